use crate::KeyValue;

/// Environment bindings handed to one subprocess at start time.
///
/// The launcher never mutates its own environment; every binding a subprocess needs is
/// collected here and applied to that subprocess only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubprocessEnv(pub Vec<KeyValue>);

impl SubprocessEnv {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Create an environment containing a single binding.
    pub fn single<K, V>(key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self(vec![KeyValue::new(key, value)])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the value for a key, returning the last matching entry.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|kv| kv.key() == key)
            .map(|kv| kv.value())
    }

    /// Append a binding. Later entries win when queried via [`SubprocessEnv::get`].
    pub fn push<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.0.push(KeyValue::new(key, value));
    }

    /// Builder form of [`SubprocessEnv::push`].
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.push(key, value);
        self
    }

    /// Concatenate two environments; entries from `other` override earlier ones.
    pub fn merged(&self, other: &SubprocessEnv) -> SubprocessEnv {
        let mut out = self.0.clone();
        out.extend(other.0.clone());
        SubprocessEnv(out)
    }

    /// Last value per key, in first-seen key order.
    ///
    /// This is what actually reaches the child: one binding per variable.
    pub fn resolved(&self) -> Vec<(&str, &str)> {
        let mut out: Vec<(&str, &str)> = Vec::with_capacity(self.0.len());
        for kv in &self.0 {
            match out.iter_mut().find(|(k, _)| *k == kv.key()) {
                Some(slot) => slot.1 = kv.value(),
                None => out.push((kv.key(), kv.value())),
            }
        }
        out
    }
}

impl Default for SubprocessEnv {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::SubprocessEnv;

    #[test]
    fn env_new_is_empty() {
        let env = SubprocessEnv::new();
        assert!(env.is_empty());
        assert!(env.get("FOO").is_none());
    }

    #[test]
    fn env_push_and_override_last_wins() {
        let mut env = SubprocessEnv::new();
        env.push("FOO", "one");
        env.push("BAR", "x");
        env.push("FOO", "two");

        assert_eq!(env.get("FOO"), Some("two"));
        assert_eq!(env.get("BAR"), Some("x"));
        assert!(env.get("BAZ").is_none());
    }

    #[test]
    fn env_merged_other_overrides_base() {
        let base = SubprocessEnv::new().with("FOO", "base").with("BAR", "bar");
        let other = SubprocessEnv::single("FOO", "override").with("BAZ", "baz");

        let merged = base.merged(&other);

        assert_eq!(merged.get("FOO"), Some("override"));
        assert_eq!(merged.get("BAR"), Some("bar"));
        assert_eq!(merged.get("BAZ"), Some("baz"));
    }

    #[test]
    fn resolved_keeps_one_binding_per_key() {
        let env = SubprocessEnv::new()
            .with("CUTTLEFISH_INSTANCE", "1")
            .with("CF_CONSOLE_SEVERITY", "INFO")
            .with("CUTTLEFISH_INSTANCE", "2");

        assert_eq!(
            env.resolved(),
            vec![("CUTTLEFISH_INSTANCE", "2"), ("CF_CONSOLE_SEVERITY", "INFO")]
        );
    }
}
