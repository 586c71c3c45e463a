//! Rewrites bare and negated boolean toggles into explicit `--name=true|false`.
//!
//! The downstream parser only understands the explicit form for these flags; a bare
//! `-daemon` would otherwise be rejected or swallowed as a positional argument.

/// Boolean flags of the subordinate binaries.
pub const BOOL_FLAGS: &[&str] = &[
    "guest_enforce_security",
    "use_random_serial",
    "use_allocd",
    "use_sdcard",
    "pause_in_bootloader",
    "daemon",
    "enable_minimal_mode",
    "enable_modem_simulator",
    "console",
    "enable_sandbox",
    "enable_virtiofs",
    "restart_subprocesses",
    "enable_gpu_udmabuf",
    "enable_gpu_vhost_user",
    "enable_audio",
    "start_gnss_proxy",
    "enable_bootanimation",
    "record_screen",
    "protected_vm",
    "enable_kernel_log",
    "kgdb",
    "start_webrtc",
    "smt",
    "vhost_net",
    "vhost_user_vsock",
    "chromeos_boot",
    "enable_host_sandbox",
];

/// A recognized boolean toggle and the value it stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolArg<'a> {
    pub name: &'a str,
    pub value: bool,
}

impl BoolArg<'_> {
    pub fn to_explicit(&self) -> String {
        format!("--{}={}", self.name, self.value)
    }
}

#[inline]
pub fn is_bool_flag(name: &str) -> bool {
    BOOL_FLAGS.contains(&name)
}

/// Recognize `-name`, `--name`, `-noname` and `--noname` for a known boolean `name`.
pub fn parse_bool_arg(token: &str) -> Option<BoolArg<'_>> {
    let name = token.strip_prefix('-')?;
    let name = name.strip_prefix('-').unwrap_or(name);
    if name.is_empty() || name.contains('=') {
        return None;
    }
    if is_bool_flag(name) {
        return Some(BoolArg { name, value: true });
    }
    name.strip_prefix("no")
        .filter(|suffix| is_bool_flag(suffix))
        .map(|suffix| BoolArg {
            name: suffix,
            value: false,
        })
}

/// Normalize every boolean toggle in place. Token count never changes.
///
/// Returns whether any token was rewritten.
pub fn normalize_bool_args(args: &mut [String]) -> bool {
    let mut changed = false;
    for arg in args.iter_mut() {
        if let Some(explicit) = parse_bool_arg(arg).map(|b| b.to_explicit()) {
            *arg = explicit;
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(token: &str) -> String {
        let mut args = vec![token.to_string()];
        normalize_bool_args(&mut args);
        args.remove(0)
    }

    #[test]
    fn bare_toggles_become_true() {
        assert_eq!(normalized("-daemon"), "--daemon=true");
        assert_eq!(normalized("--start_webrtc"), "--start_webrtc=true");
    }

    #[test]
    fn negated_toggles_become_false() {
        assert_eq!(normalized("--nodaemon"), "--daemon=false");
        assert_eq!(normalized("-nosmt"), "--smt=false");
    }

    #[test]
    fn explicit_and_unknown_tokens_are_untouched() {
        for token in [
            "--daemon=false",
            "-nosuch",
            "-no",
            "-",
            "--",
            "daemon",
            "---daemon",
            "-daemonx",
            "-num_instances=2",
            "-nonum_instances",
        ] {
            assert_eq!(normalized(token), token, "token {token:?}");
        }
    }

    #[test]
    fn only_one_no_prefix_is_stripped() {
        assert_eq!(normalized("-nonosmt"), "-nonosmt");
    }

    #[test]
    fn reports_whether_anything_changed() {
        let mut args = vec!["-num_instances=2".to_string(), "foo".to_string()];
        assert!(!normalize_bool_args(&mut args));

        args.push("-kgdb".into());
        assert!(normalize_bool_args(&mut args));
        assert_eq!(args.len(), 3);
        assert_eq!(args[2], "--kgdb=true");
    }

    #[test]
    fn normalization_is_idempotent() {
        let mut args: Vec<String> = [
            "-daemon",
            "--noconsole",
            "-report_anonymous_usage_stats=y",
            "positional",
            "-no",
            "--enable_audio=false",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        assert!(normalize_bool_args(&mut args));
        let once = args.clone();
        assert!(!normalize_bool_args(&mut args));
        assert_eq!(args, once);
    }

    #[test]
    fn set_has_no_duplicates() {
        let mut names = BOOL_FLAGS.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BOOL_FLAGS.len());
    }
}
