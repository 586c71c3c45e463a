use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Child;
use tracing::trace;
use vdl_model::SubprocessEnv;

use crate::{error::ExecError, util::cmd_program};

/// What a child's stdin is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StdinMode {
    /// Share the launcher's own stdin.
    #[default]
    Inherit,
    /// A fresh pipe; the write end is returned in `Child::stdin`.
    Piped,
}

impl From<StdinMode> for Stdio {
    fn from(mode: StdinMode) -> Self {
        match mode {
            StdinMode::Inherit => Stdio::inherit(),
            StdinMode::Piped => Stdio::piped(),
        }
    }
}

/// Everything needed to start one subprocess.
#[derive(Clone, Debug, Default)]
pub struct ProcConfig {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Applied on top of the inherited environment.
    pub env: SubprocessEnv,
    pub stdin: StdinMode,
    /// Pipe stdout back to the caller instead of inheriting it.
    pub capture_stdout: bool,
}

impl ProcConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_env(mut self, env: SubprocessEnv) -> Self {
        self.env = env;
        self
    }

    pub fn with_stdin(mut self, stdin: StdinMode) -> Self {
        self.stdin = stdin;
        self
    }

    pub fn capture_stdout(mut self) -> Self {
        self.capture_stdout = true;
        self
    }
}

/// Start a subprocess. Stderr is always inherited.
pub fn spawn(cfg: &ProcConfig) -> Result<Child, ExecError> {
    if cfg.program.as_os_str().is_empty() {
        return Err(ExecError::MissingProgram);
    }

    let mut cmd = cmd_program(&cfg.program, &cfg.args);
    for (k, v) in cfg.env.resolved() {
        cmd.env(k, v);
    }

    cmd.stdin(Stdio::from(cfg.stdin));
    cmd.stdout(if cfg.capture_stdout {
        Stdio::piped()
    } else {
        Stdio::inherit()
    });
    cmd.stderr(Stdio::inherit());

    trace!(target: "vdl.exec.proc", program = %cfg.program.display(), args = ?cfg.args, "spawn");
    cmd.spawn().map_err(|e| ExecError::Spawn {
        program: cfg.program.display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::util::exit_code;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn sh(script: &str) -> ProcConfig {
        ProcConfig::new("sh").with_args(vec!["-c".into(), script.into()])
    }

    #[tokio::test]
    async fn piped_stdin_reaches_captured_stdout() {
        let cfg = sh("cat").with_stdin(StdinMode::Piped).capture_stdout();
        let mut child = spawn(&cfg).unwrap();

        let mut stdin = child.stdin.take().unwrap();
        stdin.write_all(b"device config").await.unwrap();
        drop(stdin);

        let mut out = Vec::new();
        child.stdout.take().unwrap().read_to_end(&mut out).await.unwrap();
        let status = child.wait().await.unwrap();

        assert_eq!(out, b"device config");
        assert_eq!(exit_code(status), 0);
    }

    #[tokio::test]
    async fn env_bindings_are_applied() {
        let env = SubprocessEnv::single("CUTTLEFISH_INSTANCE", "1").with("CUTTLEFISH_INSTANCE", "4");
        let cfg = sh("printf %s \"$CUTTLEFISH_INSTANCE\"")
            .with_env(env)
            .capture_stdout();
        let mut child = spawn(&cfg).unwrap();

        let mut out = String::new();
        child.stdout.take().unwrap().read_to_string(&mut out).await.unwrap();
        child.wait().await.unwrap();

        assert_eq!(out, "4");
    }

    #[tokio::test]
    async fn exit_code_is_reported() {
        let mut child = spawn(&sh("exit 7")).unwrap();
        let status = child.wait().await.unwrap();
        assert_eq!(exit_code(status), 7);
    }

    #[tokio::test]
    async fn signal_exit_is_offset_by_128() {
        let mut child = spawn(&sh("kill -TERM $$")).unwrap();
        let status = child.wait().await.unwrap();
        assert_eq!(exit_code(status), 128 + libc::SIGTERM);
    }

    #[tokio::test]
    async fn kill_graceful_reaps_a_sleeping_child() {
        let mut child = spawn(&sh("sleep 30")).unwrap();
        crate::util::kill_graceful(&mut child).await.unwrap();
        assert!(child.try_wait().unwrap().is_some());
    }

    #[tokio::test]
    async fn children_share_one_grace_period() {
        let stubborn = "trap '' TERM; while :; do sleep 1; done";
        let mut first = spawn(&sh(stubborn)).unwrap();
        let mut second = spawn(&sh(stubborn)).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        let started = std::time::Instant::now();
        crate::util::kill_graceful_all([&mut first, &mut second])
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(8));
        assert!(first.try_wait().unwrap().is_some());
        assert!(second.try_wait().unwrap().is_some());
    }

    #[tokio::test]
    async fn reaped_child_is_left_alone() {
        let mut child = spawn(&sh("exit 0")).unwrap();
        child.wait().await.unwrap();
        crate::util::kill_graceful(&mut child).await.unwrap();
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let _guard = rt.enter();
        let err = spawn(&ProcConfig::new("/nonexistent/assemble_cvd")).unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }

    #[test]
    fn empty_program_is_rejected() {
        assert!(matches!(
            spawn(&ProcConfig::default()),
            Err(ExecError::MissingProgram)
        ));
    }
}
