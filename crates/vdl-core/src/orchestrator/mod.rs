//! Two-phase launch: run the assembler to completion, then fan its output out to one
//! runner per instance.
//!
//! Runs on a single control task. Subprocesses run concurrently with it once started;
//! all communication with them goes through pipes and the environment bound at start.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};
use vdl_exec::{
    ExecError, ProcConfig, StdinMode, exit_code, kill_graceful, kill_graceful_all, spawn,
};
use vdl_model::{
    INSTANCE_ENV_VAR, InstanceNum, InstanceSet, LaunchOutcome, LaunchState, RunnerExit,
    SubprocessEnv, Subtool,
};
use vdl_observe::Verbosity;

use crate::{discovery::FileReport, error::CoreError, forward::FlagForwarder};

pub const CONSOLE_SEVERITY_ENV: &str = "CF_CONSOLE_SEVERITY";
pub const FILE_SEVERITY_ENV: &str = "CF_FILE_SEVERITY";

/// Everything one launch needs, resolved before any process starts.
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub assembler: PathBuf,
    pub runner: PathBuf,
    /// Normalized invocation arguments, handed to the flag forwarder.
    pub args: Vec<String>,
    pub instances: InstanceSet,
    /// Piped to the assembler's stdin when present; otherwise stdin is inherited.
    pub file_report: Option<FileReport>,
    /// Bindings applied to every subprocess.
    pub env: SubprocessEnv,
}

impl LaunchPlan {
    /// Log severities for the subprocesses, unless the launcher's own environment
    /// already pins them.
    pub fn log_env(console: Verbosity, file: Verbosity) -> SubprocessEnv {
        let mut env = SubprocessEnv::new();
        for (key, value) in [
            (CONSOLE_SEVERITY_ENV, console),
            (FILE_SEVERITY_ENV, file),
        ] {
            if std::env::var_os(key).is_none() {
                env.push(key, value.as_str());
            }
        }
        env
    }
}

enum Assembly {
    Output(Vec<u8>),
    Failed(i32),
}

/// Drives one launch from `Init` to `Done` or `Failed`. Single use.
pub struct Orchestrator<'a> {
    forwarder: &'a dyn FlagForwarder,
    cancel: CancellationToken,
    state: LaunchState,
}

impl<'a> Orchestrator<'a> {
    pub fn new(forwarder: &'a dyn FlagForwarder) -> Self {
        Self {
            forwarder,
            cancel: CancellationToken::new(),
            state: LaunchState::Init,
        }
    }

    /// Cancelling `token` terminates and reaps every started subprocess.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn state(&self) -> LaunchState {
        self.state
    }

    fn transition(&mut self, next: LaunchState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        trace!(target: "vdl.core.orchestrator", from = ?self.state, to = ?next, "transition");
        self.state = next;
    }

    /// Run the whole launch.
    ///
    /// Process failures are reported through the returned [`LaunchOutcome`]; `Err` means
    /// the launch could not be carried out (start failure, pipe I/O, cancellation).
    #[instrument(level = "debug", skip_all, fields(instances = plan.instances.len()))]
    pub async fn launch(&mut self, plan: &LaunchPlan) -> Result<LaunchOutcome, CoreError> {
        if self.state != LaunchState::Init {
            return Err(CoreError::AlreadyStarted(self.state));
        }
        if plan.instances.is_empty() {
            return Err(CoreError::EmptyInstanceSet);
        }

        let result = self.drive(plan).await;
        if result.is_err() {
            // Errors abort outside the regular transitions.
            self.state = LaunchState::Failed;
        }
        result
    }

    async fn drive(&mut self, plan: &LaunchPlan) -> Result<LaunchOutcome, CoreError> {
        self.transition(LaunchState::Assembling);
        let output = match self.assemble(plan).await? {
            Assembly::Output(output) => output,
            Assembly::Failed(code) => {
                self.transition(LaunchState::Failed);
                return Ok(LaunchOutcome {
                    assembler_exit: code,
                    runners: Vec::new(),
                });
            }
        };
        self.transition(LaunchState::Assembled);

        self.transition(LaunchState::Running);
        let runners = self.run(plan, output).await?;
        let outcome = LaunchOutcome {
            assembler_exit: 0,
            runners,
        };
        self.transition(if outcome.is_success() {
            LaunchState::Done
        } else {
            LaunchState::Failed
        });
        Ok(outcome)
    }

    async fn assemble(&self, plan: &LaunchPlan) -> Result<Assembly, CoreError> {
        let env = plan
            .env
            .clone()
            .with(INSTANCE_ENV_VAR, plan.instances.first().to_string());
        let stdin = if plan.file_report.is_some() {
            StdinMode::Piped
        } else {
            StdinMode::Inherit
        };
        let cfg = ProcConfig::new(&plan.assembler)
            .with_args(self.forwarder.argv_for(Subtool::Assembler, &plan.args))
            .with_env(env)
            .with_stdin(stdin)
            .capture_stdout();

        let mut child = spawn(&cfg)?;
        debug!(target: "vdl.core.orchestrator", pid = ?child.id(), "assembler started");

        let report = child.stdin.take().zip(plan.file_report.as_ref());
        let Some(mut stdout) = child.stdout.take() else {
            terminate(&mut child, Subtool::Assembler).await;
            return Err(ExecError::Io("assembler stdout is not captured".into()).into());
        };

        let write_report = async move {
            if let Some((mut stdin, report)) = report {
                stdin.write_all(&report.to_bytes()).await?;
                stdin.shutdown().await?;
                trace!(target: "vdl.core.orchestrator", files = report.len(), "file report written");
            }
            Ok::<_, std::io::Error>(())
        };
        let read_output = async move {
            let mut output = Vec::new();
            stdout.read_to_end(&mut output).await?;
            Ok::<_, std::io::Error>(output)
        };

        let output = tokio::select! {
            res = async { tokio::try_join!(write_report, read_output) } => match res {
                Ok(((), output)) => output,
                Err(e) => {
                    error!(target: "vdl.core.orchestrator", error = %e, "reading assembler output failed");
                    terminate(&mut child, Subtool::Assembler).await;
                    return Err(ExecError::from(e).into());
                }
            },
            _ = self.cancel.cancelled() => {
                terminate(&mut child, Subtool::Assembler).await;
                return Err(CoreError::Cancelled);
            }
        };

        let status = tokio::select! {
            status = child.wait() => status.map_err(ExecError::from)?,
            _ = self.cancel.cancelled() => {
                terminate(&mut child, Subtool::Assembler).await;
                return Err(CoreError::Cancelled);
            }
        };

        let code = exit_code(status);
        if code != 0 {
            error!(target: "vdl.core.orchestrator", code, "assembler returned non-zero");
            return Ok(Assembly::Failed(code));
        }
        debug!(target: "vdl.core.orchestrator", bytes = output.len(), "assembler exited successfully");
        Ok(Assembly::Output(output))
    }

    async fn run(
        &self,
        plan: &LaunchPlan,
        output: Vec<u8>,
    ) -> Result<Vec<RunnerExit>, CoreError> {
        let output: Arc<[u8]> = output.into();
        let mut started: Vec<(InstanceNum, Child)> = Vec::with_capacity(plan.instances.len());
        let mut writers: Vec<(InstanceNum, JoinHandle<std::io::Result<()>>)> =
            Vec::with_capacity(plan.instances.len());

        for instance in plan.instances.iter() {
            let cfg = ProcConfig::new(&plan.runner)
                .with_args(self.forwarder.argv_for(Subtool::Runner, &plan.args))
                .with_env(plan.env.clone().with(INSTANCE_ENV_VAR, instance.to_string()))
                .with_stdin(StdinMode::Piped);

            let mut child = match spawn(&cfg) {
                Ok(child) => child,
                Err(e) => {
                    error!(target: "vdl.core.orchestrator", instance, error = %e, "runner failed to start");
                    terminate_all(&mut started).await;
                    return Err(e.into());
                }
            };
            info!(target: "vdl.core.orchestrator", instance, pid = ?child.id(), "runner started");

            let Some(mut stdin) = child.stdin.take() else {
                started.push((instance, child));
                terminate_all(&mut started).await;
                return Err(ExecError::Io("runner stdin is not piped".into()).into());
            };
            started.push((instance, child));

            // Each runner drains its own pipe; a slow reader must not hold up the rest.
            let bytes = Arc::clone(&output);
            writers.push((
                instance,
                tokio::spawn(async move {
                    stdin.write_all(&bytes).await?;
                    stdin.shutdown().await
                }),
            ));
        }

        let mut exits = Vec::with_capacity(started.len());
        for i in 0..started.len() {
            let instance = started[i].0;
            let status = tokio::select! {
                status = started[i].1.wait() => status,
                _ = self.cancel.cancelled() => {
                    warn!(target: "vdl.core.orchestrator", "cancelled; terminating runners");
                    terminate_all(&mut started[i..]).await;
                    return Err(CoreError::Cancelled);
                }
            };
            let code = match status {
                Ok(status) => exit_code(status),
                Err(e) => {
                    terminate_all(&mut started[i + 1..]).await;
                    return Err(ExecError::from(e).into());
                }
            };

            if code != 0 {
                error!(target: "vdl.core.orchestrator", instance, code, "runner returned non-zero");
            } else {
                debug!(target: "vdl.core.orchestrator", instance, "runner exited successfully");
            }
            exits.push(RunnerExit { instance, code });
        }

        let mut write_error = None;
        for (instance, writer) in writers {
            let res = writer
                .await
                .unwrap_or_else(|e| Err(std::io::Error::other(e.to_string())));
            if let Err(e) = res {
                error!(target: "vdl.core.orchestrator", instance, error = %e, "could not write to runner");
                write_error.get_or_insert(ExecError::Io(format!(
                    "could not write to runner for instance {instance}: {e}"
                )));
            }
        }
        match write_error {
            Some(e) => Err(e.into()),
            None => Ok(exits),
        }
    }
}

async fn terminate(child: &mut Child, subtool: Subtool) {
    if let Err(e) = kill_graceful(child).await {
        warn!(target: "vdl.core.orchestrator", subtool = subtool.kind(), error = %e, "terminate failed");
    }
}

/// Terminate every child under one shared grace period.
async fn terminate_all(children: &mut [(InstanceNum, Child)]) {
    if let Err(e) = kill_graceful_all(children.iter_mut().map(|(_, child)| child)).await {
        warn!(target: "vdl.core.orchestrator", error = %e, "terminating runners failed");
    }
}
