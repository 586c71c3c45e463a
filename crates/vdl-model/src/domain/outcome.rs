use crate::InstanceNum;

/// Exit code reported when the assembler succeeded but at least one runner failed.
pub const RUNNER_FAILURE_EXIT_CODE: u8 = 255;

/// Exit status of one runner process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerExit {
    pub instance: InstanceNum,
    pub code: i32,
}

impl RunnerExit {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Aggregate result of one launch.
///
/// `runners` is empty when the assembler failed: no runner is ever started in that case.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LaunchOutcome {
    pub assembler_exit: i32,
    pub runners: Vec<RunnerExit>,
}

impl LaunchOutcome {
    pub fn assembler_failed(&self) -> bool {
        self.assembler_exit != 0
    }

    /// Runners that exited with a non-zero code, in start order.
    pub fn failed_runners(&self) -> impl Iterator<Item = &RunnerExit> {
        self.runners.iter().filter(|r| !r.success())
    }

    pub fn is_success(&self) -> bool {
        !self.assembler_failed() && self.runners.iter().all(RunnerExit::success)
    }

    /// Process exit code for the launcher itself.
    ///
    /// A failing assembler's code is surfaced verbatim; runner failures collapse into
    /// [`RUNNER_FAILURE_EXIT_CODE`].
    pub fn exit_code(&self) -> u8 {
        if self.assembler_failed() {
            // Exit codes observed from the OS are already within 0..=255; a wider value
            // still must not read as success.
            return u8::try_from(self.assembler_exit)
                .ok()
                .filter(|code| *code != 0)
                .unwrap_or(RUNNER_FAILURE_EXIT_CODE);
        }
        if self.failed_runners().next().is_some() {
            return RUNNER_FAILURE_EXIT_CODE;
        }
        0
    }
}
