/// Where a launch currently is in its lifecycle.
///
/// `Init → Assembling → Assembled → Running → Done`, with `Failed` reachable from
/// `Assembling` and `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    /// Nothing has been started yet.
    Init,
    /// The assembler is running and its output is being captured.
    Assembling,
    /// The assembler exited successfully; its output is complete.
    Assembled,
    /// Runners are being started or waited on.
    Running,
    /// The assembler and every runner exited with code zero.
    Done,
    /// The assembler or at least one runner failed.
    Failed,
}

impl LaunchState {
    /// Whether `self → next` is a legal transition.
    pub fn can_transition_to(&self, next: LaunchState) -> bool {
        use LaunchState::*;
        matches!(
            (self, next),
            (Init, Assembling)
                | (Assembling, Assembled)
                | (Assembling, Failed)
                | (Assembled, Running)
                | (Running, Done)
                | (Running, Failed)
        )
    }
}
