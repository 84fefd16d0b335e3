//! Runner state machine.

/// Lifecycle state of a [`CommandRunner`](super::CommandRunner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunnerState {
    /// Options may still change; nothing has been spawned.
    #[default]
    Configuring,
    /// The process is being spawned or is running.
    Executing,
    /// The process exited and its output was collected.
    Completed,
    /// The process was killed after its deadline passed.
    TimedOut,
    /// The process could not be started.
    Failed,
}

impl RunnerState {
    /// Check if transition to target state is valid.
    ///
    /// Valid transitions:
    /// - Configuring -> Executing
    /// - Executing -> Completed
    /// - Executing -> TimedOut
    /// - Executing -> Failed
    pub fn can_transition_to(&self, target: RunnerState) -> bool {
        use RunnerState::*;
        matches!(
            (*self, target),
            (Configuring, Executing)
                | (Executing, Completed)
                | (Executing, TimedOut)
                | (Executing, Failed)
        )
    }

    /// Attempt to transition to a new state.
    ///
    /// Returns `Ok(())` if the transition is valid, or an error otherwise.
    pub fn transition_to(&mut self, target: RunnerState) -> crate::Result<()> {
        if self.can_transition_to(target) {
            *self = target;
            Ok(())
        } else {
            Err(crate::error::RunnerError::InvalidStateTransition {
                from: *self,
                to: target,
            })
        }
    }

    /// Check if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunnerState::Completed | RunnerState::TimedOut | RunnerState::Failed
        )
    }

    /// Check if options can still be changed.
    pub fn can_configure(&self) -> bool {
        matches!(self, RunnerState::Configuring)
    }
}
