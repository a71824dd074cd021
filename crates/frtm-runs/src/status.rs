use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle state of a run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RunStatus {
    /// Upload stored; analysis not started yet.
    Queued,
    /// Analysis in progress.
    Running,
    /// Analysis stored; the run can be rendered.
    Complete,
    /// Analysis failed; the run carries an error message.
    Failed,
}

impl RunStatus {
    /// Whether no further transition is allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Running)
                | (Self::Running, Self::Complete)
                | (Self::Running, Self::Failed)
        )
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(RunStatus::Queued, RunStatus::Running, true)]
    #[case(RunStatus::Running, RunStatus::Complete, true)]
    #[case(RunStatus::Running, RunStatus::Failed, true)]
    #[case(RunStatus::Queued, RunStatus::Complete, false)]
    #[case(RunStatus::Queued, RunStatus::Failed, false)]
    #[case(RunStatus::Running, RunStatus::Queued, false)]
    #[case(RunStatus::Complete, RunStatus::Failed, false)]
    #[case(RunStatus::Failed, RunStatus::Running, false)]
    fn transitions(#[case] from: RunStatus, #[case] to: RunStatus, #[case] allowed: bool) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn terminal_states() {
        assert!(RunStatus::Complete.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(!RunStatus::Queued.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
    }
}
