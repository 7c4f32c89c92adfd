use super::states::OperationStatus;

/// Outcome of asking whether `current` may move to `target`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionDecision {
    /// Write `target`
    Apply,
    /// `current` is terminal; the caller lost the race or saw a duplicate
    AlreadyTerminal,
    /// Backwards or same-status move between non-terminal statuses
    NoOp,
}

/// Monotonic transition rule shared by every registry backend
pub fn decide_transition(current: OperationStatus, target: OperationStatus) -> TransitionDecision {
    use OperationStatus::*;

    if current.is_terminal() {
        return TransitionDecision::AlreadyTerminal;
    }

    match (current, target) {
        (_, Succeeded | Failed | Stopped) => TransitionDecision::Apply,
        (Pending, InProgress) => TransitionDecision::Apply,
        _ => TransitionDecision::NoOp,
    }
}
