// State machine for tracked operations
//
// Status only ever moves forward: non-terminal to non-terminal, or
// non-terminal to exactly one terminal status. Every write goes through
// `decide_transition` so the registries apply the same rules.

pub mod states;
pub mod transitions;

pub use states::{OperationStatus, TerminalStatus};
pub use transitions::{decide_transition, TransitionDecision};
