pub mod operation;
pub mod push_event;
pub mod subscription;

// Re-export core models for easy access
pub use operation::{
    ExecutionRef, NewOperation, Operation, OperationExtra, ResolutionChannel, TerminalTransition,
};
pub use push_event::{
    EventDetail, ImageStateDetail, Observation, PipelineExecutionDetail, PushEvent,
    TaskStateDetail,
};
pub use subscription::{SubscriptionKey, SubscriptionPattern, SubscriptionRecord, SubscriptionState};
