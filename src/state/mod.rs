//! Feature State Machine
//!
//! Owns the lifecycle of a feature's state record:
//! - TaskList: the linked ordering over the task arena
//! - initialize/advance/resume transitions and the StateMachine wrapper
//! - StateStore: persisted-record repository with exclusive acquisition

mod list;
mod machine;
mod store;

pub use list::TaskList;
pub use machine::{
    advance, initialize, resume, CleanupOutcome, NextTaskSummary, ResumeSummary, StateMachine,
    TaskSummary, TicketInfo,
};
pub use store::{FileStateStore, StateLock, StateStore};

/// Errors raised by state machine operations
///
/// Structural/input errors abort the operation before any write. Coherence
/// findings are never errors; they travel as violation data instead.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Malformed task input: {0}")]
    MalformedInput(String),

    #[error("Task list is empty")]
    EmptyTaskList,

    #[error("Task '{0}' not in state record")]
    UnknownTask(String),

    #[error("Task '{0}' does not exist")]
    NotFound(String),

    #[error("Task '{0}' is already done")]
    AlreadyDone(String),

    #[error("All tasks are already complete; no further transitions accepted")]
    AlreadyComplete,

    #[error("State record failed validation: {0}")]
    SchemaViolation(String),
}
