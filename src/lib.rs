// Trackd - Feature Workflow State Tracker
// Tracks a feature's linear task sequence in a durable state record

pub mod cli;
pub mod context;
pub mod models;
pub mod parser;
pub mod state;
pub mod validator;

pub use anyhow::{Context, Result};
pub use colored::Colorize;

// Re-export commonly used types
pub use models::{CoherenceReport, FeatureState, Severity, Task, TaskStatus, Violation};
pub use state::{FileStateStore, StateError, StateMachine, StateStore, TaskList};
