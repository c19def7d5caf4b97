//! Task record types
//!
//! A task is one atomic unit of implementation work within a feature. Tasks
//! live in an id-keyed arena on the state record; execution order is carried
//! by explicit `nextTask`/`previousTask` id links, never by map order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a single task
///
/// Progression is `pending → in-progress → {red → green → refactor}* → done`;
/// `done` is terminal for the task.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Red,
    Green,
    Refactor,
    Done,
}

impl TaskStatus {
    /// Wire name as it appears in the persisted record
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Red => "red",
            TaskStatus::Green => "green",
            TaskStatus::Refactor => "refactor",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in-progress" => Ok(TaskStatus::InProgress),
            "red" => Ok(TaskStatus::Red),
            "green" => Ok(TaskStatus::Green),
            "refactor" => Ok(TaskStatus::Refactor),
            "done" => Ok(TaskStatus::Done),
            other => Err(format!(
                "Invalid task status '{}' (expected pending|in-progress|red|green|refactor|done)",
                other
            )),
        }
    }
}

/// Red/green/refactor sub-phase of a task that is in progress but not done
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TddPhase {
    Red,
    Green,
    Refactor,
}

impl TddPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TddPhase::Red => "red",
            TddPhase::Green => "green",
            TddPhase::Refactor => "refactor",
        }
    }
}

impl fmt::Display for TddPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TddPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "red" => Ok(TddPhase::Red),
            "green" => Ok(TddPhase::Green),
            "refactor" => Ok(TddPhase::Refactor),
            other => Err(format!(
                "Invalid TDD phase '{}' (expected red|green|refactor)",
                other
            )),
        }
    }
}

/// Classification tag for tasks without a user-story marker
pub const FOUNDATION_STORY: &str = "foundation";

/// One task in the persisted state record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique stable identifier (e.g. "T001"); lexical order matches
    /// intended execution order
    pub id: String,

    /// Human-readable description, non-empty
    pub description: String,

    /// Current lifecycle status
    pub status: TaskStatus,

    /// Classification tag: "foundation", a "US-n" story id, or a polish tag
    pub user_story: String,

    /// Forward link into the same arena (weak reference by id)
    pub next_task: Option<String>,

    /// Backward link into the same arena (weak reference by id)
    pub previous_task: Option<String>,

    /// Recorded but never enforced; no dependency-gated advancement
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// May run concurrently with siblings sharing the same predecessor
    /// (informational only)
    pub parallel: bool,

    /// TDD sub-phase while the task is not yet done
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tdd_phase: Option<TddPhase>,

    /// Set exactly once, when the task transitions to done
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }
}
