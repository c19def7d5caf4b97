//! Persisted feature state record
//!
//! Defines the durable JSON record that tracks a feature's progress:
//! - feature identity and ticket reference
//! - the task arena with its linked ordering
//! - the denormalized cursor (current task)
//! - document existence flags and aggregate totals
//! - the last coherence summary
//!
//! Field names follow the "1.0.0" wire format.

use crate::models::task::{Task, TaskStatus, TddPhase};
use crate::models::violation::Violation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Record format version understood by this build
pub const STATE_VERSION: &str = "1.0.0";

/// The durable state record for one feature
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureState {
    /// Record format version, always "1.0.0"
    pub version: String,

    /// Feature identity
    pub feature: FeatureInfo,

    /// Where this record lives and when it was touched
    pub state_file: StateFileInfo,

    /// Denormalized cursor: the single active task, or the terminal marker
    pub current_task: CurrentTask,

    /// Supporting documents and aggregate task totals
    pub workflow: WorkflowDocuments,

    /// Last coherence summary
    pub coherence: CoherenceSummary,

    /// Task arena keyed by id; order lives in the links, not the map
    pub tasks: BTreeMap<String, Task>,
}

impl FeatureState {
    /// "completed/total" progress string
    pub fn progress(&self) -> String {
        format!(
            "{}/{}",
            self.workflow.tasks.completed_tasks, self.workflow.tasks.total_tasks
        )
    }

    /// Number of tasks whose status is done
    pub fn done_count(&self) -> u32 {
        self.tasks.values().filter(|t| t.is_done()).count() as u32
    }

    /// True once the cursor has reached the terminal all-complete state
    pub fn is_complete(&self) -> bool {
        self.current_task.status == CursorStatus::AllComplete
    }

    /// The head of the task chain (the task with no predecessor)
    pub fn head_task(&self) -> Option<&Task> {
        self.tasks.values().find(|t| t.previous_task.is_none())
    }
}

/// Feature identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureInfo {
    pub id: String,
    pub name: String,
    pub branch: String,
    pub ticket: TicketRef,
}

/// External ticket reference ("none" when untracked)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketRef {
    pub system: String,
    pub id: String,
    pub url: String,
}

/// State file location and timestamps
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateFileInfo {
    /// Path relative to the project root
    pub path: String,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// Cursor status: a task status, or the feature-level terminal marker
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CursorStatus {
    Pending,
    InProgress,
    Red,
    Green,
    Refactor,
    Done,
    #[serde(rename = "all_complete")]
    AllComplete,
}

impl CursorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CursorStatus::Pending => "pending",
            CursorStatus::InProgress => "in-progress",
            CursorStatus::Red => "red",
            CursorStatus::Green => "green",
            CursorStatus::Refactor => "refactor",
            CursorStatus::Done => "done",
            CursorStatus::AllComplete => "all_complete",
        }
    }
}

impl fmt::Display for CursorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TaskStatus> for CursorStatus {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Pending => CursorStatus::Pending,
            TaskStatus::InProgress => CursorStatus::InProgress,
            TaskStatus::Red => CursorStatus::Red,
            TaskStatus::Green => CursorStatus::Green,
            TaskStatus::Refactor => CursorStatus::Refactor,
            TaskStatus::Done => CursorStatus::Done,
        }
    }
}

/// Feature-level phase derived from the cursor task's user story
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowPhase {
    Foundation,
    UserStory,
    Polish,
    Qa,
}

impl WorkflowPhase {
    /// Classify a user-story tag: "foundation" tasks stay in the foundation
    /// phase, "US-*" tasks are user-story work, anything else is polish.
    pub fn for_story(user_story: &str) -> Self {
        if user_story == crate::models::task::FOUNDATION_STORY {
            WorkflowPhase::Foundation
        } else if user_story.starts_with("US-") {
            WorkflowPhase::UserStory
        } else {
            WorkflowPhase::Polish
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowPhase::Foundation => "foundation",
            WorkflowPhase::UserStory => "user-story",
            WorkflowPhase::Polish => "polish",
            WorkflowPhase::Qa => "qa",
        }
    }
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Denormalized "where are we" cache, kept in sync with the referenced task
///
/// `id` is none only once every task is done, in which case the status is
/// `all_complete` and the phase is `qa`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentTask {
    pub id: Option<String>,
    pub status: CursorStatus,
    pub phase: WorkflowPhase,
    pub next_task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tdd_phase: Option<TddPhase>,
}

impl CurrentTask {
    /// The terminal cursor once every task is done
    pub fn all_complete() -> Self {
        Self {
            id: None,
            status: CursorStatus::AllComplete,
            phase: WorkflowPhase::Qa,
            next_task_id: None,
            tdd_phase: None,
        }
    }

    /// Cursor freshly positioned on a pending task
    pub fn at_task(task: &Task) -> Self {
        Self {
            id: Some(task.id.clone()),
            status: CursorStatus::Pending,
            phase: WorkflowPhase::for_story(&task.user_story),
            next_task_id: task.next_task.clone(),
            tdd_phase: None,
        }
    }
}

/// Existence/path flags for the three supporting documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDocuments {
    pub spec: DocumentRef,
    pub plan: DocumentRef,
    pub tasks: TasksDocument,
}

/// A supporting document tracked by path and existence only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRef {
    pub path: String,
    pub exists: bool,
}

/// The tasks document plus aggregate totals
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksDocument {
    pub path: String,
    pub exists: bool,
    pub total_tasks: u32,
    pub completed_tasks: u32,
}

/// Last coherence-check summary carried on the record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoherenceSummary {
    pub spec_plan_alignment: bool,
    pub plan_tasks_alignment: bool,
    pub plan_implementation_alignment: bool,
    pub violations: Vec<Violation>,
    pub last_check: DateTime<Utc>,
}
