//! Coherence violations and the check report
//!
//! Violations are data, not errors: checks return them as a structured list
//! and the caller decides whether a blocker halts the surrounding workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a coherence violation
///
/// Blockers negate coherence; warnings do not.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Blocker,
    Warning,
}

impl Severity {
    /// Display symbol for severity
    pub fn symbol(&self) -> &'static str {
        match self {
            Severity::Blocker => "🔴",
            Severity::Warning => "🟡",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Severity::Blocker => "BLOCKER",
            Severity::Warning => "WARNING",
        }
    }
}

/// What kind of inconsistency was found
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationType {
    /// Specification document reported absent
    MissingSpec,
    /// Plan document reported absent
    MissingPlan,
    /// Tasks document reported absent
    MissingTasks,
    /// No state record exists for the feature
    MissingState,
    /// Referenced task id is not a key of the task arena
    UnknownTask,
    /// A nextTask link points at a nonexistent task
    BrokenNext,
    /// A previousTask link points at a nonexistent task
    BrokenPrevious,
    /// Following next links revisits a task, or no head exists
    CycleDetected,
    /// Task is never reached when walking next links from the head
    OrphanedTask,
    /// completedTasks disagrees with the arena, or exceeds totalTasks
    CountMismatch,
    /// Cursor disagrees with the task it references
    CursorDesync,
}

/// A single coherence violation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    #[serde(rename = "type")]
    pub kind: ViolationType,
    pub severity: Severity,
    pub description: String,
}

impl Violation {
    pub fn blocker(kind: ViolationType, description: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Blocker,
            description: description.into(),
        }
    }

    pub fn warning(kind: ViolationType, description: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            description: description.into(),
        }
    }

    /// Format for terminal display
    pub fn format(&self) -> String {
        format!(
            "{} [{}] {}",
            self.severity.symbol(),
            self.severity.name(),
            self.description
        )
    }
}

/// Aggregate result of a coherence check
///
/// This is the wire contract consumed by any caller: a feature is coherent
/// iff no violation has blocker severity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoherenceReport {
    pub coherent: bool,
    pub violations: Vec<Violation>,
    pub checked_at: DateTime<Utc>,
}

impl CoherenceReport {
    /// Build a report from collected violations; the coherent verdict is
    /// derived, never supplied
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        let coherent = !violations
            .iter()
            .any(|v| v.severity == Severity::Blocker);
        Self {
            coherent,
            violations,
            checked_at: Utc::now(),
        }
    }

    pub fn blocker_count(&self) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Blocker)
            .count()
    }
}
