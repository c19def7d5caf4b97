//! Coherence Checker
//!
//! Detects divergence between the state record and the three supporting
//! documents, and within the record's own linked structure:
//! - documents reported absent
//! - task references that resolve nowhere
//! - broken next/previous links, cycles, and orphaned tasks
//! - aggregate counts that disagree with the task arena
//! - a cursor out of sync with the task it references
//!
//! Violations are returned as data; callers decide whether a blocker halts
//! the surrounding workflow.

use crate::models::feature::{CursorStatus, FeatureState, WorkflowDocuments};
use crate::models::violation::{CoherenceReport, Violation, ViolationType};
use std::collections::HashSet;

// =============================================================================
// Document Checks
// =============================================================================

/// One blocker per supporting document reported absent
pub fn check_documents(documents: &WorkflowDocuments) -> Vec<Violation> {
    let mut violations = Vec::new();

    if !documents.spec.exists {
        violations.push(Violation::blocker(
            ViolationType::MissingSpec,
            "Specification missing",
        ));
    }
    if !documents.plan.exists {
        violations.push(Violation::blocker(
            ViolationType::MissingPlan,
            "Plan missing",
        ));
    }
    if !documents.tasks.exists {
        violations.push(Violation::blocker(
            ViolationType::MissingTasks,
            "Tasks missing",
        ));
    }

    violations
}

// =============================================================================
// Task Reference Check
// =============================================================================

/// Blocker when `task_id` is not a key of the task arena
pub fn check_task_reference(state: &FeatureState, task_id: &str) -> Vec<Violation> {
    if state.tasks.contains_key(task_id) {
        Vec::new()
    } else {
        vec![Violation::blocker(
            ViolationType::UnknownTask,
            format!("Task {} not in state", task_id),
        )]
    }
}

// =============================================================================
// Link Integrity
// =============================================================================

/// Verify the arena forms exactly one traversable chain.
///
/// Every non-none link must resolve; walking next links from the head must
/// visit every task exactly once and terminate at none. Dangling links are
/// reported per edge, a revisit (or a non-empty arena with no head) as a
/// cycle, and tasks the walk never reaches as orphans.
pub fn check_link_integrity(state: &FeatureState) -> Vec<Violation> {
    let mut violations = Vec::new();
    let tasks = &state.tasks;

    for (id, task) in tasks {
        if let Some(next) = &task.next_task {
            if !tasks.contains_key(next) {
                violations.push(Violation::blocker(
                    ViolationType::BrokenNext,
                    format!("Task {}: nextTask {} not found", id, next),
                ));
            }
        }
        if let Some(previous) = &task.previous_task {
            if !tasks.contains_key(previous) {
                violations.push(Violation::blocker(
                    ViolationType::BrokenPrevious,
                    format!("Task {}: previousTask {} not found", id, previous),
                ));
            }
        }
    }

    if tasks.is_empty() {
        return violations;
    }

    let heads: Vec<&str> = tasks
        .values()
        .filter(|t| t.previous_task.is_none())
        .map(|t| t.id.as_str())
        .collect();

    if heads.is_empty() {
        violations.push(Violation::blocker(
            ViolationType::CycleDetected,
            "No head task; previous links form a cycle",
        ));
        return violations;
    }

    let mut visited: HashSet<&str> = HashSet::new();
    for head in heads {
        let mut current = Some(head);
        while let Some(id) = current {
            if !visited.insert(id) {
                violations.push(Violation::blocker(
                    ViolationType::CycleDetected,
                    format!("Task chain re-enters {}; next links do not terminate", id),
                ));
                break;
            }
            // dangling targets are already reported above; stop the walk there
            current = tasks
                .get(id)
                .and_then(|t| t.next_task.as_deref())
                .filter(|next| tasks.contains_key(*next));
        }
    }

    for id in tasks.keys() {
        if !visited.contains(id.as_str()) {
            violations.push(Violation::blocker(
                ViolationType::OrphanedTask,
                format!("Task {} unreachable from the head", id),
            ));
        }
    }

    violations
}

// =============================================================================
// Count Checks
// =============================================================================

/// Verify `completedTasks` against the arena and against `totalTasks`
pub fn check_counts(state: &FeatureState) -> Vec<Violation> {
    let mut violations = Vec::new();
    let tallied = state.workflow.tasks.completed_tasks;
    let done = state.done_count();

    if tallied != done {
        violations.push(Violation::blocker(
            ViolationType::CountMismatch,
            format!(
                "completedTasks is {} but {} tasks are done",
                tallied, done
            ),
        ));
    }
    if tallied > state.workflow.tasks.total_tasks {
        violations.push(Violation::blocker(
            ViolationType::CountMismatch,
            format!(
                "completedTasks {} exceeds totalTasks {}",
                tallied, state.workflow.tasks.total_tasks
            ),
        ));
    }

    violations
}

// =============================================================================
// Cursor Consistency
// =============================================================================

/// Verify the denormalized cursor against the task it references.
///
/// The cursor is a derived view: its id is none only when every task is
/// done, and otherwise it must reference an existing task whose own status
/// matches. Callable independently, which makes it useful for fuzzing.
pub fn check_cursor(state: &FeatureState) -> Vec<Violation> {
    let mut violations = Vec::new();
    let cursor = &state.current_task;

    match &cursor.id {
        None => {
            if cursor.status != CursorStatus::AllComplete {
                violations.push(Violation::blocker(
                    ViolationType::CursorDesync,
                    format!(
                        "Cursor has no task but status is {} instead of all_complete",
                        cursor.status
                    ),
                ));
            }
            if let Some(task) = state.tasks.values().find(|t| !t.is_done()) {
                violations.push(Violation::blocker(
                    ViolationType::CursorDesync,
                    format!("Cursor is terminal but task {} is not done", task.id),
                ));
            }
        }
        Some(id) => {
            if cursor.status == CursorStatus::AllComplete {
                violations.push(Violation::blocker(
                    ViolationType::CursorDesync,
                    format!("Cursor status is all_complete but still points at {}", id),
                ));
                return violations;
            }
            match state.tasks.get(id) {
                None => {
                    violations.push(Violation::blocker(
                        ViolationType::CursorDesync,
                        format!("Cursor points at nonexistent task {}", id),
                    ));
                }
                Some(task) => {
                    if CursorStatus::from(task.status) != cursor.status {
                        violations.push(Violation::blocker(
                            ViolationType::CursorDesync,
                            format!(
                                "Cursor status {} disagrees with task {} status {}",
                                cursor.status, id, task.status
                            ),
                        ));
                    }
                    if cursor.next_task_id != task.next_task {
                        violations.push(Violation::blocker(
                            ViolationType::CursorDesync,
                            format!(
                                "Cursor nextTaskId disagrees with task {} nextTask",
                                id
                            ),
                        ));
                    }
                }
            }
        }
    }

    violations
}

// =============================================================================
// Aggregate
// =============================================================================

/// Run every check and fold the results into a report.
///
/// The feature is coherent iff no violation carries blocker severity.
pub fn full_check(state: &FeatureState, documents: &WorkflowDocuments) -> CoherenceReport {
    let mut violations = check_documents(documents);
    violations.extend(check_link_integrity(state));
    violations.extend(check_counts(state));
    violations.extend(check_cursor(state));
    CoherenceReport::from_violations(violations)
}
