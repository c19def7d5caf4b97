//! State machine transitions
//!
//! Creation and advancement of a feature's state record. Every transition
//! here is a pure in-memory transformation over a `FeatureState` value;
//! persistence is bracketed by [`StateMachine`], which pairs the pure
//! functions with a [`StateStore`] so each operation is load → mutate →
//! store under an exclusive acquisition, with no partial write visible to
//! a racing reader.

use crate::context::STATE_DIR;
use crate::models::feature::{
    CoherenceSummary, CurrentTask, CursorStatus, FeatureInfo, FeatureState, StateFileInfo,
    TicketRef, WorkflowDocuments, STATE_VERSION,
};
use crate::models::task::{TaskStatus, TddPhase};
use crate::models::violation::{CoherenceReport, Violation, ViolationType};
use crate::parser::RawTask;
use crate::state::list::TaskList;
use crate::state::store::StateStore;
use crate::state::StateError;
use crate::validator::coherence;
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;

/// Caller-supplied feature metadata; everything defaults to the feature id
#[derive(Debug, Clone, Default)]
pub struct TicketInfo {
    pub name: Option<String>,
    pub system: Option<String>,
    pub id: Option<String>,
    pub url: Option<String>,
}

/// Create a fresh state record from parsed task input.
///
/// The cursor starts on the head task with status pending; aggregate totals
/// are seeded from the input length. Fails with `EmptyTaskList` before any
/// record is produced.
pub fn initialize(
    feature_id: &str,
    ticket: &TicketInfo,
    raw_tasks: &[RawTask],
    mut documents: WorkflowDocuments,
) -> Result<FeatureState, StateError> {
    if raw_tasks.is_empty() {
        return Err(StateError::EmptyTaskList);
    }

    let list = TaskList::build(raw_tasks)?;
    let Some(head) = list.head() else {
        return Err(StateError::EmptyTaskList);
    };
    let current_task = CurrentTask::at_task(head);

    let now = Utc::now();
    let stamp = now.format("%Y-%m-%d-%H%M%S");

    documents.tasks.exists = true;
    documents.tasks.total_tasks = list.len() as u32;
    documents.tasks.completed_tasks = 0;

    Ok(FeatureState {
        version: STATE_VERSION.to_string(),
        feature: FeatureInfo {
            id: feature_id.to_string(),
            name: ticket.name.clone().unwrap_or_else(|| feature_id.to_string()),
            branch: feature_id.to_string(),
            ticket: TicketRef {
                system: ticket.system.clone().unwrap_or_else(|| "none".to_string()),
                id: ticket.id.clone().unwrap_or_else(|| feature_id.to_string()),
                url: ticket.url.clone().unwrap_or_default(),
            },
        },
        state_file: StateFileInfo {
            path: format!("{}/{}-{}.json", STATE_DIR, stamp, feature_id),
            created_at: now,
            last_updated: now,
        },
        current_task,
        workflow: documents,
        coherence: CoherenceSummary {
            spec_plan_alignment: true,
            plan_tasks_alignment: true,
            plan_implementation_alignment: true,
            violations: Vec::new(),
            last_check: now,
        },
        tasks: list.into_tasks(),
    })
}

/// Record a task status transition and keep the cursor in sync.
///
/// On `done` the task is stamped, the completed tally moves up by one, and
/// the cursor advances to the successor (or to the terminal all-complete
/// marker at the tail). On any other status the cursor stays put and
/// mirrors the task's new status and TDD phase. Fails before mutating on
/// an unknown task, a task already done, or a feature already complete.
pub fn advance(
    state: &mut FeatureState,
    task_id: &str,
    new_status: TaskStatus,
    tdd_phase: Option<TddPhase>,
) -> Result<(), StateError> {
    if state.is_complete() {
        return Err(StateError::AlreadyComplete);
    }

    let now = Utc::now();

    let successor = {
        let task = state
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| StateError::UnknownTask(task_id.to_string()))?;

        // done is terminal per task; any further transition is misuse
        if task.status == TaskStatus::Done {
            return Err(StateError::AlreadyDone(task_id.to_string()));
        }

        task.status = new_status;
        if let Some(phase) = tdd_phase {
            task.tdd_phase = Some(phase);
        }
        if new_status == TaskStatus::Done {
            task.completed_at = Some(now);
        }
        task.next_task.clone()
    };

    if new_status == TaskStatus::Done {
        state.workflow.tasks.completed_tasks += 1;

        match successor {
            Some(next_id) => {
                let next = state
                    .tasks
                    .get(&next_id)
                    .ok_or_else(|| StateError::UnknownTask(next_id.clone()))?;
                state.current_task = CurrentTask::at_task(next);
            }
            None => {
                state.current_task = CurrentTask::all_complete();
            }
        }
    } else {
        state.current_task.status = CursorStatus::from(new_status);
        if let Some(phase) = tdd_phase {
            state.current_task.tdd_phase = Some(phase);
        }
    }

    state.state_file.last_updated = now;
    state.coherence.last_check = now;
    Ok(())
}

/// Read-only resumption summary for an interrupted feature
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSummary {
    pub feature: FeatureInfo,
    pub progress: String,
    pub current_task: TaskSummary,
    pub next_task: NextTaskSummary,
    pub coherence: CoherenceSummary,
}

/// The cursor task as presented to a resuming caller
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub id: Option<String>,
    pub description: Option<String>,
    pub status: CursorStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tdd_phase: Option<TddPhase>,
    pub user_story: Option<String>,
}

/// The task after the cursor, if any
#[derive(Debug, Clone, Serialize)]
pub struct NextTaskSummary {
    pub id: Option<String>,
    pub description: Option<String>,
}

/// Project a state record into its resumption summary; never mutates
pub fn resume(state: &FeatureState) -> ResumeSummary {
    let current = state
        .current_task
        .id
        .as_deref()
        .and_then(|id| state.tasks.get(id));
    let next = state
        .current_task
        .next_task_id
        .as_deref()
        .and_then(|id| state.tasks.get(id));

    ResumeSummary {
        feature: state.feature.clone(),
        progress: state.progress(),
        current_task: TaskSummary {
            id: state.current_task.id.clone(),
            description: current.map(|t| t.description.clone()),
            status: state.current_task.status,
            tdd_phase: state.current_task.tdd_phase,
            user_story: current.map(|t| t.user_story.clone()),
        },
        next_task: NextTaskSummary {
            id: state.current_task.next_task_id.clone(),
            description: next.map(|t| t.description.clone()),
        },
        coherence: state.coherence.clone(),
    }
}

/// Result of disposing of a feature's state record
#[derive(Debug, Clone)]
pub struct CleanupOutcome {
    pub feature_id: String,
    pub archived_to: Option<PathBuf>,
}

/// Transactional wrapper: pure transitions bracketed by a state store
///
/// Every mutating operation acquires the feature's exclusive lock, loads,
/// applies the in-memory transition, and stores. A failed transition leaves
/// the persisted record untouched.
pub struct StateMachine<S: StateStore> {
    store: S,
}

impl<S: StateStore> StateMachine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create and persist a fresh state record for a feature
    pub fn initialize(
        &self,
        feature_id: &str,
        ticket: &TicketInfo,
        raw_tasks: &[RawTask],
        documents: WorkflowDocuments,
    ) -> anyhow::Result<FeatureState> {
        let _lock = self.store.acquire(feature_id)?;
        let state = initialize(feature_id, ticket, raw_tasks, documents)?;
        self.store.store(&state)?;
        Ok(state)
    }

    /// Apply one task status transition to the persisted record
    pub fn advance(
        &self,
        feature_id: &str,
        task_id: &str,
        new_status: TaskStatus,
        tdd_phase: Option<TddPhase>,
    ) -> anyhow::Result<FeatureState> {
        let _lock = self.store.acquire(feature_id)?;
        let mut state = self.store.load(feature_id)?;
        advance(&mut state, task_id, new_status, tdd_phase)?;
        self.store.store(&state)?;
        Ok(state)
    }

    /// Load the record and project its resumption summary
    pub fn resume(&self, feature_id: &str) -> anyhow::Result<ResumeSummary> {
        let state = self.store.load(feature_id)?;
        Ok(resume(&state))
    }

    /// Run a coherence check and annotate the record with the result.
    ///
    /// Document checks run even when no record exists; the structural checks
    /// need one. Checks only annotate the coherence summary, never task data.
    pub fn check(
        &self,
        feature_id: &str,
        documents: &WorkflowDocuments,
        task: Option<&str>,
    ) -> anyhow::Result<CoherenceReport> {
        let mut violations = coherence::check_documents(documents);

        if !self.store.exists(feature_id) {
            if task.is_some() {
                violations.push(Violation::blocker(
                    ViolationType::MissingState,
                    "State file missing",
                ));
            }
            return Ok(CoherenceReport::from_violations(violations));
        }

        let _lock = self.store.acquire(feature_id)?;
        let mut state = self.store.load(feature_id)?;

        violations.extend(coherence::check_link_integrity(&state));
        violations.extend(coherence::check_counts(&state));
        violations.extend(coherence::check_cursor(&state));
        if let Some(task_id) = task {
            violations.extend(coherence::check_task_reference(&state, task_id));
        }

        let report = CoherenceReport::from_violations(violations);

        state.coherence.spec_plan_alignment = documents.spec.exists && documents.plan.exists;
        state.coherence.plan_tasks_alignment = documents.plan.exists && documents.tasks.exists;
        state.coherence.violations = report.violations.clone();
        state.coherence.last_check = report.checked_at;
        self.store.store(&state)?;

        Ok(report)
    }

    /// Dispose of a feature's state record, optionally archiving it first
    pub fn cleanup(&self, feature_id: &str, archive: bool) -> anyhow::Result<CleanupOutcome> {
        let _lock = self.store.acquire(feature_id)?;
        let state = self.store.load(feature_id)?;

        let archived_to = if archive {
            Some(self.store.archive(&state)?)
        } else {
            None
        };
        self.store.remove(feature_id)?;

        Ok(CleanupOutcome {
            feature_id: state.feature.id,
            archived_to,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::feature::{DocumentRef, TasksDocument, WorkflowPhase};

    fn documents() -> WorkflowDocuments {
        WorkflowDocuments {
            spec: DocumentRef {
                path: "trackd/specs/demo/spec.md".to_string(),
                exists: true,
            },
            plan: DocumentRef {
                path: "trackd/specs/demo/plan.md".to_string(),
                exists: true,
            },
            tasks: TasksDocument {
                path: "trackd/specs/demo/tasks.md".to_string(),
                exists: true,
                total_tasks: 0,
                completed_tasks: 0,
            },
        }
    }

    fn two_task_state() -> FeatureState {
        let raw = vec![
            RawTask::new("T001", "Setup"),
            RawTask::new("T002", "Build"),
        ];
        initialize("demo", &TicketInfo::default(), &raw, documents()).unwrap()
    }

    #[test]
    fn test_initialize_positions_cursor_on_head() {
        let state = two_task_state();

        assert_eq!(state.version, "1.0.0");
        assert_eq!(state.current_task.id.as_deref(), Some("T001"));
        assert_eq!(state.current_task.status, CursorStatus::Pending);
        assert_eq!(state.current_task.phase, WorkflowPhase::Foundation);
        assert_eq!(state.current_task.next_task_id.as_deref(), Some("T002"));
        assert_eq!(state.workflow.tasks.total_tasks, 2);
        assert_eq!(state.workflow.tasks.completed_tasks, 0);
    }

    #[test]
    fn test_initialize_empty_rejected() {
        let result = initialize("demo", &TicketInfo::default(), &[], documents());
        assert!(matches!(result, Err(StateError::EmptyTaskList)));
    }

    #[test]
    fn test_initialize_derives_phase_from_head_story() {
        let mut raw = vec![RawTask::new("T001", "Login form")];
        raw[0].user_story = Some("US-1".to_string());

        let state = initialize("demo", &TicketInfo::default(), &raw, documents()).unwrap();
        assert_eq!(state.current_task.phase, WorkflowPhase::UserStory);
    }

    #[test]
    fn test_advance_done_moves_cursor_to_successor() {
        let mut state = two_task_state();

        advance(&mut state, "T001", TaskStatus::Done, None).unwrap();

        assert_eq!(state.current_task.id.as_deref(), Some("T002"));
        assert_eq!(state.current_task.status, CursorStatus::Pending);
        assert!(state.current_task.next_task_id.is_none());
        assert_eq!(state.workflow.tasks.completed_tasks, 1);
        assert!(state.tasks["T001"].completed_at.is_some());
    }

    #[test]
    fn test_advance_last_task_reaches_terminal_state() {
        let mut state = two_task_state();

        advance(&mut state, "T001", TaskStatus::Done, None).unwrap();
        advance(&mut state, "T002", TaskStatus::Done, None).unwrap();

        assert!(state.current_task.id.is_none());
        assert_eq!(state.current_task.status, CursorStatus::AllComplete);
        assert_eq!(state.current_task.phase, WorkflowPhase::Qa);
        assert!(state.current_task.next_task_id.is_none());
        assert_eq!(state.workflow.tasks.completed_tasks, 2);
    }

    #[test]
    fn test_advance_after_terminal_rejected() {
        let mut state = two_task_state();
        advance(&mut state, "T001", TaskStatus::Done, None).unwrap();
        advance(&mut state, "T002", TaskStatus::Done, None).unwrap();

        let result = advance(&mut state, "T002", TaskStatus::Done, None);
        assert!(matches!(result, Err(StateError::AlreadyComplete)));
    }

    #[test]
    fn test_advance_done_twice_rejected_without_side_effects() {
        let mut state = two_task_state();
        advance(&mut state, "T001", TaskStatus::Done, None).unwrap();

        let result = advance(&mut state, "T001", TaskStatus::Done, None);
        assert!(matches!(result, Err(StateError::AlreadyDone(_))));
        assert_eq!(state.workflow.tasks.completed_tasks, 1);
        assert_eq!(state.current_task.id.as_deref(), Some("T002"));
    }

    #[test]
    fn test_advance_unknown_task_rejected() {
        let mut state = two_task_state();
        let result = advance(&mut state, "T999", TaskStatus::InProgress, None);
        assert!(matches!(result, Err(StateError::UnknownTask(_))));
    }

    #[test]
    fn test_advance_non_done_mirrors_cursor_without_moving() {
        let mut state = two_task_state();

        advance(&mut state, "T001", TaskStatus::InProgress, None).unwrap();
        assert_eq!(state.current_task.id.as_deref(), Some("T001"));
        assert_eq!(state.current_task.status, CursorStatus::InProgress);
        assert_eq!(state.workflow.tasks.completed_tasks, 0);

        advance(&mut state, "T001", TaskStatus::Red, Some(TddPhase::Red)).unwrap();
        assert_eq!(state.current_task.status, CursorStatus::Red);
        assert_eq!(state.current_task.tdd_phase, Some(TddPhase::Red));
        assert_eq!(state.tasks["T001"].tdd_phase, Some(TddPhase::Red));
    }

    #[test]
    fn test_advance_non_done_is_idempotent() {
        let mut state = two_task_state();

        advance(&mut state, "T001", TaskStatus::InProgress, None).unwrap();
        let before = state.clone();
        advance(&mut state, "T001", TaskStatus::InProgress, None).unwrap();

        assert_eq!(
            state.current_task.status,
            before.current_task.status
        );
        assert_eq!(state.current_task.id, before.current_task.id);
        assert_eq!(
            state.workflow.tasks.completed_tasks,
            before.workflow.tasks.completed_tasks
        );
        // only the timestamps refresh
        assert!(state.state_file.last_updated >= before.state_file.last_updated);
    }

    #[test]
    fn test_cursor_empty_iff_all_done() {
        let mut state = two_task_state();
        assert!(state.current_task.id.is_some());

        advance(&mut state, "T001", TaskStatus::Done, None).unwrap();
        assert!(state.current_task.id.is_some());
        assert!(state.done_count() < state.workflow.tasks.total_tasks);

        advance(&mut state, "T002", TaskStatus::Done, None).unwrap();
        assert!(state.current_task.id.is_none());
        assert_eq!(state.done_count(), state.workflow.tasks.total_tasks);
    }

    #[test]
    fn test_resume_projects_current_and_next() {
        let mut state = two_task_state();
        advance(&mut state, "T001", TaskStatus::InProgress, Some(TddPhase::Green)).unwrap();

        let summary = resume(&state);
        assert_eq!(summary.progress, "0/2");
        assert_eq!(summary.current_task.id.as_deref(), Some("T001"));
        assert_eq!(summary.current_task.description.as_deref(), Some("Setup"));
        assert_eq!(summary.current_task.status, CursorStatus::InProgress);
        assert_eq!(summary.current_task.tdd_phase, Some(TddPhase::Green));
        assert_eq!(summary.next_task.id.as_deref(), Some("T002"));
        assert_eq!(summary.next_task.description.as_deref(), Some("Build"));
    }

    #[test]
    fn test_resume_on_terminal_state() {
        let mut state = two_task_state();
        advance(&mut state, "T001", TaskStatus::Done, None).unwrap();
        advance(&mut state, "T002", TaskStatus::Done, None).unwrap();

        let summary = resume(&state);
        assert_eq!(summary.progress, "2/2");
        assert!(summary.current_task.id.is_none());
        assert_eq!(summary.current_task.status, CursorStatus::AllComplete);
        assert!(summary.next_task.id.is_none());
    }

    #[test]
    fn test_ticket_defaults() {
        let state = two_task_state();
        assert_eq!(state.feature.ticket.system, "none");
        assert_eq!(state.feature.ticket.id, "demo");
        assert_eq!(state.feature.ticket.url, "");
        assert_eq!(state.feature.branch, "demo");
    }
}
