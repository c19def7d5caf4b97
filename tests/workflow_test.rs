//! End-to-end workflow tests
//!
//! Drives a feature through its full lifecycle against a real project root:
//! init from a tasks document, advance through every task, resume midway,
//! coherence-check, and clean up.

use std::path::Path;
use tempfile::TempDir;

use trackd::context::ProjectContext;
use trackd::models::{CursorStatus, TaskStatus, TddPhase};
use trackd::parser;
use trackd::state::{FileStateStore, StateMachine, StateStore, TicketInfo};
use trackd::validator;

const TASKS_MD: &str = "\
# Tasks: User Authentication

## Foundation

- [ ] T001: Set up project scaffolding
- [ ] T002 [P]: Create database migrations

## User Story 1

- [ ] T003 [US1]: Implement login form
- [ ] T004 [P] [US1]: Implement session storage

## Polish

- [ ] T005 [US2]: Add logout flow
";

fn setup_project(root: &Path) -> ProjectContext {
    let ctx = ProjectContext::at(root);
    let feature_dir = ctx.feature_dir("user-auth");
    std::fs::create_dir_all(&feature_dir).unwrap();
    std::fs::write(feature_dir.join("spec.md"), "# Spec\n").unwrap();
    std::fs::write(feature_dir.join("plan.md"), "# Plan\n").unwrap();
    std::fs::write(feature_dir.join("tasks.md"), TASKS_MD).unwrap();
    ctx
}

fn machine(ctx: &ProjectContext) -> StateMachine<FileStateStore> {
    StateMachine::new(FileStateStore::new(ctx.root()))
}

fn init_feature(ctx: &ProjectContext) -> trackd::FeatureState {
    let raw = parser::parse_tasks_file(&ctx.tasks_path("user-auth")).unwrap();
    let ticket = TicketInfo {
        name: Some("User Authentication".to_string()),
        ..TicketInfo::default()
    };
    machine(ctx)
        .initialize("user-auth", &ticket, &raw, ctx.probe_documents("user-auth"))
        .unwrap()
}

#[test]
fn test_init_builds_linked_state_from_document() {
    let temp = TempDir::new().unwrap();
    let ctx = setup_project(temp.path());

    let state = init_feature(&ctx);

    assert_eq!(state.workflow.tasks.total_tasks, 5);
    assert_eq!(state.current_task.id.as_deref(), Some("T001"));
    assert_eq!(state.tasks["T002"].previous_task.as_deref(), Some("T001"));
    assert_eq!(state.tasks["T003"].user_story, "US-1");
    assert!(state.tasks["T004"].parallel);
    assert!(state.tasks["T005"].next_task.is_none());

    // the record landed on disk and loads back
    let store = FileStateStore::new(ctx.root());
    assert!(store.exists("user-auth"));
    let loaded = store.load("user-auth").unwrap();
    assert_eq!(loaded.feature.name, "User Authentication");
}

#[test]
fn test_advance_through_full_lifecycle() {
    let temp = TempDir::new().unwrap();
    let ctx = setup_project(temp.path());
    init_feature(&ctx);
    let machine = machine(&ctx);

    // first task runs through TDD phases before completing
    machine
        .advance("user-auth", "T001", TaskStatus::InProgress, None)
        .unwrap();
    machine
        .advance("user-auth", "T001", TaskStatus::Red, Some(TddPhase::Red))
        .unwrap();
    machine
        .advance("user-auth", "T001", TaskStatus::Green, Some(TddPhase::Green))
        .unwrap();
    let state = machine
        .advance("user-auth", "T001", TaskStatus::Done, None)
        .unwrap();
    assert_eq!(state.current_task.id.as_deref(), Some("T002"));
    assert_eq!(state.workflow.tasks.completed_tasks, 1);

    for task_id in ["T002", "T003", "T004", "T005"] {
        machine
            .advance("user-auth", task_id, TaskStatus::Done, None)
            .unwrap();
    }

    let store = FileStateStore::new(ctx.root());
    let final_state = store.load("user-auth").unwrap();
    assert!(final_state.current_task.id.is_none());
    assert_eq!(final_state.current_task.status, CursorStatus::AllComplete);
    assert_eq!(final_state.workflow.tasks.completed_tasks, 5);
    assert!(final_state.tasks.values().all(|t| t.completed_at.is_some()));

    // the terminal state refuses further transitions
    let err = machine.advance("user-auth", "T005", TaskStatus::Done, None);
    assert!(err.is_err());
}

#[test]
fn test_resume_after_interruption() {
    let temp = TempDir::new().unwrap();
    let ctx = setup_project(temp.path());
    init_feature(&ctx);

    {
        let machine = machine(&ctx);
        machine
            .advance("user-auth", "T001", TaskStatus::Done, None)
            .unwrap();
        machine
            .advance("user-auth", "T002", TaskStatus::InProgress, None)
            .unwrap();
    }

    // a fresh session picks up exactly where the last one stopped
    let summary = machine(&ctx).resume("user-auth").unwrap();
    assert_eq!(summary.progress, "1/5");
    assert_eq!(summary.current_task.id.as_deref(), Some("T002"));
    assert_eq!(summary.current_task.status, CursorStatus::InProgress);
    assert_eq!(summary.next_task.id.as_deref(), Some("T003"));
    assert_eq!(
        summary.next_task.description.as_deref(),
        Some("Implement login form")
    );
}

#[test]
fn test_check_reports_missing_documents() {
    let temp = TempDir::new().unwrap();
    let ctx = setup_project(temp.path());
    init_feature(&ctx);

    std::fs::remove_file(ctx.feature_dir("user-auth").join("plan.md")).unwrap();

    let documents = ctx.probe_documents("user-auth");
    let report = machine(&ctx)
        .check("user-auth", &documents, None)
        .unwrap();

    assert!(!report.coherent);
    assert!(report
        .violations
        .iter()
        .any(|v| v.description.contains("Plan")));

    // the annotation is persisted on the record
    let state = FileStateStore::new(ctx.root()).load("user-auth").unwrap();
    assert!(!state.coherence.spec_plan_alignment);
    assert!(!state.coherence.violations.is_empty());
}

#[test]
fn test_check_unknown_task_reference() {
    let temp = TempDir::new().unwrap();
    let ctx = setup_project(temp.path());
    init_feature(&ctx);

    let documents = ctx.probe_documents("user-auth");
    let report = machine(&ctx)
        .check("user-auth", &documents, Some("T999"))
        .unwrap();

    assert!(!report.coherent);
    assert!(report
        .violations
        .iter()
        .any(|v| v.description.contains("T999")));
}

#[test]
fn test_check_without_state_record() {
    let temp = TempDir::new().unwrap();
    let ctx = setup_project(temp.path());
    // no init: document checks still run, per-task checks report missing state

    let documents = ctx.probe_documents("user-auth");
    let report = machine(&ctx)
        .check("user-auth", &documents, Some("T001"))
        .unwrap();

    assert!(!report.coherent);
    assert!(report
        .violations
        .iter()
        .any(|v| v.description.contains("State file missing")));
}

#[test]
fn test_round_trip_preserves_link_integrity() {
    let temp = TempDir::new().unwrap();
    let ctx = setup_project(temp.path());
    let state = init_feature(&ctx);

    let documents = ctx.probe_documents("user-auth");
    assert!(validator::full_check(&state, &documents).coherent);

    let reloaded = FileStateStore::new(ctx.root()).load("user-auth").unwrap();
    assert!(validator::check_link_integrity(&reloaded).is_empty());
    assert!(validator::full_check(&reloaded, &documents).coherent);
}

#[test]
fn test_cleanup_with_archive() {
    let temp = TempDir::new().unwrap();
    let ctx = setup_project(temp.path());
    init_feature(&ctx);
    let machine = machine(&ctx);

    for task_id in ["T001", "T002", "T003", "T004", "T005"] {
        machine
            .advance("user-auth", task_id, TaskStatus::Done, None)
            .unwrap();
    }

    let outcome = machine.cleanup("user-auth", true).unwrap();
    assert_eq!(outcome.feature_id, "user-auth");

    let archive_path = outcome.archived_to.unwrap();
    assert!(archive_path.exists());
    assert!(archive_path.starts_with(ctx.feature_dir("user-auth")));
    assert!(!FileStateStore::new(ctx.root()).exists("user-auth"));
}

#[test]
fn test_cleanup_without_archive_discards() {
    let temp = TempDir::new().unwrap();
    let ctx = setup_project(temp.path());
    init_feature(&ctx);

    let outcome = machine(&ctx).cleanup("user-auth", false).unwrap();
    assert!(outcome.archived_to.is_none());
    assert!(!FileStateStore::new(ctx.root()).exists("user-auth"));
}
