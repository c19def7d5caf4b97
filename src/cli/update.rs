use crate::context::ProjectContext;
use crate::models::{TaskStatus, TddPhase};
use crate::state::{FileStateStore, StateMachine};
use crate::Result;
use colored::Colorize;

pub fn run(
    feature_id: &str,
    task_id: &str,
    status: &str,
    tdd_phase: Option<String>,
    json: bool,
) -> Result<()> {
    let new_status: TaskStatus = status.parse().map_err(anyhow::Error::msg)?;
    let tdd_phase = tdd_phase
        .as_deref()
        .map(str::parse::<TddPhase>)
        .transpose()
        .map_err(anyhow::Error::msg)?;

    let ctx = ProjectContext::current()?;
    let machine = StateMachine::new(FileStateStore::new(ctx.root()));
    let state = machine.advance(feature_id, task_id, new_status, tdd_phase)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "success": true,
                "taskId": task_id,
                "status": new_status,
                "nextTask": state.current_task.id,
                "completedTasks": state.workflow.tasks.completed_tasks,
                "totalTasks": state.workflow.tasks.total_tasks,
            })
        );
        return Ok(());
    }

    let status_colored = match new_status {
        TaskStatus::Done => new_status.to_string().green(),
        TaskStatus::Red => new_status.to_string().red(),
        TaskStatus::Green => new_status.to_string().green(),
        _ => new_status.to_string().yellow(),
    };
    println!("✓ {} → {}", task_id.bold(), status_colored);
    println!("   Progress: {}", state.progress());

    if state.is_complete() {
        println!("{}", "🎉 All tasks complete; feature is ready for QA".green());
    } else if new_status == TaskStatus::Done {
        if let Some(next) = &state.current_task.id {
            let description = state
                .tasks
                .get(next)
                .map(|t| t.description.as_str())
                .unwrap_or_default();
            println!("   Next:     {} {}", next.yellow(), description);
        }
    }

    Ok(())
}
