use crate::context::ProjectContext;
use crate::models::{CursorStatus, WorkflowPhase};
use crate::state::{FileStateStore, StateMachine, StateStore};
use crate::Result;
use colored::Colorize;

pub fn run(feature_id: &str, json: bool) -> Result<()> {
    let ctx = ProjectContext::current()?;
    let store = FileStateStore::new(ctx.root());

    if !store.exists(feature_id) {
        if json {
            println!(
                "{}",
                serde_json::json!({"error": "state_not_found", "featureId": feature_id})
            );
        } else {
            println!(
                "{}",
                format!("No state record for feature '{}'", feature_id).red()
            );
        }
        return Ok(());
    }

    let machine = StateMachine::new(store);
    let summary = machine.resume(feature_id)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "featureId": summary.feature.id,
                "progress": summary.progress,
                "currentTask": summary.current_task.id,
                "status": summary.current_task.status,
            })
        );
        return Ok(());
    }

    println!(
        "{}",
        format!("Status for: {}", feature_id).cyan().bold()
    );
    println!();

    let status = summary.current_task.status;
    let status_icon = match status {
        CursorStatus::Pending => "⏳",
        CursorStatus::InProgress => "🔨",
        CursorStatus::Red => "🔴",
        CursorStatus::Green => "🟢",
        CursorStatus::Refactor => "♻️",
        CursorStatus::Done => "✔",
        CursorStatus::AllComplete => "✅",
    };
    let status_colored = match status {
        CursorStatus::Pending => status.to_string().yellow(),
        CursorStatus::InProgress => status.to_string().blue(),
        CursorStatus::Red => status.to_string().red(),
        CursorStatus::Green | CursorStatus::Done | CursorStatus::AllComplete => {
            status.to_string().green()
        }
        CursorStatus::Refactor => status.to_string().cyan(),
    };

    println!("   Progress: {}", summary.progress.bold());
    println!("   Status:   {} {}", status_icon, status_colored);

    if let Some(id) = &summary.current_task.id {
        println!(
            "   Task:     {} {}",
            id.yellow(),
            summary.current_task.description.as_deref().unwrap_or("")
        );
    }

    let phase = match status {
        CursorStatus::AllComplete => WorkflowPhase::Qa,
        _ => summary
            .current_task
            .user_story
            .as_deref()
            .map(WorkflowPhase::for_story)
            .unwrap_or(WorkflowPhase::Foundation),
    };
    println!("   Phase:    {}", phase);

    let coherent = summary
        .coherence
        .violations
        .iter()
        .all(|v| v.severity != crate::models::Severity::Blocker);
    if coherent {
        println!("   Coherent: {}", "yes".green());
    } else {
        println!("   Coherent: {}", "no (run 'trackd check')".red());
    }

    Ok(())
}
