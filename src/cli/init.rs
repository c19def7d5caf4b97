use crate::context::ProjectContext;
use crate::parser;
use crate::state::{FileStateStore, StateMachine, TicketInfo};
use crate::Result;
use anyhow::bail;
use colored::Colorize;
use std::path::PathBuf;

pub fn run(
    feature_id: &str,
    name: Option<String>,
    ticket_system: Option<String>,
    ticket_id: Option<String>,
    ticket_url: Option<String>,
    tasks_override: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let ctx = ProjectContext::current()?;
    let mut documents = ctx.probe_documents(feature_id);

    let tasks_path = match tasks_override {
        Some(path) => {
            documents.tasks.path = path.display().to_string();
            path
        }
        None => ctx.tasks_path(feature_id),
    };
    if !tasks_path.exists() {
        bail!("Tasks document not found: {}", tasks_path.display());
    }

    let raw_tasks = parser::parse_tasks_file(&tasks_path)?;
    let ticket = TicketInfo {
        name,
        system: ticket_system,
        id: ticket_id,
        url: ticket_url,
    };

    let machine = StateMachine::new(FileStateStore::new(ctx.root()));
    let state = machine.initialize(feature_id, &ticket, &raw_tasks, documents)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "success": true,
                "stateFile": state.state_file.path,
                "totalTasks": state.workflow.tasks.total_tasks,
                "firstTask": state.current_task.id,
            })
        );
    } else {
        println!(
            "{}",
            format!("🚀 Initialized state for '{}'", feature_id).cyan()
        );
        println!("   State file: {}", state.state_file.path);
        println!("   Tasks:      {}", state.workflow.tasks.total_tasks);
        if let Some(first) = &state.current_task.id {
            println!("   First task: {}", first.yellow());
        }
        if !state.workflow.spec.exists || !state.workflow.plan.exists {
            println!(
                "{}",
                "   ⚠ Supporting documents are missing; run 'trackd check'".yellow()
            );
        }
    }

    Ok(())
}
