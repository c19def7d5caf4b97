use crate::context::ProjectContext;
use crate::models::CursorStatus;
use crate::state::{FileStateStore, StateMachine};
use crate::Result;
use colored::Colorize;

pub fn run(feature_id: &str, json: bool) -> Result<()> {
    let ctx = ProjectContext::current()?;
    let machine = StateMachine::new(FileStateStore::new(ctx.root()));
    let summary = machine.resume(feature_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "{}",
        format!("Resuming: {} ({})", summary.feature.id, summary.feature.name)
            .cyan()
            .bold()
    );
    println!();
    println!("   Progress: {}", summary.progress.bold());

    if summary.current_task.status == CursorStatus::AllComplete {
        println!("{}", "   ✅ All tasks complete".green());
        return Ok(());
    }

    if let Some(id) = &summary.current_task.id {
        let description = summary.current_task.description.as_deref().unwrap_or("");
        println!(
            "   Current:  {} {} [{}]",
            id.yellow(),
            description,
            summary.current_task.status
        );
        if let Some(phase) = summary.current_task.tdd_phase {
            println!("   TDD:      {}", phase);
        }
        if let Some(story) = &summary.current_task.user_story {
            println!("   Story:    {}", story);
        }
    }

    match &summary.next_task.id {
        Some(next) => {
            let description = summary.next_task.description.as_deref().unwrap_or("");
            println!("   Next:     {} {}", next, description);
        }
        None => println!("   Next:     (last task)"),
    }

    if !summary.coherence.violations.is_empty() {
        println!();
        println!("{}", "   Coherence violations:".red());
        for violation in &summary.coherence.violations {
            println!("   {}", violation.format());
        }
    }

    Ok(())
}
