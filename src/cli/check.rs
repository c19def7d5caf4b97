use crate::context::ProjectContext;
use crate::state::{FileStateStore, StateMachine};
use crate::Result;
use colored::Colorize;

pub fn run(feature_id: &str, task: Option<String>, json: bool) -> Result<()> {
    let ctx = ProjectContext::current()?;
    let documents = ctx.probe_documents(feature_id);

    let machine = StateMachine::new(FileStateStore::new(ctx.root()));
    let report = machine.check(feature_id, &documents, task.as_deref())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.coherent {
        println!(
            "{}",
            format!("✅ Feature '{}' is coherent", feature_id).green()
        );
        for violation in &report.violations {
            println!("   {}", violation.format());
        }
    } else {
        println!(
            "{}",
            format!(
                "❌ Feature '{}' has {} blocking violation(s)",
                feature_id,
                report.blocker_count()
            )
            .red()
        );
        for violation in &report.violations {
            println!("   {}", violation.format());
        }
    }

    if !report.coherent {
        std::process::exit(1);
    }
    Ok(())
}
