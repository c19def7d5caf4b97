use crate::context::ProjectContext;
use crate::state::{FileStateStore, StateMachine};
use crate::Result;
use colored::Colorize;

pub fn run(feature_id: &str, archive: bool, json: bool) -> Result<()> {
    let ctx = ProjectContext::current()?;
    let machine = StateMachine::new(FileStateStore::new(ctx.root()));
    let outcome = machine.cleanup(feature_id, archive)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "success": true,
                "archived": outcome.archived_to.is_some(),
                "feature": outcome.feature_id,
            })
        );
        return Ok(());
    }

    if let Some(path) = &outcome.archived_to {
        println!("📦 State archived to: {}", path.display());
    }
    println!(
        "{}",
        format!("🧹 Removed state record for '{}'", outcome.feature_id).green()
    );

    Ok(())
}
