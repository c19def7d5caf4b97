use crate::validator::StateValidator;
use crate::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

pub fn run(state_file: &Path, schema: Option<PathBuf>, json: bool) -> Result<()> {
    let content = std::fs::read_to_string(state_file)
        .with_context(|| format!("Failed to read state record: {}", state_file.display()))?;

    let validator = match schema {
        Some(path) => StateValidator::from_schema_file(&path)?,
        None => StateValidator::new()?,
    };
    let report = validator.validate_str(&content)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.valid {
        println!("{}", "✅ State record is valid".green());
    } else {
        println!(
            "{}",
            format!("❌ State record is invalid ({} error(s))", report.errors.len()).red()
        );
        for error in &report.errors {
            println!("   {}", error);
        }
    }

    if !report.valid {
        std::process::exit(1);
    }
    Ok(())
}
