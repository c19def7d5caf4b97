//! Tasks document parser
//!
//! Extracts the raw ordered task sequence from a tasks.md checklist. One
//! entry per incomplete checkbox line:
//!
//! ```text
//! - [ ] T001: Set up project scaffolding
//! - [ ] T002 [P] [US1]: Implement login form
//! ```
//!
//! `[P]` marks a task as parallel-eligible; `[USn]` tags it with a user
//! story. Completed lines (`- [x]`) are ignored; the state record, not the
//! document, is the source of truth for progress.

use anyhow::{bail, Context, Result};
use regex::Regex;
use std::path::Path;

/// One decoded task entry, in document order
#[derive(Debug, Clone)]
pub struct RawTask {
    /// Identifier token (three-digit sequence, e.g. "T001")
    pub id: String,
    /// Free-text description
    pub description: String,
    /// "US-n" when a user-story marker is present
    pub user_story: Option<String>,
    /// True when the `[P]` marker is present
    pub parallel: bool,
}

impl RawTask {
    /// Plain entry with no markers (mostly for tests and embedding callers)
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            user_story: None,
            parallel: false,
        }
    }
}

/// Parse all incomplete checklist entries from a tasks document
pub fn parse_task_lines(content: &str) -> Result<Vec<RawTask>> {
    let entry_re = Regex::new(r"^- \[ \] (T\d{3})((?:\s+\[[^\]]+\])*)\s*:\s*(.+)$")?;
    let story_re = Regex::new(r"\[US(\d+)\]")?;

    let mut tasks = Vec::new();
    for line in content.lines() {
        let Some(caps) = entry_re.captures(line.trim_end()) else {
            continue;
        };

        let markers = &caps[2];
        let user_story = story_re
            .captures(markers)
            .map(|m| format!("US-{}", &m[1]));

        tasks.push(RawTask {
            id: caps[1].to_string(),
            description: caps[3].trim().to_string(),
            user_story,
            parallel: markers.contains("[P]"),
        });
    }

    if tasks.is_empty() {
        bail!("No incomplete task entries found in tasks document");
    }

    Ok(tasks)
}

/// Read and parse a tasks document from disk
pub fn parse_tasks_file(path: &Path) -> Result<Vec<RawTask>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tasks document: {}", path.display()))?;
    parse_task_lines(&content)
}
