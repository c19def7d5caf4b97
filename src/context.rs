//! Project context and path conventions
//!
//! All paths the tool manages hang off a single project root:
//! `trackd/specs/<feature-id>/` for the supporting documents and
//! `trackd/state/` for persisted state records. Paths are recorded relative
//! to the root so records stay valid when the project moves.

use crate::models::feature::{DocumentRef, TasksDocument, WorkflowDocuments};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Top-level directory managed by the tool
pub const TRACKD_DIR: &str = "trackd";
/// Where persisted state records live, relative to the project root
pub const STATE_DIR: &str = "trackd/state";
/// Where per-feature documents live, relative to the project root
pub const SPECS_DIR: &str = "trackd/specs";

/// A resolved project root plus path helpers
pub struct ProjectContext {
    root: PathBuf,
}

impl ProjectContext {
    /// Context rooted at the current working directory
    pub fn current() -> Result<Self> {
        let root = std::env::current_dir().context("Failed to resolve current directory")?;
        Ok(Self { root })
    }

    /// Context rooted at an explicit directory (tests, embedding callers)
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The feature's document directory
    pub fn feature_dir(&self, feature_id: &str) -> PathBuf {
        self.root.join(SPECS_DIR).join(feature_id)
    }

    pub fn spec_rel(&self, feature_id: &str) -> String {
        format!("{}/{}/spec.md", SPECS_DIR, feature_id)
    }

    pub fn plan_rel(&self, feature_id: &str) -> String {
        format!("{}/{}/plan.md", SPECS_DIR, feature_id)
    }

    pub fn tasks_rel(&self, feature_id: &str) -> String {
        format!("{}/{}/tasks.md", SPECS_DIR, feature_id)
    }

    /// Absolute path to the feature's tasks document
    pub fn tasks_path(&self, feature_id: &str) -> PathBuf {
        self.root.join(self.tasks_rel(feature_id))
    }

    /// Probe the three supporting documents for existence.
    ///
    /// Aggregate totals are zeroed; `initialize` fills them from the parsed
    /// task sequence.
    pub fn probe_documents(&self, feature_id: &str) -> WorkflowDocuments {
        let spec_rel = self.spec_rel(feature_id);
        let plan_rel = self.plan_rel(feature_id);
        let tasks_rel = self.tasks_rel(feature_id);

        WorkflowDocuments {
            spec: DocumentRef {
                exists: self.root.join(&spec_rel).exists(),
                path: spec_rel,
            },
            plan: DocumentRef {
                exists: self.root.join(&plan_rel).exists(),
                path: plan_rel,
            },
            tasks: TasksDocument {
                exists: self.root.join(&tasks_rel).exists(),
                path: tasks_rel,
                total_tasks: 0,
                completed_tasks: 0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_relative_paths_follow_convention() {
        let ctx = ProjectContext::at("/project");
        assert_eq!(ctx.spec_rel("auth"), "trackd/specs/auth/spec.md");
        assert_eq!(ctx.plan_rel("auth"), "trackd/specs/auth/plan.md");
        assert_eq!(ctx.tasks_rel("auth"), "trackd/specs/auth/tasks.md");
    }

    #[test]
    fn test_probe_reflects_filesystem() {
        let temp = TempDir::new().unwrap();
        let ctx = ProjectContext::at(temp.path());

        let feature_dir = ctx.feature_dir("auth");
        std::fs::create_dir_all(&feature_dir).unwrap();
        std::fs::write(feature_dir.join("spec.md"), "# Spec").unwrap();
        std::fs::write(feature_dir.join("tasks.md"), "- [ ] T001: Setup").unwrap();

        let documents = ctx.probe_documents("auth");
        assert!(documents.spec.exists);
        assert!(!documents.plan.exists);
        assert!(documents.tasks.exists);
        assert_eq!(documents.tasks.total_tasks, 0);
    }
}
