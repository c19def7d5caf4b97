//! State record persistence
//!
//! The persisted record is process-wide shared state keyed by feature, so it
//! is abstracted as an explicit repository capability injected into the
//! state machine rather than touched as ambient global state. The store
//! offers an exclusive-acquisition primitive for the at-most-one-writer
//! guarantee; advisory locks are cooperative, so every writer must go
//! through `acquire`.

use crate::context::{SPECS_DIR, STATE_DIR};
use crate::models::feature::FeatureState;
use crate::state::StateError;
use crate::validator::schema::StateValidator;
use anyhow::{bail, Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Repository capability for persisted state records
pub trait StateStore {
    /// Acquire the feature's exclusive lock; held until the guard drops
    fn acquire(&self, feature_id: &str) -> Result<StateLock>;

    /// True when a state record exists for the feature
    fn exists(&self, feature_id: &str) -> bool;

    /// Load the feature's record, validating it structurally first
    fn load(&self, feature_id: &str) -> Result<FeatureState>;

    /// Persist the record atomically at its recorded path
    fn store(&self, state: &FeatureState) -> Result<()>;

    /// Copy the record to the feature's archive location, returning the path
    fn archive(&self, state: &FeatureState) -> Result<PathBuf>;

    /// Delete the feature's record (and lock file, if any)
    fn remove(&self, feature_id: &str) -> Result<()>;
}

/// Guard for an exclusive feature lock; unlocks on drop
pub struct StateLock {
    file: Option<File>,
}

impl StateLock {
    /// Lock-less guard for stores that do not need real exclusion
    pub fn noop() -> Self {
        Self { file: None }
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            let _ = FileExt::unlock(file);
        }
    }
}

/// File-backed store rooted at a project directory
///
/// Records live at `trackd/state/<stamp>-<feature-id>.json` (the path is
/// also recorded inside the record itself); locks are sibling
/// `<feature-id>.lock` files.
pub struct FileStateStore {
    root: PathBuf,
}

impl FileStateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR)
    }

    fn lock_path(&self, feature_id: &str) -> PathBuf {
        self.state_dir().join(format!("{}.lock", feature_id))
    }

    /// Locate the feature's record file, preferring the newest stamp
    fn find_record(&self, feature_id: &str) -> Result<Option<PathBuf>> {
        let state_dir = self.state_dir();
        if !state_dir.exists() {
            return Ok(None);
        }

        let suffix = format!("-{}.json", feature_id);
        let mut matches: Vec<PathBuf> = Vec::new();
        for entry in std::fs::read_dir(&state_dir)
            .with_context(|| format!("Failed to read state directory: {}", state_dir.display()))?
        {
            let entry = entry?;
            let name = entry.file_name();
            if name.to_string_lossy().ends_with(&suffix) {
                matches.push(entry.path());
            }
        }

        // stamps sort lexically, so the last entry is the newest record
        matches.sort();
        Ok(matches.pop())
    }
}

impl StateStore for FileStateStore {
    fn acquire(&self, feature_id: &str) -> Result<StateLock> {
        let state_dir = self.state_dir();
        std::fs::create_dir_all(&state_dir).with_context(|| {
            format!("Failed to create state directory: {}", state_dir.display())
        })?;

        let lock_path = self.lock_path(feature_id);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("Failed to acquire exclusive lock: {}", lock_path.display()))?;

        Ok(StateLock { file: Some(file) })
    }

    fn exists(&self, feature_id: &str) -> bool {
        matches!(self.find_record(feature_id), Ok(Some(_)))
    }

    fn load(&self, feature_id: &str) -> Result<FeatureState> {
        let Some(path) = self.find_record(feature_id)? else {
            bail!("No state record found for feature '{}'", feature_id);
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read state record: {}", path.display()))?;

        let value: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("State record is not valid JSON: {}", path.display()))?;

        let report = StateValidator::new()?.validate_value(&value);
        if !report.valid {
            return Err(StateError::SchemaViolation(report.errors.join("; ")).into());
        }

        serde_json::from_value(value)
            .with_context(|| format!("Failed to decode state record: {}", path.display()))
    }

    fn store(&self, state: &FeatureState) -> Result<()> {
        let path = self.root.join(&state.state_file.path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create state directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(state)
            .context("Failed to serialize state record")?;

        // Lock before truncating so a racing reader never observes an empty
        // record between truncation and write completion.
        #[allow(clippy::suspicious_open_options)]
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&path)
            .with_context(|| format!("Failed to open state record: {}", path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("Failed to lock state record: {}", path.display()))?;
        file.set_len(0)
            .with_context(|| format!("Failed to truncate state record: {}", path.display()))?;

        let mut writer = std::io::BufWriter::new(&file);
        writer
            .write_all(content.as_bytes())
            .with_context(|| format!("Failed to write state record: {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("Failed to flush state record: {}", path.display()))?;
        drop(writer);

        FileExt::unlock(&file)
            .with_context(|| format!("Failed to unlock state record: {}", path.display()))?;
        Ok(())
    }

    fn archive(&self, state: &FeatureState) -> Result<PathBuf> {
        let Some(record) = self.find_record(&state.feature.id)? else {
            bail!("No state record found for feature '{}'", state.feature.id);
        };

        let archive_dir = self.root.join(SPECS_DIR).join(&state.feature.id);
        std::fs::create_dir_all(&archive_dir).with_context(|| {
            format!("Failed to create archive directory: {}", archive_dir.display())
        })?;

        let archive_path = archive_dir.join("state-archive.json");
        std::fs::copy(&record, &archive_path).with_context(|| {
            format!("Failed to archive state record to {}", archive_path.display())
        })?;

        Ok(archive_path)
    }

    fn remove(&self, feature_id: &str) -> Result<()> {
        let Some(record) = self.find_record(feature_id)? else {
            bail!("No state record found for feature '{}'", feature_id);
        };
        std::fs::remove_file(&record)
            .with_context(|| format!("Failed to remove state record: {}", record.display()))?;

        let lock_path = self.lock_path(feature_id);
        if lock_path.exists() {
            let _ = std::fs::remove_file(&lock_path);
        }
        Ok(())
    }
}
