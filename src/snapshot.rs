//! # Snapshot Store
//!
//! Golden files: the first run of a test records its output, every later run
//! compares against the record.
//!
//! One record per test identity lives at `<root>/<sanitized identity>.snap`,
//! holding exactly the content that was passed in. Records are written to a
//! temporary file in the same directory and renamed into place, so readers
//! never observe a partial record. A first write never replaces an existing
//! file: when two writers race, the loser validates against the winner's
//! record instead.
//!
//! Update mode (`VERITY_UPDATE_SNAPSHOTS=1`, or [`SnapshotStore::with_update`])
//! overwrites records unconditionally.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::diff::{diff, ContextLines};
use crate::errors::SnapshotError;
use crate::format::format;
use crate::value::ToValue;

pub const SNAPSHOT_EXTENSION: &str = "snap";

/// Environment variable that switches every store into update mode.
pub const UPDATE_ENV: &str = "VERITY_UPDATE_SNAPSHOTS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotStatus {
    /// No record existed; one was written.
    Created,
    /// The record equals the current content.
    Matched,
    /// Update mode replaced the record.
    Updated,
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
    update: bool,
    context: ContextLines,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(Self::default_root())
    }
}

impl SnapshotStore {
    /// A store rooted at `root`. Update mode follows [`UPDATE_ENV`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            update: update_requested(),
            context: ContextLines::default(),
        }
    }

    /// `$CARGO_MANIFEST_DIR/testdata/snapshots`, or `./testdata/snapshots`
    /// outside of cargo.
    pub fn default_root() -> PathBuf {
        let base = env::var_os("CARGO_MANIFEST_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("testdata").join("snapshots")
    }

    pub fn with_update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }

    /// Context window for mismatch diffs.
    pub fn with_context_lines(mut self, context: ContextLines) -> Self {
        self.context = context;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_update_mode(&self) -> bool {
        self.update
    }

    /// Where the record for `identity` lives.
    pub fn path_for(&self, identity: &str) -> Result<PathBuf, SnapshotError> {
        let name = sanitize_identity(identity).ok_or_else(|| SnapshotError::InvalidIdentity {
            identity: identity.to_string(),
        })?;
        Ok(self
            .root
            .join(format!("{}.{}", name, SNAPSHOT_EXTENSION)))
    }

    /// Creates the record on first use, compares against it afterwards.
    pub fn create_or_validate(
        &self,
        identity: &str,
        content: &str,
    ) -> Result<SnapshotStatus, SnapshotError> {
        let path = self.path_for(identity)?;

        if self.update {
            let temp = self.stage(&path, content)?;
            temp.persist(&path)
                .map_err(|err| SnapshotError::io(&path, err.error))?;
            info!(identity, path = %path.display(), "snapshot updated");
            return Ok(SnapshotStatus::Updated);
        }

        if path.is_file() {
            return self.validate(identity, &path, content);
        }

        let temp = self.stage(&path, content)?;
        match temp.persist_noclobber(&path) {
            Ok(_) => {
                debug!(identity, path = %path.display(), "snapshot created");
                Ok(SnapshotStatus::Created)
            }
            // Another writer created the record first.
            Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
                self.validate(identity, &path, content)
            }
            Err(err) => Err(SnapshotError::io(&path, err.error)),
        }
    }

    /// Formats `value` and runs [`create_or_validate`](Self::create_or_validate)
    /// on the text.
    pub fn create_or_validate_value<T: ToValue + ?Sized>(
        &self,
        identity: &str,
        value: &T,
    ) -> Result<SnapshotStatus, SnapshotError> {
        self.create_or_validate(identity, &format(&value.to_value()))
    }

    /// The stored record, if there is one.
    pub fn read(&self, identity: &str) -> Result<Option<String>, SnapshotError> {
        let path = self.path_for(identity)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(SnapshotError::io(path, err)),
        }
    }

    /// Sanitized identities of every record under the root, sorted. A missing
    /// root holds no records.
    pub fn list(&self) -> Result<Vec<String>, SnapshotError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|err| {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.root.clone());
                SnapshotError::io(path, io::Error::from(err))
            })?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(SNAPSHOT_EXTENSION)
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn validate(
        &self,
        identity: &str,
        path: &Path,
        content: &str,
    ) -> Result<SnapshotStatus, SnapshotError> {
        let stored = fs::read_to_string(path).map_err(|err| SnapshotError::io(path, err))?;
        if stored == content {
            debug!(identity, path = %path.display(), "snapshot matched");
            return Ok(SnapshotStatus::Matched);
        }
        let diff = diff(&stored, content, self.context);
        warn!(
            identity,
            path = %path.display(),
            changes = diff.change_count(),
            "snapshot mismatch"
        );
        Err(SnapshotError::Mismatch {
            identity: identity.to_string(),
            path: path.to_path_buf(),
            diff,
        })
    }

    /// Writes `content` to a temporary file in the record's directory, ready
    /// to be renamed into place.
    fn stage(&self, path: &Path, content: &str) -> Result<NamedTempFile, SnapshotError> {
        let dir = path.parent().unwrap_or(self.root.as_path());
        fs::create_dir_all(dir).map_err(|err| SnapshotError::io(dir, err))?;

        let mut temp = NamedTempFile::new_in(dir).map_err(|err| SnapshotError::io(dir, err))?;
        temp.write_all(content.as_bytes())
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|err| SnapshotError::io(temp.path(), err))?;
        Ok(temp)
    }
}

/// Maps every character outside `[A-Za-z0-9._-]` to `_`. Empty identities
/// cannot name a file.
///
/// ```rust
/// use verity::snapshot::sanitize_identity;
/// assert_eq!(sanitize_identity("tests::parse/nested case").as_deref(), Some("tests__parse_nested_case"));
/// assert_eq!(sanitize_identity(""), None);
/// ```
pub fn sanitize_identity(identity: &str) -> Option<String> {
    if identity.is_empty() {
        return None;
    }
    Some(
        identity
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect(),
    )
}

fn update_requested() -> bool {
    env::var(UPDATE_ENV)
        .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "always"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, SnapshotStore) {
        let dir = TempDir::new().expect("temp dir");
        let store = SnapshotStore::new(dir.path()).with_update(false);
        (dir, store)
    }

    #[test]
    fn sanitizing_keeps_safe_characters() {
        assert_eq!(sanitize_identity("Test_1.case-a").as_deref(), Some("Test_1.case-a"));
        assert_eq!(sanitize_identity("a/b c").as_deref(), Some("a_b_c"));
        assert_eq!(sanitize_identity("é").as_deref(), Some("_"));
    }

    #[test]
    fn empty_identity_is_rejected() {
        let (_dir, store) = store();
        assert!(matches!(
            store.create_or_validate("", "x"),
            Err(SnapshotError::InvalidIdentity { .. })
        ));
    }

    #[test]
    fn first_write_creates_then_matches() {
        let (_dir, store) = store();
        assert_eq!(
            store.create_or_validate("t1", "hello").expect("create"),
            SnapshotStatus::Created
        );
        assert_eq!(store.read("t1").expect("read").as_deref(), Some("hello"));
        assert_eq!(
            store.create_or_validate("t1", "hello").expect("validate"),
            SnapshotStatus::Matched
        );
    }

    #[test]
    fn mismatch_carries_a_diff() {
        let (_dir, store) = store();
        store.create_or_validate("t1", "hello").expect("create");
        let err = store
            .create_or_validate("t1", "goodbye")
            .expect_err("content changed");
        let diff = err.diff().expect("mismatch diff");
        assert_eq!(diff.removed().map(|l| l.text.as_str()).collect::<Vec<_>>(), ["hello"]);
        assert_eq!(diff.added().map(|l| l.text.as_str()).collect::<Vec<_>>(), ["goodbye"]);
        assert_eq!(store.read("t1").expect("read").as_deref(), Some("hello"));
    }

    #[test]
    fn update_mode_overwrites() {
        let (_dir, store) = store();
        store.create_or_validate("t1", "hello").expect("create");
        let updating = store.clone().with_update(true);
        assert_eq!(
            updating.create_or_validate("t1", "goodbye").expect("update"),
            SnapshotStatus::Updated
        );
        assert_eq!(store.read("t1").expect("read").as_deref(), Some("goodbye"));
    }

    #[test]
    fn values_are_formatted_before_storing() {
        let (_dir, store) = store();
        store
            .create_or_validate_value("list", &vec!["a", "b"])
            .expect("create");
        assert_eq!(store.read("list").expect("read").as_deref(), Some("[0] a\n[1] b"));
    }

    #[test]
    fn list_returns_sorted_identities() {
        let (dir, store) = store();
        store.create_or_validate("beta", "2").expect("create");
        store.create_or_validate("alpha", "1").expect("create");
        fs::write(dir.path().join("notes.txt"), "ignored").expect("write");
        assert_eq!(store.list().expect("list"), ["alpha", "beta"]);
    }

    #[test]
    fn missing_root_lists_nothing() {
        let store = SnapshotStore::new("/definitely/not/here/verity").with_update(false);
        assert!(store.list().expect("list").is_empty());
        assert_eq!(store.read("x").expect("read"), None);
    }
}
