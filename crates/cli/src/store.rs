// File-backed document store adapter.
//
// The engine treats document text as externally owned; here the owner is
// the filesystem. Each applied splice is written back in a single
// `std::fs::write`, the CLI's version of "one atomic, undoable
// transaction". Document identity is derived from the canonical path so a
// `PendingKey` built by `ai begin` still matches in a later `ai resolve`
// invocation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use uuid::Uuid;

use redline_engine::lifecycle::Splice;

/// Read the current document text.
pub fn load(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Apply a splice outcome: write the new text back, or leave the file
/// untouched on a no-op. Returns whether anything changed.
pub fn apply(path: &Path, splice: &Splice) -> Result<bool> {
    match splice {
        Splice::Applied(new_text) => {
            std::fs::write(path, new_text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            Ok(true)
        }
        Splice::NoOp => Ok(false),
    }
}

/// Stable document identifier: a v5 UUID of the canonical path.
pub fn doc_id(path: &Path) -> Uuid {
    let canonical: PathBuf = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    Uuid::new_v5(&Uuid::NAMESPACE_URL, canonical.to_string_lossy().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use redline_engine::lifecycle::Splice;

    #[test]
    fn apply_writes_only_on_applied_splices() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "before").unwrap();

        assert!(!apply(&path, &Splice::NoOp).unwrap());
        assert_eq!(load(&path).unwrap(), "before");

        assert!(apply(&path, &Splice::Applied("after".to_string())).unwrap());
        assert_eq!(load(&path).unwrap(), "after");
    }

    #[test]
    fn doc_id_is_stable_per_path() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        std::fs::write(&a, "").unwrap();
        std::fs::write(&b, "").unwrap();

        assert_eq!(doc_id(&a), doc_id(&a));
        assert_ne!(doc_id(&a), doc_id(&b));
    }
}
