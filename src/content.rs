//! Content store installation
//!
//! The corpus ships as a read-only SQLite asset. On first launch (or when the
//! installed copy is stale or unreadable) it is copied into the writable data
//! directory, verified, and stamped with [`CONTENT_VERSION`].

use anyhow::{anyhow, Context, Result};
use rusqlite::{Connection, OpenFlags};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Bumped whenever the bundled corpus changes shape or content
pub const CONTENT_VERSION: i64 = 1;

const REQUIRED_TABLES: [&str; 3] = ["books", "doors", "hadiths"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    AlreadyInstalled,
    Copied,
}

/// Make sure `target` holds a usable copy of `bundled`.
pub fn install(bundled: &Path, target: &Path) -> Result<InstallOutcome> {
    if is_installed(target) {
        debug!(path = %target.display(), "content store already installed");
        return Ok(InstallOutcome::AlreadyInstalled);
    }

    if !bundled.exists() {
        return Err(anyhow!("Bundled content asset missing at {:?}", bundled));
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory {:?}", parent))?;
    }

    info!(from = %bundled.display(), to = %target.display(), "copying content store");

    let expected_hash = file_sha256(bundled)?;
    let staging = staging_path(target);
    fs::copy(bundled, &staging)
        .with_context(|| format!("Failed to copy content asset to {:?}", staging))?;

    if !verify_file_hash(&staging, &expected_hash)? {
        let _ = fs::remove_file(&staging);
        return Err(anyhow!("Copied content store failed integrity check"));
    }

    {
        let conn = Connection::open(&staging)
            .with_context(|| format!("Failed to open copied content store {:?}", staging))?;
        conn.pragma_update(None, "user_version", CONTENT_VERSION)?;
    }

    fs::rename(&staging, target)
        .with_context(|| format!("Failed to move content store into {:?}", target))?;

    if !is_installed(target) {
        return Err(anyhow!(
            "Installed content store at {:?} is not readable or lacks required tables",
            target
        ));
    }

    Ok(InstallOutcome::Copied)
}

/// Whether `path` holds a readable content store at the current version.
pub fn is_installed(path: &Path) -> bool {
    let usable = fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false);
    if !usable {
        return false;
    }

    match check_store(path) {
        Ok(()) => true,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "installed content store rejected");
            false
        }
    }
}

fn check_store(path: &Path) -> Result<()> {
    let conn = open_read_only(path)?;

    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if version != CONTENT_VERSION {
        return Err(anyhow!(
            "content version {} does not match {}",
            version,
            CONTENT_VERSION
        ));
    }

    for table in REQUIRED_TABLES {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )?;
        if count == 0 {
            return Err(anyhow!("missing table {}", table));
        }
    }

    Ok(())
}

/// Open the installed store without write access.
pub fn open_read_only(path: &Path) -> rusqlite::Result<Connection> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    target.with_file_name(name)
}

fn file_sha256(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path)
        .with_context(|| format!("Failed to open {:?} for hashing", path))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Verify file hash matches expected
pub fn verify_file_hash(path: &Path, expected_hash: &str) -> Result<bool> {
    let expected = expected_hash.strip_prefix("sha256:").unwrap_or(expected_hash);
    Ok(file_sha256(path)? == expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{build_corpus, FixtureOptions};

    #[test]
    fn test_first_install_copies_and_stamps() {
        let dir = tempfile::tempdir().unwrap();
        let bundled = dir.path().join("bundle/riyad.db");
        build_corpus(&bundled, &FixtureOptions::default());
        let target = dir.path().join("data/riyad.db");

        assert!(!is_installed(&target));
        assert_eq!(install(&bundled, &target).unwrap(), InstallOutcome::Copied);
        assert!(is_installed(&target));

        let conn = open_read_only(&target).unwrap();
        let version: i64 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, CONTENT_VERSION);
        assert!(!staging_path(&target).exists());
    }

    #[test]
    fn test_second_install_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let bundled = dir.path().join("bundle.db");
        build_corpus(&bundled, &FixtureOptions::default());
        let target = dir.path().join("riyad.db");

        install(&bundled, &target).unwrap();
        assert_eq!(
            install(&bundled, &target).unwrap(),
            InstallOutcome::AlreadyInstalled
        );
    }

    #[test]
    fn test_version_mismatch_triggers_recopy() {
        let dir = tempfile::tempdir().unwrap();
        let bundled = dir.path().join("bundle.db");
        build_corpus(&bundled, &FixtureOptions::default());
        let target = dir.path().join("riyad.db");
        install(&bundled, &target).unwrap();

        {
            let conn = Connection::open(&target).unwrap();
            conn.pragma_update(None, "user_version", CONTENT_VERSION + 1)
                .unwrap();
        }
        assert!(!is_installed(&target));
        assert_eq!(install(&bundled, &target).unwrap(), InstallOutcome::Copied);
        assert!(is_installed(&target));
    }

    #[test]
    fn test_garbage_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let bundled = dir.path().join("bundle.db");
        build_corpus(&bundled, &FixtureOptions::default());
        let target = dir.path().join("riyad.db");
        fs::write(&target, b"definitely not sqlite").unwrap();

        assert_eq!(install(&bundled, &target).unwrap(), InstallOutcome::Copied);
        assert!(is_installed(&target));
    }

    #[test]
    fn test_missing_bundle_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = install(&dir.path().join("nope.db"), &dir.path().join("riyad.db"));
        assert!(err.is_err());
    }

    #[test]
    fn test_verify_file_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        fs::write(&path, b"hello").unwrap();
        let hash = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
        assert!(verify_file_hash(&path, hash).unwrap());
        assert!(verify_file_hash(&path, &format!("sha256:{}", hash)).unwrap());
        assert!(!verify_file_hash(&path, "00").unwrap());
    }
}
