//! Disk persistence for lexical snapshots using bincode serialization.
//!
//! Layout: `[bincode payload][magic "HSL1"][u32 CRC32 BE]`. Writes use an
//! atomic temp-file + rename. Loads fail closed: a missing footer, a checksum
//! mismatch, a decode error or a failed structural check rejects the file.

use crate::config::SNAPSHOT_MAGIC;
use crate::storage::snapshot::LexicalSnapshot;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

fn tmp_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn invalid(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

/// Save a snapshot to `path` with atomic write and a CRC32 footer.
pub fn save_snapshot(snapshot: &LexicalSnapshot, path: &Path) -> io::Result<()> {
    let bytes = bincode::serialize(snapshot).map_err(|e| io::Error::other(e.to_string()))?;
    let crc = crc32fast::hash(&bytes);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut output = Vec::with_capacity(bytes.len() + 8);
    output.extend_from_slice(&bytes);
    output.extend_from_slice(SNAPSHOT_MAGIC);
    output.extend_from_slice(&crc.to_be_bytes());

    let tmp = tmp_path(path);
    fs::write(&tmp, &output)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
    }
    fs::rename(&tmp, path)?;

    tracing::info!(
        "Saved lexical snapshot {:?} ({} documents, {} bytes, CRC32={:#010x})",
        path,
        snapshot.len(),
        bytes.len(),
        crc
    );
    Ok(())
}

/// Load a snapshot from `path`, verifying the footer, the checksum and the
/// structural invariants.
pub fn load_snapshot(path: &Path) -> io::Result<LexicalSnapshot> {
    let raw = fs::read(path)?;

    if raw.len() < 8 || &raw[raw.len() - 8..raw.len() - 4] != SNAPSHOT_MAGIC {
        return Err(invalid(format!(
            "{:?} is not a lexical snapshot (missing HSL1 footer)",
            path
        )));
    }
    let payload = &raw[..raw.len() - 8];
    let stored_crc = u32::from_be_bytes([
        raw[raw.len() - 4],
        raw[raw.len() - 3],
        raw[raw.len() - 2],
        raw[raw.len() - 1],
    ]);
    let computed_crc = crc32fast::hash(payload);
    if computed_crc != stored_crc {
        return Err(invalid(format!(
            "Snapshot CRC32 mismatch: expected {:#010x}, got {:#010x}. File may be corrupted: {:?}",
            stored_crc, computed_crc, path
        )));
    }
    tracing::debug!("Snapshot CRC32 verified: {:#010x}", stored_crc);

    let snapshot: LexicalSnapshot =
        bincode::deserialize(payload).map_err(|e| invalid(e.to_string()))?;

    snapshot
        .validate()
        .map_err(|e| invalid(format!("snapshot validation failed: {}", e)))?;

    tracing::info!(
        "Loaded lexical snapshot {:?} ({} documents, {} terms)",
        path,
        snapshot.len(),
        snapshot.bm25_index.vocabulary_size()
    );
    Ok(snapshot)
}
