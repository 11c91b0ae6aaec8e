//! File I/O around the engine: reading a pulse, writing the selection.

use crate::batch::Batch;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Read and validate a batch from a JSON file.
pub fn read_batch(path: &Path) -> Result<Batch> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading batch from {}", path.display()))?;
    Batch::from_json_str(&content).with_context(|| format!("loading batch {}", path.display()))
}

/// Write pretty JSON (plus trailing newline) so that readers never see a partial file.
///
/// The data goes to a temp file in the target directory which is then renamed over
/// `path`. Permissions of an existing target are kept; new files get 0644.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("creating directory {}", dir.display()))?;

    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("out.json");
    let mut tmp = tempfile::Builder::new()
        .prefix(&format!("{file_name}.tmp."))
        .tempfile_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;

    serde_json::to_writer_pretty(&mut tmp, data).context("serializing JSON")?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all().context("flushing temp file")?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(path)
            .map(|m| m.permissions().mode() & 0o777)
            .unwrap_or(0o644);
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(mode))
            .context("setting permissions on temp file")?;
    }

    tmp.persist(path)
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}
