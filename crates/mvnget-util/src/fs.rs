use std::path::Path;

/// Ensure a directory exists, creating it and any parents if needed.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Delete a file if it exists.
///
/// Failures are logged and swallowed: a file that vanished or is locked by
/// another thread is not worth aborting a run for.
pub fn delete_file(path: &Path) {
    if !path.is_file() {
        return;
    }
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("Couldn't delete {} because it doesn't exist", path.display());
        }
        Err(e) => {
            tracing::debug!("Skipping error when deleting {}: {e}", path.display());
        }
    }
}

/// Sorted file names (not directories) directly inside `dir`.
pub fn list_file_names(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    Ok(names)
}
