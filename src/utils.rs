//! Utility functions for file operations and path manipulation

use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Extension appended to files while they are being written
pub const PARTIAL_EXTENSION: &str = "part";

/// Build the on-disk path of an image
///
/// Returns `None` when `stem` cannot be used as a single file name (empty,
/// `.`/`..`, or containing a path separator); such names would either escape
/// the image directory or never be recognised again by the inventory.
///
/// # Examples
///
/// ```
/// use imagery_dl::utils::asset_path;
/// use std::path::Path;
///
/// let path = asset_path(Path::new("/srv/images"), "YG1 EDP123", "jpg").unwrap();
/// assert_eq!(path, Path::new("/srv/images/YG1 EDP123.jpg"));
/// assert!(asset_path(Path::new("/srv/images"), "../etc/passwd", "jpg").is_none());
/// ```
#[must_use]
pub fn asset_path(dir: &Path, stem: &str, extension: &str) -> Option<PathBuf> {
    if stem.is_empty() || stem == "." || stem == ".." || stem.contains(['/', '\\']) {
        return None;
    }
    Some(dir.join(format!("{}.{}", stem, extension)))
}

/// Path of the temporary file used while `path` is being written
#[must_use]
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(PARTIAL_EXTENSION);
    PathBuf::from(name)
}

/// Strip the final extension from a file name
///
/// # Examples
///
/// ```
/// use imagery_dl::utils::strip_extension;
///
/// assert_eq!(strip_extension("ISC 5602455.jpg"), "ISC 5602455");
/// assert_eq!(strip_extension("GUH-5510-3.000.png"), "GUH-5510-3.000");
/// assert_eq!(strip_extension("README"), "README");
/// ```
#[must_use]
pub fn strip_extension(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

/// Write `bytes` to `path` so that `path` either does not exist or holds the
/// complete content
///
/// Data goes to a sibling `.part` file first, is flushed to disk, then renamed
/// into place. On failure the partial file is removed.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = partial_path(path);

    let result = async {
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, path).await
    }
    .await;

    if result.is_err()
        && let Err(e) = tokio::fs::remove_file(&tmp).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %tmp.display(), error = %e, "failed to remove partial file");
    }

    result
}
