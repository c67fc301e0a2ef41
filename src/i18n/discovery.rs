//! Language discovery: the supported language list is the set of
//! subdirectories found under the translations root.

use crate::i18n::error::{I18nError, Result};
use std::path::Path;
use tracing::debug;

/// List the names of every direct child of `root` that is a directory.
///
/// Entries are classified with `symlink_metadata`, so symbolic links are
/// never reported even when they point at a directory. Ordering is whatever
/// the filesystem enumeration yields.
///
/// Fails if `root` is missing, unreadable or not a directory, if any entry
/// cannot be inspected, or if an entry name is not valid UTF-8. No partial
/// list is ever returned.
pub async fn discover_languages(root: &Path) -> Result<Vec<String>> {
    let discovery_error = |source: std::io::Error| I18nError::Discovery {
        path: root.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(root).await.map_err(discovery_error)?;
    let mut languages = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(discovery_error)? {
        let path = entry.path();
        let metadata = tokio::fs::symlink_metadata(&path)
            .await
            .map_err(|source| I18nError::Discovery {
                path: path.clone(),
                source,
            })?;

        if !metadata.is_dir() {
            debug!("Skipping non-directory entry {}", path.display());
            continue;
        }

        let name = entry.file_name().into_string().map_err(|raw| I18nError::Discovery {
            path: path.clone(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("language directory name {:?} is not valid UTF-8", raw),
            ),
        })?;

        languages.push(name);
    }

    Ok(languages)
}
