//! Filesystem-backed note vault.
//!
//! Note ids are slash-separated paths whose first segment names the vault
//! root itself (`"Notas/Sistemas/cache.md"` lives at `<root>/Sistemas/cache.md`).
//! Artifacts are written below the same root.

use async_trait::async_trait;
use estudo_core::error::{EstudoError, Result};
use estudo_core::generation::{ArtifactWriter, NoteReader};
use std::path::{Component, Path, PathBuf};

/// A note tree on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSystemVault {
    root: PathBuf,
}

impl FileSystemVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a note id to its file under the root.
    fn note_path(&self, note_id: &str) -> Result<PathBuf> {
        let mut segments = note_id.split('/').filter(|s| !s.is_empty());
        // The leading segment is the root's own name.
        segments.next();

        let mut path = self.root.clone();
        let mut pushed = false;
        for segment in segments {
            path.push(checked_segment(segment)?);
            pushed = true;
        }
        if !pushed {
            return Err(EstudoError::not_found("Note", note_id));
        }
        Ok(path)
    }
}

/// Rejects segments that would escape the vault.
fn checked_segment(segment: &str) -> Result<&str> {
    let mut components = Path::new(segment).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(segment),
        _ => Err(EstudoError::io(format!(
            "Invalid path segment '{}'",
            segment
        ))),
    }
}

#[async_trait]
impl NoteReader for FileSystemVault {
    async fn read_note_bytes(&self, note_id: &str) -> Result<Vec<u8>> {
        let path = self.note_path(note_id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(EstudoError::not_found("Note", note_id))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ArtifactWriter for FileSystemVault {
    async fn write_file(
        &self,
        parent_segments: &[String],
        folder_name: &str,
        file_name: &str,
        content: &str,
    ) -> Result<()> {
        let mut dir = self.root.clone();
        for segment in parent_segments {
            dir.push(checked_segment(segment)?);
        }
        dir.push(checked_segment(folder_name)?);

        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(checked_segment(file_name)?);
        tokio::fs::write(&path, content).await?;

        tracing::debug!("[FileSystemVault] Wrote {}", path.display());
        Ok(())
    }
}
