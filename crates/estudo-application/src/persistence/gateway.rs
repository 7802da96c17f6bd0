//! Persistence gateway for finished artifacts.

use estudo_core::artifact::{
    self, ArtifactCategory, ArtifactLocation, DEFAULT_MAX_FILENAME_LEN, render_artifact,
};
use estudo_core::generation::ArtifactWriter;
use serde::Serialize;

/// Outcome of a save, shaped for display.
///
/// Failures are reported here rather than raised; the in-memory artifact is
/// untouched so the caller can retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<ArtifactLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveResult {
    fn saved(file_name: String, location: ArtifactLocation) -> Self {
        Self {
            success: true,
            file_name: Some(file_name),
            location: Some(location),
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            file_name: None,
            location: None,
            error: Some(error.into()),
        }
    }
}

/// Writes finished artifacts next to their source note.
#[derive(Debug, Clone)]
pub struct PersistenceGateway {
    max_filename_len: usize,
}

impl PersistenceGateway {
    pub fn new(max_filename_len: usize) -> Self {
        Self { max_filename_len }
    }

    pub fn max_filename_len(&self) -> usize {
        self.max_filename_len
    }

    /// Resolves the destination for `note_id`/`category`, prepends the
    /// artifact header and writes `content` through `writer`.
    ///
    /// A missing writer (no directory selected) and write failures both come
    /// back as `success: false`.
    pub async fn save(
        &self,
        writer: Option<&dyn ArtifactWriter>,
        note_id: &str,
        category: ArtifactCategory,
        title: &str,
        content: &str,
    ) -> SaveResult {
        let Some(writer) = writer else {
            tracing::warn!(
                "[PersistenceGateway] No directory available, cannot save '{}'",
                title
            );
            return SaveResult::failed("No directory selected for saving artifacts");
        };

        let now = chrono::Utc::now();
        let location = artifact::resolve(note_id, category);
        let file_name = artifact::file_name(title, category, self.max_filename_len, now);
        let document = render_artifact(title, category, content, now);

        match writer
            .write_file(
                &location.parent_segments,
                &location.folder_name,
                &file_name,
                &document,
            )
            .await
        {
            Ok(()) => {
                tracing::info!(
                    "[PersistenceGateway] Saved {} '{}' to {}/{}/{}",
                    category,
                    title,
                    location.parent_segments.join("/"),
                    location.folder_name,
                    file_name
                );
                SaveResult::saved(file_name, location)
            }
            Err(e) => {
                tracing::error!(
                    "[PersistenceGateway] Failed to save {} '{}': {}",
                    category,
                    title,
                    e
                );
                SaveResult::failed(e.to_string())
            }
        }
    }
}

impl Default for PersistenceGateway {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILENAME_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use estudo_core::error::{EstudoError, Result};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingWriter {
        writes: Mutex<Vec<(Vec<String>, String, String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl ArtifactWriter for RecordingWriter {
        async fn write_file(
            &self,
            parent_segments: &[String],
            folder_name: &str,
            file_name: &str,
            content: &str,
        ) -> Result<()> {
            if self.fail {
                return Err(EstudoError::io("permission denied"));
            }
            self.writes.lock().unwrap().push((
                parent_segments.to_vec(),
                folder_name.to_string(),
                file_name.to_string(),
                content.to_string(),
            ));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_save_resolves_path_and_prepends_header() {
        let writer = RecordingWriter::default();
        let gateway = PersistenceGateway::default();

        let result = gateway
            .save(
                Some(&writer as &dyn ArtifactWriter),
                "Root/Topic/definicoes/doc.md",
                ArtifactCategory::Lesson,
                "Design de Cache Distribuído!",
                "corpo da aula",
            )
            .await;

        assert!(result.success);
        assert_eq!(
            result.file_name.as_deref(),
            Some("Design_de_Cache_Distribuido.md")
        );
        let writes = writer.writes.lock().unwrap();
        let (parents, folder, file, content) = &writes[0];
        assert_eq!(parents, &vec!["Topic".to_string()]);
        assert_eq!(folder, "aulas");
        assert_eq!(file, "Design_de_Cache_Distribuido.md");
        assert!(content.starts_with("# Design de Cache Distribuído!\n"));
        assert!(content.contains("corpo da aula"));
    }

    #[tokio::test]
    async fn test_missing_writer_reports_failure() {
        let gateway = PersistenceGateway::default();
        let result = gateway
            .save(None, "Root/doc.md", ArtifactCategory::Lesson, "X", "y")
            .await;
        assert!(!result.success);
        assert!(result.file_name.is_none());
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_write_failure_reports_failure() {
        let writer = RecordingWriter {
            fail: true,
            ..RecordingWriter::default()
        };
        let result = PersistenceGateway::default()
            .save(
                Some(&writer as &dyn ArtifactWriter),
                "Root/doc.md",
                ArtifactCategory::ExerciseSolution,
                "Lista",
                "resolução",
            )
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("permission denied"));
    }
}
