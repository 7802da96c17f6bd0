use super::category::ArtifactCategory;
use chrono::{DateTime, Utc};

/// Prepends the cosmetic title/category/date header to artifact content.
pub fn render_artifact(
    title: &str,
    category: ArtifactCategory,
    content: &str,
    now: DateTime<Utc>,
) -> String {
    format!(
        "# {}\n\n**Categoria:** {}\n**Data:** {}\n\n---\n\n{}\n",
        title.trim(),
        category.label(),
        now.format("%Y-%m-%d %H:%M"),
        content.trim_end()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_header_precedes_content() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap();
        let rendered = render_artifact("Filas", ArtifactCategory::Lesson, "Corpo\n\n", now);
        assert_eq!(
            rendered,
            "# Filas\n\n**Categoria:** Aula\n**Data:** 2024-06-01 09:30\n\n---\n\nCorpo\n"
        );
    }
}
