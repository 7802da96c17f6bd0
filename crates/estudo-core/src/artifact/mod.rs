//! Artifact naming, placement and post-processing.

mod answer_key;
mod category;
mod header;
pub mod path;

pub use answer_key::extract_answer_key;
pub use category::ArtifactCategory;
pub use header::render_artifact;
pub use path::{ArtifactLocation, DEFAULT_MAX_FILENAME_LEN, file_name, resolve, sanitize_title};
