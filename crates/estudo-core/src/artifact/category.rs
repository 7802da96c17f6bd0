use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of persisted artifact. Decides the destination folder and whether
/// several files may exist per note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactCategory {
    Lesson,
    ExerciseSolution,
    InterviewSummary,
    ProjectSpec,
    CustomChallenge,
}

impl ArtifactCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactCategory::Lesson => "lesson",
            ArtifactCategory::ExerciseSolution => "exercise-solution",
            ArtifactCategory::InterviewSummary => "interview-summary",
            ArtifactCategory::ProjectSpec => "project-spec",
            ArtifactCategory::CustomChallenge => "custom-challenge",
        }
    }

    /// Folder created next to the note's containing folder.
    pub fn folder_name(&self) -> &'static str {
        match self {
            ArtifactCategory::Lesson => "aulas",
            ArtifactCategory::ExerciseSolution => "exercicios",
            ArtifactCategory::InterviewSummary | ArtifactCategory::CustomChallenge => "desafios",
            ArtifactCategory::ProjectSpec => "projetos",
        }
    }

    /// Whether each save produces a new file (timestamp suffix) rather than
    /// one file per title.
    pub fn allows_multiple(&self) -> bool {
        matches!(
            self,
            ArtifactCategory::ExerciseSolution
                | ArtifactCategory::InterviewSummary
                | ArtifactCategory::CustomChallenge
        )
    }

    /// Label written into the artifact header.
    pub fn label(&self) -> &'static str {
        match self {
            ArtifactCategory::Lesson => "Aula",
            ArtifactCategory::ExerciseSolution => "Resolução de Exercícios",
            ArtifactCategory::InterviewSummary => "Revisão de Desafio",
            ArtifactCategory::ProjectSpec => "Especificação de Projeto",
            ArtifactCategory::CustomChallenge => "Desafio Personalizado",
        }
    }
}

impl fmt::Display for ArtifactCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
