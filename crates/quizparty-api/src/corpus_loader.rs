//! Loads the question corpus from disk at startup.
//!
//! `QUESTIONS_PATH` may name a single corpus document or a directory of
//! them. Each document is `{"categories": [...], "questions": [...]}`. In a
//! directory, unreadable files are skipped with a warning and questions
//! without a `source` are tagged with their file name.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use quizparty_questions::domain::corpus::{CorpusDocument, QuestionCorpus};
use tracing::{info, warn};

use crate::error::AppError;

/// Reads the corpus at `path`. A missing path yields an empty corpus.
///
/// # Errors
///
/// Returns `AppError::Corpus` if a single-file corpus cannot be parsed or the
/// combined questions break corpus invariants, and `AppError::Server` for
/// I/O failures other than a missing path.
pub async fn load_corpus(path: &Path) -> Result<QuestionCorpus, AppError> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "Question corpus not found, starting with no questions");
            return Ok(QuestionCorpus::default());
        }
        Err(e) => return Err(AppError::Server(e)),
    };

    let document = if metadata.is_dir() {
        load_directory(path).await?
    } else {
        read_document(path).await?
    };

    let corpus = QuestionCorpus::from_document(document)
        .map_err(|e| AppError::Corpus(e.to_string()))?;
    info!(
        path = %path.display(),
        questions = corpus.len(),
        categories = corpus.categories().len(),
        "Question corpus loaded"
    );
    Ok(corpus)
}

async fn read_document(path: &Path) -> Result<CorpusDocument, AppError> {
    let raw = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&raw)
        .map_err(|e| AppError::Corpus(format!("{}: {e}", path.display())))
}

async fn load_directory(dir: &Path) -> Result<CorpusDocument, AppError> {
    let mut files: Vec<PathBuf> = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();

    let mut merged = CorpusDocument::default();
    let mut known_categories = HashSet::new();
    for file in files {
        let document = match read_document(&file).await {
            Ok(document) => document,
            Err(e) => {
                warn!(file = %file.display(), error = %e, "Skipping unreadable question file");
                continue;
            }
        };
        let source = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        for category in document.categories {
            if known_categories.insert(category.key.clone()) {
                merged.categories.push(category);
            }
        }
        for mut question in document.questions {
            if question.source.is_none() {
                question.source.clone_from(&source);
            }
            merged.questions.push(question);
        }
    }
    Ok(merged)
}
