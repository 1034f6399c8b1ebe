use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::exam::ExamDocument;
use crate::manifest::Manifest;
use crate::text::{normalize_modules, Rule};

#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("failed to serialize {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileRewrite {
    Missing,
    Unparseable(String),
    Unchanged,
    /// `questions` counts questions with at least one changed field
    Rewritten { questions: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRewriteReport {
    pub file_name: String,
    pub outcome: FileRewrite,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteSummary {
    pub files: Vec<FileRewriteReport>,
    pub rewritten_files: usize,
    pub questions: usize,
    pub dry_run: bool,
}

/// Rewrites one exam file. The file is only written when a question changed
/// and `dry_run` is off; key order and non-ASCII text are kept.
pub fn rewrite_file(
    path: &Path,
    rules: &[Rule],
    dry_run: bool,
) -> Result<FileRewrite, RewriteError> {
    if !path.exists() {
        return Ok(FileRewrite::Missing);
    }

    let exam = match fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| ExamDocument::parse(&content).map_err(|e| e.to_string()))
    {
        Ok(exam) => exam,
        Err(msg) => return Ok(FileRewrite::Unparseable(msg)),
    };

    let mut map = exam.into_map();
    let questions = normalize_modules(&mut map, rules);
    if questions == 0 {
        return Ok(FileRewrite::Unchanged);
    }

    if !dry_run {
        let mut content = serde_json::to_string_pretty(&map).map_err(|source| {
            RewriteError::Serialize {
                path: path.to_path_buf(),
                source,
            }
        })?;
        content.push('\n');
        fs::write(path, content).map_err(|source| RewriteError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "written");
    }

    Ok(FileRewrite::Rewritten { questions })
}

/// Runs the rules over every manifest entry in order. A write failure ends
/// the run; unreadable files are reported and skipped.
pub fn run_rewrite(
    seed_dir: &Path,
    manifest: &Manifest,
    rules: &[Rule],
    dry_run: bool,
    mut on_file: impl FnMut(&FileRewriteReport),
) -> Result<RewriteSummary, RewriteError> {
    let mut summary = RewriteSummary {
        files: Vec::with_capacity(manifest.len()),
        rewritten_files: 0,
        questions: 0,
        dry_run,
    };

    for (file_name, path) in manifest.paths(seed_dir) {
        let outcome = rewrite_file(&path, rules, dry_run)?;

        match &outcome {
            FileRewrite::Missing => warn!(file = file_name, "file not found, skipping"),
            FileRewrite::Unparseable(msg) => warn!(file = file_name, error = %msg, "skipping"),
            FileRewrite::Unchanged => debug!(file = file_name, "nothing to rewrite"),
            FileRewrite::Rewritten { questions } => {
                info!(file = file_name, questions, dry_run, "rewritten");
                summary.rewritten_files += 1;
                summary.questions += questions;
            }
        }

        let report = FileRewriteReport {
            file_name: file_name.to_string(),
            outcome,
        };
        on_file(&report);
        summary.files.push(report);
    }

    Ok(summary)
}
