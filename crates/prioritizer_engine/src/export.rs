use std::path::{Path, PathBuf};

use serde_json::json;

use crate::persist::{AtomicFileWriter, PersistError};

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub transcript_filename: String,
    pub manifest_filename: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            transcript_filename: "transcript.txt".to_string(),
            manifest_filename: Some("transcript.json".to_string()),
        }
    }
}

/// What the run produced besides the transcript text itself.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub technique: String,
    pub model: String,
    pub result_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub chars: usize,
    pub transcript_path: PathBuf,
    pub manifest_path: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("transcript is empty")]
    Empty,
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// Writes the run transcript (and optionally a small JSON manifest) into `output_dir`.
pub fn export_transcript(
    output_dir: &Path,
    transcript: &str,
    run: &RunSummary,
    options: &ExportOptions,
) -> Result<ExportSummary, ExportError> {
    if transcript.trim().is_empty() {
        return Err(ExportError::Empty);
    }

    let writer = AtomicFileWriter::new(output_dir.to_path_buf());
    let mut body = transcript.trim_end().to_string();
    body.push('\n');
    let transcript_path = writer.write(&options.transcript_filename, &body)?;
    let chars = transcript.chars().count();

    let manifest_path = match &options.manifest_filename {
        Some(name) => {
            let manifest = json!({
                "transcript": options.transcript_filename,
                "chars": chars,
                "technique": run.technique,
                "model": run.model,
                "result_rows": run.result_rows,
            });
            Some(writer.write(name, &manifest.to_string())?)
        }
        None => None,
    };

    Ok(ExportSummary {
        chars,
        transcript_path,
        manifest_path,
    })
}
