//! Story files on disk: JSON in and out, CSV passed through to the upload endpoint.

use std::fs;
use std::path::{Path, PathBuf};

use prioritizer_core::Row;
use prioritizer_engine::{parse_stories, AtomicFileWriter};
use serde_json::Value;

use super::AppError;

#[derive(Debug, Clone, PartialEq)]
pub enum StoryInput {
    Rows(Vec<Row>),
    /// Needs a round trip through the upload endpoint first.
    Csv(PathBuf),
}

/// Accepts a JSON array of objects, a `{"stories_with_epics": [...]}` body, or a `.csv` path.
pub fn read_story_file(path: &Path) -> Result<StoryInput, AppError> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        return Ok(StoryInput::Csv(path.to_path_buf()));
    }

    let text = fs::read_to_string(path).map_err(|err| stories_error(path, err.to_string()))?;
    let value: Value =
        serde_json::from_str(&text).map_err(|err| stories_error(path, err.to_string()))?;
    let rows = match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(row) => Ok(row),
                _ => Err(stories_error(path, format!("story {index} is not an object"))),
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => parse_stories(&text).map_err(|err| stories_error(path, err.message))?,
    };
    Ok(StoryInput::Rows(rows))
}

/// Writes rows as a pretty JSON array that `read_story_file` accepts back.
pub fn write_story_file(path: &Path, rows: &[Row]) -> Result<PathBuf, AppError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| stories_error(path, "not a file path".to_string()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let json =
        serde_json::to_string_pretty(rows).map_err(|err| stories_error(path, err.to_string()))?;
    Ok(AtomicFileWriter::new(dir).write(file_name, &json)?)
}

fn stories_error(path: &Path, message: String) -> AppError {
    AppError::Stories {
        path: path.to_path_buf(),
        message,
    }
}
