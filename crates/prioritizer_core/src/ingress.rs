//! Stream ingress: turns raw channel frames into queueable messages or a
//! terminal result table.
//!
//! Shape checks happen here so nothing half-formed reaches the scheduler.

use serde_json::Value;
use thiserror::Error;

use crate::role::{AgentRole, TABLE_MARKER};
use crate::table::{ResultTable, Row};

/// One text fragment from a named agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub role: AgentRole,
    pub text: String,
}

impl IncomingMessage {
    pub fn new(role: AgentRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    /// Blank fragments are dropped before they reach the queue.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Text(IncomingMessage),
    Table(ResultTable),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngressError {
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("frame is not a JSON object")]
    NotAnObject,
    #[error("frame has no string `agentType`")]
    MissingRole,
    #[error("frame from `{role}` has a non-string `message`")]
    TextNotString { role: String },
    #[error("table frame `message` is not an array")]
    RowsNotArray,
    #[error("table frame row {index} is not an object")]
    RowNotObject { index: usize },
    #[error("table frame has no string `prioritization_type`")]
    MissingKind,
}

/// Parse one raw frame as received on the channel.
pub fn parse_frame(raw: &str) -> Result<Frame, IngressError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|err| IngressError::InvalidJson(err.to_string()))?;
    let object = value.as_object().ok_or(IngressError::NotAnObject)?;
    let tag = object
        .get("agentType")
        .and_then(Value::as_str)
        .ok_or(IngressError::MissingRole)?;

    if tag == TABLE_MARKER {
        return parse_table(object).map(Frame::Table);
    }

    match object.get("message") {
        Some(Value::String(text)) => Ok(Frame::Text(IncomingMessage::new(
            AgentRole::from_tag(tag),
            text.as_str(),
        ))),
        _ => Err(IngressError::TextNotString {
            role: tag.to_string(),
        }),
    }
}

fn parse_table(object: &serde_json::Map<String, Value>) -> Result<ResultTable, IngressError> {
    let items = object
        .get("message")
        .and_then(Value::as_array)
        .ok_or(IngressError::RowsNotArray)?;
    let rows = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_object()
                .cloned()
                .ok_or(IngressError::RowNotObject { index })
        })
        .collect::<Result<Vec<Row>, _>>()?;
    let kind = object
        .get("prioritization_type")
        .and_then(Value::as_str)
        .ok_or(IngressError::MissingKind)?;

    Ok(ResultTable {
        rows,
        kind: kind.to_string(),
    })
}
