use std::fmt;
use std::path::PathBuf;

use serde_json::{Map, Value};

/// One story object exactly as the backend returned it.
pub type StoryObject = Map<String, Value>;

/// Which REST endpoint a request goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Generate,
    GenerateFromFiles,
    UploadCsv,
    CheckQuality,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Generate => "/api/generate-user-stories",
            Endpoint::GenerateFromFiles => "/api/generate-user-stories-by-files",
            Endpoint::UploadCsv => "/api/upload-csv",
            Endpoint::CheckQuality => "/api/check-user-stories-quality",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoryRequest {
    Generate {
        vision: String,
        mvp: String,
        model: String,
    },
    GenerateFromFiles {
        vision_file: PathBuf,
        mvp_file: PathBuf,
        model: String,
    },
    UploadCsv {
        file: PathBuf,
    },
    CheckQuality {
        framework: String,
        stories: Vec<StoryObject>,
        model: String,
    },
}

impl StoryRequest {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            StoryRequest::Generate { .. } => Endpoint::Generate,
            StoryRequest::GenerateFromFiles { .. } => Endpoint::GenerateFromFiles,
            StoryRequest::UploadCsv { .. } => Endpoint::UploadCsv,
            StoryRequest::CheckQuality { .. } => Endpoint::CheckQuality,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    RequestCompleted {
        endpoint: Endpoint,
        result: Result<Vec<StoryObject>, ApiError>,
    },
    Channel(ChannelEvent),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Connected,
    Disconnected,
    Error(String),
    /// Raw text frame, unparsed.
    Frame(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    /// Upload source could not be read.
    Io,
    InvalidResponse,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Io => write!(f, "io error"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
        }
    }
}
