use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::role::AgentRole;
use crate::table::Row;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    RequestStories(StorySource),
    CheckCompliance {
        framework: String,
        stories: Vec<Row>,
        model: String,
    },
    SendRunRequest(RunRequest),
    Schedule { after: Duration, timer: Timer },
    /// Drop every pending timer; a new run has started.
    CancelTimers,
    ScrollToLatest { role: Option<AgentRole> },
    ExportTranscript(String),
    Notify(Notification),
}

/// Timers carry the run generation they were scheduled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timer {
    Reveal { generation: u64 },
    Settle { generation: u64 },
    Scroll { generation: u64 },
}

impl Timer {
    pub fn generation(self) -> u64 {
        match self {
            Timer::Reveal { generation }
            | Timer::Settle { generation }
            | Timer::Scroll { generation } => generation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorySource {
    Text {
        vision: String,
        mvp: String,
        model: String,
    },
    Files {
        vision_file: PathBuf,
        mvp_file: PathBuf,
        model: String,
    },
    Csv {
        file: PathBuf,
    },
}

impl StorySource {
    pub fn kind(&self) -> RequestKind {
        match self {
            StorySource::Text { .. } => RequestKind::Generate,
            StorySource::Files { .. } => RequestKind::GenerateFromFiles,
            StorySource::Csv { .. } => RequestKind::UploadCsv,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Generate,
    GenerateFromFiles,
    UploadCsv,
    Compliance,
}

impl RequestKind {
    pub fn success_text(self) -> &'static str {
        match self {
            RequestKind::Generate | RequestKind::GenerateFromFiles => "User stories generated",
            RequestKind::UploadCsv => "File uploaded successfully",
            RequestKind::Compliance => "Framework user stories generated",
        }
    }

    pub fn failure_text(self) -> &'static str {
        match self {
            RequestKind::UploadCsv => "Error uploading file",
            _ => "Internal Server Error",
        }
    }
}

/// Sent once over the channel at the start of every run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRequest {
    pub stories: Vec<Row>,
    pub model: String,
    pub prioritization_type: String,
    pub feedback: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub text: String,
    /// Must be acknowledged by the user rather than shown in passing.
    pub blocking: bool,
}

impl Notification {
    pub fn success(text: impl Into<String>) -> Self {
        Self::new(Severity::Success, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(Severity::Info, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(Severity::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Severity::Error, text)
    }

    pub fn blocking(mut self) -> Self {
        self.blocking = true;
        self
    }

    fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            severity,
            text: text.into(),
            blocking: false,
        }
    }
}
