use crate::effect::{RequestKind, StorySource, Timer};
use crate::table::{PrioritizationKind, Row};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User asked for stories (generated from text/files, or a CSV upload).
    StoriesRequested(StorySource),
    /// Backend answered a story request.
    StoriesLoaded { request: RequestKind, rows: Vec<Row> },
    /// Stories read from a local file; no request involved.
    StoriesImported(Vec<Row>),
    /// User asked for a framework compliance check of the current stories.
    ComplianceRequested { framework: String, model: String },
    /// Backend answered the compliance check.
    ComplianceLoaded(Vec<Row>),
    /// A request-style call failed; no retry.
    RequestFailed { request: RequestKind, message: String },
    /// User submitted a prioritization run.
    PrioritizationSubmitted {
        technique: PrioritizationKind,
        model: String,
        feedback: String,
    },
    ChannelConnected,
    ChannelDisconnected,
    ChannelFailed(String),
    /// One raw frame pushed by the backend.
    FrameReceived(String),
    /// A timer scheduled through `Effect::Schedule` elapsed.
    TimerFired(Timer),
    /// User asked to copy the full transcript.
    TranscriptExportRequested,
    TranscriptExported(Result<(), String>),
    /// Fallback for placeholder wiring.
    NoOp,
}
