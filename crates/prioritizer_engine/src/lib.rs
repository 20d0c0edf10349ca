//! Prioritizer engine: REST calls, the chat socket and file export.
mod api;
mod channel;
mod engine;
mod export;
mod persist;
mod types;

pub use api::{parse_stories, ApiSettings, ReqwestStoryApi, StoryApi};
pub use channel::{run_channel, ws_url, ChannelError, ChannelSettings, EventSink};
pub use engine::{EngineError, EngineHandle, EngineSettings};
pub use export::{export_transcript, ExportError, ExportOptions, ExportSummary, RunSummary};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use types::{
    ApiError, ChannelEvent, Endpoint, EngineEvent, FailureKind, StoryObject, StoryRequest,
};
