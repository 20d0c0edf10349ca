//! Prioritizer core: pure state machine for the streamed agent chat and
//! view-model helpers.
mod effect;
mod ingress;
mod msg;
mod role;
mod scheduler;
mod state;
mod table;
mod update;
mod view_model;

pub use effect::{Effect, Notification, RequestKind, RunRequest, Severity, StorySource, Timer};
pub use ingress::{parse_frame, Frame, IncomingMessage, IngressError};
pub use msg::Msg;
pub use role::{AgentRole, TABLE_MARKER};
pub use scheduler::{Animation, ChatEntry, Reveal, RevealScheduler, RoleAccumulator};
pub use state::{AppState, ChannelStatus, RevealSettings};
pub use table::{
    assign_display_keys, cell_text, schema_for, Column, PrioritizationKind, ResultTable, Row,
    StoryRow, COMPLIANCE_COLUMNS, STORY_COLUMNS,
};
pub use update::update;
pub use view_model::{AppViewModel, FinalTableView, RolePanelView, TableView, FINAL_TABLE_TITLE};
