use crate::role::AgentRole;
use crate::state::{AppState, ChannelStatus};
use crate::table::{cell_text, Column, Row, COMPLIANCE_COLUMNS, STORY_COLUMNS};

pub const FINAL_TABLE_TITLE: &str = "Final Prioritized Stories";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub generation: u64,
    pub channel: ChannelStatus,
    pub loading: bool,
    pub animating: bool,
    pub pending_messages: usize,
    /// Narrative panels in first-seen order, excluding the final and error roles.
    pub panels: Vec<RolePanelView>,
    pub final_panel: Option<RolePanelView>,
    pub errors: Vec<String>,
    pub stories: Option<TableView>,
    pub compliance: Option<TableView>,
    /// Present only once the presentation gate is open.
    pub final_table: Option<FinalTableView>,
    pub transcript_len: usize,
    pub dropped_frames: usize,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePanelView {
    pub role: AgentRole,
    /// Entries joined with newlines, the way the chat box shows them.
    pub text: String,
    pub in_progress: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableView {
    pub title: String,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl TableView {
    pub fn build<'a>(
        title: impl Into<String>,
        schema: &[Column],
        rows: impl IntoIterator<Item = &'a Row>,
    ) -> Self {
        let rows = if schema.is_empty() {
            Vec::new()
        } else {
            rows.into_iter()
                .enumerate()
                .map(|(position, row)| {
                    schema
                        .iter()
                        .map(|column| cell_text(row, position, column.field))
                        .collect()
                })
                .collect()
        };
        Self {
            title: title.into(),
            columns: schema.iter().map(|column| column.title).collect(),
            rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalTableView {
    pub kind: String,
    pub table: TableView,
}

impl AppViewModel {
    pub(crate) fn from_state(state: &AppState) -> Self {
        let scheduler = state.scheduler();
        let mut panels = Vec::new();
        let mut final_panel = None;
        let mut errors = Vec::new();

        for acc in scheduler.accumulators() {
            match acc.role {
                AgentRole::Error => {
                    errors.extend(acc.entries.iter().map(|e| e.text.clone()));
                }
                _ => {
                    let panel = RolePanelView {
                        role: acc.role.clone(),
                        text: acc.texts().join("\n"),
                        in_progress: acc.entries.iter().any(|e| !e.completed),
                    };
                    if acc.role.is_terminal_narrative() {
                        final_panel = Some(panel);
                    } else {
                        panels.push(panel);
                    }
                }
            }
        }

        let final_table = if state.result_visible() {
            state.result().map(|result| FinalTableView {
                kind: result.kind.clone(),
                table: TableView::build(FINAL_TABLE_TITLE, result.schema(), &result.rows),
            })
        } else {
            None
        };

        let stories = (!state.stories().is_empty()).then(|| {
            TableView::build(
                "User Stories",
                STORY_COLUMNS,
                state.stories().iter().map(|s| &s.fields),
            )
        });
        let compliance = (!state.compliance().is_empty()).then(|| {
            TableView::build(
                "Framework Compliance",
                COMPLIANCE_COLUMNS,
                state.compliance().iter().map(|s| &s.fields),
            )
        });

        Self {
            generation: state.generation(),
            channel: state.channel(),
            loading: state.is_loading(),
            animating: scheduler.is_animating(),
            pending_messages: scheduler.pending_len(),
            panels,
            final_panel,
            errors,
            stories,
            compliance,
            final_table,
            transcript_len: state.transcript().len(),
            dropped_frames: state.dropped_frames(),
            dirty: state.is_dirty(),
        }
    }
}
