//! Turns successive view models into terminal output.
//!
//! The renderer only ever appends: each call returns the text that became
//! visible since the previous call.

use std::collections::HashMap;
use std::fmt::Write as _;

use prioritizer_core::{
    AgentRole, AppViewModel, ChannelStatus, Notification, RolePanelView, Severity, TableView,
};

/// Cells wider than this are cut with an ellipsis.
const MAX_CELL_WIDTH: usize = 48;

#[derive(Debug, Default)]
pub struct TerminalRenderer {
    generation: u64,
    /// Bytes of each role's panel text already written.
    printed: HashMap<AgentRole, usize>,
    speaking: Option<AgentRole>,
    channel: Option<ChannelStatus>,
    stories: Option<TableView>,
    compliance: Option<TableView>,
    final_shown: bool,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, view: &AppViewModel) -> String {
        let mut out = String::new();

        if view.generation != self.generation {
            self.close_line(&mut out);
            self.generation = view.generation;
            self.printed.clear();
            self.speaking = None;
            self.final_shown = false;
        }

        if self.channel != Some(view.channel) {
            if self.channel.is_some() || view.channel != ChannelStatus::Connecting {
                self.close_line(&mut out);
                let _ = writeln!(out, "-- channel {} --", channel_label(view.channel));
            }
            self.channel = Some(view.channel);
        }

        if view.stories.is_some() && view.stories != self.stories {
            if let Some(table) = &view.stories {
                self.close_line(&mut out);
                out.push_str(&table_text(table));
            }
        }
        self.stories = view.stories.clone();

        if view.compliance.is_some() && view.compliance != self.compliance {
            if let Some(table) = &view.compliance {
                self.close_line(&mut out);
                out.push_str(&table_text(table));
            }
        }
        self.compliance = view.compliance.clone();

        for panel in view.panels.iter().chain(view.final_panel.iter()) {
            self.stream_panel(&mut out, panel);
        }
        if !view.errors.is_empty() {
            let errors = RolePanelView {
                role: AgentRole::Error,
                text: view.errors.join("\n"),
                in_progress: false,
            };
            self.stream_panel(&mut out, &errors);
        }

        if let Some(result) = &view.final_table {
            if !self.final_shown {
                self.final_shown = true;
                self.close_line(&mut out);
                let _ = writeln!(out, "\n[{}]", result.kind);
                out.push_str(&table_text(&result.table));
            }
        }

        out
    }

    /// Ends a half-written line, if any.
    pub fn finish(&mut self) -> String {
        let mut out = String::new();
        self.close_line(&mut out);
        out
    }

    fn stream_panel(&mut self, out: &mut String, panel: &RolePanelView) {
        let done = self.printed.get(&panel.role).copied().unwrap_or(0);
        let Some(fresh) = panel.text.get(done..) else {
            return;
        };
        if fresh.is_empty() {
            return;
        }

        if self.speaking.as_ref() == Some(&panel.role) {
            out.push_str(fresh);
        } else {
            self.close_line(out);
            let _ = write!(out, "\n{}: ", role_label(&panel.role));
            out.push_str(fresh.strip_prefix('\n').unwrap_or(fresh));
            self.speaking = Some(panel.role.clone());
        }
        self.printed.insert(panel.role.clone(), panel.text.len());
    }

    fn close_line(&mut self, out: &mut String) {
        if self.speaking.take().is_some() {
            out.push('\n');
        }
    }
}

pub fn role_label(role: &AgentRole) -> &str {
    match role {
        AgentRole::ProductOwner => "Product Owner",
        AgentRole::QualityAssurance => "QA",
        AgentRole::Developer => "Developer",
        AgentRole::FinalPrioritization => "Final Prioritization",
        AgentRole::Error => "Error",
        AgentRole::Other(tag) => tag,
    }
}

fn channel_label(status: ChannelStatus) -> &'static str {
    match status {
        ChannelStatus::Connecting => "connecting",
        ChannelStatus::Connected => "connected",
        ChannelStatus::Disconnected => "disconnected",
    }
}

/// Plain-text table with a title line and aligned columns.
pub fn table_text(table: &TableView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", table.title);
    if table.columns.is_empty() {
        out.push_str("(no columns for this result)\n");
        return out;
    }

    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| clip(cell)).collect())
        .collect();
    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, title)| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(title.chars().count().min(MAX_CELL_WIDTH)))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = table.columns.iter().map(|title| clip(title)).collect();
    push_row(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, &rule, &widths);
    for row in &cells {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, width)| {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    let _ = writeln!(out, "{}", line.join(" | ").trim_end());
}

fn clip(text: &str) -> String {
    let flat = text.replace(['\n', '\r'], " ");
    if flat.chars().count() <= MAX_CELL_WIDTH {
        return flat;
    }
    let mut clipped: String = flat.chars().take(MAX_CELL_WIDTH - 1).collect();
    clipped.push('…');
    clipped
}

/// Where a notification goes and how it reads.
pub fn notification_line(note: &Notification) -> (bool, String) {
    let to_stderr = note.blocking || matches!(note.severity, Severity::Warning | Severity::Error);
    let prefix = match note.severity {
        Severity::Success => "ok",
        Severity::Info => "info",
        Severity::Warning => "warning",
        Severity::Error => "error",
    };
    (to_stderr, format!("[{prefix}] {}", note.text))
}
