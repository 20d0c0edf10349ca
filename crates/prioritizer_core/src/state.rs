use std::time::Duration;

use crate::ingress::IncomingMessage;
use crate::scheduler::RevealScheduler;
use crate::table::{ResultTable, StoryRow};
use crate::view_model::AppViewModel;

/// Pacing of the typing animation and the post-run delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealSettings {
    pub tick: Duration,
    pub batch_chars: usize,
    pub settle_delay: Duration,
    pub scroll_delay: Duration,
}

impl Default for RevealSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(10),
            batch_chars: 6,
            settle_delay: Duration::from_millis(1000),
            scroll_delay: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelStatus {
    #[default]
    Connecting,
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    settings: RevealSettings,
    generation: u64,
    scheduler: RevealScheduler,
    result: Option<ResultTable>,
    pending_settles: u32,
    transcript: String,
    stories: Vec<StoryRow>,
    compliance: Vec<StoryRow>,
    channel: ChannelStatus,
    loading: bool,
    dropped_frames: usize,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: RevealSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel::from_state(self)
    }

    pub fn settings(&self) -> &RevealSettings {
        &self.settings
    }

    /// Current run generation; 0 before the first run.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn scheduler(&self) -> &RevealScheduler {
        &self.scheduler
    }

    pub fn result(&self) -> Option<&ResultTable> {
        self.result.as_ref()
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn stories(&self) -> &[StoryRow] {
        &self.stories
    }

    pub fn compliance(&self) -> &[StoryRow] {
        &self.compliance
    }

    pub fn channel(&self) -> ChannelStatus {
        self.channel
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn dropped_frames(&self) -> usize {
        self.dropped_frames
    }

    /// True while a terminal-narrative settle delay has not yet elapsed.
    pub fn is_settling(&self) -> bool {
        self.pending_settles > 0
    }

    /// All narrative output has finished rendering.
    pub fn is_fully_drained(&self) -> bool {
        self.scheduler.is_drained() && !self.is_settling()
    }

    /// Presentation gate for the final table.
    pub fn result_visible(&self) -> bool {
        self.is_fully_drained()
            && self
                .result
                .as_ref()
                .is_some_and(|table| !table.rows.is_empty())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns whether anything changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn scheduler_mut(&mut self) -> &mut RevealScheduler {
        &mut self.scheduler
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        if self.loading != loading {
            self.loading = loading;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_channel(&mut self, channel: ChannelStatus) {
        if self.channel != channel {
            self.channel = channel;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_stories(&mut self, stories: Vec<StoryRow>) {
        self.stories = stories;
        self.mark_dirty();
    }

    pub(crate) fn set_compliance(&mut self, rows: Vec<StoryRow>) {
        self.compliance = rows;
        self.mark_dirty();
    }

    /// Starts a new run: bumps the generation and clears all per-run state.
    pub(crate) fn begin_run(&mut self) -> u64 {
        self.generation += 1;
        self.scheduler.reset();
        self.result = None;
        self.pending_settles = 0;
        self.transcript.clear();
        self.mark_dirty();
        self.generation
    }

    pub(crate) fn store_result(&mut self, table: ResultTable) {
        self.result = Some(table);
        self.mark_dirty();
    }

    pub(crate) fn accept_message(&mut self, message: IncomingMessage) {
        if !self.transcript.is_empty() {
            self.transcript.push(' ');
        }
        self.transcript.push_str(&message.text);
        self.scheduler.enqueue(message);
        self.mark_dirty();
    }

    pub(crate) fn note_dropped_frame(&mut self) {
        self.dropped_frames += 1;
    }

    pub(crate) fn push_settle(&mut self) {
        self.pending_settles += 1;
    }

    /// Returns false if no settle was pending.
    pub(crate) fn pop_settle(&mut self) -> bool {
        if self.pending_settles == 0 {
            return false;
        }
        self.pending_settles -= 1;
        self.mark_dirty();
        true
    }
}
