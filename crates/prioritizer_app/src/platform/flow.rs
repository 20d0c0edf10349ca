//! What each subcommand asks of the core, and when it is done.
//!
//! A flow only ever reacts to messages after `update` has applied them, so
//! it reads the state the user would be looking at.

use chat_logging::chat_info;
use prioritizer_core::{AppState, ChannelStatus, Msg, PrioritizationKind, StorySource};

use super::stories::StoryInput;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlowAction {
    Dispatch(Msg),
    Finish(Outcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    LoadingStories,
    WaitingForChannel,
    Running,
    Copying,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub technique: PrioritizationKind,
    pub model: String,
    pub feedback: String,
    pub copy: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Generate or upload: one request, then done.
    Fetch { source: StorySource },
    Check {
        input: StoryInput,
        framework: String,
        model: String,
        checking: bool,
    },
    Prioritize {
        input: StoryInput,
        run: RunOptions,
        phase: Phase,
    },
}

impl Flow {
    pub fn fetch(source: StorySource) -> Self {
        Flow::Fetch { source }
    }

    pub fn check(input: StoryInput, framework: String, model: String) -> Self {
        Flow::Check {
            input,
            framework,
            model,
            checking: false,
        }
    }

    pub fn prioritize(input: StoryInput, run: RunOptions) -> Self {
        Flow::Prioritize {
            input,
            run,
            phase: Phase::LoadingStories,
        }
    }

    /// Messages that kick the flow off.
    pub fn start(&self) -> Vec<Msg> {
        match self {
            Flow::Fetch { source } => vec![Msg::StoriesRequested(source.clone())],
            Flow::Check { input, .. } | Flow::Prioritize { input, .. } => vec![load(input)],
        }
    }

    pub fn observe(&mut self, msg: &Msg, state: &AppState) -> Option<FlowAction> {
        match self {
            Flow::Fetch { .. } => match msg {
                Msg::StoriesLoaded { .. } => Some(FlowAction::Finish(Outcome::Done)),
                Msg::RequestFailed { message, .. } => failed(message),
                _ => None,
            },
            Flow::Check {
                framework,
                model,
                checking,
                ..
            } => match msg {
                Msg::StoriesLoaded { .. } | Msg::StoriesImported(_) if !*checking => {
                    if state.stories().is_empty() {
                        return failed("no user stories to check");
                    }
                    *checking = true;
                    Some(FlowAction::Dispatch(Msg::ComplianceRequested {
                        framework: framework.clone(),
                        model: model.clone(),
                    }))
                }
                Msg::ComplianceLoaded(_) => Some(FlowAction::Finish(Outcome::Done)),
                Msg::RequestFailed { message, .. } => failed(message),
                _ => None,
            },
            Flow::Prioritize { run, phase, .. } => observe_run(run, phase, msg, state),
        }
    }
}

fn observe_run(
    run: &RunOptions,
    phase: &mut Phase,
    msg: &Msg,
    state: &AppState,
) -> Option<FlowAction> {
    match (*phase, msg) {
        (Phase::LoadingStories, Msg::StoriesLoaded { .. } | Msg::StoriesImported(_)) => {
            if state.stories().is_empty() {
                return failed("no user stories to prioritize");
            }
            *phase = Phase::WaitingForChannel;
            submit_when_connected(run, phase, state)
        }
        (Phase::LoadingStories, Msg::RequestFailed { message, .. }) => failed(message),
        (Phase::WaitingForChannel, Msg::ChannelConnected) => {
            submit_when_connected(run, phase, state)
        }
        (Phase::Running, Msg::ChannelDisconnected) if state.result().is_none() => {
            failed("channel closed before the run finished")
        }
        (Phase::Running, _) => {
            if state.result_visible() {
                if run.copy && !state.transcript().is_empty() {
                    *phase = Phase::Copying;
                    return Some(FlowAction::Dispatch(Msg::TranscriptExportRequested));
                }
                return Some(FlowAction::Finish(Outcome::Done));
            }
            // `error` fragments are narrative too; the backend keeps going after them.
            None
        }
        (Phase::Copying, Msg::TranscriptExported(Ok(()))) => {
            Some(FlowAction::Finish(Outcome::Done))
        }
        (Phase::Copying, Msg::TranscriptExported(Err(err))) => {
            failed(&format!("Failed to copy: {err}"))
        }
        _ => None,
    }
}

fn submit_when_connected(
    run: &RunOptions,
    phase: &mut Phase,
    state: &AppState,
) -> Option<FlowAction> {
    if state.channel() != ChannelStatus::Connected {
        return None;
    }
    *phase = Phase::Running;
    chat_info!("submitting {} run", run.technique);
    Some(FlowAction::Dispatch(Msg::PrioritizationSubmitted {
        technique: run.technique,
        model: run.model.clone(),
        feedback: run.feedback.clone(),
    }))
}

fn load(input: &StoryInput) -> Msg {
    match input {
        StoryInput::Rows(rows) => Msg::StoriesImported(rows.clone()),
        StoryInput::Csv(file) => Msg::StoriesRequested(StorySource::Csv { file: file.clone() }),
    }
}

fn failed(message: &str) -> Option<FlowAction> {
    Some(FlowAction::Finish(Outcome::Failed(message.to_string())))
}
