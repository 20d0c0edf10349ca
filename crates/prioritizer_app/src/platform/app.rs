use std::collections::VecDeque;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Instant;

use chat_logging::{chat_debug, chat_warn};
use prioritizer_core::{update, AppState, Effect, Msg, RevealSettings};

use super::effects::{Console, EffectRunner};
use super::flow::{Flow, FlowAction, Outcome};
use super::render::TerminalRenderer;
use super::timers::TimerQueue;

/// Single-threaded loop: inbox messages and due timers go through `update`,
/// effects go out through the runner.
pub struct App {
    state: AppState,
    timers: TimerQueue,
    inbox: mpsc::Receiver<Msg>,
    runner: EffectRunner,
    renderer: TerminalRenderer,
    console: Console,
    flow: Flow,
}

impl App {
    pub fn new(
        settings: RevealSettings,
        inbox: mpsc::Receiver<Msg>,
        runner: EffectRunner,
        console: Console,
        flow: Flow,
    ) -> Self {
        Self {
            state: AppState::with_settings(settings),
            timers: TimerQueue::new(),
            inbox,
            runner,
            renderer: TerminalRenderer::new(),
            console,
            flow,
        }
    }

    /// Runs until the flow finishes; returns the final state for anything the
    /// caller wants to save.
    pub fn run(mut self) -> (Outcome, AppState) {
        let mut pending: VecDeque<Msg> = self.flow.start().into();

        let outcome = loop {
            if let Some(msg) = pending.pop_front() {
                if let Some(outcome) = self.dispatch(msg, &mut pending) {
                    break outcome;
                }
                continue;
            }

            let now = Instant::now();
            let due = self.timers.pop_due(now);
            if !due.is_empty() {
                pending.extend(due.into_iter().map(Msg::TimerFired));
                continue;
            }

            let received = match self.timers.next_deadline() {
                Some(deadline) => self
                    .inbox
                    .recv_timeout(deadline.saturating_duration_since(now)),
                None => self
                    .inbox
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok(msg) => pending.push_back(msg),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    chat_warn!("inbox closed with the flow still running");
                    break Outcome::Failed("engine stopped unexpectedly".to_string());
                }
            }
        };

        let tail = self.renderer.finish();
        self.console.print(&tail);
        (outcome, self.state)
    }

    fn dispatch(&mut self, msg: Msg, pending: &mut VecDeque<Msg>) -> Option<Outcome> {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg.clone());
        self.state = state;
        chat_logging::set_run_generation(self.state.generation());

        if self.state.consume_dirty() {
            let text = self.renderer.render(&self.state.view());
            self.console.print(&text);
        }

        for effect in effects {
            match effect {
                Effect::Schedule { after, timer } => {
                    self.timers.schedule(Instant::now(), after, timer);
                }
                Effect::CancelTimers => {
                    chat_debug!("dropping {} pending timers", self.timers.len());
                    self.timers.clear();
                }
                other => {
                    if let Some(follow_up) = self.runner.run(other, &mut self.console) {
                        pending.push_back(follow_up);
                    }
                }
            }
        }

        match self.flow.observe(&msg, &self.state)? {
            FlowAction::Dispatch(next) => {
                pending.push_back(next);
                None
            }
            FlowAction::Finish(outcome) => Some(outcome),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use prioritizer_core::{PrioritizationKind, Row};
    use serde_json::{json, Value};

    use super::*;
    use crate::platform::effects::testing::{captured_console, FakeClipboard, RecordingBackend};
    use crate::platform::flow::RunOptions;
    use crate::platform::stories::StoryInput;

    fn fast() -> RevealSettings {
        RevealSettings {
            tick: Duration::from_millis(1),
            batch_chars: 64,
            settle_delay: Duration::from_millis(2),
            scroll_delay: Duration::from_millis(1),
        }
    }

    fn rows() -> Vec<Row> {
        vec![json!({"epic": "E1", "user_story": "S1"})
            .as_object()
            .cloned()
            .unwrap()]
    }

    fn frame(value: Value) -> Msg {
        Msg::FrameReceived(value.to_string())
    }

    #[test]
    fn prioritize_run_streams_then_prints_the_table() {
        let (tx, rx) = mpsc::channel();
        // Everything the socket would deliver, queued up front.
        tx.send(Msg::ChannelConnected).unwrap();
        tx.send(frame(json!({"agentType": "PO", "message": "Checkout first."})))
            .unwrap();
        tx.send(frame(
            json!({"agentType": "Final Prioritization", "message": "Agreed."}),
        ))
        .unwrap();
        tx.send(frame(json!({
            "agentType": "Final_output_into_table",
            "prioritization_type": "WSJF",
            "message": [{"epic": "E1", "user_story": "S1", "wsjf_score": 4.2}],
        })))
        .unwrap();

        let backend = RecordingBackend::default();
        let clipboard = FakeClipboard::default();
        let (console, out, _) = captured_console();
        let runner = EffectRunner::new(Box::new(backend.clone()), Box::new(clipboard.clone()));
        let flow = Flow::prioritize(
            StoryInput::Rows(rows()),
            RunOptions {
                technique: PrioritizationKind::Wsjf,
                model: "gpt-4o-mini".into(),
                feedback: String::new(),
                copy: true,
            },
        );

        let (outcome, state) = App::new(fast(), rx, runner, console, flow).run();

        assert_eq!(outcome, Outcome::Done);
        assert_eq!(backend.sent.borrow().len(), 1);
        assert!(state.result_visible());
        assert_eq!(state.transcript(), "Checkout first. Agreed.");
        assert_eq!(
            clipboard.copied.borrow().as_slice(),
            &["Checkout first. Agreed.".to_string()]
        );

        let printed = out.text();
        let narrative = printed.find("Product Owner: Checkout first.").unwrap();
        let table = printed.find("[WSJF]").unwrap();
        assert!(narrative < table);
        assert!(printed.contains("Content Copied Successfully"));
    }

    #[test]
    fn failed_upload_ends_the_fetch() {
        let (tx, rx) = mpsc::channel();
        tx.send(Msg::RequestFailed {
            request: prioritizer_core::RequestKind::UploadCsv,
            message: "http status 500: boom".into(),
        })
        .unwrap();

        let backend = RecordingBackend::default();
        let (console, _, err) = captured_console();
        let runner = EffectRunner::new(Box::new(backend.clone()), Box::new(FakeClipboard::default()));
        let flow = Flow::fetch(prioritizer_core::StorySource::Csv {
            file: "s.csv".into(),
        });

        let (outcome, _) = App::new(fast(), rx, runner, console, flow).run();

        assert_eq!(outcome, Outcome::Failed("http status 500: boom".into()));
        assert_eq!(backend.requests.borrow().len(), 1);
        assert_eq!(err.text(), "[error] Error uploading file\n");
    }

    #[test]
    fn closed_inbox_fails_instead_of_hanging() {
        let (tx, rx) = mpsc::channel::<Msg>();
        drop(tx);
        let (console, _, _) = captured_console();
        let runner = EffectRunner::new(
            Box::new(RecordingBackend::default()),
            Box::new(FakeClipboard::default()),
        );
        let flow = Flow::fetch(prioritizer_core::StorySource::Text {
            vision: "v".into(),
            mvp: "m".into(),
            model: "gpt-4o-mini".into(),
        });

        let (outcome, state) = App::new(fast(), rx, runner, console, flow).run();

        assert!(matches!(outcome, Outcome::Failed(_)));
        assert!(state.is_loading());
    }
}
