use std::io::{self, Write};
use std::sync::mpsc;

use chat_logging::{chat_debug, chat_info, chat_warn};
use prioritizer_core::{Effect, Msg, Notification, RequestKind, StorySource};
use prioritizer_engine::{
    ChannelEvent, EngineEvent, EngineHandle, Endpoint, EventSink, StoryRequest,
};

use super::clipboard::TranscriptClipboard;
use super::render::notification_line;

/// Feeds engine events straight into the app inbox as core messages.
pub struct InboxSink {
    tx: mpsc::Sender<Msg>,
}

impl InboxSink {
    pub fn new(tx: mpsc::Sender<Msg>) -> Self {
        Self { tx }
    }
}

impl EventSink for InboxSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(to_msg(event));
    }
}

pub fn to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::RequestCompleted { endpoint, result } => {
            let request = request_kind(endpoint);
            match result {
                Ok(rows) if request == RequestKind::Compliance => Msg::ComplianceLoaded(rows),
                Ok(rows) => Msg::StoriesLoaded { request, rows },
                Err(err) => Msg::RequestFailed {
                    request,
                    message: err.to_string(),
                },
            }
        }
        EngineEvent::Channel(ChannelEvent::Connected) => Msg::ChannelConnected,
        EngineEvent::Channel(ChannelEvent::Disconnected) => Msg::ChannelDisconnected,
        EngineEvent::Channel(ChannelEvent::Error(reason)) => Msg::ChannelFailed(reason),
        EngineEvent::Channel(ChannelEvent::Frame(raw)) => Msg::FrameReceived(raw),
    }
}

fn request_kind(endpoint: Endpoint) -> RequestKind {
    match endpoint {
        Endpoint::Generate => RequestKind::Generate,
        Endpoint::GenerateFromFiles => RequestKind::GenerateFromFiles,
        Endpoint::UploadCsv => RequestKind::UploadCsv,
        Endpoint::CheckQuality => RequestKind::Compliance,
    }
}

/// The IO side the runner drives. `EngineHandle` in the binary, a recorder in tests.
pub trait Backend {
    fn request(&self, request: StoryRequest);
    fn send(&self, text: String);
}

impl Backend for EngineHandle {
    fn request(&self, request: StoryRequest) {
        EngineHandle::request(self, request);
    }

    fn send(&self, text: String) {
        EngineHandle::send(self, text);
    }
}

/// Chat output on one stream, notifications split between the two.
pub struct Console {
    out: Box<dyn Write>,
    err: Box<dyn Write>,
}

impl Console {
    pub fn stdio() -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    pub fn new(out: Box<dyn Write>, err: Box<dyn Write>) -> Self {
        Self { out, err }
    }

    pub fn print(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }

    pub fn notify(&mut self, note: &Notification) {
        let (to_stderr, line) = notification_line(note);
        let stream = if to_stderr { &mut self.err } else { &mut self.out };
        let _ = writeln!(stream, "{line}");
        let _ = stream.flush();
    }
}

/// Executes the IO effects. Timer effects belong to the app loop and never get here.
pub struct EffectRunner {
    backend: Box<dyn Backend>,
    clipboard: Box<dyn TranscriptClipboard>,
}

impl EffectRunner {
    pub fn new(backend: Box<dyn Backend>, clipboard: Box<dyn TranscriptClipboard>) -> Self {
        Self { backend, clipboard }
    }

    /// Returns the follow-up message for effects that complete synchronously.
    pub fn run(&mut self, effect: Effect, console: &mut Console) -> Option<Msg> {
        match effect {
            Effect::RequestStories(source) => {
                chat_info!("requesting stories via {:?}", source.kind());
                self.backend.request(story_request(source));
                None
            }
            Effect::CheckCompliance {
                framework,
                stories,
                model,
            } => {
                chat_info!("checking {} stories against {}", stories.len(), framework);
                self.backend.request(StoryRequest::CheckQuality {
                    framework,
                    stories,
                    model,
                });
                None
            }
            Effect::SendRunRequest(run) => {
                match serde_json::to_string(&run) {
                    Ok(text) => self.backend.send(text),
                    Err(err) => chat_warn!("cannot encode run request: {}", err),
                }
                None
            }
            Effect::ExportTranscript(text) => {
                Some(Msg::TranscriptExported(self.clipboard.copy(&text)))
            }
            Effect::Notify(note) => {
                console.notify(&note);
                None
            }
            Effect::ScrollToLatest { role } => {
                chat_debug!("scroll to latest {:?}", role);
                None
            }
            Effect::Schedule { .. } | Effect::CancelTimers => {
                chat_warn!("timer effect reached the effect runner");
                None
            }
        }
    }
}

fn story_request(source: StorySource) -> StoryRequest {
    match source {
        StorySource::Text { vision, mvp, model } => StoryRequest::Generate { vision, mvp, model },
        StorySource::Files {
            vision_file,
            mvp_file,
            model,
        } => StoryRequest::GenerateFromFiles {
            vision_file,
            mvp_file,
            model,
        },
        StorySource::Csv { file } => StoryRequest::UploadCsv { file },
    }
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use prioritizer_core::RunRequest;
    use prioritizer_engine::{ApiError, FailureKind};
    use serde_json::{json, Value};

    use super::testing::{captured_console, FakeClipboard, RecordingBackend};
    use super::*;

    fn runner(backend: &RecordingBackend, clipboard: &FakeClipboard) -> EffectRunner {
        EffectRunner::new(Box::new(backend.clone()), Box::new(clipboard.clone()))
    }

    #[test]
    fn quality_check_results_become_compliance_rows() {
        let rows = vec![json!({"user_story": "S"}).as_object().cloned().unwrap()];
        let msg = to_msg(EngineEvent::RequestCompleted {
            endpoint: Endpoint::CheckQuality,
            result: Ok(rows.clone()),
        });
        assert_eq!(msg, Msg::ComplianceLoaded(rows));
    }

    #[test]
    fn failures_keep_request_kind() {
        let msg = to_msg(EngineEvent::RequestCompleted {
            endpoint: Endpoint::UploadCsv,
            result: Err(ApiError {
                kind: FailureKind::HttpStatus(500),
                message: "boom".to_string(),
            }),
        });
        assert_eq!(
            msg,
            Msg::RequestFailed {
                request: RequestKind::UploadCsv,
                message: "http status 500: boom".to_string(),
            }
        );
    }

    #[test]
    fn channel_events_map_one_to_one() {
        assert_eq!(
            to_msg(EngineEvent::Channel(ChannelEvent::Frame("{}".into()))),
            Msg::FrameReceived("{}".into())
        );
        assert_eq!(
            to_msg(EngineEvent::Channel(ChannelEvent::Disconnected)),
            Msg::ChannelDisconnected
        );
    }

    #[test]
    fn run_request_is_sent_as_json() {
        let backend = RecordingBackend::default();
        let mut runner = runner(&backend, &FakeClipboard::default());
        let (mut console, _, _) = captured_console();

        let follow_up = runner.run(
            Effect::SendRunRequest(RunRequest {
                stories: Vec::new(),
                model: "gpt-4o-mini".into(),
                prioritization_type: "WSJF".into(),
                feedback: String::new(),
            }),
            &mut console,
        );

        assert_eq!(follow_up, None);
        let sent = backend.sent.borrow();
        let value: Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(
            value,
            json!({"stories": [], "model": "gpt-4o-mini", "prioritization_type": "WSJF", "feedback": ""})
        );
    }

    #[test]
    fn csv_source_becomes_upload() {
        let backend = RecordingBackend::default();
        let mut runner = runner(&backend, &FakeClipboard::default());
        let (mut console, _, _) = captured_console();

        runner.run(
            Effect::RequestStories(StorySource::Csv {
                file: "stories.csv".into(),
            }),
            &mut console,
        );

        assert_eq!(
            backend.requests.borrow().as_slice(),
            &[StoryRequest::UploadCsv {
                file: "stories.csv".into()
            }]
        );
    }

    #[test]
    fn export_reports_clipboard_outcome() {
        let backend = RecordingBackend::default();
        let clipboard = FakeClipboard::default();
        let (mut console, _, _) = captured_console();

        let ok = runner(&backend, &clipboard).run(Effect::ExportTranscript("a b".into()), &mut console);
        assert_eq!(ok, Some(Msg::TranscriptExported(Ok(()))));
        assert_eq!(clipboard.copied.borrow().as_slice(), &["a b".to_string()]);

        let broken = FakeClipboard {
            fail_with: Some("no display".into()),
            ..FakeClipboard::default()
        };
        let err = runner(&backend, &broken).run(Effect::ExportTranscript("a".into()), &mut console);
        assert_eq!(err, Some(Msg::TranscriptExported(Err("no display".into()))));
    }

    #[test]
    fn notifications_are_split_by_severity() {
        let backend = RecordingBackend::default();
        let mut runner = runner(&backend, &FakeClipboard::default());
        let (mut console, out, err) = captured_console();

        runner.run(Effect::Notify(Notification::success("User stories generated")), &mut console);
        runner.run(Effect::Notify(Notification::warning("Nothing to copy yet")), &mut console);

        assert_eq!(out.text(), "[ok] User stories generated\n");
        assert_eq!(err.text(), "[warning] Nothing to copy yet\n");
    }
}
