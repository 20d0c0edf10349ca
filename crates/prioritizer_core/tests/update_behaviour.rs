use std::path::PathBuf;
use std::sync::Once;

use pretty_assertions::assert_eq;
use prioritizer_core::{
    update, AppState, ChannelStatus, Effect, Msg, Notification, PrioritizationKind, RequestKind,
    Row, RunRequest, Severity, StorySource,
};
use serde_json::{json, Value};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(chat_logging::initialize_for_tests);
}

fn row(value: Value) -> Row {
    value.as_object().cloned().unwrap()
}

fn frame(role: &str, text: &str) -> Msg {
    Msg::FrameReceived(json!({ "agentType": role, "message": text }).to_string())
}

fn connected() -> AppState {
    update(AppState::new(), Msg::ChannelConnected).0
}

fn with_stories(state: AppState) -> AppState {
    let (state, _) = update(
        state,
        Msg::StoriesLoaded {
            request: RequestKind::UploadCsv,
            rows: vec![
                row(json!({"epic": "Checkout", "user_story": "Pay by card", "key": 41})),
                row(json!({"epic": "Checkout", "user_story": "Save cart"})),
            ],
        },
    );
    state
}

#[test]
fn story_request_sets_loading_and_emits_effect() {
    init_logging();
    let source = StorySource::Text {
        vision: "A parcel tracker".into(),
        mvp: "Scan and list parcels".into(),
        model: "gpt-4o-mini".into(),
    };
    let (state, effects) = update(AppState::new(), Msg::StoriesRequested(source.clone()));

    assert!(state.is_loading());
    assert_eq!(effects, vec![Effect::RequestStories(source)]);
}

#[test]
fn loaded_stories_are_keyed_by_position() {
    init_logging();
    let state = with_stories(AppState::new());

    let keys: Vec<_> = state.stories().iter().map(|s| s.key).collect();
    assert_eq!(keys, vec![0, 1]);
    let view = state.view();
    let table = view.stories.unwrap();
    assert_eq!(table.title, "User Stories");
    assert_eq!(table.rows[0][0], "1");
    assert_eq!(table.rows[1][2], "Save cart");
}

#[test]
fn imported_stories_are_keyed_quietly() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::StoriesImported(vec![row(json!({"epic": "E1", "user_story": "S1"}))]),
    );

    assert!(effects.is_empty());
    assert_eq!(state.stories()[0].key, 0);
    assert_eq!(state.stories()[0].to_wire()["key"], json!(0));
}

#[test]
fn loaded_stories_notify_per_request_kind() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::StoriesLoaded {
            request: RequestKind::Generate,
            rows: Vec::new(),
        },
    );

    assert!(!state.is_loading());
    assert_eq!(
        effects,
        vec![Effect::Notify(Notification::success("User stories generated"))]
    );
    assert!(state.view().stories.is_none());
}

#[test]
fn failed_request_clears_loading_and_reports() {
    init_logging();
    let source = StorySource::Csv {
        file: PathBuf::from("stories.csv"),
    };
    let (state, _) = update(AppState::new(), Msg::StoriesRequested(source));
    let (state, effects) = update(
        state,
        Msg::RequestFailed {
            request: RequestKind::UploadCsv,
            message: "HTTP 500".into(),
        },
    );

    assert!(!state.is_loading());
    assert_eq!(
        effects,
        vec![Effect::Notify(Notification::error("Error uploading file"))]
    );
}

#[test]
fn compliance_without_stories_only_warns() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::ComplianceRequested {
            framework: "INVEST framework".into(),
            model: "gpt-4o-mini".into(),
        },
    );

    assert!(!state.is_loading());
    assert_eq!(effects.len(), 1);
    let Effect::Notify(note) = &effects[0] else {
        panic!("expected a notification");
    };
    assert_eq!(note.severity, Severity::Warning);
}

#[test]
fn compliance_sends_keyed_stories() {
    init_logging();
    let state = with_stories(AppState::new());
    let (state, effects) = update(
        state,
        Msg::ComplianceRequested {
            framework: "INVEST framework".into(),
            model: "gpt-4o".into(),
        },
    );

    assert!(state.is_loading());
    let Effect::CheckCompliance {
        framework,
        stories,
        model,
    } = &effects[0]
    else {
        panic!("expected a compliance request");
    };
    assert_eq!(framework, "INVEST framework");
    assert_eq!(model, "gpt-4o");
    assert_eq!(stories[0]["key"], json!(0));
    assert_eq!(stories[1]["key"], json!(1));

    let (state, effects) = update(
        state,
        Msg::ComplianceLoaded(vec![row(json!({"user_story": "Pay by card", "compliance": "Yes"}))]),
    );
    assert!(!state.is_loading());
    assert_eq!(
        effects,
        vec![Effect::Notify(Notification::success(
            "Framework user stories generated"
        ))]
    );
    assert_eq!(state.view().compliance.unwrap().rows[0][5], "Yes");
}

#[test]
fn submit_while_connected_sends_run_request() {
    init_logging();
    let state = with_stories(connected());
    let (state, effects) = update(
        state,
        Msg::PrioritizationSubmitted {
            technique: PrioritizationKind::HundredDollar,
            model: "gpt-4o-mini".into(),
            feedback: "focus on checkout".into(),
        },
    );

    assert_eq!(state.generation(), 1);
    assert!(state.is_loading());
    assert_eq!(effects[0], Effect::CancelTimers);
    let Effect::SendRunRequest(request) = &effects[1] else {
        panic!("expected a run request");
    };
    assert_eq!(
        request,
        &RunRequest {
            stories: state.stories().iter().map(|s| s.to_wire()).collect(),
            model: "gpt-4o-mini".into(),
            prioritization_type: "100_DOLLAR".into(),
            feedback: "focus on checkout".into(),
        }
    );
    assert!(matches!(&effects[2], Effect::Notify(n) if n.severity == Severity::Info));
}

#[test]
fn submit_while_disconnected_resets_and_warns() {
    init_logging();
    let (state, _) = update(with_stories(connected()), frame("PO", "leftover"));
    let (state, _) = update(state, Msg::ChannelDisconnected);
    let (state, effects) = update(
        state,
        Msg::PrioritizationSubmitted {
            technique: PrioritizationKind::Kano,
            model: "gpt-4o-mini".into(),
            feedback: String::new(),
        },
    );

    assert!(!state.is_loading());
    assert_eq!(state.transcript(), "");
    assert!(state.scheduler().is_drained());
    assert!(!effects
        .iter()
        .any(|e| matches!(e, Effect::SendRunRequest(_))));
    assert!(matches!(
        effects.last(),
        Some(Effect::Notify(n)) if n.severity == Severity::Warning
    ));
}

#[test]
fn disconnect_keeps_queued_messages() {
    init_logging();
    let (state, _) = update(connected(), frame("PO", "first"));
    let (state, _) = update(state, frame("QA", "second"));
    let (state, _) = update(state, Msg::ChannelDisconnected);

    assert_eq!(state.channel(), ChannelStatus::Disconnected);
    assert_eq!(state.scheduler().pending_len(), 2);
    assert_eq!(state.transcript(), "first second");
}

#[test]
fn malformed_frames_are_counted_and_ignored() {
    init_logging();
    let state = connected();
    let (state, effects) = update(state, Msg::FrameReceived("not json".into()));
    assert!(effects.is_empty());
    let (state, effects) = update(
        state,
        Msg::FrameReceived(r#"{"agentType":"Final Prioritization","message":{"stories":[]}}"#.into()),
    );
    assert!(effects.is_empty());

    assert_eq!(state.dropped_frames(), 2);
    assert!(state.scheduler().is_drained());
    assert_eq!(state.view().dropped_frames, 2);
}

#[test]
fn first_frame_clears_loading() {
    init_logging();
    let state = with_stories(connected());
    let (state, _) = update(
        state,
        Msg::PrioritizationSubmitted {
            technique: PrioritizationKind::Moscow,
            model: "gpt-4o-mini".into(),
            feedback: String::new(),
        },
    );
    assert!(state.is_loading());

    let (state, _) = update(state, frame("PO", "Let us begin"));
    assert!(!state.is_loading());
}

#[test]
fn transcript_joins_fragments_with_single_spaces() {
    init_logging();
    let mut state = connected();
    for (role, text) in [("PO", "one"), ("QA", "two"), ("developer", "three")] {
        state = update(state, frame(role, text)).0;
    }

    assert_eq!(state.transcript(), "one two three");
    let (_, effects) = update(state, Msg::TranscriptExportRequested);
    assert_eq!(
        effects,
        vec![Effect::ExportTranscript("one two three".into())]
    );
}

#[test]
fn export_with_empty_transcript_warns() {
    init_logging();
    let (_, effects) = update(AppState::new(), Msg::TranscriptExportRequested);

    assert_eq!(
        effects,
        vec![Effect::Notify(Notification::warning("Nothing to copy yet"))]
    );
}

#[test]
fn export_outcome_is_reported() {
    init_logging();
    let (_, effects) = update(AppState::new(), Msg::TranscriptExported(Ok(())));
    assert_eq!(
        effects,
        vec![Effect::Notify(Notification::success(
            "Content Copied Successfully"
        ))]
    );

    let (_, effects) = update(
        AppState::new(),
        Msg::TranscriptExported(Err("clipboard unavailable".into())),
    );
    assert_eq!(
        effects,
        vec![Effect::Notify(
            Notification::error("Failed to copy: clipboard unavailable").blocking()
        )]
    );
}

#[test]
fn consume_dirty_resets_flag() {
    init_logging();
    let (mut state, _) = update(AppState::new(), Msg::ChannelConnected);

    assert!(state.consume_dirty());
    assert!(!state.consume_dirty());
    let (mut state, _) = update(state, Msg::ChannelConnected);
    assert!(!state.consume_dirty());
}
