use chat_logging::{chat_debug, chat_info, chat_trace, chat_warn};

use crate::effect::{Notification, RequestKind, RunRequest, Timer};
use crate::ingress::{parse_frame, Frame};
use crate::state::ChannelStatus;
use crate::table::{assign_display_keys, PrioritizationKind};
use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::StoriesRequested(source) => {
            state.set_loading(true);
            vec![Effect::RequestStories(source)]
        }
        Msg::StoriesLoaded { request, rows } => {
            chat_info!("{:?} returned {} stories", request, rows.len());
            state.set_stories(assign_display_keys(rows));
            state.set_loading(false);
            vec![Effect::Notify(Notification::success(request.success_text()))]
        }
        Msg::StoriesImported(rows) => {
            chat_debug!("imported {} stories", rows.len());
            state.set_stories(assign_display_keys(rows));
            Vec::new()
        }
        Msg::ComplianceRequested { framework, model } => {
            if state.stories().is_empty() {
                vec![Effect::Notify(Notification::warning(
                    "No user stories to check",
                ))]
            } else {
                state.set_loading(true);
                let stories = state.stories().iter().map(|s| s.to_wire()).collect();
                vec![Effect::CheckCompliance {
                    framework,
                    stories,
                    model,
                }]
            }
        }
        Msg::ComplianceLoaded(rows) => {
            state.set_compliance(assign_display_keys(rows));
            state.set_loading(false);
            vec![Effect::Notify(Notification::success(
                RequestKind::Compliance.success_text(),
            ))]
        }
        Msg::RequestFailed { request, message } => {
            chat_warn!("{:?} failed: {}", request, message);
            state.set_loading(false);
            vec![Effect::Notify(Notification::error(request.failure_text()))]
        }
        Msg::PrioritizationSubmitted {
            technique,
            model,
            feedback,
        } => start_run(&mut state, technique, model, feedback),
        Msg::ChannelConnected => {
            state.set_channel(ChannelStatus::Connected);
            state.set_loading(false);
            Vec::new()
        }
        Msg::ChannelDisconnected => {
            state.set_channel(ChannelStatus::Disconnected);
            state.set_loading(false);
            Vec::new()
        }
        Msg::ChannelFailed(reason) => {
            chat_warn!("channel error: {}", reason);
            state.set_loading(false);
            Vec::new()
        }
        Msg::FrameReceived(raw) => ingest(&mut state, &raw),
        Msg::TimerFired(timer) => on_timer(&mut state, timer),
        Msg::TranscriptExportRequested => {
            if state.transcript().is_empty() {
                vec![Effect::Notify(Notification::warning(
                    "Nothing to copy yet",
                ))]
            } else {
                vec![Effect::ExportTranscript(state.transcript().to_string())]
            }
        }
        Msg::TranscriptExported(Ok(())) => {
            vec![Effect::Notify(Notification::success(
                "Content Copied Successfully",
            ))]
        }
        Msg::TranscriptExported(Err(err)) => {
            vec![Effect::Notify(
                Notification::error(format!("Failed to copy: {err}")).blocking(),
            )]
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn start_run(
    state: &mut AppState,
    technique: PrioritizationKind,
    model: String,
    feedback: String,
) -> Vec<Effect> {
    let generation = state.begin_run();
    chat_info!(
        "starting run {} technique={} stories={}",
        generation,
        technique,
        state.stories().len()
    );
    let mut effects = vec![Effect::CancelTimers];

    if state.channel() != ChannelStatus::Connected {
        state.set_loading(false);
        effects.push(Effect::Notify(Notification::warning(
            "Not connected to the prioritization channel; request dropped",
        )));
        return effects;
    }

    state.set_loading(true);
    effects.push(Effect::SendRunRequest(RunRequest {
        stories: state.stories().iter().map(|s| s.to_wire()).collect(),
        model,
        prioritization_type: technique.as_tag().to_string(),
        feedback,
    }));
    effects.push(Effect::Notify(Notification::info(format!(
        "Prioritization started ({technique})"
    ))));
    effects
}

fn ingest(state: &mut AppState, raw: &str) -> Vec<Effect> {
    let frame = match parse_frame(raw) {
        Ok(frame) => frame,
        Err(err) => {
            chat_warn!("dropping malformed frame: {}", err);
            state.note_dropped_frame();
            return Vec::new();
        }
    };
    state.set_loading(false);

    match frame {
        Frame::Table(table) => {
            chat_info!(
                "result table received kind={} rows={}",
                table.kind,
                table.rows.len()
            );
            state.store_result(table);
            Vec::new()
        }
        Frame::Text(message) => {
            if message.is_blank() {
                chat_trace!("ignoring blank fragment from {}", message.role);
                return Vec::new();
            }
            chat_debug!(
                "queued fragment role={} len={}",
                message.role,
                message.text.len()
            );
            state.accept_message(message);
            start_reveal_if_idle(state)
        }
    }
}

fn start_reveal_if_idle(state: &mut AppState) -> Vec<Effect> {
    if state.scheduler_mut().begin_next() {
        vec![reveal_tick(state)]
    } else {
        Vec::new()
    }
}

fn reveal_tick(state: &AppState) -> Effect {
    Effect::Schedule {
        after: state.settings().tick,
        timer: Timer::Reveal {
            generation: state.generation(),
        },
    }
}

fn on_timer(state: &mut AppState, timer: Timer) -> Vec<Effect> {
    if timer.generation() != state.generation() {
        chat_trace!("ignoring stale {:?}", timer);
        return Vec::new();
    }

    match timer {
        Timer::Reveal { .. } => {
            let batch = state.settings().batch_chars;
            let Some(reveal) = state.scheduler_mut().reveal_batch(batch) else {
                return Vec::new();
            };
            state.mark_dirty();
            if !reveal.completed {
                return vec![reveal_tick(state)];
            }

            let mut effects = Vec::new();
            if reveal.role.is_terminal_narrative() {
                state.push_settle();
                effects.push(Effect::Schedule {
                    after: state.settings().settle_delay,
                    timer: Timer::Settle {
                        generation: state.generation(),
                    },
                });
            }
            effects.extend(start_reveal_if_idle(state));
            effects
        }
        Timer::Settle { generation } => {
            if !state.pop_settle() {
                return Vec::new();
            }
            vec![Effect::Schedule {
                after: state.settings().scroll_delay,
                timer: Timer::Scroll { generation },
            }]
        }
        Timer::Scroll { .. } => {
            let role = state.scheduler().last_revealed().cloned();
            vec![Effect::ScrollToLatest { role }]
        }
    }
}
