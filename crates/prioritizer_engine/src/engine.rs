use std::sync::{mpsc, Arc};
use std::thread;

use chat_logging::{chat_debug, chat_info};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiSettings, ReqwestStoryApi, StoryApi};
use crate::channel::{run_channel, ChannelError, ChannelSettings, EventSink};
use crate::{ApiError, EngineEvent, StoryRequest};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub api: ApiSettings,
    /// `None` for REST-only use; no socket is opened.
    pub channel: Option<ChannelSettings>,
}

impl EngineSettings {
    pub fn for_base_url(base_url: &str) -> Result<Self, EngineError> {
        Ok(Self {
            api: ApiSettings {
                base_url: base_url.to_string(),
                ..ApiSettings::default()
            },
            channel: Some(ChannelSettings::for_base_url(base_url)?),
        })
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

enum EngineCommand {
    Request(StoryRequest),
    Send(String),
    Shutdown,
}

/// Owns the IO thread: REST calls run as spawned tasks, the chat socket as
/// one long-lived task.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    worker: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    pub fn spawn(settings: EngineSettings, sink: Arc<dyn EventSink>) -> Result<Self, EngineError> {
        let api: Arc<dyn StoryApi> = Arc::new(ReqwestStoryApi::new(&settings.api)?);
        Self::spawn_with_api(settings.channel, api, sink)
    }

    pub fn spawn_with_api(
        channel: Option<ChannelSettings>,
        api: Arc<dyn StoryApi>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Runtime::new()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (out_tx, out_rx) = tokio::sync::mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        match channel {
            Some(channel) => {
                runtime.spawn(run_channel(channel, out_rx, sink.clone(), cancel.clone()));
            }
            None => drop(out_rx),
        }

        let worker = thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Request(request) => {
                        let api = api.clone();
                        let sink = sink.clone();
                        runtime.spawn(async move {
                            handle_request(api.as_ref(), request, sink.as_ref()).await;
                        });
                    }
                    EngineCommand::Send(text) => {
                        if out_tx.send(text).is_err() {
                            chat_debug!("channel task gone; outgoing message dropped");
                        }
                    }
                    EngineCommand::Shutdown => break,
                }
            }
            cancel.cancel();
            runtime.shutdown_timeout(std::time::Duration::from_secs(2));
            chat_info!("engine stopped");
        });

        Ok(Self {
            cmd_tx,
            worker: Some(worker),
        })
    }

    pub fn request(&self, request: StoryRequest) {
        let _ = self.cmd_tx.send(EngineCommand::Request(request));
    }

    /// Queues one text frame for the chat socket.
    pub fn send(&self, text: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Send(text.into()));
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn handle_request(api: &dyn StoryApi, request: StoryRequest, sink: &dyn EventSink) {
    let endpoint = request.endpoint();
    let result = api.call(&request).await;
    sink.emit(EngineEvent::RequestCompleted { endpoint, result });
}
