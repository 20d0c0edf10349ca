use std::sync::Arc;
use std::time::Duration;

use chat_logging::{chat_debug, chat_info, chat_warn};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::{ChannelEvent, EngineEvent};

const CHAT_PATH: &str = "/api/ws-chat";

#[derive(Debug, Clone)]
pub struct ChannelSettings {
    pub url: String,
    pub reconnect_delay: Duration,
}

impl ChannelSettings {
    pub fn for_base_url(base_url: &str) -> Result<Self, ChannelError> {
        Ok(Self {
            url: ws_url(base_url)?,
            reconnect_delay: Duration::from_secs(5),
        })
    }
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("invalid channel url: {0}")]
    InvalidUrl(String),
    #[error("unsupported scheme `{0}`; expected http or https")]
    UnsupportedScheme(String),
    #[error("websocket error: {0}")]
    Socket(Box<tokio_tungstenite::tungstenite::Error>),
}

impl From<tokio_tungstenite::tungstenite::Error> for ChannelError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ChannelError::Socket(Box::new(err))
    }
}

/// Receives everything the engine reports.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Derives the chat socket URL from the REST base (`http` -> `ws`, `https` -> `wss`).
pub fn ws_url(base_url: &str) -> Result<String, ChannelError> {
    let mut url =
        url::Url::parse(base_url).map_err(|err| ChannelError::InvalidUrl(err.to_string()))?;
    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => return Err(ChannelError::UnsupportedScheme(other.to_string())),
    };
    url.set_scheme(scheme)
        .map_err(|()| ChannelError::UnsupportedScheme(scheme.to_string()))?;
    let path = format!("{}{CHAT_PATH}", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.set_query(None);
    Ok(url.to_string())
}

enum SessionEnd {
    Closed,
    Shutdown,
}

/// Keeps one socket open, reconnecting after a fixed delay until cancelled.
pub async fn run_channel(
    settings: ChannelSettings,
    mut outgoing: UnboundedReceiver<String>,
    sink: Arc<dyn EventSink>,
    cancel: CancellationToken,
) {
    loop {
        let connected = tokio::select! {
            _ = cancel.cancelled() => break,
            result = connect_async(settings.url.as_str()) => result,
        };

        match connected {
            Ok((stream, _)) => {
                chat_info!("channel connected to {}", settings.url);
                sink.emit(EngineEvent::Channel(ChannelEvent::Connected));
                let end = session(stream, &mut outgoing, sink.as_ref(), &cancel).await;
                sink.emit(EngineEvent::Channel(ChannelEvent::Disconnected));
                match end {
                    Ok(SessionEnd::Shutdown) => break,
                    Ok(SessionEnd::Closed) => chat_info!("channel closed"),
                    Err(err) => {
                        chat_warn!("channel error: {}", err);
                        sink.emit(EngineEvent::Channel(ChannelEvent::Error(err.to_string())));
                    }
                }
            }
            Err(err) => {
                chat_warn!("channel connect to {} failed: {}", settings.url, err);
                sink.emit(EngineEvent::Channel(ChannelEvent::Error(err.to_string())));
                sink.emit(EngineEvent::Channel(ChannelEvent::Disconnected));
            }
        }

        let mut dropped = 0usize;
        while outgoing.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            chat_warn!("dropped {} outgoing message(s) while disconnected", dropped);
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(settings.reconnect_delay) => {}
        }
        chat_debug!("reconnecting to {}", settings.url);
    }
    chat_info!("channel task stopped");
}

async fn session<S>(
    stream: tokio_tungstenite::WebSocketStream<S>,
    outgoing: &mut UnboundedReceiver<String>,
    sink: &dyn EventSink,
    cancel: &CancellationToken,
) -> Result<SessionEnd, ChannelError>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let (mut write, mut read) = stream.split();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = write.send(Message::Close(None)).await;
                return Ok(SessionEnd::Shutdown);
            }
            next = outgoing.recv() => match next {
                Some(text) => {
                    chat_debug!("sending {} bytes", text.len());
                    write.send(Message::Text(text.into())).await?;
                }
                None => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(SessionEnd::Shutdown);
                }
            },
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    sink.emit(EngineEvent::Channel(ChannelEvent::Frame(text.to_string())));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(SessionEnd::Closed),
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err.into()),
            },
        }
    }
}
