use super::{translate, RoomControl, RoomEvent, TranscriptBuffer};
use crate::error::RoomError;
use crate::session::{Action, SessionId};
use crate::state::AppEvent;
use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use std::sync::mpsc::Sender as EventSender;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{connect_async, tungstenite};

/// Build the signalling request `<server>/rtc?access_token=<credential>`.
/// `http(s)` server URLs are upgraded to `ws(s)`.
pub fn build_room_request(
    server_url: &str,
    credential: &str,
) -> Result<tungstenite::http::Request<()>, RoomError> {
    let mut url = Url::parse(server_url.trim())
        .map_err(|e| RoomError::InvalidUrl(format!("{}: {}", server_url, e)))?;
    let scheme = match url.scheme() {
        "ws" | "http" => "ws",
        "wss" | "https" => "wss",
        other => {
            return Err(RoomError::InvalidUrl(format!(
                "unsupported scheme {} in {}",
                other, server_url
            )))
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| RoomError::InvalidUrl(server_url.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| RoomError::InvalidUrl(server_url.to_string()))?
        .pop_if_empty()
        .push("rtc");
    url.query_pairs_mut().append_pair("access_token", credential);

    Ok(url.as_str().into_client_request()?)
}

/// Live room connection owned by the current session.
///
/// Dropping the handle (or calling [`RoomHandle::leave`]) ends the room task;
/// a task that ends this way emits nothing further.
pub struct RoomHandle {
    pub session: SessionId,
    control_tx: mpsc::Sender<RoomControl>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl RoomHandle {
    pub fn send(&self, control: RoomControl) {
        if let Err(e) = self.control_tx.try_send(control) {
            log::warn!("[room] {} control dropped: {}", self.session, e);
        }
    }

    pub fn leave(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Start the room task on `runtime` and return its handle.
pub fn join(
    runtime: &tokio::runtime::Handle,
    server_url: String,
    credential: String,
    session: SessionId,
    event_tx: EventSender<AppEvent>,
) -> RoomHandle {
    let (control_tx, control_rx) = mpsc::channel::<RoomControl>(16);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    runtime.spawn(run_room(
        server_url,
        credential,
        session,
        event_tx,
        control_rx,
        shutdown_rx,
    ));
    RoomHandle {
        session,
        control_tx,
        shutdown_tx: Some(shutdown_tx),
    }
}

fn emit(tx: &EventSender<AppEvent>, session: SessionId, event: RoomEvent) {
    let _ = tx.send(AppEvent::Session(Action::Room { session, event }));
}

pub async fn run_room(
    server_url: String,
    credential: String,
    session: SessionId,
    event_tx: EventSender<AppEvent>,
    mut control_rx: mpsc::Receiver<RoomControl>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let request = match build_room_request(&server_url, &credential) {
        Ok(req) => req,
        Err(e) => {
            log::error!("[room] {} {}", session, e);
            emit(
                &event_tx,
                session,
                RoomEvent::Disconnected {
                    reason: Some(e.to_string()),
                },
            );
            return;
        }
    };

    log::info!("[room] {} connecting to {}", session, server_url);
    let ws_stream = tokio::select! {
        res = connect_async(request) => match res {
            Ok((stream, _)) => stream,
            Err(e) => {
                let err = RoomError::from(e);
                log::error!("[room] {} {}", session, err);
                emit(
                    &event_tx,
                    session,
                    RoomEvent::Disconnected {
                        reason: Some(err.to_string()),
                    },
                );
                return;
            }
        },
        _ = &mut shutdown_rx => {
            log::info!("[room] {} left before the connection completed", session);
            return;
        }
    };
    log::info!("[room] {} websocket connected", session);
    emit(&event_tx, session, RoomEvent::Connected);

    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    let mut transcripts = TranscriptBuffer::default();

    let reason: Option<String> = loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                log::info!("[room] {} leaving", session);
                let _ = ws_tx.close().await;
                return;
            }
            Some(control) = control_rx.recv() => {
                let frame = control.to_frame();
                if let Err(e) = ws_tx
                    .send(tungstenite::Message::Text(frame.to_string().into()))
                    .await
                {
                    log::warn!("[room] {} control send failed: {}", session, e);
                    break Some(e.to_string());
                }
            }
            msg = ws_rx.next() => {
                let msg = match msg {
                    Some(Ok(m)) => m,
                    Some(Err(e)) => {
                        log::warn!("[room] {} websocket error: {}", session, e);
                        break Some(e.to_string());
                    }
                    None => break None,
                };
                let text = match msg {
                    tungstenite::Message::Text(t) => t,
                    tungstenite::Message::Close(frame) => {
                        log::info!("[room] {} websocket closed", session);
                        break frame
                            .map(|f| f.reason.to_string())
                            .filter(|r| !r.is_empty());
                    }
                    _ => continue,
                };
                match translate(&text, &mut transcripts) {
                    Some(RoomEvent::Disconnected { reason }) => {
                        let _ = ws_tx.close().await;
                        break reason;
                    }
                    Some(event) => emit(&event_tx, session, event),
                    None => {}
                }
            }
        }
    };

    emit(&event_tx, session, RoomEvent::Disconnected { reason });
}
