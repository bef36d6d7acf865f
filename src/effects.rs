use crate::backend::BackendClient;
use crate::room::session::{self as room_session, RoomHandle};
use crate::room::RoomControl;
use crate::session::{Action, Command};
use crate::state::AppEvent;
use std::sync::mpsc::Sender as EventSender;

/// Runs controller commands on the tokio runtime and reports results back
/// through the app event channel.
pub struct Effects {
    runtime: tokio::runtime::Handle,
    backend: BackendClient,
    room_url: String,
    event_tx: EventSender<AppEvent>,
    room: Option<RoomHandle>,
}

impl Effects {
    pub fn new(
        runtime: tokio::runtime::Handle,
        backend: BackendClient,
        room_url: String,
        event_tx: EventSender<AppEvent>,
    ) -> Self {
        Self {
            runtime,
            backend,
            room_url,
            event_tx,
            room: None,
        }
    }

    /// Swap in new endpoints. Only called while no session is live.
    pub fn reconfigure(&mut self, backend: BackendClient, room_url: String) {
        self.backend = backend;
        self.room_url = room_url;
    }

    pub fn backend_url(&self) -> &str {
        self.backend.base_url()
    }

    pub fn has_room(&self) -> bool {
        self.room.is_some()
    }

    pub fn run_all(&mut self, commands: Vec<Command>) {
        for cmd in commands {
            self.run(cmd);
        }
    }

    fn spawn_session<F>(&self, fut: F)
    where
        F: std::future::Future<Output = Action> + Send + 'static,
    {
        let tx = self.event_tx.clone();
        self.runtime.spawn(async move {
            let action = fut.await;
            let _ = tx.send(AppEvent::Session(action));
        });
    }

    pub fn run(&mut self, cmd: Command) {
        match cmd {
            Command::RequestCredential { session, name } => {
                log::info!("[effects] {} requesting credential", session);
                let backend = self.backend.clone();
                self.spawn_session(async move {
                    let result = backend.get_token(&name).await;
                    Action::CredentialIssued { session, result }
                });
            }
            Command::JoinRoom {
                session,
                credential,
            } => {
                self.leave_room();
                self.room = Some(room_session::join(
                    &self.runtime,
                    self.room_url.clone(),
                    credential,
                    session,
                    self.event_tx.clone(),
                ));
            }
            Command::LeaveRoom { session } => {
                if self.room.as_ref().is_some_and(|r| r.session == session) {
                    self.leave_room();
                }
            }
            Command::FetchLocation { session } => {
                let backend = self.backend.clone();
                self.spawn_session(async move {
                    let result = backend.fetch_map().await;
                    Action::LocationLoaded { session, result }
                });
            }
            Command::UploadPhoto {
                session,
                seq,
                photo,
            } => {
                log::info!(
                    "[effects] {} uploading {} ({} bytes)",
                    session,
                    photo.file_name,
                    photo.bytes.len()
                );
                let backend = self.backend.clone();
                self.spawn_session(async move {
                    let result = backend.upload_photo(&photo).await;
                    Action::PhotoUploaded {
                        session,
                        seq,
                        result,
                    }
                });
            }
            Command::SharePhoto { session, seq, url } => {
                let backend = self.backend.clone();
                self.spawn_session(async move {
                    let result = backend.share_photo(&url).await;
                    Action::PhotoShared {
                        session,
                        seq,
                        result,
                    }
                });
            }
            Command::SetMicrophone { session, enabled } => match &self.room {
                Some(room) if room.session == session => {
                    room.send(RoomControl::SetMicrophone(enabled));
                }
                _ => log::debug!("[effects] {} no room for microphone control", session),
            },
        }
    }

    fn leave_room(&mut self) {
        if let Some(room) = self.room.take() {
            log::info!("[effects] {} leaving room", room.session);
            room.leave();
        }
    }

    pub fn ping(&self) {
        let backend = self.backend.clone();
        let tx = self.event_tx.clone();
        self.runtime.spawn(async move {
            let result = backend.ping().await;
            let _ = tx.send(AppEvent::PingFinished(result));
        });
    }
}
