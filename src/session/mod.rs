pub mod location;
pub mod media;
pub mod transcript;

use crate::error::ServiceError;
use crate::room::{AgentState, RoomEvent};
use location::{LocationFlow, LocationSnapshot};
use media::{LocalPhoto, MediaFlow, UploadedPhoto};
use transcript::TranscriptAggregator;

/// Generation number of a session. Results tagged with anything other than
/// the live session's id are stale and get dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    Joining,
    Joined,
}

/// Everything that only exists while the room is connected.
#[derive(Debug)]
pub struct ConnectedSession {
    pub credential: String,
    pub room: RoomStatus,
    pub agent_state: AgentState,
    pub microphone_enabled: bool,
    pub transcript: TranscriptAggregator,
    pub media: MediaFlow,
    pub location: LocationFlow,
}

impl ConnectedSession {
    fn new(credential: String) -> Self {
        Self {
            credential,
            room: RoomStatus::Joining,
            agent_state: AgentState::Initializing,
            microphone_enabled: true,
            transcript: TranscriptAggregator::new(),
            media: MediaFlow::new(),
            location: LocationFlow::start(),
        }
    }
}

#[derive(Debug)]
pub enum ConnectionPhase {
    AwaitingName,
    AcquiringCredential,
    Connected(Box<ConnectedSession>),
}

#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub display_name: String,
    pub phase: ConnectionPhase,
}

impl Session {
    pub fn connected(&self) -> Option<&ConnectedSession> {
        match &self.phase {
            ConnectionPhase::Connected(c) => Some(c),
            _ => None,
        }
    }

    fn connected_mut(&mut self) -> Option<&mut ConnectedSession> {
        match &mut self.phase {
            ConnectionPhase::Connected(c) => Some(c),
            _ => None,
        }
    }
}

/// Inputs to the controller: user intent, service results, room events.
#[derive(Debug)]
pub enum Action {
    Open,
    Close,
    SubmitName(String),
    CredentialIssued {
        session: SessionId,
        result: Result<String, ServiceError>,
    },
    Room {
        session: SessionId,
        event: RoomEvent,
    },
    UploadPhoto(Option<LocalPhoto>),
    PhotoUploaded {
        session: SessionId,
        seq: u64,
        result: Result<UploadedPhoto, ServiceError>,
    },
    SharePhoto,
    PhotoShared {
        session: SessionId,
        seq: u64,
        result: Result<(), ServiceError>,
    },
    LocationLoaded {
        session: SessionId,
        result: Result<LocationSnapshot, ServiceError>,
    },
    ToggleMicrophone,
}

/// Side effects requested by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    RequestCredential { session: SessionId, name: String },
    JoinRoom { session: SessionId, credential: String },
    LeaveRoom { session: SessionId },
    FetchLocation { session: SessionId },
    UploadPhoto { session: SessionId, seq: u64, photo: LocalPhoto },
    SharePhoto { session: SessionId, seq: u64, url: String },
    SetMicrophone { session: SessionId, enabled: bool },
}

/// Owns the single SOS session and is the only place its state changes.
#[derive(Debug, Default)]
pub struct Controller {
    session: Option<Session>,
    next_id: u64,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.session.is_none()
    }

    fn current_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.session.as_mut().filter(|s| s.id == id)
    }

    pub fn update(&mut self, action: Action) -> Vec<Command> {
        match action {
            Action::Open => self.open(),
            Action::Close => self.close("closed by user"),
            Action::SubmitName(name) => self.submit_name(&name),
            Action::CredentialIssued { session, result } => {
                self.credential_issued(session, result)
            }
            Action::Room { session, event } => self.room_event(session, event),
            Action::UploadPhoto(file) => self.upload_photo(file),
            Action::PhotoUploaded {
                session,
                seq,
                result,
            } => {
                if let Some(c) = self.current_mut(session).and_then(Session::connected_mut) {
                    c.media.upload_finished(seq, result);
                } else {
                    log::debug!("[session] dropping stale upload result for {}", session);
                }
                vec![]
            }
            Action::SharePhoto => self.share_photo(),
            Action::PhotoShared {
                session,
                seq,
                result,
            } => {
                if let Some(c) = self.current_mut(session).and_then(Session::connected_mut) {
                    c.media.share_finished(seq, result);
                } else {
                    log::debug!("[session] dropping stale share result for {}", session);
                }
                vec![]
            }
            Action::LocationLoaded { session, result } => {
                if let Some(c) = self.current_mut(session).and_then(Session::connected_mut) {
                    c.location.finish(result);
                } else {
                    log::debug!("[session] dropping stale location result for {}", session);
                }
                vec![]
            }
            Action::ToggleMicrophone => self.toggle_microphone(),
        }
    }

    fn open(&mut self) -> Vec<Command> {
        if self.session.is_some() {
            return vec![];
        }
        self.next_id += 1;
        let id = SessionId::new(self.next_id);
        log::info!("[session] {} opened", id);
        self.session = Some(Session {
            id,
            display_name: String::new(),
            phase: ConnectionPhase::AwaitingName,
        });
        vec![]
    }

    fn close(&mut self, reason: &str) -> Vec<Command> {
        let Some(session) = self.session.take() else {
            return vec![];
        };
        log::info!("[session] {} ended: {}", session.id, reason);
        match session.phase {
            ConnectionPhase::Connected(_) => vec![Command::LeaveRoom {
                session: session.id,
            }],
            _ => vec![],
        }
    }

    fn submit_name(&mut self, name: &str) -> Vec<Command> {
        let Some(session) = self.session.as_mut() else {
            return vec![];
        };
        if !matches!(session.phase, ConnectionPhase::AwaitingName) {
            return vec![];
        }
        let name = name.trim();
        if name.is_empty() {
            return vec![];
        }
        session.display_name = name.to_string();
        session.phase = ConnectionPhase::AcquiringCredential;
        vec![Command::RequestCredential {
            session: session.id,
            name: name.to_string(),
        }]
    }

    fn credential_issued(
        &mut self,
        id: SessionId,
        result: Result<String, ServiceError>,
    ) -> Vec<Command> {
        let Some(session) = self.current_mut(id) else {
            log::debug!("[session] dropping stale credential for {}", id);
            return vec![];
        };
        if !matches!(session.phase, ConnectionPhase::AcquiringCredential) {
            return vec![];
        }
        let credential = match result {
            Ok(token) if !token.trim().is_empty() => token.trim().to_string(),
            Ok(_) => {
                log::error!("[session] {} token service returned an empty credential", id);
                session.phase = ConnectionPhase::AwaitingName;
                return vec![];
            }
            Err(e) => {
                log::error!("[session] {} credential request failed: {}", id, e);
                session.phase = ConnectionPhase::AwaitingName;
                return vec![];
            }
        };
        log::info!("[session] {} credential acquired, joining room", id);
        session.phase = ConnectionPhase::Connected(Box::new(ConnectedSession::new(
            credential.clone(),
        )));
        vec![
            Command::JoinRoom {
                session: id,
                credential,
            },
            Command::FetchLocation { session: id },
        ]
    }

    fn room_event(&mut self, id: SessionId, event: RoomEvent) -> Vec<Command> {
        let Some(session) = self.current_mut(id) else {
            log::debug!("[session] dropping room event for stale {}", id);
            return vec![];
        };
        if let RoomEvent::Disconnected { reason } = &event {
            if session.connected().is_none() {
                return vec![];
            }
            let reason = reason.clone().unwrap_or_else(|| "room disconnected".into());
            return self.close(&reason);
        }
        let Some(connected) = session.connected_mut() else {
            return vec![];
        };
        match event {
            RoomEvent::Connected => {
                log::info!("[session] {} room joined", id);
                connected.room = RoomStatus::Joined;
            }
            RoomEvent::Transcription { speaker, segments } => {
                connected.transcript.update(speaker, segments);
            }
            RoomEvent::AgentState(state) => {
                connected.agent_state = state;
            }
            RoomEvent::Disconnected { .. } => {}
        }
        vec![]
    }

    fn upload_photo(&mut self, file: Option<LocalPhoto>) -> Vec<Command> {
        let Some(session) = self.session.as_mut() else {
            return vec![];
        };
        let id = session.id;
        let Some(connected) = session.connected_mut() else {
            return vec![];
        };
        match connected.media.upload(file) {
            Some(req) => vec![Command::UploadPhoto {
                session: id,
                seq: req.seq,
                photo: req.photo,
            }],
            None => vec![],
        }
    }

    fn share_photo(&mut self) -> Vec<Command> {
        let Some(session) = self.session.as_mut() else {
            return vec![];
        };
        let id = session.id;
        let Some(connected) = session.connected_mut() else {
            return vec![];
        };
        match connected.media.share() {
            Some(req) => vec![Command::SharePhoto {
                session: id,
                seq: req.seq,
                url: req.url,
            }],
            None => vec![],
        }
    }

    fn toggle_microphone(&mut self) -> Vec<Command> {
        let Some(session) = self.session.as_mut() else {
            return vec![];
        };
        let id = session.id;
        let Some(connected) = session.connected_mut() else {
            return vec![];
        };
        connected.microphone_enabled = !connected.microphone_enabled;
        vec![Command::SetMicrophone {
            session: id,
            enabled: connected.microphone_enabled,
        }]
    }
}
