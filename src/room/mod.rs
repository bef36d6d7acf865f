pub mod session;

use crate::session::transcript::{Speaker, TranscriptSegment};
use serde::Deserialize;
use serde_json::{json, Value};

/// What the voice agent is doing, as reported by the room gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    Initializing,
    Listening,
    Thinking,
    Speaking,
    Disconnected,
}

impl AgentState {
    pub fn label(self) -> &'static str {
        match self {
            AgentState::Initializing => "Connecting...",
            AgentState::Listening => "Listening",
            AgentState::Thinking => "Thinking",
            AgentState::Speaking => "Speaking",
            AgentState::Disconnected => "Disconnected",
        }
    }
}

/// Events the room client delivers to the session controller.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    Connected,
    Disconnected { reason: Option<String> },
    /// Full current sequence for one participant.
    Transcription {
        speaker: Speaker,
        segments: Vec<TranscriptSegment>,
    },
    AgentState(AgentState),
}

/// Requests sent from the app into the live room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomControl {
    SetMicrophone(bool),
}

impl RoomControl {
    pub fn to_frame(self) -> Value {
        match self {
            RoomControl::SetMicrophone(enabled) => json!({
                "type": "set_microphone",
                "enabled": enabled,
            }),
        }
    }
}

/// Text frames published by the room gateway.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayMessage {
    Transcription {
        participant: Speaker,
        #[serde(default)]
        segments: Vec<TranscriptSegment>,
    },
    AgentState {
        state: AgentState,
    },
    Disconnect {
        #[serde(default)]
        reason: Option<String>,
    },
}

pub fn parse_gateway_message(text: &str) -> Option<GatewayMessage> {
    match serde_json::from_str(text) {
        Ok(msg) => Some(msg),
        Err(e) => {
            log::debug!("[room] ignoring frame ({}): {}", e, text);
            None
        }
    }
}

/// Per-participant segment history as observed on the wire.
///
/// New segments are appended in arrival order. An interim segment may be revised
/// by a later frame with the same id; once a segment is final it is frozen.
#[derive(Debug, Default)]
pub struct TranscriptBuffer {
    agent: Vec<TranscriptSegment>,
    user: Vec<TranscriptSegment>,
}

impl TranscriptBuffer {
    /// Merge `incoming` into the speaker's history. Returns the full history
    /// when anything changed.
    pub fn apply(
        &mut self,
        speaker: Speaker,
        incoming: Vec<TranscriptSegment>,
    ) -> Option<Vec<TranscriptSegment>> {
        let history = match speaker {
            Speaker::Agent => &mut self.agent,
            Speaker::User => &mut self.user,
        };
        let mut changed = false;
        for seg in incoming {
            let existing = history.iter_mut().find(|s| same_segment(s, &seg));
            match existing {
                Some(prev) if prev.is_final => {}
                Some(prev) => {
                    if *prev != seg {
                        *prev = seg;
                        changed = true;
                    }
                }
                None => {
                    history.push(seg);
                    changed = true;
                }
            }
        }
        changed.then(|| history.clone())
    }
}

/// Segments without an id are keyed by their first receipt time, which stays
/// fixed across interim revisions.
fn same_segment(a: &TranscriptSegment, b: &TranscriptSegment) -> bool {
    match (&a.id, &b.id) {
        (Some(x), Some(y)) => x == y,
        (None, None) => a.received_at == b.received_at,
        _ => false,
    }
}

/// Turn one gateway frame into the event the controller should see.
pub fn translate(text: &str, buffer: &mut TranscriptBuffer) -> Option<RoomEvent> {
    match parse_gateway_message(text)? {
        GatewayMessage::Transcription {
            participant,
            segments,
        } => buffer
            .apply(participant, segments)
            .map(|segments| RoomEvent::Transcription {
                speaker: participant,
                segments,
            }),
        GatewayMessage::AgentState { state } => Some(RoomEvent::AgentState(state)),
        GatewayMessage::Disconnect { reason } => Some(RoomEvent::Disconnected { reason }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(id: &str, text: &str, at: i64, is_final: bool) -> TranscriptSegment {
        TranscriptSegment {
            id: Some(id.into()),
            text: text.into(),
            received_at: at,
            is_final,
        }
    }

    #[test]
    fn parses_each_frame_type() {
        let t = parse_gateway_message(
            r#"{"type":"transcription","participant":"agent","segments":[{"id":"s1","text":"Hello","firstReceivedTime":1000,"final":false}]}"#,
        );
        assert_eq!(
            t,
            Some(GatewayMessage::Transcription {
                participant: Speaker::Agent,
                segments: vec![seg("s1", "Hello", 1000, false)],
            })
        );

        assert_eq!(
            parse_gateway_message(r#"{"type":"agent_state","state":"thinking"}"#),
            Some(GatewayMessage::AgentState {
                state: AgentState::Thinking
            })
        );
        assert_eq!(
            parse_gateway_message(r#"{"type":"disconnect"}"#),
            Some(GatewayMessage::Disconnect { reason: None })
        );
    }

    #[test]
    fn unknown_frames_are_ignored() {
        assert!(parse_gateway_message(r#"{"type":"participant_metadata"}"#).is_none());
        assert!(parse_gateway_message("not json").is_none());
    }

    #[test]
    fn interim_segments_are_revised_until_final() {
        let mut buf = TranscriptBuffer::default();
        let first = buf.apply(Speaker::User, vec![seg("u1", "the", 10, false)]);
        assert_eq!(first.unwrap()[0].text, "the");

        let revised = buf
            .apply(Speaker::User, vec![seg("u1", "there is smoke", 10, true)])
            .unwrap();
        assert_eq!(revised.len(), 1);
        assert_eq!(revised[0].text, "there is smoke");

        // Final segments are frozen.
        assert!(buf
            .apply(Speaker::User, vec![seg("u1", "something else", 10, true)])
            .is_none());
    }

    #[test]
    fn new_ids_append_and_repeats_are_quiet() {
        let mut buf = TranscriptBuffer::default();
        buf.apply(Speaker::Agent, vec![seg("a1", "hi", 1, true)]);
        let out = buf
            .apply(
                Speaker::Agent,
                vec![seg("a1", "hi", 1, true), seg("a2", "stay calm", 3, true)],
            )
            .unwrap();
        assert_eq!(out.len(), 2);
        assert!(buf
            .apply(Speaker::Agent, vec![seg("a2", "stay calm", 3, true)])
            .is_none());
    }

    #[test]
    fn segments_without_ids_are_not_duplicated() {
        let mut buf = TranscriptBuffer::default();
        let frame = r#"{"type":"transcription","participant":"user","segments":[{"text":"help","firstReceivedTime":5,"final":true}]}"#;
        assert!(translate(frame, &mut buf).is_some());
        assert_eq!(translate(frame, &mut buf), None);
        assert_eq!(translate(frame, &mut buf), None);
        assert_eq!(buf.user.len(), 1);
    }

    #[test]
    fn segments_without_ids_are_revised_by_receipt_time() {
        let mut buf = TranscriptBuffer::default();
        let interim = TranscriptSegment {
            id: None,
            text: "fire".into(),
            received_at: 7,
            is_final: false,
        };
        let done = TranscriptSegment {
            text: "fire on the second floor".into(),
            is_final: true,
            ..interim.clone()
        };
        buf.apply(Speaker::User, vec![interim]);
        let out = buf.apply(Speaker::User, vec![done]).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "fire on the second floor");

        let later = TranscriptSegment {
            id: None,
            text: "hurry".into(),
            received_at: 9,
            is_final: true,
        };
        assert_eq!(buf.apply(Speaker::User, vec![later]).unwrap().len(), 2);
    }

    #[test]
    fn speakers_are_tracked_separately() {
        let mut buf = TranscriptBuffer::default();
        buf.apply(Speaker::Agent, vec![seg("x", "agent", 1, true)]);
        let user = buf
            .apply(Speaker::User, vec![seg("x", "user", 2, true)])
            .unwrap();
        assert_eq!(user.len(), 1);
        assert_eq!(user[0].text, "user");
    }

    #[test]
    fn translate_maps_frames_to_events() {
        let mut buf = TranscriptBuffer::default();
        assert_eq!(
            translate(r#"{"type":"agent_state","state":"speaking"}"#, &mut buf),
            Some(RoomEvent::AgentState(AgentState::Speaking))
        );
        assert_eq!(
            translate(r#"{"type":"disconnect","reason":"room closed"}"#, &mut buf),
            Some(RoomEvent::Disconnected {
                reason: Some("room closed".into())
            })
        );
        let frame = r#"{"type":"transcription","participant":"user","segments":[{"id":"u1","text":"help","firstReceivedTime":5,"final":true}]}"#;
        assert!(matches!(
            translate(frame, &mut buf),
            Some(RoomEvent::Transcription { speaker: Speaker::User, .. })
        ));
        // Same frame again changes nothing.
        assert_eq!(translate(frame, &mut buf), None);
    }

    #[test]
    fn microphone_control_frame() {
        assert_eq!(
            RoomControl::SetMicrophone(false).to_frame(),
            json!({"type": "set_microphone", "enabled": false})
        );
    }
}
