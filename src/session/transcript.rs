use serde::{Deserialize, Serialize};

/// Which side of the conversation a transcript line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Agent,
    User,
}

impl Speaker {
    pub fn label(self) -> &'static str {
        match self {
            Speaker::Agent => "Agent:",
            Speaker::User => "You:",
        }
    }
}

/// One recognized utterance as published by the room for a single participant.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TranscriptSegment {
    #[serde(default)]
    pub id: Option<String>,
    pub text: String,
    /// Epoch milliseconds at which the segment was first received.
    #[serde(rename = "firstReceivedTime", alias = "received_at")]
    pub received_at: i64,
    #[serde(default, rename = "final")]
    pub is_final: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub id: Option<String>,
    pub text: String,
    pub received_at: i64,
}

impl TranscriptEntry {
    /// Stable row key: the segment id, or the merged position when the room
    /// did not supply one.
    pub fn display_key(&self, index: usize) -> String {
        match &self.id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => format!("#{}", index),
        }
    }
}

/// Keeps the latest sequence for each speaker and the merged view derived
/// from both. The merged view is rebuilt from scratch on every update.
#[derive(Debug, Default)]
pub struct TranscriptAggregator {
    agent: Vec<TranscriptSegment>,
    user: Vec<TranscriptSegment>,
    merged: Vec<TranscriptEntry>,
}

impl TranscriptAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace one speaker's sequence and recompute the merged view.
    pub fn update(&mut self, speaker: Speaker, segments: Vec<TranscriptSegment>) {
        match speaker {
            Speaker::Agent => self.agent = segments,
            Speaker::User => self.user = segments,
        }
        self.merged = merge(&self.agent, &self.user);
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.merged
    }

    pub fn is_empty(&self) -> bool {
        self.merged.is_empty()
    }
}

/// Concatenate agent then user lines and order them by receipt time.
/// `sort_by_key` is stable, so equal timestamps keep their source order.
pub fn merge(agent: &[TranscriptSegment], user: &[TranscriptSegment]) -> Vec<TranscriptEntry> {
    let mut all: Vec<TranscriptEntry> = agent
        .iter()
        .map(|s| tagged(Speaker::Agent, s))
        .chain(user.iter().map(|s| tagged(Speaker::User, s)))
        .collect();
    all.sort_by_key(|e| e.received_at);
    all
}

fn tagged(speaker: Speaker, s: &TranscriptSegment) -> TranscriptEntry {
    TranscriptEntry {
        speaker,
        id: s.id.clone(),
        text: s.text.clone(),
        received_at: s.received_at,
    }
}
