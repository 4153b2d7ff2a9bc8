//! Wire types exchanged with the podcast backend.
//!
//! All structs serialize to the backend's camelCase JSON. Update bodies carry
//! the parent podcast as a nested reference (`{"podcast": {"id": 42}}`),
//! matching the entity shapes the server persists.

use serde::{Deserialize, Serialize};

/// Nested parent reference used by create/update bodies for child entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodcastRef {
    pub id: i64,
}

/// A podcast as the backend persists it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodcastRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    pub description: String,
    pub length: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Source context attached 1:1 to a podcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub description_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub podcast: Option<PodcastRef>,
}

/// A podcast participant as the backend persists it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub role_description: String,
    #[serde(default)]
    pub voice_characteristics: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthetic_voice_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_preview_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub podcast: Option<PodcastRef>,
}

/// One spoken line of the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    pub participant_id: i64,
    pub content: String,
    pub timing: u32,
}

/// The JSON `content` column of a transcript row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptContent {
    #[serde(default)]
    pub messages: Vec<WireMessage>,
}

/// A transcript as the backend persists it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub content: TranscriptContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub podcast: Option<PodcastRef>,
}

/// The transcript-by-podcast endpoint answers either a bare object or a
/// one-element array depending on the server version. Normalized here, at
/// ingestion, so no other module ever sees the ambiguity.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Collapse to the single record, taking the first element of the
    /// array-shaped variant.
    pub fn into_first(self) -> Option<T> {
        match self {
            OneOrMany::One(record) => Some(record),
            OneOrMany::Many(records) => records.into_iter().next(),
        }
    }
}

/// A synthesized voice available for assignment to participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voice {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub external_voice_id: String,
    pub voice_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub gender: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub audio_preview_path: String,
}

/// Server-suggested prefill draft for create mode (metadata plus context).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleDraft {
    pub title: String,
    pub description: String,
    #[serde(default = "default_sample_length")]
    pub length: u32,
    #[serde(default)]
    pub context_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_url: Option<String>,
}

fn default_sample_length() -> u32 {
    30
}

/// Outcome of a sample suggestion request. The feature can be switched off
/// server-side, which is a distinct non-error answer.
#[derive(Debug, Clone)]
pub enum SampleOutcome<T> {
    Supplied(T),
    Disabled,
}

impl<T> SampleOutcome<T> {
    pub fn supplied(self) -> Option<T> {
        match self {
            SampleOutcome::Supplied(value) => Some(value),
            SampleOutcome::Disabled => None,
        }
    }
}

/// Title/description text extracted from a URL or uploaded document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedContent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// One event on the generation progress channel, passed to the consumer
/// unmodified and in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub status: String,
    #[serde(default)]
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_serializes_parent_reference() {
        let participant = ParticipantRecord {
            id: Some(7),
            name: "Host".into(),
            gender: "female".into(),
            age: 35,
            role: "host".into(),
            role_description: "Leads the conversation".into(),
            voice_characteristics: "warm".into(),
            synthetic_voice_id: None,
            voice_preview_url: None,
            podcast: Some(PodcastRef { id: 42 }),
        };
        let json = serde_json::to_value(&participant).unwrap();
        assert_eq!(json["podcast"]["id"], 42);
        assert_eq!(json["roleDescription"], "Leads the conversation");
    }

    #[test]
    fn transcript_lookup_accepts_bare_object() {
        let json = r#"{"id": 3, "content": {"messages": []}}"#;
        let parsed: OneOrMany<TranscriptRecord> = serde_json::from_str(json).unwrap();
        let record = parsed.into_first().unwrap();
        assert_eq!(record.id, Some(3));
    }

    #[test]
    fn transcript_lookup_accepts_one_element_array() {
        let json = r#"[{"id": 9, "content": {"messages": [
            {"participantId": 1, "content": "Hello", "timing": 0}
        ]}}]"#;
        let parsed: OneOrMany<TranscriptRecord> = serde_json::from_str(json).unwrap();
        let record = parsed.into_first().unwrap();
        assert_eq!(record.id, Some(9));
        assert_eq!(record.content.messages.len(), 1);
        assert_eq!(record.content.messages[0].participant_id, 1);
    }

    #[test]
    fn transcript_lookup_empty_array_is_none() {
        let parsed: OneOrMany<TranscriptRecord> = serde_json::from_str("[]").unwrap();
        assert!(parsed.into_first().is_none());
    }

    #[test]
    fn progress_event_parses_wire_payload() {
        let json = r#"{"status":"GENERATING_VOICES","progress":10,"message":"voices"}"#;
        let event: ProgressEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.status, "GENERATING_VOICES");
        assert_eq!(event.progress, 10);
        assert_eq!(event.message.as_deref(), Some("voices"));
        assert!(event.audio_url.is_none());
    }

    #[test]
    fn progress_event_parses_audio_url() {
        let json = r#"{"status":"COMPLETED","progress":100,"audioUrl":"/api/audio/5.mp3"}"#;
        let event: ProgressEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.audio_url.as_deref(), Some("/api/audio/5.mp3"));
    }
}
