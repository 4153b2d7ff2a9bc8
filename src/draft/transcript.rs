use thiserror::Error;

use crate::api::types::{PodcastRef, TranscriptContent, TranscriptRecord, WireMessage};

use super::entity::Lifecycle;

/// One spoken line of a transcript draft.
///
/// `timing` is a non-negative offset and need not be monotonic; display
/// order is array order.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub participant_id: i64,
    pub content: String,
    pub timing: u32,
}

#[derive(Debug, Error, PartialEq)]
pub enum TranscriptError {
    /// A message references a participant that does not belong to the
    /// owning podcast.
    #[error("message references unknown participant {participant_id}")]
    UnknownParticipant { participant_id: i64 },
}

/// The transcript draft owned 1:1 by a podcast.
///
/// Construction and mutation validate that every message references a
/// participant of the same podcast; a violating set is rejected outright
/// rather than partially applied.
#[derive(Debug, Clone)]
pub struct TranscriptDraft {
    pub identity: Option<i64>,
    pub lifecycle: Lifecycle,
    messages: Vec<Message>,
}

impl TranscriptDraft {
    /// An empty, locally created transcript.
    pub fn local() -> Self {
        Self {
            identity: None,
            lifecycle: Lifecycle::New,
            messages: Vec::new(),
        }
    }

    /// Build a draft from a persisted transcript record (edit mode). The
    /// record has already been normalized to the single tagged shape at the
    /// API boundary.
    pub fn from_record(record: &TranscriptRecord) -> Self {
        let messages = record
            .content
            .messages
            .iter()
            .map(|m| Message {
                participant_id: m.participant_id,
                content: m.content.clone(),
                timing: m.timing,
            })
            .collect();
        Self {
            identity: record.id,
            lifecycle: if record.id.is_some() {
                Lifecycle::Clean
            } else {
                Lifecycle::New
            },
            messages,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Replace the message sequence, rejecting any message that references a
    /// participant outside `participant_ids`. On success the lifecycle
    /// advances like any other edit.
    pub fn set_messages(
        &mut self,
        messages: Vec<Message>,
        participant_ids: &[i64],
    ) -> Result<(), TranscriptError> {
        validate_references(&messages, participant_ids)?;
        self.messages = messages;
        self.lifecycle = match self.identity {
            None => Lifecycle::New,
            Some(_) => Lifecycle::Dirty,
        };
        Ok(())
    }

    /// Replace local state with the server's returned representation.
    pub fn apply_record(&mut self, record: &TranscriptRecord) {
        *self = Self::from_record(record);
    }

    /// Wire representation for create/update requests.
    pub fn to_record(&self, podcast_id: Option<i64>) -> TranscriptRecord {
        TranscriptRecord {
            id: self.identity,
            content: TranscriptContent {
                messages: self
                    .messages
                    .iter()
                    .map(|m| WireMessage {
                        participant_id: m.participant_id,
                        content: m.content.clone(),
                        timing: m.timing,
                    })
                    .collect(),
            },
            podcast: podcast_id.map(|id| PodcastRef { id }),
        }
    }
}

/// Check that every message references one of the given participant ids.
pub fn validate_references(
    messages: &[Message],
    participant_ids: &[i64],
) -> Result<(), TranscriptError> {
    for message in messages {
        if !participant_ids.contains(&message.participant_id) {
            return Err(TranscriptError::UnknownParticipant {
                participant_id: message.participant_id,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(participant_id: i64, content: &str, timing: u32) -> Message {
        Message {
            participant_id,
            content: content.to_string(),
            timing,
        }
    }

    #[test]
    fn accepts_messages_referencing_known_participants() {
        let mut transcript = TranscriptDraft::local();
        transcript
            .set_messages(vec![msg(1, "Hi", 0), msg(2, "Hello", 4), msg(1, "So…", 9)], &[1, 2])
            .unwrap();
        assert_eq!(transcript.messages().len(), 3);
        assert_eq!(transcript.lifecycle, Lifecycle::New);
    }

    #[test]
    fn rejects_unknown_participant_reference() {
        let mut transcript = TranscriptDraft::local();
        let err = transcript
            .set_messages(vec![msg(1, "Hi", 0), msg(99, "??", 2)], &[1, 2])
            .unwrap_err();
        assert_eq!(err, TranscriptError::UnknownParticipant { participant_id: 99 });
        // Rejection leaves the draft unchanged.
        assert!(transcript.messages().is_empty());
    }

    #[test]
    fn timing_need_not_be_monotonic() {
        let mut transcript = TranscriptDraft::local();
        transcript
            .set_messages(vec![msg(1, "late", 30), msg(2, "early", 5)], &[1, 2])
            .unwrap();
        assert_eq!(transcript.messages()[0].timing, 30);
    }

    #[test]
    fn edit_dirties_persisted_transcript() {
        let record = TranscriptRecord {
            id: Some(6),
            content: TranscriptContent { messages: vec![] },
            podcast: None,
        };
        let mut transcript = TranscriptDraft::from_record(&record);
        assert_eq!(transcript.lifecycle, Lifecycle::Clean);
        transcript.set_messages(vec![msg(1, "Hi", 0)], &[1]).unwrap();
        assert_eq!(transcript.lifecycle, Lifecycle::Dirty);
    }

    // Randomized referential-integrity sweep: construction must succeed
    // exactly when every generated message references a generated
    // participant id.
    #[test]
    fn random_message_sets_honor_referential_integrity() {
        let mut seed: u64 = 0x9E3779B97F4A7C15;
        let mut next = move || {
            // xorshift64*
            seed ^= seed >> 12;
            seed ^= seed << 25;
            seed ^= seed >> 27;
            seed.wrapping_mul(0x2545F4914F6CDD1D)
        };

        for _ in 0..500 {
            let participant_count = (next() % 5) as i64 + 1;
            let participant_ids: Vec<i64> = (1..=participant_count).collect();

            let message_count = (next() % 8) as usize;
            let messages: Vec<Message> = (0..message_count)
                .map(|i| {
                    // Roughly one in six references an id outside the set.
                    let id = if next() % 6 == 0 {
                        participant_count + 1 + (next() % 3) as i64
                    } else {
                        (next() % participant_count as u64) as i64 + 1
                    };
                    msg(id, "line", i as u32)
                })
                .collect();

            let has_violation = messages
                .iter()
                .any(|m| !participant_ids.contains(&m.participant_id));

            let mut transcript = TranscriptDraft::local();
            let result = transcript.set_messages(messages, &participant_ids);
            assert_eq!(result.is_err(), has_violation);
        }
    }
}
