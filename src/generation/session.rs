use std::fmt;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::api::types::ProgressEvent;

/// Observed phase of one audio-generation job.
///
/// A session flows through: IDLE → STARTING → QUEUED → GENERATING_VOICES →
/// GENERATING_SEGMENTS → STITCHING → COMPLETED, with ERROR and CANCELLED as
/// the other terminal states. CONNECTION_LOST is a degraded observer state,
/// not a statement about the job itself: the server may still be working.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationPhase {
    Idle,
    Starting,
    Queued,
    GeneratingVoices,
    GeneratingSegments,
    Stitching,
    Completed,
    Error,
    Cancelled,
    ConnectionLost,
}

impl GenerationPhase {
    /// Terminal phases never change again; cancel and progress events are
    /// ignored once one is reached.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GenerationPhase::Completed | GenerationPhase::Error | GenerationPhase::Cancelled
        )
    }

    /// Map a server status string onto a phase. Unknown strings yield `None`
    /// and leave the phase untouched; the log still records them verbatim.
    pub fn from_wire(status: &str) -> Option<Self> {
        match status {
            "QUEUED" => Some(GenerationPhase::Queued),
            "GENERATING_VOICES" => Some(GenerationPhase::GeneratingVoices),
            "GENERATING_SEGMENTS" => Some(GenerationPhase::GeneratingSegments),
            "STITCHING" => Some(GenerationPhase::Stitching),
            "COMPLETED" => Some(GenerationPhase::Completed),
            "ERROR" => Some(GenerationPhase::Error),
            "CANCELLED" => Some(GenerationPhase::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for GenerationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationPhase::Idle => write!(f, "IDLE"),
            GenerationPhase::Starting => write!(f, "STARTING"),
            GenerationPhase::Queued => write!(f, "QUEUED"),
            GenerationPhase::GeneratingVoices => write!(f, "GENERATING_VOICES"),
            GenerationPhase::GeneratingSegments => write!(f, "GENERATING_SEGMENTS"),
            GenerationPhase::Stitching => write!(f, "STITCHING"),
            GenerationPhase::Completed => write!(f, "COMPLETED"),
            GenerationPhase::Error => write!(f, "ERROR"),
            GenerationPhase::Cancelled => write!(f, "CANCELLED"),
            GenerationPhase::ConnectionLost => write!(f, "CONNECTION_LOST"),
        }
    }
}

/// One line of the append-only progress log. Status and message are stored
/// verbatim as received, never rewritten by later events.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub status: String,
    pub message: String,
    pub received_at: DateTime<Utc>,
}

/// Client-side record of one generation job for one podcast.
#[derive(Debug, Clone)]
pub struct GenerationSession {
    podcast_id: i64,
    phase: GenerationPhase,
    progress: u8,
    log: Vec<LogEntry>,
    audio_url: Option<String>,
}

impl GenerationSession {
    pub fn new(podcast_id: i64) -> Self {
        Self {
            podcast_id,
            phase: GenerationPhase::Idle,
            progress: 0,
            log: Vec::new(),
            audio_url: None,
        }
    }

    pub fn podcast_id(&self) -> i64 {
        self.podcast_id
    }

    pub fn phase(&self) -> GenerationPhase {
        self.phase
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn audio_url(&self) -> Option<&str> {
        self.audio_url.as_deref()
    }

    /// Mark the start request as sent. Also begins a regeneration of a
    /// finished session: the log, progress and audio URL reset to a fresh
    /// run.
    pub fn begin(&mut self) {
        debug!(podcast_id = self.podcast_id, "generation starting");
        self.phase = GenerationPhase::Starting;
        self.progress = 0;
        self.log.clear();
        self.audio_url = None;
    }

    /// The start request itself failed; the session ends immediately with
    /// the failure as its only log entry.
    pub fn fail_to_start(&mut self, message: &str) {
        self.phase = GenerationPhase::Error;
        self.log.push(LogEntry {
            status: GenerationPhase::Error.to_string(),
            message: message.to_string(),
            received_at: Utc::now(),
        });
    }

    /// Apply one progress event. Events against a terminal session are
    /// ignored (late frames after completion or cancellation). Returns
    /// whether the event was recorded.
    pub fn apply_event(&mut self, event: &ProgressEvent) -> bool {
        if self.phase.is_terminal() {
            debug!(status = %event.status, "event after terminal phase ignored");
            return false;
        }

        self.log.push(LogEntry {
            status: event.status.clone(),
            message: event.message.clone().unwrap_or_default(),
            received_at: Utc::now(),
        });
        self.progress = event.progress;

        if let Some(phase) = GenerationPhase::from_wire(&event.status) {
            self.phase = phase;
            if phase == GenerationPhase::Completed {
                self.audio_url = event.audio_url.clone();
            }
        }
        true
    }

    /// Cancel the session. Valid from any non-terminal phase, including
    /// `ConnectionLost`; a no-op once terminal. Cancellation wins over any
    /// event that arrives afterwards.
    pub fn cancel(&mut self) -> bool {
        if self.phase.is_terminal() {
            return false;
        }
        self.phase = GenerationPhase::Cancelled;
        true
    }

    /// The progress channel gave up reconnecting. The log so far is kept;
    /// a terminal session stays terminal.
    pub fn connection_lost(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = GenerationPhase::ConnectionLost;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(status: &str, progress: u8) -> ProgressEvent {
        ProgressEvent {
            status: status.to_string(),
            progress,
            message: Some(format!("{status} in progress")),
            audio_url: None,
        }
    }

    #[test]
    fn happy_path_walks_all_phases() {
        let mut session = GenerationSession::new(42);
        assert_eq!(session.phase(), GenerationPhase::Idle);

        session.begin();
        assert_eq!(session.phase(), GenerationPhase::Starting);

        for (status, progress) in [
            ("QUEUED", 0),
            ("GENERATING_VOICES", 20),
            ("GENERATING_SEGMENTS", 55),
            ("STITCHING", 90),
        ] {
            assert!(session.apply_event(&event(status, progress)));
        }
        assert_eq!(session.phase(), GenerationPhase::Stitching);
        assert_eq!(session.progress(), 90);

        let done = ProgressEvent {
            status: "COMPLETED".into(),
            progress: 100,
            message: None,
            audio_url: Some("/audio/42.mp3".into()),
        };
        assert!(session.apply_event(&done));
        assert_eq!(session.phase(), GenerationPhase::Completed);
        assert_eq!(session.audio_url(), Some("/audio/42.mp3"));
        assert_eq!(session.log().len(), 5);
    }

    #[test]
    fn log_records_events_verbatim_in_order() {
        let mut session = GenerationSession::new(42);
        session.begin();
        session.apply_event(&event("QUEUED", 0));
        session.apply_event(&event("WARMING_UP", 5));
        session.apply_event(&event("QUEUED", 0));

        let statuses: Vec<&str> = session.log().iter().map(|e| e.status.as_str()).collect();
        assert_eq!(statuses, vec!["QUEUED", "WARMING_UP", "QUEUED"]);
    }

    #[test]
    fn unknown_status_is_logged_but_keeps_phase() {
        let mut session = GenerationSession::new(42);
        session.begin();
        session.apply_event(&event("QUEUED", 0));
        session.apply_event(&event("SOMETHING_NEW", 10));
        assert_eq!(session.phase(), GenerationPhase::Queued);
        assert_eq!(session.log().len(), 2);
        assert_eq!(session.progress(), 10);
    }

    #[test]
    fn events_after_terminal_phase_are_ignored() {
        let mut session = GenerationSession::new(42);
        session.begin();
        session.apply_event(&event("ERROR", 30));
        assert_eq!(session.phase(), GenerationPhase::Error);

        assert!(!session.apply_event(&event("GENERATING_VOICES", 40)));
        assert_eq!(session.phase(), GenerationPhase::Error);
        assert_eq!(session.log().len(), 1);
    }

    #[test]
    fn cancel_wins_over_later_events() {
        let mut session = GenerationSession::new(42);
        session.begin();
        session.apply_event(&event("GENERATING_VOICES", 25));

        assert!(session.cancel());
        assert_eq!(session.phase(), GenerationPhase::Cancelled);

        // A frame already in flight when the user cancelled.
        assert!(!session.apply_event(&event("GENERATING_SEGMENTS", 50)));
        assert_eq!(session.phase(), GenerationPhase::Cancelled);
    }

    #[test]
    fn cancel_is_noop_once_terminal() {
        let mut session = GenerationSession::new(42);
        session.begin();
        session.apply_event(&event("COMPLETED", 100));
        assert!(!session.cancel());
        assert_eq!(session.phase(), GenerationPhase::Completed);
    }

    #[test]
    fn cancel_applies_from_connection_lost() {
        let mut session = GenerationSession::new(42);
        session.begin();
        session.apply_event(&event("QUEUED", 0));
        session.connection_lost();
        assert_eq!(session.phase(), GenerationPhase::ConnectionLost);

        assert!(session.cancel());
        assert_eq!(session.phase(), GenerationPhase::Cancelled);
        // The log survives the degraded connection.
        assert_eq!(session.log().len(), 1);
    }

    #[test]
    fn connection_lost_never_overrides_terminal() {
        let mut session = GenerationSession::new(42);
        session.begin();
        session.apply_event(&event("COMPLETED", 100));
        session.connection_lost();
        assert_eq!(session.phase(), GenerationPhase::Completed);
    }

    #[test]
    fn regeneration_resets_to_a_fresh_run() {
        let mut session = GenerationSession::new(42);
        session.begin();
        let done = ProgressEvent {
            status: "COMPLETED".into(),
            progress: 100,
            message: None,
            audio_url: Some("/audio/42.mp3".into()),
        };
        session.apply_event(&done);

        session.begin();
        assert_eq!(session.phase(), GenerationPhase::Starting);
        assert_eq!(session.progress(), 0);
        assert!(session.log().is_empty());
        assert!(session.audio_url().is_none());
    }

    #[test]
    fn failed_start_is_sole_log_entry() {
        let mut session = GenerationSession::new(42);
        session.begin();
        session.fail_to_start("generation pool full");
        assert_eq!(session.phase(), GenerationPhase::Error);
        assert_eq!(session.log().len(), 1);
        assert_eq!(session.log()[0].message, "generation pool full");
    }

    #[test]
    fn phase_display_matches_wire_strings() {
        assert_eq!(GenerationPhase::GeneratingVoices.to_string(), "GENERATING_VOICES");
        assert_eq!(
            GenerationPhase::from_wire("GENERATING_VOICES"),
            Some(GenerationPhase::GeneratingVoices)
        );
        assert_eq!(GenerationPhase::from_wire("NOT_A_STATUS"), None);
    }
}
