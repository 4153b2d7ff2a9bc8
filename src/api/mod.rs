pub mod client;
pub mod error;
pub mod types;

pub use client::ApiClient;
pub use error::ApiError;
pub use types::{
    ContextRecord, ParticipantRecord, PodcastRecord, PodcastRef, ProgressEvent, SampleDraft,
    SampleOutcome, ScrapedContent, TranscriptContent, TranscriptRecord, Voice, WireMessage,
};
