pub mod entity;
pub mod store;
pub mod transcript;

pub use entity::{EntityDraft, EntityKind, Lifecycle, ParticipantDraft};
pub use store::{DraftStore, DraftTarget, ReconcileFailure, ReconcileReport, StoreMode};
pub use transcript::{Message, TranscriptDraft, TranscriptError};
