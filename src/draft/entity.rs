use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::Value;

use crate::api::types::{ParticipantRecord, PodcastRef};

/// The kinds of domain entity a wizard session drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntityKind {
    Metadata,
    Context,
    Participant,
    Transcript,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Metadata => write!(f, "metadata"),
            EntityKind::Context => write!(f, "context"),
            EntityKind::Participant => write!(f, "participant"),
            EntityKind::Transcript => write!(f, "transcript"),
        }
    }
}

/// Persistence lifecycle of one draft entity.
///
/// `Clean` always implies a server-assigned identity; a sample-populated or
/// locally created entity is `New` until the first reconciliation persists it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Matches the backend of record, unedited since load or last save.
    Clean,
    /// Created locally, no identity yet.
    New,
    /// Has an identity but carries local edits since the last sync.
    Dirty,
}

impl Lifecycle {
    /// Whether a reconciliation pass must persist this entity.
    pub fn needs_save(self) -> bool {
        matches!(self, Lifecycle::New | Lifecycle::Dirty)
    }
}

/// In-memory draft of one persisted-or-pending entity.
///
/// Field values live in a name→value map; the touched-set records which
/// fields the user has explicitly edited and is tracked independently of the
/// lifecycle — it governs placeholder clearing, not persistence.
#[derive(Debug, Clone)]
pub struct EntityDraft {
    pub kind: EntityKind,
    pub identity: Option<i64>,
    pub lifecycle: Lifecycle,
    fields: BTreeMap<String, Value>,
    touched: BTreeSet<String>,
}

impl EntityDraft {
    /// An empty, locally created draft.
    pub fn local(kind: EntityKind) -> Self {
        Self {
            kind,
            identity: None,
            lifecycle: Lifecycle::New,
            fields: BTreeMap::new(),
            touched: BTreeSet::new(),
        }
    }

    /// A draft populated from server-suggested sample data. All fields start
    /// untouched: they render as placeholders until the user's first focus.
    pub fn sample(kind: EntityKind, fields: BTreeMap<String, Value>) -> Self {
        Self {
            kind,
            identity: None,
            lifecycle: Lifecycle::New,
            fields,
            touched: BTreeSet::new(),
        }
    }

    /// A draft populated from the backend of record. Everything is marked
    /// touched (nothing is placeholder text in edit mode) and the lifecycle
    /// is `Clean`.
    pub fn existing(kind: EntityKind, identity: i64, fields: BTreeMap<String, Value>) -> Self {
        let touched = fields.keys().cloned().collect();
        Self {
            kind,
            identity: Some(identity),
            lifecycle: Lifecycle::Clean,
            fields,
            touched,
        }
    }

    pub fn value(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Current string value of a field, empty when unset or non-string.
    pub fn text(&self, field: &str) -> &str {
        self.fields
            .get(field)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Current numeric value of a field, zero when unset.
    pub fn number(&self, field: &str) -> u64 {
        self.fields
            .get(field)
            .and_then(Value::as_u64)
            .unwrap_or_default()
    }

    pub fn is_touched(&self, field: &str) -> bool {
        self.touched.contains(field)
    }

    /// First-focus placeholder clearing. In create mode an untouched field
    /// drops its sample value and becomes an empty, touched field; any later
    /// focus is a no-op. Returns whether the value was cleared.
    pub fn focus(&mut self, field: &str, create_mode: bool) -> bool {
        if !create_mode || self.is_touched(field) {
            return false;
        }
        self.fields.insert(field.to_string(), Value::String(String::new()));
        self.touched.insert(field.to_string());
        true
    }

    /// Commit a user edit: mark the field touched and advance the lifecycle
    /// (`New` while unpersisted, `Clean → Dirty` on the first edit).
    pub fn set(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_string(), value);
        self.touched.insert(field.to_string());
        self.lifecycle = match self.identity {
            None => Lifecycle::New,
            Some(_) => match self.lifecycle {
                Lifecycle::Clean | Lifecycle::Dirty => Lifecycle::Dirty,
                Lifecycle::New => Lifecycle::Dirty,
            },
        };
    }

    /// Write a field without touching it or dirtying the entity. Used for
    /// derived values such as the default voice resolved from a gender edit.
    pub fn set_untracked(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_string(), value);
    }

    /// Replace this draft with the server's returned representation after a
    /// successful create/update.
    pub fn mark_saved(&mut self, identity: i64, fields: BTreeMap<String, Value>) {
        self.identity = Some(identity);
        self.lifecycle = Lifecycle::Clean;
        self.touched = fields.keys().cloned().collect();
        self.fields = fields;
    }
}

/// Participant specialization of [`EntityDraft`].
///
/// Carries the voice selection (a weak reference, looked up by id), the
/// preview audio URL, and an in-flight flag for preview synthesis — kept
/// separate from the lifecycle so a field edited mid-save is never dropped.
#[derive(Debug, Clone)]
pub struct ParticipantDraft {
    pub entity: EntityDraft,
    pub selected_voice: Option<i64>,
    pub voice_preview_url: Option<String>,
    pub generating_voice: bool,
}

impl ParticipantDraft {
    pub fn local() -> Self {
        Self {
            entity: EntityDraft::local(EntityKind::Participant),
            selected_voice: None,
            voice_preview_url: None,
            generating_voice: false,
        }
    }

    /// Build a draft from a persisted participant record (edit mode).
    pub fn from_record(record: &ParticipantRecord) -> Self {
        let identity = record.id.unwrap_or_default();
        let entity = EntityDraft::existing(
            EntityKind::Participant,
            identity,
            participant_fields(record),
        );
        Self {
            entity,
            selected_voice: None,
            voice_preview_url: record.voice_preview_url.clone(),
            generating_voice: false,
        }
    }

    /// Build a draft from sample data (create mode, fields untouched).
    pub fn from_sample(record: &ParticipantRecord) -> Self {
        Self {
            entity: EntityDraft::sample(EntityKind::Participant, participant_fields(record)),
            selected_voice: None,
            voice_preview_url: record.voice_preview_url.clone(),
            generating_voice: false,
        }
    }

    /// Replace local state with the server's returned representation.
    pub fn apply_record(&mut self, record: &ParticipantRecord) {
        if let Some(id) = record.id {
            self.entity.mark_saved(id, participant_fields(record));
        }
        if record.voice_preview_url.is_some() {
            self.voice_preview_url = record.voice_preview_url.clone();
        }
    }

    /// Wire representation for create/update requests. Update bodies always
    /// include the parent podcast reference.
    pub fn to_record(&self, podcast_id: Option<i64>) -> ParticipantRecord {
        ParticipantRecord {
            id: self.entity.identity,
            name: self.entity.text("name").to_string(),
            gender: self.entity.text("gender").to_string(),
            age: self.entity.number("age") as u32,
            role: self.entity.text("role").to_string(),
            role_description: self.entity.text("roleDescription").to_string(),
            voice_characteristics: self.entity.text("voiceCharacteristics").to_string(),
            synthetic_voice_id: self.selected_voice.map(|id| id.to_string()),
            voice_preview_url: self.voice_preview_url.clone(),
            podcast: podcast_id.map(|id| PodcastRef { id }),
        }
    }
}

fn participant_fields(record: &ParticipantRecord) -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("name".to_string(), Value::String(record.name.clone())),
        ("gender".to_string(), Value::String(record.gender.clone())),
        ("age".to_string(), Value::from(record.age)),
        ("role".to_string(), Value::String(record.role.clone())),
        (
            "roleDescription".to_string(),
            Value::String(record.role_description.clone()),
        ),
        (
            "voiceCharacteristics".to_string(),
            Value::String(record.voice_characteristics.clone()),
        ),
    ])
}
