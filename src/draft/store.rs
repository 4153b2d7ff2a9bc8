//! The working set of entity drafts for one podcast.
//!
//! [`DraftStore`] owns the metadata, context, participant and transcript
//! drafts of a single wizard session and mediates every mutation and every
//! persistence call. `set_field` never touches the network; only
//! [`DraftStore::reconcile`], the identified branch of
//! [`DraftStore::remove_participant`], and the explicit voice actions
//! perform I/O.

use std::collections::BTreeMap;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use serde_json::Value;

use crate::api::types::{
    ContextRecord, ParticipantRecord, PodcastRecord, PodcastRef, SampleDraft, SampleOutcome,
    TranscriptRecord, Voice,
};
use crate::api::{ApiClient, ApiError};
use crate::error::PodforgeError;

use super::entity::{EntityDraft, EntityKind, Lifecycle, ParticipantDraft};
use super::transcript::{Message, TranscriptDraft, TranscriptError};

/// Whether the session drafts a brand-new podcast or edits a persisted one.
/// Governs the first-focus placeholder clearing contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    Create,
    Edit,
}

/// Addresses one draft inside the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftTarget {
    Metadata,
    Context,
    Participant(usize),
    Transcript,
}

/// One entity whose create/update request failed during reconciliation.
/// The rest of the batch is unaffected.
#[derive(Debug)]
pub struct ReconcileFailure {
    pub target: DraftTarget,
    pub error: ApiError,
}

/// Result of one [`DraftStore::reconcile`] call.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub saved: Vec<DraftTarget>,
    pub failures: Vec<ReconcileFailure>,
}

impl ReconcileReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Server representation returned by one per-entity save request.
enum Applied {
    Podcast(PodcastRecord),
    Context(ContextRecord),
    Participant(ParticipantRecord),
    Transcript(TranscriptRecord),
}

type SaveOutcome = (DraftTarget, Result<Applied, ApiError>);

pub struct DraftStore {
    mode: StoreMode,
    user_id: String,
    podcast_id: Option<i64>,
    pub metadata: EntityDraft,
    pub context: EntityDraft,
    pub participants: Vec<ParticipantDraft>,
    pub transcript: Option<TranscriptDraft>,
    voices: Vec<Voice>,
}

impl DraftStore {
    /// An empty create-mode store. The podcast identity arrives with the
    /// first successful reconciliation.
    pub fn create(user_id: String) -> Self {
        Self {
            mode: StoreMode::Create,
            user_id,
            podcast_id: None,
            metadata: EntityDraft::local(EntityKind::Metadata),
            context: EntityDraft::local(EntityKind::Context),
            participants: Vec::new(),
            transcript: None,
            voices: Vec::new(),
        }
    }

    /// Load an edit-mode store from the backend of record. Every field is
    /// marked touched and every entity starts `Clean`.
    pub async fn load_existing(api: &ApiClient, podcast_id: i64) -> Result<Self, PodforgeError> {
        let podcast = api.get_podcast(podcast_id).await?;
        let context = api.context_by_podcast(podcast_id).await?;
        let participants = api.participants_by_podcast(podcast_id).await?;
        let transcript = api.transcript_by_podcast(podcast_id).await?;

        let podcast_identity = podcast.id.ok_or(PodforgeError::PodcastNotFound(podcast_id))?;
        let context_identity = context.id.unwrap_or_default();

        Ok(Self {
            mode: StoreMode::Edit,
            user_id: api.user_id().to_string(),
            podcast_id: Some(podcast_identity),
            metadata: EntityDraft::existing(
                EntityKind::Metadata,
                podcast_identity,
                metadata_fields(&podcast),
            ),
            context: EntityDraft::existing(
                EntityKind::Context,
                context_identity,
                context_fields(&context),
            ),
            participants: participants.iter().map(ParticipantDraft::from_record).collect(),
            transcript: transcript.as_ref().map(TranscriptDraft::from_record),
            voices: Vec::new(),
        })
    }

    pub fn mode(&self) -> StoreMode {
        self.mode
    }

    pub fn podcast_id(&self) -> Option<i64> {
        self.podcast_id
    }

    /// Populate metadata and context from a server-suggested sample. Sample
    /// data never sets touched fields; everything renders as placeholders.
    /// A disabled sample feature leaves the empty drafts as they are.
    pub fn load_sample(&mut self, outcome: SampleOutcome<SampleDraft>) {
        let Some(sample) = outcome.supplied() else {
            return;
        };
        self.metadata = EntityDraft::sample(
            EntityKind::Metadata,
            BTreeMap::from([
                ("title".to_string(), Value::String(sample.title)),
                ("description".to_string(), Value::String(sample.description)),
                ("length".to_string(), Value::from(sample.length)),
            ]),
        );
        let mut fields = BTreeMap::from([(
            "descriptionText".to_string(),
            Value::String(sample.context_description),
        )]);
        if let Some(url) = sample.context_url {
            fields.insert("sourceUrl".to_string(), Value::String(url));
        }
        self.context = EntityDraft::sample(EntityKind::Context, fields);
    }

    /// Populate the participant roster from sample suggestions.
    pub fn load_sample_participants(&mut self, outcome: SampleOutcome<Vec<ParticipantRecord>>) {
        let Some(records) = outcome.supplied() else {
            return;
        };
        self.participants = records.iter().map(ParticipantDraft::from_sample).collect();
    }

    /// Prefill context description/URL from extracted web or document text.
    pub fn apply_extracted_context(&mut self, title: &str, description: &str, url: Option<&str>) {
        if self.metadata.text("title").is_empty() && !title.is_empty() {
            self.metadata.set("title", Value::String(title.to_string()));
        }
        self.context
            .set("descriptionText", Value::String(description.to_string()));
        if let Some(url) = url {
            self.context.set("sourceUrl", Value::String(url.to_string()));
        }
    }

    /// First-focus placeholder clearing; a no-op in edit mode.
    pub fn focus_field(&mut self, target: DraftTarget, field: &str) {
        let create_mode = self.mode == StoreMode::Create;
        match target {
            DraftTarget::Metadata => {
                self.metadata.focus(field, create_mode);
            }
            DraftTarget::Context => {
                self.context.focus(field, create_mode);
            }
            DraftTarget::Participant(index) => {
                if let Some(participant) = self.participants.get_mut(index) {
                    participant.entity.focus(field, create_mode);
                }
            }
            DraftTarget::Transcript => {}
        }
    }

    /// Commit a user edit. Setting a participant's gender additionally
    /// resolves a default voice from the cached catalog (user-scoped first,
    /// system-wide fallback); resolution failure is silent and the voice
    /// fields stay outside touched/dirty tracking.
    pub fn set_field(&mut self, target: DraftTarget, field: &str, value: Value) {
        match target {
            DraftTarget::Metadata => self.metadata.set(field, value),
            DraftTarget::Context => self.context.set(field, value),
            DraftTarget::Participant(index) => {
                let default_voice = if field == "gender" {
                    value
                        .as_str()
                        .and_then(|gender| self.default_voice_for(gender))
                        .map(|voice| (voice.id, voice.audio_preview_path.clone()))
                } else {
                    None
                };
                if let Some(participant) = self.participants.get_mut(index) {
                    participant.entity.set(field, value);
                    if let Some((voice_id, preview_path)) = default_voice {
                        participant.selected_voice = Some(voice_id);
                        participant.voice_preview_url = Some(preview_path);
                    }
                }
            }
            DraftTarget::Transcript => {}
        }
    }

    /// Append a `New` participant with empty fields.
    pub fn add_participant(&mut self) -> usize {
        self.participants.push(ParticipantDraft::local());
        self.participants.len() - 1
    }

    /// Remove a participant. An identified participant is deleted on the
    /// backend before the local removal; an unidentified one is removed
    /// immediately with no network call.
    pub async fn remove_participant(
        &mut self,
        index: usize,
        api: &ApiClient,
    ) -> Result<(), ApiError> {
        let Some(participant) = self.participants.get(index) else {
            return Ok(());
        };
        if let Some(id) = participant.entity.identity {
            api.delete_participant(id).await?;
        }
        self.participants.remove(index);
        Ok(())
    }

    /// Cache the voice catalog used for gender-based defaulting: the user's
    /// own voices plus the system catalog.
    pub async fn load_voice_catalog(&mut self, api: &ApiClient) -> Result<(), ApiError> {
        let mut voices = api.voices_by_user(&self.user_id).await?;
        for voice in api.default_voices().await? {
            if !voices.iter().any(|v| v.id == voice.id) {
                voices.push(voice);
            }
        }
        self.set_voice_catalog(voices);
        Ok(())
    }

    pub fn set_voice_catalog(&mut self, voices: Vec<Voice>) {
        self.voices = voices;
    }

    /// Default voice for a gender: a user-scoped default wins over the
    /// system-wide one; no match leaves the selection empty.
    pub fn default_voice_for(&self, gender: &str) -> Option<&Voice> {
        let matches = |voice: &&Voice| voice.is_default && voice.gender == gender;
        self.voices
            .iter()
            .filter(matches)
            .find(|voice| voice.user_id.as_deref() == Some(self.user_id.as_str()))
            .or_else(|| {
                self.voices
                    .iter()
                    .filter(matches)
                    .find(|voice| voice.user_id.is_none())
            })
    }

    /// Synthesize a voice preview for one participant. The participant is
    /// persisted first when still unsaved (the endpoint is keyed by
    /// identity). The in-flight flag is visible to observers for the whole
    /// call and cleared on either outcome.
    pub async fn generate_voice_preview(
        &mut self,
        index: usize,
        api: &ApiClient,
    ) -> Result<(), ApiError> {
        let podcast_id = self.podcast_id;
        let Some(participant) = self.participants.get_mut(index) else {
            return Ok(());
        };
        participant.generating_voice = true;

        let result: Result<(), ApiError> = async {
            let identity = match participant.entity.identity {
                Some(id) => id,
                None => {
                    let created = api
                        .create_participant(&participant.to_record(podcast_id))
                        .await?;
                    // The identity sticks even if the preview call below
                    // fails; a later reconcile must not re-create the row.
                    participant.apply_record(&created);
                    participant.entity.identity.ok_or_else(|| {
                        ApiError::Parse("created participant missing identity".to_string())
                    })?
                }
            };
            let record = api.generate_voice_preview(identity).await?;
            participant.apply_record(&record);
            Ok(())
        }
        .await;

        self.participants[index].generating_voice = false;
        result
    }

    /// Identities of all persisted participants, for transcript validation.
    pub fn participant_ids(&self) -> Vec<i64> {
        self.participants
            .iter()
            .filter_map(|p| p.entity.identity)
            .collect()
    }

    /// Replace the transcript's message sequence, validating that every
    /// message references a participant of this podcast.
    pub fn set_transcript_messages(
        &mut self,
        messages: Vec<Message>,
    ) -> Result<(), TranscriptError> {
        let ids = self.participant_ids();
        let transcript = self.transcript.get_or_insert_with(TranscriptDraft::local);
        transcript.set_messages(messages, &ids)
    }

    // ---- Validity ----

    /// Metadata-step issues: title, description and context description must
    /// all be non-empty. Empty means valid input is still missing.
    pub fn metadata_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.metadata.text("title").is_empty() {
            issues.push("title must not be empty".to_string());
        }
        if self.metadata.text("description").is_empty() {
            issues.push("description must not be empty".to_string());
        }
        if self.context.text("descriptionText").is_empty() {
            issues.push("context description must not be empty".to_string());
        }
        issues
    }

    /// Participants-step issues: at least two participants, each with name,
    /// gender, role and role description filled in.
    pub fn participant_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.participants.len() < 2 {
            issues.push("at least 2 participants are required".to_string());
        }
        for (index, participant) in self.participants.iter().enumerate() {
            let entity = &participant.entity;
            for field in ["name", "gender", "role", "roleDescription"] {
                if entity.text(field).is_empty() {
                    issues.push(format!("participant {} is missing {field}", index + 1));
                }
            }
        }
        issues
    }

    // ---- Reconciliation ----

    /// Persist every New/Dirty entity in one coordinated batch.
    ///
    /// The podcast itself is created first when it has no identity yet
    /// (children must carry the parent reference); all remaining entities
    /// are then saved concurrently. Reconciliation is atomic per entity: a
    /// partial failure leaves the failed entities `New`/`Dirty`, resolves
    /// the rest, and reports exactly which targets failed.
    pub async fn reconcile(&mut self, api: &ApiClient) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        if self.metadata.lifecycle == Lifecycle::New {
            match api.create_podcast(&self.podcast_record()).await {
                Ok(record) => {
                    let Some(id) = record.id else {
                        report.failures.push(ReconcileFailure {
                            target: DraftTarget::Metadata,
                            error: ApiError::Parse(
                                "created podcast missing identity".to_string(),
                            ),
                        });
                        return report;
                    };
                    self.podcast_id = Some(id);
                    self.metadata.mark_saved(id, metadata_fields(&record));
                    report.saved.push(DraftTarget::Metadata);
                }
                Err(error) => {
                    // Children cannot be saved without the parent identity;
                    // they simply stay New for the next attempt.
                    report.failures.push(ReconcileFailure {
                        target: DraftTarget::Metadata,
                        error,
                    });
                    return report;
                }
            }
        }

        let outcomes = join_all(self.save_requests(api)).await;
        for (target, result) in outcomes {
            match result {
                Ok(applied) => {
                    self.apply_saved(target, applied);
                    report.saved.push(target);
                }
                Err(error) => report.failures.push(ReconcileFailure { target, error }),
            }
        }
        report
    }

    /// One boxed future per remaining New/Dirty entity. All requests of a
    /// single reconcile call run concurrently with no ordering guarantee.
    fn save_requests<'a>(&self, api: &'a ApiClient) -> Vec<BoxFuture<'a, SaveOutcome>> {
        let mut requests: Vec<BoxFuture<'a, SaveOutcome>> = Vec::new();
        let podcast_id = self.podcast_id;

        if self.metadata.lifecycle == Lifecycle::Dirty
            && let Some(id) = self.metadata.identity
        {
            let record = self.podcast_record();
            requests.push(
                async move {
                    let result = api.update_podcast(id, &record).await.map(Applied::Podcast);
                    (DraftTarget::Metadata, result)
                }
                .boxed(),
            );
        }

        if self.context.lifecycle.needs_save() && !self.context_is_pristine() {
            let record = self.context_record();
            let identity = self.context.identity;
            requests.push(
                async move {
                    let result = match identity {
                        Some(id) => api.update_context(id, &record).await,
                        None => api.create_context(&record).await,
                    }
                    .map(Applied::Context);
                    (DraftTarget::Context, result)
                }
                .boxed(),
            );
        }

        for (index, participant) in self.participants.iter().enumerate() {
            if !participant.entity.lifecycle.needs_save() || participant_is_pristine(participant)
            {
                continue;
            }
            let record = participant.to_record(podcast_id);
            let identity = participant.entity.identity;
            requests.push(
                async move {
                    let result = match identity {
                        Some(id) => api.update_participant(id, &record).await,
                        None => api.create_participant(&record).await,
                    }
                    .map(Applied::Participant);
                    (DraftTarget::Participant(index), result)
                }
                .boxed(),
            );
        }

        if let Some(transcript) = &self.transcript
            && transcript.lifecycle.needs_save()
        {
            let record = transcript.to_record(podcast_id);
            let identity = transcript.identity;
            requests.push(
                async move {
                    let result = match identity {
                        Some(id) => api.update_transcript(id, &record).await,
                        None => api.create_transcript(&record).await,
                    }
                    .map(Applied::Transcript);
                    (DraftTarget::Transcript, result)
                }
                .boxed(),
            );
        }

        requests
    }

    fn apply_saved(&mut self, target: DraftTarget, applied: Applied) {
        match (target, applied) {
            (DraftTarget::Metadata, Applied::Podcast(record)) => {
                if let Some(id) = record.id {
                    self.podcast_id = Some(id);
                    self.metadata.mark_saved(id, metadata_fields(&record));
                }
            }
            (DraftTarget::Context, Applied::Context(record)) => {
                if let Some(id) = record.id {
                    self.context.mark_saved(id, context_fields(&record));
                }
            }
            (DraftTarget::Participant(index), Applied::Participant(record)) => {
                if let Some(participant) = self.participants.get_mut(index) {
                    participant.apply_record(&record);
                }
            }
            (DraftTarget::Transcript, Applied::Transcript(record)) => {
                if let Some(transcript) = &mut self.transcript {
                    transcript.apply_record(&record);
                }
            }
            _ => {}
        }
    }

    /// A brand-new context with nothing in it has nothing to persist.
    fn context_is_pristine(&self) -> bool {
        self.context.identity.is_none()
            && self.context.text("descriptionText").is_empty()
            && self.context.text("sourceUrl").is_empty()
    }

    fn podcast_record(&self) -> PodcastRecord {
        PodcastRecord {
            id: self.metadata.identity,
            title: self.metadata.text("title").to_string(),
            description: self.metadata.text("description").to_string(),
            length: self.metadata.number("length") as u32,
            status: Some("DRAFT".to_string()),
            user_id: Some(self.user_id.clone()),
        }
    }

    fn context_record(&self) -> ContextRecord {
        let source_url = self.context.text("sourceUrl");
        ContextRecord {
            id: self.context.identity,
            description_text: self.context.text("descriptionText").to_string(),
            source_url: (!source_url.is_empty()).then(|| source_url.to_string()),
            podcast: self.podcast_id.map(|id| PodcastRef { id }),
        }
    }
}

/// An empty "Add participant" row that was never edited is skipped by
/// reconciliation; the backend never sees it.
fn participant_is_pristine(participant: &ParticipantDraft) -> bool {
    participant.entity.identity.is_none()
        && ["name", "gender", "role", "roleDescription"]
            .iter()
            .all(|field| participant.entity.text(field).is_empty())
}

fn metadata_fields(record: &PodcastRecord) -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("title".to_string(), Value::String(record.title.clone())),
        (
            "description".to_string(),
            Value::String(record.description.clone()),
        ),
        ("length".to_string(), Value::from(record.length)),
    ])
}

fn context_fields(record: &ContextRecord) -> BTreeMap<String, Value> {
    let mut fields = BTreeMap::from([(
        "descriptionText".to_string(),
        Value::String(record.description_text.clone()),
    )]);
    if let Some(url) = &record.source_url {
        fields.insert("sourceUrl".to_string(), Value::String(url.clone()));
    }
    fields
}
