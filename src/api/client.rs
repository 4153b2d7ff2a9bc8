//! HTTP client for the podcast backend.
//!
//! [`ApiClient`] wraps a `reqwest::Client` with the entity CRUD surface,
//! sample suggestion lookups, voice endpoints, context extraction, and
//! generation control. All failures are mapped to [`ApiError`] at this
//! boundary; nothing deeper in the crate sees raw HTTP.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::types::{
    ContextRecord, OneOrMany, ParticipantRecord, PodcastRecord, SampleDraft, SampleOutcome,
    ScrapedContent, TranscriptRecord, Voice,
};

pub struct ApiClient {
    client: Client,
    base_url: String,
    user_id: String,
}

impl ApiClient {
    /// Create a client pointing at the given backend base URL.
    pub fn new(base_url: String, user_id: String) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url,
            user_id,
        }
    }

    /// Opaque user identity attached to podcast writes.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Map a non-success response to [`ApiError::Status`], reading the body
    /// text as the message.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.client.get(self.url(path)).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn post_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn put_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.client.put(self.url(path)).json(body).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let response = self.client.delete(self.url(path)).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    // ---- Podcasts ----

    pub async fn get_podcast(&self, id: i64) -> Result<PodcastRecord, ApiError> {
        self.get_json(&format!("/api/podcasts/{id}")).await
    }

    pub async fn create_podcast(
        &self,
        podcast: &PodcastRecord,
    ) -> Result<PodcastRecord, ApiError> {
        self.post_json("/api/podcasts", podcast).await
    }

    pub async fn update_podcast(
        &self,
        id: i64,
        podcast: &PodcastRecord,
    ) -> Result<PodcastRecord, ApiError> {
        self.put_json(&format!("/api/podcasts/{id}"), podcast).await
    }

    pub async fn delete_podcast(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/api/podcasts/{id}")).await
    }

    /// Fetch the server-suggested sample draft for create mode. A `403`
    /// means the feature is switched off server-side, which is not an error.
    pub async fn sample_podcast(&self) -> Result<SampleOutcome<SampleDraft>, ApiError> {
        let response = self.client.get(self.url("/api/podcasts/sample")).send().await?;
        if response.status() == StatusCode::FORBIDDEN {
            return Ok(SampleOutcome::Disabled);
        }
        let response = Self::check(response).await?;
        Ok(SampleOutcome::Supplied(response.json().await?))
    }

    /// Fetch suggested participants for an existing podcast draft.
    pub async fn sample_participants(
        &self,
        podcast_id: i64,
    ) -> Result<SampleOutcome<Vec<ParticipantRecord>>, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("/api/podcasts/{podcast_id}/sample-participants")))
            .send()
            .await?;
        if response.status() == StatusCode::FORBIDDEN {
            return Ok(SampleOutcome::Disabled);
        }
        let response = Self::check(response).await?;
        Ok(SampleOutcome::Supplied(response.json().await?))
    }

    // ---- Contexts ----

    pub async fn context_by_podcast(&self, podcast_id: i64) -> Result<ContextRecord, ApiError> {
        self.get_json(&format!("/api/contexts/podcast/{podcast_id}")).await
    }

    pub async fn create_context(
        &self,
        context: &ContextRecord,
    ) -> Result<ContextRecord, ApiError> {
        self.post_json("/api/contexts", context).await
    }

    pub async fn update_context(
        &self,
        id: i64,
        context: &ContextRecord,
    ) -> Result<ContextRecord, ApiError> {
        self.put_json(&format!("/api/contexts/{id}"), context).await
    }

    /// Extract prefill text from a web page.
    pub async fn scrape_url(&self, url: &str) -> Result<ScrapedContent, ApiError> {
        let response = self
            .client
            .get(self.url("/api/contexts/scrape"))
            .query(&[("url", url)])
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    /// Extract prefill text from an uploaded document.
    pub async fn extract_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<ScrapedContent, ApiError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .client
            .post(self.url("/api/contexts/extract-document"))
            .multipart(form)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    // ---- Participants ----

    pub async fn participants_by_podcast(
        &self,
        podcast_id: i64,
    ) -> Result<Vec<ParticipantRecord>, ApiError> {
        self.get_json(&format!("/api/participants/podcast/{podcast_id}")).await
    }

    pub async fn create_participant(
        &self,
        participant: &ParticipantRecord,
    ) -> Result<ParticipantRecord, ApiError> {
        self.post_json("/api/participants", participant).await
    }

    pub async fn update_participant(
        &self,
        id: i64,
        participant: &ParticipantRecord,
    ) -> Result<ParticipantRecord, ApiError> {
        self.put_json(&format!("/api/participants/{id}"), participant).await
    }

    pub async fn delete_participant(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/api/participants/{id}")).await
    }

    /// Synthesize a voice preview for a persisted participant. The server
    /// answers with the updated participant record carrying the preview URL.
    pub async fn generate_voice_preview(
        &self,
        participant_id: i64,
    ) -> Result<ParticipantRecord, ApiError> {
        let response = self
            .client
            .post(self.url(&format!("/api/participants/{participant_id}/voice-preview")))
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    // ---- Transcripts ----

    /// Look up the transcript of a podcast, normalizing the server's
    /// object-or-array answer to at most one record.
    pub async fn transcript_by_podcast(
        &self,
        podcast_id: i64,
    ) -> Result<Option<TranscriptRecord>, ApiError> {
        let lookup: OneOrMany<TranscriptRecord> = self
            .get_json(&format!("/api/transcripts/podcast/{podcast_id}"))
            .await?;
        Ok(lookup.into_first())
    }

    pub async fn create_transcript(
        &self,
        transcript: &TranscriptRecord,
    ) -> Result<TranscriptRecord, ApiError> {
        self.post_json("/api/transcripts", transcript).await
    }

    pub async fn update_transcript(
        &self,
        id: i64,
        transcript: &TranscriptRecord,
    ) -> Result<TranscriptRecord, ApiError> {
        self.put_json(&format!("/api/transcripts/{id}"), transcript).await
    }

    // ---- Voices ----

    pub async fn default_voices(&self) -> Result<Vec<Voice>, ApiError> {
        self.get_json("/api/voices/default").await
    }

    pub async fn voices_by_user(&self, user_id: &str) -> Result<Vec<Voice>, ApiError> {
        self.get_json(&format!("/api/voices/user/{user_id}")).await
    }

    // ---- Generation control ----

    /// Ask the server to begin generating the finished audio. The result of
    /// the job is observed via the progress channel, not this response.
    pub async fn start_generation(&self, podcast_id: i64) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url(&format!("/api/podcasts/{podcast_id}/generate")))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Best-effort cancellation; the client never blocks on the job service
    /// confirming it.
    pub async fn cancel_generation(&self, podcast_id: i64) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url(&format!("/api/podcasts/{podcast_id}/cancel")))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::types::PodcastRef;
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(server.uri(), "dev-user-123".into())
    }

    #[tokio::test]
    async fn create_participant_posts_and_parses_identity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/participants"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 11,
                "name": "Host",
                "gender": "female",
                "age": 35,
                "role": "host",
                "roleDescription": "Leads",
                "voiceCharacteristics": ""
            })))
            .mount(&server)
            .await;

        let api = client_for(&server);
        let body = ParticipantRecord {
            id: None,
            name: "Host".into(),
            gender: "female".into(),
            age: 35,
            role: "host".into(),
            role_description: "Leads".into(),
            voice_characteristics: String::new(),
            synthetic_voice_id: None,
            voice_preview_url: None,
            podcast: Some(PodcastRef { id: 42 }),
        };
        let saved = api.create_participant(&body).await.unwrap();
        assert_eq!(saved.id, Some(11));
    }

    #[tokio::test]
    async fn sample_podcast_disabled_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/podcasts/sample"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let api = client_for(&server);
        let outcome = api.sample_podcast().await.unwrap();
        assert!(matches!(outcome, SampleOutcome::Disabled));
    }

    #[tokio::test]
    async fn sample_podcast_supplies_prefill_draft() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/podcasts/sample"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Sample Title",
                "description": "Sample description",
                "length": 30,
                "contextDescription": "Sample context"
            })))
            .mount(&server)
            .await;

        let api = client_for(&server);
        let draft = api.sample_podcast().await.unwrap().supplied().unwrap();
        assert_eq!(draft.title, "Sample Title");
        assert_eq!(draft.length, 30);
    }

    #[tokio::test]
    async fn transcript_lookup_normalizes_array_answer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/transcripts/podcast/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 5, "content": {"messages": []}}
            ])))
            .mount(&server)
            .await;

        let api = client_for(&server);
        let transcript = api.transcript_by_podcast(42).await.unwrap().unwrap();
        assert_eq!(transcript.id, Some(5));
    }

    #[tokio::test]
    async fn scrape_url_sends_query_parameter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/contexts/scrape"))
            .and(query_param("url", "https://example.com/article"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Article",
                "description": "Body text"
            })))
            .mount(&server)
            .await;

        let api = client_for(&server);
        let content = api.scrape_url("https://example.com/article").await.unwrap();
        assert_eq!(content.title, "Article");
    }

    #[tokio::test]
    async fn server_error_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/podcasts/7/generate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("generation pool full"))
            .mount(&server)
            .await;

        let api = client_for(&server);
        let err = api.start_generation(7).await.unwrap_err();
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "generation pool full");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_participant_issues_delete() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/participants/11"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let api = client_for(&server);
        api.delete_participant(11).await.unwrap();
    }
}
