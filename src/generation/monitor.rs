//! Drives one generation job end to end: starts it over HTTP, follows it
//! over the progress channel, and folds everything into a
//! [`GenerationSession`].

use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};

use super::channel::{ChannelUpdate, ProgressChannel, ProgressTransport};
use super::session::{GenerationPhase, GenerationSession};

/// One observable step of a monitored job.
#[derive(Debug)]
pub enum MonitorUpdate {
    /// A progress event was applied to the session.
    Progress,
    /// The channel gave up reconnecting; the session is degraded but the
    /// server may still finish the job.
    ConnectionLost,
    /// The session is settled; no further updates will arrive.
    Finished,
}

pub struct GenerationMonitor<T: ProgressTransport> {
    session: GenerationSession,
    channel: ProgressChannel<T>,
}

impl<T: ProgressTransport> GenerationMonitor<T> {
    pub fn new(session: GenerationSession, channel: ProgressChannel<T>) -> Self {
        Self { session, channel }
    }

    pub fn session(&self) -> &GenerationSession {
        &self.session
    }

    /// Send the start request. On failure the session ends in `Error` with
    /// the server's message as its only log entry, and the channel is
    /// closed before it ever dialed.
    pub async fn start(&mut self, api: &ApiClient) -> Result<(), ApiError> {
        self.session.begin();
        if let Err(error) = api.start_generation(self.session.podcast_id()).await {
            self.session.fail_to_start(&error.to_string());
            self.channel.close();
            return Err(error);
        }
        info!(podcast_id = self.session.podcast_id(), "generation started");
        Ok(())
    }

    /// Pull the next update from the channel and apply it to the session.
    pub async fn next(&mut self) -> MonitorUpdate {
        if self.session.phase().is_terminal() {
            self.channel.close();
            return MonitorUpdate::Finished;
        }
        match self.channel.next().await {
            ChannelUpdate::Event(event) => {
                self.session.apply_event(&event);
                if self.session.phase().is_terminal() {
                    self.channel.close();
                }
                MonitorUpdate::Progress
            }
            ChannelUpdate::Degraded => {
                self.session.connection_lost();
                MonitorUpdate::ConnectionLost
            }
            ChannelUpdate::Closed => MonitorUpdate::Finished,
        }
    }

    /// Begin a fresh run of a finished session (regenerate). The previous
    /// channel is discarded and progress flows over the supplied fresh one.
    pub async fn regenerate(
        &mut self,
        api: &ApiClient,
        channel: ProgressChannel<T>,
    ) -> Result<(), ApiError> {
        self.channel = channel;
        self.start(api).await
    }

    /// Continue in the background: stop observing without cancelling. The
    /// server may keep generating; the session is left as last seen.
    pub fn detach(&mut self) {
        self.channel.close();
    }

    /// Cancel the job: the session settles as `Cancelled` immediately and
    /// the channel closes; the server-side cancel request is best-effort.
    pub async fn cancel(&mut self, api: &ApiClient) {
        if !self.session.cancel() {
            return;
        }
        self.channel.close();
        if let Err(error) = api.cancel_generation(self.session.podcast_id()).await {
            warn!(
                podcast_id = self.session.podcast_id(),
                %error,
                "cancel request failed"
            );
        }
    }

    /// Whether the observed job can still change.
    pub fn is_settled(&self) -> bool {
        self.session.phase().is_terminal()
            || self.session.phase() == GenerationPhase::ConnectionLost && self.channel.is_closed()
    }
}
