mod cli;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use podforge::api::ApiClient;
use podforge::config::PodforgeConfig;
use podforge::generation::{
    GenerationMonitor, GenerationSession, MonitorUpdate, ProgressChannel, WsTransport,
};
use podforge::ui::GenerationProgress;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "podforge=debug"
    } else {
        "podforge=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => PodforgeConfig::load_from(Path::new(path))?,
        None => PodforgeConfig::load()?,
    };
    let api = ApiClient::new(config.base_url.clone(), config.user_id.clone());

    match cli.command {
        Command::Generate { podcast_id } => generate(&api, &config, podcast_id).await?,
        Command::Cancel { podcast_id } => {
            api.cancel_generation(podcast_id).await?;
            println!("Cancel requested for podcast {podcast_id}");
        }
        Command::Status { podcast_id } => status(&api, podcast_id).await?,
        Command::Voices => voices(&api, &config).await?,
    }

    Ok(())
}

/// Start a generation job and follow it until it settles. Ctrl-C cancels
/// the job server-side before exiting.
async fn generate(api: &ApiClient, config: &PodforgeConfig, podcast_id: i64) -> Result<()> {
    let transport = WsTransport::new(config.ws_url.clone());
    let channel = ProgressChannel::new(
        transport,
        podcast_id,
        config.max_reconnect_attempts,
        Duration::from_millis(config.reconnect_base_delay_ms),
    );
    let mut monitor = GenerationMonitor::new(GenerationSession::new(podcast_id), channel);

    let progress = GenerationProgress::start(podcast_id);
    if let Err(error) = monitor.start(api).await {
        progress.finish(monitor.session());
        return Err(error.into());
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                monitor.cancel(api).await;
                break;
            }
            update = monitor.next() => match update {
                MonitorUpdate::Progress => {
                    let session = monitor.session();
                    if let Some(entry) = session.log().last() {
                        progress.update(entry, session.progress());
                    }
                }
                MonitorUpdate::ConnectionLost => progress.connection_lost(),
                MonitorUpdate::Finished => break,
            }
        }
    }

    progress.finish(monitor.session());
    Ok(())
}

/// Print the persisted state of one podcast draft.
async fn status(api: &ApiClient, podcast_id: i64) -> Result<()> {
    let podcast = api.get_podcast(podcast_id).await?;
    let participants = api.participants_by_podcast(podcast_id).await?;
    let transcript = api.transcript_by_podcast(podcast_id).await?;

    println!("Podcast {podcast_id}: {}", podcast.title);
    println!("  description: {}", podcast.description);
    println!("  length: {} min", podcast.length);
    if let Some(status) = &podcast.status {
        println!("  status: {status}");
    }
    println!("  participants: {}", participants.len());
    for participant in &participants {
        println!(
            "    - {} ({}, {})",
            participant.name, participant.gender, participant.role
        );
    }
    match transcript {
        Some(transcript) => {
            println!("  transcript: {} messages", transcript.content.messages.len());
        }
        None => println!("  transcript: none"),
    }
    Ok(())
}

/// List the synthetic voice catalog: the user's voices plus the defaults.
async fn voices(api: &ApiClient, config: &PodforgeConfig) -> Result<()> {
    let mut voices = api.voices_by_user(&config.user_id).await?;
    for voice in api.default_voices().await? {
        if !voices.iter().any(|v| v.id == voice.id) {
            voices.push(voice);
        }
    }

    for voice in &voices {
        let scope = match voice.user_id.as_deref() {
            Some(_) => "user",
            None => "system",
        };
        let default_marker = if voice.is_default { " [default]" } else { "" };
        println!(
            "{:>4}  {:<24} {:<8} {scope}{default_marker}",
            voice.id, voice.name, voice.gender
        );
    }
    Ok(())
}
