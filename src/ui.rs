//! Terminal output for a monitored generation job.
//!
//! Uses `indicatif` for the progress spinner and `console` for colored
//! output. [`GenerationProgress`] mirrors the session's log and phase in
//! the terminal while the job runs.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::generation::{GenerationPhase, GenerationSession, LogEntry};

pub struct GenerationProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl GenerationProgress {
    /// Start the spinner for a podcast's generation run.
    pub fn start(podcast_id: i64) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("invalid template"),
        );
        pb.set_message(format!("STARTING generation for podcast {podcast_id}"));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Mirror one applied progress event: the spinner shows the latest
    /// status, the scrollback keeps the full log line.
    pub fn update(&self, entry: &LogEntry, progress: u8) {
        self.pb.set_message(format!("{} ({progress}%)", entry.status));
        if entry.message.is_empty() {
            self.pb.println(format!("  {} {progress:>3}%", entry.status));
        } else {
            self.pb
                .println(format!("  {} {progress:>3}%  {}", entry.status, entry.message));
        }
    }

    /// The channel gave up reconnecting.
    pub fn connection_lost(&self) {
        self.pb.println(format!(
            "  {} Connection lost; the server may still be generating",
            self.yellow.apply_to("↯")
        ));
    }

    /// Stop the spinner and print the final line for the settled session.
    pub fn finish(&self, session: &GenerationSession) {
        self.pb.finish_and_clear();
        match session.phase() {
            GenerationPhase::Completed => {
                println!(
                    "  {} Generation completed{}",
                    self.green.apply_to("✓"),
                    session
                        .audio_url()
                        .map(|url| format!(": {url}"))
                        .unwrap_or_default()
                );
            }
            GenerationPhase::Cancelled => {
                println!("  {} Generation cancelled", self.yellow.apply_to("✗"));
            }
            GenerationPhase::ConnectionLost => {
                println!(
                    "  {} Lost contact with the server; check the podcast status later",
                    self.yellow.apply_to("↯")
                );
            }
            _ => {
                let reason = session
                    .log()
                    .last()
                    .map(|entry| entry.message.clone())
                    .unwrap_or_default();
                println!("  {} Generation failed: {reason}", self.red.apply_to("✗"));
            }
        }
    }
}
