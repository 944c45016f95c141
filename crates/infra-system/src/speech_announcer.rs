// Speech announcer implementation
// reason: tokio for non-blocking process spawning, so announcements are fire-and-forget
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info};

use mediqueue_core::port::announcer::{AnnounceError, Announcer};

/// espeak / say default speaking rate (words per minute)
const BASE_WORDS_PER_MINUTE: f32 = 175.0;

/// espeak pitch midpoint (0-99 scale)
const BASE_PITCH: f32 = 50.0;

/// espeak amplitude at volume 1.0 (0-200 scale)
const BASE_AMPLITUDE: f32 = 100.0;

/// Text-to-speech backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEngine {
    /// `espeak` flags
    Espeak,
    /// macOS `say`
    Say,
    /// Any program taking the message as its last argument
    Custom(String),
}

impl SpeechEngine {
    /// `espeak` and `say` select the built-in flag sets; anything else is a
    /// program name
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "espeak" => SpeechEngine::Espeak,
            "say" => SpeechEngine::Say,
            other => SpeechEngine::Custom(other.to_string()),
        }
    }
}

/// Voice settings
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub engine: SpeechEngine,
    pub voice: Option<String>,
    /// 1.0 = engine default; below 1.0 is slower
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            engine: SpeechEngine::Espeak,
            voice: None,
            // Slower than default for clarity, slightly raised pitch
            rate: 0.85,
            pitch: 1.1,
            volume: 1.0,
        }
    }
}

impl SpeechConfig {
    fn program(&self) -> &str {
        match &self.engine {
            SpeechEngine::Espeak => "espeak",
            SpeechEngine::Say => "say",
            SpeechEngine::Custom(program) => program,
        }
    }

    /// Command-line arguments for speaking `message`
    pub fn args(&self, message: &str) -> Vec<String> {
        let wpm = (BASE_WORDS_PER_MINUTE * self.rate).round() as u32;
        let mut args = Vec::new();

        match &self.engine {
            SpeechEngine::Espeak => {
                args.push("-s".to_string());
                args.push(wpm.to_string());
                args.push("-p".to_string());
                args.push(((BASE_PITCH * self.pitch).round() as u32).min(99).to_string());
                args.push("-a".to_string());
                args.push(
                    ((BASE_AMPLITUDE * self.volume).round() as u32)
                        .min(200)
                        .to_string(),
                );
                if let Some(voice) = &self.voice {
                    args.push("-v".to_string());
                    args.push(voice.clone());
                }
            }
            SpeechEngine::Say => {
                args.push("-r".to_string());
                args.push(wpm.to_string());
                if let Some(voice) = &self.voice {
                    args.push("-v".to_string());
                    args.push(voice.clone());
                }
            }
            SpeechEngine::Custom(_) => {}
        }

        args.push(message.to_string());
        args
    }
}

/// Speaks announcements through an external TTS program
///
/// Only one utterance plays at a time: a new announcement kills the one
/// still in flight. The child is never awaited.
pub struct SpeechAnnouncer {
    config: SpeechConfig,
    in_flight: Mutex<Option<Child>>,
    superseded: AtomicUsize,
}

impl SpeechAnnouncer {
    /// Create a new speech announcer
    ///
    /// # Example
    /// ```ignore
    /// let announcer = SpeechAnnouncer::new(SpeechConfig::default());
    /// announcer.announce("Ticket number A001, please proceed to Counter 1.").await?;
    /// ```
    pub fn new(config: SpeechConfig) -> Self {
        Self {
            config,
            in_flight: Mutex::new(None),
            superseded: AtomicUsize::new(0),
        }
    }

    #[cfg(test)]
    fn superseded_count(&self) -> usize {
        self.superseded.load(Ordering::SeqCst)
    }

    /// Kill `child` if it is still running; true if it was
    fn stop(child: &mut Child) -> bool {
        match child.try_wait() {
            Ok(None) => {
                if let Err(e) = child.start_kill() {
                    debug!(error = %e, "Failed to stop previous utterance");
                }
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl Announcer for SpeechAnnouncer {
    async fn announce(&self, message: &str) -> Result<(), AnnounceError> {
        let mut slot = self.in_flight.lock().await;

        // Last call wins
        if let Some(mut previous) = slot.take() {
            if Self::stop(&mut previous) {
                let superseded = self.superseded.fetch_add(1, Ordering::SeqCst) + 1;
                info!(
                    pid = ?previous.id(),
                    superseded,
                    "Superseding in-flight announcement"
                );
            }
        }

        let program = self.config.program();
        let child = Command::new(program)
            .args(self.config.args(message))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                    AnnounceError::Unavailable(format!("{}: {}", program, e))
                }
                _ => AnnounceError::IoError(e.to_string()),
            })?;

        debug!(program = %program, pid = ?child.id(), "Announcement started");
        *slot = Some(child);
        Ok(())
    }
}
