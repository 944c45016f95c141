// MediQueue Infrastructure - System Adapters
// Implements: Announcer (text-to-speech subprocess)

pub mod speech_announcer;

pub use speech_announcer::{SpeechAnnouncer, SpeechConfig, SpeechEngine};
