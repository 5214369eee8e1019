mod tts;

pub use tts::TtsEngine;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::traits::SpeechBackend;

/// Wraps an optional speech backend so callers never have to care
/// whether voice is configured or the host has a TTS command at all.
pub struct SpeechEngine {
    backend: Option<Arc<dyn SpeechBackend>>,
}

impl SpeechEngine {
    pub fn new(backend: Option<Arc<dyn SpeechBackend>>) -> Self {
        Self { backend }
    }

    pub fn disabled() -> Self {
        Self { backend: None }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Speak `text` aloud. Failures are logged and swallowed: a broken
    /// speaker must never abort the voice cycle.
    pub async fn speak(&self, text: &str) {
        let Some(backend) = &self.backend else {
            debug!("Speech disabled, skipping utterance");
            return;
        };
        match backend.speak(text).await {
            Ok(()) => debug!(backend = backend.name(), chars = text.len(), "Spoke message"),
            Err(e) => warn!(backend = backend.name(), "Speech failed: {}", e),
        }
    }
}
