use async_trait::async_trait;

/// Text-to-speech playback for voice notifications.
///
/// Speaking blocks until playback finishes; the voice monitor awaits
/// each utterance before logging it as delivered.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn speak(&self, text: &str) -> anyhow::Result<()>;
}
