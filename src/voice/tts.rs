use async_trait::async_trait;
use tracing::info;

use crate::traits::SpeechBackend;
use crate::utils::command_exists;

/// Command-line text-to-speech backends, in auto-detection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsProgram {
    /// macOS `say`.
    Say,
    /// `espeak` / `espeak-ng` (Linux).
    Espeak,
    /// `spd-say` (speech-dispatcher, Linux).
    SpdSay,
}

impl TtsProgram {
    const CANDIDATES: [(&'static str, TtsProgram); 4] = [
        ("say", TtsProgram::Say),
        ("espeak-ng", TtsProgram::Espeak),
        ("espeak", TtsProgram::Espeak),
        ("spd-say", TtsProgram::SpdSay),
    ];

    fn program(&self) -> &'static str {
        match self {
            TtsProgram::Say => "say",
            TtsProgram::Espeak => {
                if command_exists("espeak-ng") {
                    "espeak-ng"
                } else {
                    "espeak"
                }
            }
            TtsProgram::SpdSay => "spd-say",
        }
    }

    fn detect() -> Option<Self> {
        Self::CANDIDATES
            .iter()
            .find(|(program, _)| command_exists(program))
            .map(|(_, backend)| *backend)
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "say" => Some(TtsProgram::Say),
            "espeak" | "espeak-ng" => Some(TtsProgram::Espeak),
            "spd-say" => Some(TtsProgram::SpdSay),
            _ => None,
        }
    }
}

/// Shell-out TTS engine. Rate is words per minute; volume is 0.0-1.0
/// and mapped to each program's own scale.
pub struct TtsEngine {
    program: TtsProgram,
    rate_wpm: u32,
    volume: f32,
}

impl TtsEngine {
    /// Resolve a backend by config name ("auto" probes the PATH).
    /// Returns None when nothing usable is installed or the name is
    /// unknown.
    pub fn resolve(backend: &str, rate_wpm: u32, volume: f32) -> Option<Self> {
        let program = if backend == "auto" {
            TtsProgram::detect()?
        } else {
            let p = TtsProgram::from_name(backend)?;
            if !command_exists(p.program()) {
                return None;
            }
            p
        };
        info!(program = program.program(), "Voice output enabled");
        Some(Self { program, rate_wpm, volume: volume.clamp(0.0, 1.0) })
    }
}

#[async_trait]
impl SpeechBackend for TtsEngine {
    fn name(&self) -> &'static str {
        self.program.program()
    }

    async fn speak(&self, text: &str) -> anyhow::Result<()> {
        let mut cmd = tokio::process::Command::new(self.program.program());
        match self.program {
            TtsProgram::Say => {
                cmd.arg("-r").arg(self.rate_wpm.to_string());
                cmd.arg(text);
            }
            TtsProgram::Espeak => {
                cmd.arg("-s").arg(self.rate_wpm.to_string());
                // espeak amplitude is 0-200.
                cmd.arg("-a").arg(((self.volume * 200.0) as u32).to_string());
                cmd.arg(text);
            }
            TtsProgram::SpdSay => {
                // spd-say rate is -100..100 around a 175 wpm baseline.
                let rate = (self.rate_wpm as i32 - 175).clamp(-100, 100);
                cmd.arg("-r").arg(rate.to_string());
                cmd.arg("-w");
                cmd.arg(text);
            }
        }
        let status = cmd.status().await?;
        if !status.success() {
            anyhow::bail!("{} exited with {}", self.program.program(), status);
        }
        Ok(())
    }
}
