use crate::audio::AudioChunk;

/// Assigns a speaker label to an audio chunk.
///
/// The only implementation today is a constant stub; a real diarization
/// backend can replace it without touching the ingestion loop.
pub trait SpeakerTagger: Send {
    fn assign_speaker(&self, chunk: &AudioChunk) -> String;
}

/// Placeholder diarization: every chunk is attributed to the same speaker.
pub struct ConstantTagger {
    label: String,
}

impl ConstantTagger {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl Default for ConstantTagger {
    fn default() -> Self {
        Self::new("A")
    }
}

impl SpeakerTagger for ConstantTagger {
    fn assign_speaker(&self, _chunk: &AudioChunk) -> String {
        self.label.clone()
    }
}
