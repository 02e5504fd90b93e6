use crate::domain::generation::{Content, GenerateRequest, GenerationConfig, Part, SpeechConfig};
use crate::domain::model::{Language, MultilingualSummary};
use crate::domain::ports::{ConfigProvider, GenerativeModel};
use crate::utils::error::{AushadhError, Result};
use base64::engine::general_purpose;
use base64::Engine;
use std::future::Future;
use std::time::Duration;

/// The speech model answers with raw 16-bit mono PCM at this rate unless
/// the MIME type says otherwise.
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;
const CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechAudio {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl SpeechAudio {
    /// Little-endian signed 16-bit PCM; a trailing odd byte is dropped.
    pub fn from_pcm_bytes(bytes: &[u8], sample_rate: u32) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    /// RIFF/WAVE container around the samples.
    pub fn to_wav(&self) -> Vec<u8> {
        let block_align = CHANNELS * BITS_PER_SAMPLE / 8;
        let byte_rate = self.sample_rate * block_align as u32;
        let data_len = (self.samples.len() * 2) as u32;

        let mut out = Vec::with_capacity(44 + data_len as usize);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&CHANNELS.to_le_bytes());
        out.extend_from_slice(&self.sample_rate.to_le_bytes());
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for sample in &self.samples {
            out.extend_from_slice(&sample.to_le_bytes());
        }
        out
    }
}

/// `rate=` parameter of a MIME type like `audio/L16;codec=pcm;rate=24000`.
fn sample_rate_from_mime(mime_type: &str) -> Option<u32> {
    mime_type
        .split(';')
        .filter_map(|param| param.trim().strip_prefix("rate="))
        .find_map(|rate| rate.trim().parse().ok())
}

pub struct Narrator<M: GenerativeModel> {
    model: M,
    speech_model: String,
    voice_name: String,
}

impl<M: GenerativeModel> Narrator<M> {
    pub fn new(model: M, config: &impl ConfigProvider) -> Self {
        Self {
            model,
            speech_model: config.speech_model().to_string(),
            voice_name: config.voice_name().to_string(),
        }
    }

    pub async fn synthesize(&self, text: &str) -> Result<SpeechAudio> {
        tracing::info!(
            "Synthesizing {} chars with {} ({})",
            text.chars().count(),
            self.speech_model,
            self.voice_name
        );

        let request = GenerateRequest {
            contents: vec![Content::user(vec![Part::text(text)])],
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(SpeechConfig::prebuilt(&self.voice_name)),
                ..Default::default()
            }),
            ..Default::default()
        };

        let response = self.model.generate(&self.speech_model, &request).await?;
        let inline = response
            .first_inline_data()
            .ok_or(AushadhError::EmptyResponse)?;

        let pcm = general_purpose::STANDARD.decode(inline.data.trim())?;
        let sample_rate = sample_rate_from_mime(&inline.mime_type).unwrap_or(DEFAULT_SAMPLE_RATE);
        let audio = SpeechAudio::from_pcm_bytes(&pcm, sample_rate);
        tracing::debug!("Received {:?} of audio at {} Hz", audio.duration(), sample_rate);
        Ok(audio)
    }

    /// Reads the summary in `lang` (English when that translation is empty).
    pub async fn narrate(&self, summary: &MultilingualSummary, lang: Language) -> Result<SpeechAudio> {
        let text = summary.text_for(lang);
        if text.trim().is_empty() {
            return Err(AushadhError::ValidationError {
                message: "There is no summary text to read".to_string(),
            });
        }
        self.synthesize(text).await
    }

    /// Like [`Narrator::narrate`], abandoned with `Ok(None)` as soon as `stop`
    /// completes.
    pub async fn narrate_until<F>(
        &self,
        summary: &MultilingualSummary,
        lang: Language,
        stop: F,
    ) -> Result<Option<SpeechAudio>>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            _ = stop => {
                tracing::info!("Narration stopped");
                Ok(None)
            }
            audio = self.narrate(summary, lang) => audio.map(Some),
        }
    }
}
