//! Speech synthesis of stable feedback phrases, with caching keyed by
//! the normalized text so repeated coaching cues are instant.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::advisor::{AdvisorError, AdvisorResult};

/// Voice backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    pub voice_id: String,
    pub model_id: String,
    pub output_format: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            // Clear coaching voice
            voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            model_id: "eleven_turbo_v2_5".to_string(),
            output_format: "mp3_44100_128".to_string(),
        }
    }
}

/// Interface to a text-to-speech backend returning encoded audio bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> AdvisorResult<Vec<u8>>;
}

/// Normalize a feedback phrase for caching and synthesis: strip emoji
/// and other non-ASCII decorations, collapse case and surrounding
/// whitespace. Returns `None` when nothing speakable remains.
pub fn normalize_phrase(text: &str) -> Option<String> {
    let ascii: String = text.chars().filter(char::is_ascii).collect();
    let cleaned = ascii.trim();
    let speakable = if cleaned.is_empty() { text.trim() } else { cleaned };
    if speakable.is_empty() {
        None
    } else {
        Some(speakable.to_lowercase())
    }
}

/// Caching wrapper around a [`SpeechSynthesizer`]. The feedback channel
/// repeats a small set of phrases, so nearly every request after warmup
/// is served from memory.
pub struct CachedSpeech<S: SpeechSynthesizer> {
    inner: S,
    cache: RwLock<HashMap<String, Arc<Vec<u8>>>>,
}

impl<S: SpeechSynthesizer> CachedSpeech<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub async fn synthesize(&self, text: &str) -> AdvisorResult<Arc<Vec<u8>>> {
        let key = normalize_phrase(text).ok_or(AdvisorError::EmptyPhrase)?;

        {
            let cache = self.cache.read().await;
            if let Some(audio) = cache.get(&key) {
                tracing::info!("speech cache hit for {:?}", key);
                return Ok(audio.clone());
            }
        }

        let audio = Arc::new(self.inner.synthesize(&key).await?);
        tracing::info!("speech generated ({} bytes) for {:?}", audio.len(), key);

        let mut cache = self.cache.write().await;
        Ok(cache.entry(key).or_insert(audio).clone())
    }

    pub async fn cached_phrases(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn clear(&self) {
        self.cache.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSynth {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SpeechSynthesizer for CountingSynth {
        async fn synthesize(&self, text: &str) -> AdvisorResult<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(text.as_bytes().to_vec())
        }
    }

    #[test]
    fn test_speech_config_default() {
        let config = SpeechConfig::default();
        assert_eq!(config.model_id, "eleven_turbo_v2_5");
        assert_eq!(config.output_format, "mp3_44100_128");
    }

    #[test]
    fn test_normalization_strips_decorations() {
        assert_eq!(normalize_phrase(" Good rep! "), Some("good rep!".to_string()));
        assert_eq!(normalize_phrase("Good rep! 💪"), Some("good rep!".to_string()));
        assert_eq!(normalize_phrase("   "), None);
        assert_eq!(normalize_phrase(""), None);
    }

    #[tokio::test]
    async fn test_repeated_phrases_hit_the_cache() {
        let speech = CachedSpeech::new(CountingSynth {
            calls: AtomicUsize::new(0),
        });

        let first = speech.synthesize("Good rep!").await.unwrap();
        let second = speech.synthesize("good rep!  ").await.unwrap();
        let third = speech.synthesize("Good rep! 💪").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first, third);
        assert_eq!(speech.inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(speech.cached_phrases().await, 1);
    }

    #[tokio::test]
    async fn test_empty_phrase_is_rejected_without_backend_call() {
        let speech = CachedSpeech::new(CountingSynth {
            calls: AtomicUsize::new(0),
        });

        assert!(matches!(
            speech.synthesize("  ").await,
            Err(AdvisorError::EmptyPhrase)
        ));
        assert_eq!(speech.inner.calls.load(Ordering::SeqCst), 0);
    }
}
