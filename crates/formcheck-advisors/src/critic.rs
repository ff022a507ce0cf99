//! Qualitative clip review by an external coaching model.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use formcheck_core::{ExerciseKind, SessionId};

use crate::advisor::{AdvisorError, AdvisorResult};
use crate::clip::FrameClip;
use crate::prompts::{format_critique_request, COACH_SYSTEM_PROMPT};

/// Backend configuration for the clip critic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticConfig {
    /// Model to use for video review
    pub model: String,
    /// Upper bound on the coaching cue length, in words
    pub max_words: usize,
    /// Timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for CriticConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            max_words: 10,
            timeout_ms: 30_000,
        }
    }
}

impl CriticConfig {
    /// Full prompt (system + request) a backend sends alongside the clip.
    pub fn prompt_for(&self, exercise: ExerciseKind) -> String {
        format!(
            "{}\n\n{}",
            COACH_SYSTEM_PROMPT,
            format_critique_request(exercise, self.max_words)
        )
    }
}

/// Interface to a video-review backend. Implementations upload the clip
/// and return a short free-text coaching cue.
#[async_trait]
pub trait FormCritic: Send + Sync {
    async fn critique(&self, clip: &FrameClip) -> AdvisorResult<String>;
}

/// Serializes clip reviews around a single backend: one analysis at a
/// time, bounded by the configured timeout, with finished reviews cached
/// per session so a re-request after the set ends never re-uploads the
/// clip.
pub struct CritiqueSession {
    critic: Arc<dyn FormCritic>,
    config: CriticConfig,
    analyzing: AtomicBool,
    cache: RwLock<HashMap<SessionId, String>>,
}

impl CritiqueSession {
    pub fn new(critic: Arc<dyn FormCritic>, config: CriticConfig) -> Self {
        Self {
            critic,
            config,
            analyzing: AtomicBool::new(false),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CriticConfig {
        &self.config
    }

    /// Review a clip for a session, returning the cached result when one
    /// exists. Fails with [`AdvisorError::Busy`] while another review is
    /// in flight.
    pub async fn review(&self, session: SessionId, clip: &FrameClip) -> AdvisorResult<String> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(&session) {
                tracing::info!("critique cache hit for session {:?}", session);
                return Ok(cached.clone());
            }
        }

        if self.analyzing.swap(true, Ordering::SeqCst) {
            return Err(AdvisorError::Busy);
        }

        tracing::info!(
            "reviewing {:.1}s {} clip for session {:?}",
            clip.duration_secs(),
            clip.exercise.name(),
            session
        );
        let outcome = tokio::time::timeout(
            Duration::from_millis(self.config.timeout_ms),
            self.critic.critique(clip),
        )
        .await;
        self.analyzing.store(false, Ordering::SeqCst);

        match outcome {
            Err(_) => {
                tracing::warn!("clip review timed out after {}ms", self.config.timeout_ms);
                Err(AdvisorError::Timeout(self.config.timeout_ms))
            }
            Ok(Err(e)) => {
                tracing::warn!("clip review failed: {}", e);
                Err(e)
            }
            Ok(Ok(text)) => {
                let mut cache = self.cache.write().await;
                cache.insert(session, text.clone());
                Ok(text)
            }
        }
    }

    pub async fn cached(&self, session: SessionId) -> Option<String> {
        self.cache.read().await.get(&session).cloned()
    }

    pub async fn clear(&self) {
        self.cache.write().await.clear();
    }
}
