use serde::Serialize;

use crate::error::UsageError;

/// Measured quantities of one billable call
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub(crate) struct UsageEvent {
    pub(crate) model_name: String,
    pub(crate) group: String,
    pub(crate) input_tokens: i64,
    pub(crate) completion_tokens: i64,
    /// Subset of `input_tokens` served from the prompt cache
    pub(crate) cache_tokens: i64,
    pub(crate) audio_input_tokens: i64,
    pub(crate) audio_completion_tokens: i64,
}

impl UsageEvent {
    pub(crate) fn text(model: &str, input_tokens: i64, completion_tokens: i64) -> Self {
        UsageEvent {
            model_name: model.to_string(),
            input_tokens,
            completion_tokens,
            ..UsageEvent::default()
        }
    }

    pub(crate) fn has_audio(&self) -> bool {
        self.audio_input_tokens > 0 || self.audio_completion_tokens > 0
    }

    pub(crate) fn validate(&self) -> Result<(), UsageError> {
        let counts = [
            ("input_tokens", self.input_tokens),
            ("completion_tokens", self.completion_tokens),
            ("cache_tokens", self.cache_tokens),
            ("audio_input_tokens", self.audio_input_tokens),
            ("audio_completion_tokens", self.audio_completion_tokens),
        ];
        if let Some(&(field, value)) = counts.iter().find(|(_, value)| *value < 0) {
            return Err(UsageError::NegativeCount { field, value });
        }
        if self.cache_tokens > self.input_tokens {
            return Err(UsageError::CacheExceedsInput {
                cache: self.cache_tokens,
                input: self.input_tokens,
            });
        }
        Ok(())
    }
}
