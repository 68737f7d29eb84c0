//! Token counting keyed by model name.
//!
//! This crate does not ship a tokenizer. [`TokenCounter`] is the seam a host
//! plugs one into; [`CharEstimateCounter`] is the default and estimates from
//! character counts.

/// Default characters per token (conservative estimate for English text).
/// Most tokenizers average 3-4 chars per token; we use 3.5 as a middle ground.
pub const DEFAULT_CHARS_PER_TOKEN: f64 = 3.5;

/// Counts tokens in a piece of text for a given model.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str, model: &str) -> usize;
}

/// Estimates tokens as `ceil(chars / chars_per_token)`, ignoring the model.
#[derive(Debug, Clone, Copy)]
pub struct CharEstimateCounter {
    chars_per_token: f64,
}

impl CharEstimateCounter {
    pub fn new() -> Self {
        Self {
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
        }
    }

    /// Use a calibrated ratio. Non-positive values fall back to the default.
    pub fn with_chars_per_token(mut self, ratio: f64) -> Self {
        self.chars_per_token = if ratio > 0.0 {
            ratio
        } else {
            DEFAULT_CHARS_PER_TOKEN
        };
        self
    }
}

impl Default for CharEstimateCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCounter for CharEstimateCounter {
    fn count(&self, text: &str, _model: &str) -> usize {
        let chars = text.chars().count();
        (chars as f64 / self.chars_per_token).ceil() as usize
    }
}

impl<F> TokenCounter for F
where
    F: Fn(&str, &str) -> usize + Send + Sync,
{
    fn count(&self, text: &str, model: &str) -> usize {
        self(text, model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_rounds_up() {
        let counter = CharEstimateCounter::new();
        assert_eq!(counter.count("", "m"), 0);
        assert_eq!(counter.count("abc", "m"), 1);
        assert_eq!(counter.count("abcdefg", "m"), 2);
        assert_eq!(counter.count("abcdefgh", "m"), 3);
    }

    #[test]
    fn calibrated_ratio() {
        let counter = CharEstimateCounter::new().with_chars_per_token(1.0);
        assert_eq!(counter.count("héllo", "m"), 5);
        let fallback = CharEstimateCounter::new().with_chars_per_token(0.0);
        assert_eq!(fallback.count("abcdefg", "m"), 2);
    }

    #[test]
    fn closures_are_counters() {
        let by_model = |text: &str, model: &str| {
            if model == "words" {
                text.split_whitespace().count()
            } else {
                text.len()
            }
        };
        assert_eq!(by_model.count("a b c", "words"), 3);
        assert_eq!(by_model.count("a b c", "bytes"), 5);
    }
}
