const DEFAULT_NOISE: &[&str] = &["privacycom", "*"];

/// Splits descriptions into lowercase bag-of-words terms.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    noise: Vec<String>,
}

impl Tokenizer {
    /// `noise` substrings are blanked out before splitting, on top of the defaults.
    pub fn new(noise: impl IntoIterator<Item = String>) -> Self {
        let mut tokenizer = Self::default();
        tokenizer
            .noise
            .extend(noise.into_iter().map(|n| n.to_lowercase()));
        tokenizer
    }

    pub fn tokenize(&self, description: &str) -> Vec<String> {
        let mut description = description.to_lowercase();
        for noise in &self.noise {
            description = description.replace(noise.as_str(), " ");
        }
        description.split_whitespace().map(str::to_string).collect()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self {
            noise: DEFAULT_NOISE.iter().map(|n| n.to_string()).collect(),
        }
    }
}
