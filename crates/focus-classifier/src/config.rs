//! Classifier configuration

use serde::{Deserialize, Serialize};

use crate::normalize::{AliasRule, AppNameNormalizer};

/// Classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Group distracted time under alias names
    pub group_distractors: bool,

    /// Alias rules; `None` uses the built-in table
    pub aliases: Option<Vec<AliasRule>>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            group_distractors: true,
            aliases: None,
        }
    }
}

impl ClassifierConfig {
    /// Attribute distracted time to raw (trimmed) window titles
    pub fn raw_titles() -> Self {
        Self {
            group_distractors: false,
            aliases: None,
        }
    }

    /// Build the normalizer described by this config
    pub fn normalizer(&self) -> AppNameNormalizer {
        if !self.group_distractors {
            return AppNameNormalizer::passthrough();
        }
        match &self.aliases {
            Some(rules) => AppNameNormalizer::new(rules.clone()),
            None => AppNameNormalizer::default(),
        }
    }
}
