//! Engine configuration

use countdown::CountdownConfig;
use focus_classifier::ClassifierConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::sampler::SamplerConfig;
use crate::EngineError;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sampling loop cadence and failure budget
    pub sampler: SamplerConfig,

    /// Work-session countdown
    pub countdown: CountdownConfig,

    /// Distractor grouping
    pub classifier: ClassifierConfig,

    /// Readings older than this do not count as focused (milliseconds)
    pub stale_signal_ms: u64,

    /// Buffered events per subscriber
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sampler: SamplerConfig::default(),
            countdown: CountdownConfig::default(),
            classifier: ClassifierConfig::default(),
            stale_signal_ms: 3000,
            event_capacity: 64,
        }
    }
}

impl EngineConfig {
    pub fn stale_after(&self) -> Duration {
        Duration::from_millis(self.stale_signal_ms)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.sampler.validate()?;
        self.countdown.validate()?;
        if self.stale_signal_ms == 0 {
            return Err(EngineError::InvalidConfig(
                "stale_signal_ms must be positive".into(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "event_capacity must be positive".into(),
            ));
        }
        Ok(())
    }
}
