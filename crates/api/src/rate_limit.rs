//! Rate limiting for control routes
//!
//! Session and countdown commands are throttled per peer IP with
//! tower_governor (GCRA, no background task). Read-only routes are not
//! limited so dashboards can poll freely.

use governor::middleware::StateInformationMiddleware;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;

/// Governor config with X-RateLimit-* headers enabled
pub type DefaultGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Rate limiting configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Seconds to replenish one request
    pub per_second: u64,
    /// Requests allowed back to back
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_second: 1,
            burst_size: 10,
        }
    }
}

impl RateLimitConfig {
    /// Tight limit for shared deployments
    pub fn strict() -> Self {
        Self {
            per_second: 4,
            burst_size: 2,
        }
    }

    /// Loose limit for local dashboards that click quickly
    pub fn lenient() -> Self {
        Self {
            per_second: 1,
            burst_size: 30,
        }
    }
}

/// Build the governor config, or `None` when the values are unusable
/// (zero period or zero burst).
///
/// The limiter keys on the peer address, so the server must be started with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn create_governor_config(config: &RateLimitConfig) -> Option<Arc<DefaultGovernorConfig>> {
    GovernorConfigBuilder::default()
        .per_second(config.per_second)
        .burst_size(config.burst_size)
        .use_headers()
        .finish()
        .map(Arc::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(RateLimitConfig::default().burst_size, 10);
        assert_eq!(RateLimitConfig::strict().per_second, 4);
        assert!(RateLimitConfig::lenient().burst_size > RateLimitConfig::default().burst_size);
    }

    #[test]
    fn test_create_governor_config() {
        assert!(create_governor_config(&RateLimitConfig::default()).is_some());
    }

    #[test]
    fn test_zero_burst_rejected() {
        let config = RateLimitConfig {
            per_second: 1,
            burst_size: 0,
        };
        assert!(create_governor_config(&config).is_none());
    }
}
