//! Request throttling and header randomization.
//!
//! The scheduler charges a cooldown against every permit it hands out and
//! asks the policy for a User-Agent per request. Tests plug in
//! [`FixedPoliteness`] to make both deterministic.

use rand::{Rng, rng};
use rand::seq::IndexedRandom;
use std::time::Duration;

/// Desktop browser User-Agent strings rotated across requests.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36",
];

pub trait Politeness: Send + Sync {
    /// User-Agent header for the next request.
    fn user_agent(&self) -> String;

    /// How long a finished fetch keeps its permit before releasing it.
    fn cooldown(&self) -> Duration;
}

/// Random User-Agent from [`USER_AGENTS`] and a uniform cooldown.
#[derive(Debug, Clone)]
pub struct RandomPoliteness {
    min_cooldown_ms: u64,
    max_cooldown_ms: u64,
}

impl RandomPoliteness {
    pub fn new(min: Duration, max: Duration) -> Self {
        let min_cooldown_ms = min.as_millis() as u64;
        let max_cooldown_ms = (max.as_millis() as u64).max(min_cooldown_ms);
        Self {
            min_cooldown_ms,
            max_cooldown_ms,
        }
    }
}

impl Default for RandomPoliteness {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_millis(1500))
    }
}

impl Politeness for RandomPoliteness {
    fn user_agent(&self) -> String {
        USER_AGENTS
            .choose(&mut rng())
            .copied()
            .unwrap_or(USER_AGENTS[0])
            .to_string()
    }

    fn cooldown(&self) -> Duration {
        let ms = rng().random_range(self.min_cooldown_ms..=self.max_cooldown_ms);
        Duration::from_millis(ms)
    }
}

/// Constant User-Agent and cooldown.
#[derive(Debug, Clone)]
pub struct FixedPoliteness {
    pub user_agent: String,
    pub cooldown: Duration,
}

impl FixedPoliteness {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            user_agent: USER_AGENTS[0].to_string(),
            cooldown,
        }
    }
}

impl Politeness for FixedPoliteness {
    fn user_agent(&self) -> String {
        self.user_agent.clone()
    }

    fn cooldown(&self) -> Duration {
        self.cooldown
    }
}
