use std::time::Duration;

/// Default bound on a single ledger call.
pub const DEFAULT_LEDGER_TIMEOUT: Duration = Duration::from_secs(10);

/// Tunables for the [`Coordinator`](crate::Coordinator).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Upper bound on every ledger call. Expiry counts as a ledger failure.
    pub ledger_timeout: Duration,
}

impl CoordinatorConfig {
    pub fn with_ledger_timeout(mut self, timeout: Duration) -> Self {
        self.ledger_timeout = timeout;
        self
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            ledger_timeout: DEFAULT_LEDGER_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout() {
        assert_eq!(
            CoordinatorConfig::default().ledger_timeout,
            Duration::from_secs(10)
        );
        let c = CoordinatorConfig::default().with_ledger_timeout(Duration::from_millis(5));
        assert_eq!(c.ledger_timeout, Duration::from_millis(5));
    }
}
