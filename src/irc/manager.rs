use crate::config::{ConnectionConfig, RateLimitConfig};
use crate::irc::connection::{Connector, ConnectorError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Hands out at most one live [`Connector`] per session.
///
/// The registry is an ordinary owned value: create it once at session start
/// and build the connector through it. A second [`ConnectorRegistry::create`]
/// fails until the first connector is dropped.
#[derive(Debug, Default)]
pub struct ConnectorRegistry {
    active: Arc<AtomicBool>,
}

/// Held by a live connector; frees the registry slot on drop.
#[derive(Debug)]
pub(crate) struct Lease {
    active: Arc<AtomicBool>,
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &self,
        connection: &ConnectionConfig,
        rate_limit: &RateLimitConfig,
    ) -> Result<Connector, ConnectorError> {
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("rejecting duplicate connector");
            return Err(ConnectorError::AlreadyActive);
        }
        let lease = Lease {
            active: self.active.clone(),
        };
        Ok(Connector::new(connection, rate_limit).with_lease(lease))
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}
