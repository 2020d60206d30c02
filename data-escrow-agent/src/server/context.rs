use rand::{rngs::StdRng, SeedableRng};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::Config;

/// Shared state every protocol operation runs against.
pub struct Context<DB> {
    pub config: Config,
    pub db: Arc<DB>,
    pub rng: Arc<Mutex<StdRng>>,
}

impl<DB> Context<DB> {
    pub fn new(config: Config, db: Arc<DB>) -> Self {
        Self {
            config,
            db,
            rng: Arc::new(Mutex::new(StdRng::from_entropy())),
        }
    }

    /// Absolute URL of one of the agent's service endpoints; request
    /// signatures commit to it.
    pub fn service_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url, endpoint)
    }
}

impl<DB> Clone for Context<DB> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            db: Arc::clone(&self.db),
            rng: Arc::clone(&self.rng),
        }
    }
}
