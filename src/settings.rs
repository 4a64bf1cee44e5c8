//! Layered configuration for an [`crate::system::ActorSystem`], following
//! the same defaults-then-file-then-env layering the rest of the actor
//! ecosystem uses via the `config` crate.

use std::env;
use std::sync::Arc;

use config::{Config, File};

use crate::scheduler::{Scheduler, TokioScheduler};

/// Runtime configuration for an `ActorSystem`. Schedulers are injectable so
/// tests can swap in a virtual scheduler; everything else is sourced from
/// layered `config::Config`.
#[derive(Clone)]
pub struct ActorSystemConfig {
    pub mailbox_capacity: usize,
    pub msg_process_limit: u32,
    pub message_scheduler: Arc<dyn Scheduler>,
    pub time_scheduler: Arc<dyn Scheduler>,
}

impl Default for ActorSystemConfig {
    fn default() -> Self {
        ActorSystemConfig {
            mailbox_capacity: 0, // 0 == unbounded
            msg_process_limit: 1000,
            message_scheduler: Arc::new(TokioScheduler),
            time_scheduler: Arc::new(TokioScheduler),
        }
    }
}

impl ActorSystemConfig {
    /// Loads defaults, then `CONDUIT_CONF` (a TOML file, default
    /// `config/conduit.toml`) if present, then environment overrides
    /// prefixed `CONDUIT_`. Scheduler fields are not sourced from config —
    /// they stay at their programmatic defaults unless overridden via
    /// [`ActorSystemConfig::with_message_scheduler`]/[`with_time_scheduler`].
    pub fn from_env() -> Self {
        let mut cfg = Config::builder()
            .set_default("mailbox.capacity", 0i64)
            .unwrap()
            .set_default("mailbox.msg_process_limit", 1000i64)
            .unwrap();

        let path = env::var("CONDUIT_CONF").unwrap_or_else(|_| "config/conduit.toml".into());
        cfg = cfg.add_source(File::with_name(&path).required(false));
        cfg = cfg.add_source(config::Environment::with_prefix("CONDUIT").separator("_"));

        let cfg = cfg
            .build()
            .expect("layered config sources are all optional and should never fail to build");

        let mut settings = ActorSystemConfig::default();
        if let Ok(capacity) = cfg.get_int("mailbox.capacity") {
            settings.mailbox_capacity = capacity.max(0) as usize;
        }
        if let Ok(limit) = cfg.get_int("mailbox.msg_process_limit") {
            settings.msg_process_limit = limit.max(0) as u32;
        }
        settings
    }

    pub fn with_message_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.message_scheduler = scheduler;
        self
    }

    pub fn with_time_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.time_scheduler = scheduler;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_limits() {
        let cfg = ActorSystemConfig::default();
        assert_eq!(cfg.msg_process_limit, 1000);
    }
}
