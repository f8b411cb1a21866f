//! Test harness helpers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Duration;
use tempfile::TempDir;
use tether_core::{ManualClock, SessionId, TetherHome};
use tether_crypto::AuditSecret;
use tether_runtime::{Governance, GovernanceOptions, SessionGovernor};
use tracing_subscriber::EnvFilter;

/// Signing secret every harness uses unless told otherwise.
pub const TEST_SECRET: &str = "tether-test-secret";

/// Instant the harness clock starts at (epoch seconds).
pub const TEST_EPOCH: f64 = 1_700_000_000.0;

/// Set up test logging with the given filter.
///
/// Safe to call from many tests; only the first call installs a subscriber.
pub fn setup_test_logging(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_test_writer()
        .try_init();
}

/// A governance instance over a temporary data directory and a manual
/// clock.
#[derive(Debug)]
pub struct TestHarness {
    dir: TempDir,
    clock: Arc<ManualClock>,
    options: GovernanceOptions,
    governance: Governance,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    /// Harness with default governance options.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(|_| {})
    }

    /// Harness with options adjusted by `configure`. The clock is always the
    /// harness's manual clock.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn with_options(configure: impl FnOnce(&mut GovernanceOptions)) -> Self {
        let dir = TempDir::with_prefix("tether-test").expect("Failed to create temp directory");
        let clock = Arc::new(ManualClock::at_epoch(TEST_EPOCH));

        let mut options = GovernanceOptions::default();
        configure(&mut options);
        options.clock = clock.clone();

        let governance = build(dir.path(), TEST_SECRET, options.clone());
        Self {
            dir,
            clock,
            options,
            governance,
        }
    }

    /// Data directory root.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// The manual clock shared by every component.
    #[must_use]
    pub fn clock(&self) -> &Arc<ManualClock> {
        &self.clock
    }

    /// Move the clock forward.
    pub fn advance_secs(&self, secs: i64) {
        self.clock.advance(Duration::seconds(secs));
    }

    /// The governance instance.
    #[must_use]
    pub fn governance(&self) -> &Governance {
        &self.governance
    }

    /// Open the governor for a session.
    ///
    /// # Panics
    ///
    /// Panics if the name is not a valid session id or state cannot be
    /// initialized.
    #[must_use]
    pub fn session(&self, name: &str) -> SessionGovernor {
        self.governance
            .session(&SessionId::new(name).expect("invalid session id"))
            .expect("Failed to open session governor")
    }

    /// A second governance instance over the same directory and secret, as
    /// another process would build it.
    #[must_use]
    pub fn reopen(&self) -> Governance {
        self.reopen_with_secret(TEST_SECRET)
    }

    /// A second governance instance over the same directory, signing with a
    /// different secret.
    ///
    /// # Panics
    ///
    /// Panics if `secret` is blank.
    #[must_use]
    pub fn reopen_with_secret(&self, secret: &str) -> Governance {
        build(self.dir.path(), secret, self.options.clone())
    }

    /// Directory of one component's state for a session.
    #[must_use]
    pub fn session_dir(&self, component: &str, session: &str) -> PathBuf {
        self.dir.path().join(component).join(session)
    }
}

fn build(root: &Path, secret: &str, options: GovernanceOptions) -> Governance {
    Governance::new(
        TetherHome::from_path(root),
        AuditSecret::new(secret).expect("test secret must not be blank"),
        options,
    )
}
