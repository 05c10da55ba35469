use crate::{
    config::Config,
    event::error::{FailureOrigin, UpgradeError},
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Inputs to the step reducer which do not come from the event stream.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Overrides {
    pub blocked: bool,
    pub manual_install_required: bool,
}

impl Overrides {
    pub fn new(blocked: bool, manual_install_required: bool) -> Self {
        Self { blocked, manual_install_required }
    }
}

/// A blocked connection is a better explanation than the error for failures on the download
/// path. Verification and installer failures happen locally, and are never suppressed.
pub fn suppresses_error(error: UpgradeError, blocked: bool) -> bool {
    blocked && error.origin() == FailureOrigin::Network
}

/// Conditions owned by other subsystems, which take precedence over the latest event.
///
/// The flags are shared handles: the connection subsystem and the platform layer write to
/// them, and the orchestrator reads them on every derivation.
#[derive(Clone, Debug, Default)]
pub struct OverridePolicy {
    blocked:                 Arc<AtomicBool>,
    manual_install_required: Arc<AtomicBool>,
    never_auto_launch:       bool,
}

impl OverridePolicy {
    pub fn new(never_auto_launch: bool) -> Self {
        Self { never_auto_launch, ..Self::default() }
    }

    pub fn from_config(config: &Config) -> Self { Self::new(config.never_auto_launch) }

    /// Reads connectivity from a flag owned by the connection subsystem.
    pub fn with_connectivity(mut self, blocked: Arc<AtomicBool>) -> Self {
        self.blocked = blocked;
        self
    }

    /// A handle which the connection subsystem may write to.
    pub fn connectivity(&self) -> Arc<AtomicBool> { self.blocked.clone() }

    pub fn is_blocked(&self) -> bool { self.blocked.load(Ordering::SeqCst) }

    pub fn set_blocked(&self, blocked: bool) { self.blocked.store(blocked, Ordering::SeqCst); }

    /// The externally computed manual-install condition.
    pub fn manual_install_required(&self) -> bool {
        self.manual_install_required.load(Ordering::SeqCst)
    }

    pub fn set_manual_install_required(&self, required: bool) {
        self.manual_install_required.store(required, Ordering::SeqCst);
    }

    /// Platforms which never launch a verified installer on their own.
    pub fn never_auto_launch(&self) -> bool { self.never_auto_launch }
}
