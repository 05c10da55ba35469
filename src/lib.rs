#![deny(clippy::all)]

#[macro_use]
extern crate log;

#[macro_use]
extern crate num_derive;

#[macro_use]
extern crate serde_derive;

#[macro_use]
extern crate shrinkwraprs;

/// Configuration of the upgrade orchestrator
pub mod config;

/// Commands which the user may issue to the updater backend
pub mod dispatcher;

/// Errors which may occur within this crate
pub mod errors;

/// Lifecycle events emitted by the updater backend
pub mod event;

/// Logging setup for binaries using this library
pub mod logging;

/// Binds the state, policy, and dispatcher together across threads
pub mod orchestrator;

/// Conditions which take precedence over the event-derived step
pub mod policy;

/// Line-based scenario scripts for replaying upgrade sessions
pub mod script;

/// The latest-event register, and everything derived from it
pub mod state;

/// The coarse-grained steps shown to the user
pub mod step;

pub use self::{
    dispatcher::{Availability, Dispatcher, UpdaterBackend, UpgradeCommand, UserAction},
    event::{error::UpgradeError, InstallerMode, UpgradeEvent},
    orchestrator::Orchestrator,
    policy::{OverridePolicy, Overrides},
    state::UpgradeState,
    step::{derive_step, StepView, UpgradeStep},
};

pub const CONFIG_FILE: &str = "/etc/app-upgrade/config";
