use crate::{
    errors::DispatchError,
    policy::Overrides,
    state::UpgradeState,
    step::UpgradeStep,
};
use std::{
    fmt::{self, Display},
    sync::{mpsc::SyncSender, Arc},
};

/// Commands understood by the updater backend.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpgradeCommand {
    StartUpgrade,
    AbortUpgrade,
    StartInstaller,
}

impl From<UpgradeCommand> for &'static str {
    fn from(command: UpgradeCommand) -> Self {
        match command {
            UpgradeCommand::StartUpgrade => "start upgrade",
            UpgradeCommand::AbortUpgrade => "abort upgrade",
            UpgradeCommand::StartInstaller => "start installer",
        }
    }
}

impl Display for UpgradeCommand {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(<&'static str>::from(*self))
    }
}

/// Actions which the user may take from the upgrade view.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserAction {
    StartUpgrade,
    AbortUpgrade,
    StartInstaller,
    Retry,
}

impl From<UserAction> for &'static str {
    fn from(action: UserAction) -> Self {
        match action {
            UserAction::StartUpgrade => "start upgrade",
            UserAction::AbortUpgrade => "abort upgrade",
            UserAction::StartInstaller => "start installer",
            UserAction::Retry => "retry",
        }
    }
}

impl Display for UserAction {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(<&'static str>::from(*self))
    }
}

/// The receiving end of the command channel, owned by the native updater.
///
/// Commands are fire-and-forget: their outcome is only observed through later events.
pub trait UpdaterBackend {
    fn submit(&self, command: UpgradeCommand) -> Result<(), DispatchError>;
}

impl UpdaterBackend for flume::Sender<UpgradeCommand> {
    fn submit(&self, command: UpgradeCommand) -> Result<(), DispatchError> {
        self.send(command).map_err(|_| DispatchError::BackendClosed(command))
    }
}

impl UpdaterBackend for SyncSender<UpgradeCommand> {
    fn submit(&self, command: UpgradeCommand) -> Result<(), DispatchError> {
        self.send(command).map_err(|_| DispatchError::BackendClosed(command))
    }
}

impl<B: UpdaterBackend + ?Sized> UpdaterBackend for Arc<B> {
    fn submit(&self, command: UpgradeCommand) -> Result<(), DispatchError> {
        (**self).submit(command)
    }
}

/// Which actions are enabled in the current state.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Availability {
    pub start_upgrade:   bool,
    pub abort_upgrade:   bool,
    pub start_installer: bool,
    /// The command which a retry would send, if a retry is possible.
    pub retry:           Option<UpgradeCommand>,
}

impl Availability {
    pub fn of(state: &UpgradeState, overrides: Overrides) -> Self {
        let step = state.step(overrides);
        let start_pending = state.pending().is_some();

        Availability {
            start_upgrade:   !start_pending
                && !matches!(step, UpgradeStep::Download | UpgradeStep::Verify),
            abort_upgrade:   matches!(step, UpgradeStep::Download | UpgradeStep::Verify),
            start_installer: step == UpgradeStep::Launch
                && !start_pending
                && !state.installer_in_flight(),
            retry:           if start_pending {
                None
            } else {
                state.error().map(|error| error.retry_target())
            },
        }
    }

    /// The command which an action sends, or `None` if the action is disabled.
    pub fn command_for(&self, action: UserAction) -> Option<UpgradeCommand> {
        match action {
            UserAction::StartUpgrade if self.start_upgrade => Some(UpgradeCommand::StartUpgrade),
            UserAction::AbortUpgrade if self.abort_upgrade => Some(UpgradeCommand::AbortUpgrade),
            UserAction::StartInstaller if self.start_installer => {
                Some(UpgradeCommand::StartInstaller)
            }
            UserAction::Retry => self.retry,
            _ => None,
        }
    }
}

/// Forwards user actions to the updater backend, if they are enabled.
///
/// The dispatcher never retries on its own, and never waits on the backend.
#[derive(Debug)]
pub struct Dispatcher<B> {
    backend: B,
}

impl<B: UpdaterBackend> Dispatcher<B> {
    pub fn new(backend: B) -> Self { Self { backend } }

    pub fn backend(&self) -> &B { &self.backend }

    /// Sends the command for `action`, returning the command that was sent.
    ///
    /// A disabled action is a no-op which returns `Ok(None)`.
    pub fn dispatch(
        &self,
        state: &mut UpgradeState,
        overrides: Overrides,
        action: UserAction,
    ) -> Result<Option<UpgradeCommand>, DispatchError> {
        let command = match Availability::of(state, overrides).command_for(action) {
            Some(command) => command,
            None => {
                debug!("{} is unavailable in the {} step", action, state.step(overrides));
                return Ok(None);
            }
        };

        self.backend.submit(command)?;
        info!("sent {} command to the updater backend", command);
        state.record_command(command);

        Ok(Some(command))
    }

    pub fn start_upgrade(
        &self,
        state: &mut UpgradeState,
        overrides: Overrides,
    ) -> Result<Option<UpgradeCommand>, DispatchError> {
        self.dispatch(state, overrides, UserAction::StartUpgrade)
    }

    pub fn abort_upgrade(
        &self,
        state: &mut UpgradeState,
        overrides: Overrides,
    ) -> Result<Option<UpgradeCommand>, DispatchError> {
        self.dispatch(state, overrides, UserAction::AbortUpgrade)
    }

    pub fn start_installer(
        &self,
        state: &mut UpgradeState,
        overrides: Overrides,
    ) -> Result<Option<UpgradeCommand>, DispatchError> {
        self.dispatch(state, overrides, UserAction::StartInstaller)
    }

    pub fn retry(
        &self,
        state: &mut UpgradeState,
        overrides: Overrides,
    ) -> Result<Option<UpgradeCommand>, DispatchError> {
        self.dispatch(state, overrides, UserAction::Retry)
    }
}
