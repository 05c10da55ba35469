use crate::{
    dispatcher::UpgradeCommand,
    event::{error::UpgradeError, UpgradeEvent},
    policy::{OverridePolicy, Overrides},
    step::{derive_step, StepView, UpgradeStep},
};

/// The register holding the latest event received from the updater backend.
///
/// Older events are dropped as soon as a newer one arrives. The only things which outlive the
/// event that produced them are the sticky error, the pause latch, and the command which is
/// awaiting an answer from the backend.
#[derive(Clone, Debug, Default)]
pub struct UpgradeState {
    latest:           Option<UpgradeEvent>,
    error:            Option<UpgradeError>,
    paused:           bool,
    resume_requested: bool,
    pending:          Option<UpgradeCommand>,
}

impl UpgradeState {
    pub fn new() -> Self { Self::default() }

    pub fn latest(&self) -> Option<&UpgradeEvent> { self.latest.as_ref() }

    /// The most recent failure, until a new attempt clears it.
    pub fn error(&self) -> Option<UpgradeError> { self.error }

    /// A start command which the backend has not answered yet.
    pub fn pending(&self) -> Option<UpgradeCommand> { self.pending }

    /// The upgrade was aborted, and no resume has been requested since.
    pub fn is_paused(&self) -> bool { self.paused && !self.resume_requested }

    /// Replaces the latest event.
    ///
    /// Returns `false` if the event was ignored, which happens to events arriving after an
    /// abort, until the user asks to start the upgrade or the installer again.
    pub fn apply(&mut self, event: UpgradeEvent) -> bool {
        if self.is_paused() {
            trace!("ignoring event while paused: {}", event);
            return false;
        }

        if event.begins_attempt() {
            self.error = None;
        }

        if let Some(error) = event.error() {
            self.error = Some(error);
        }

        self.paused = event == UpgradeEvent::Aborted;
        self.resume_requested = false;
        self.pending = None;
        self.latest = Some(event);
        true
    }

    /// Records a command which was sent to the backend.
    pub fn record_command(&mut self, command: UpgradeCommand) {
        match command {
            UpgradeCommand::StartUpgrade | UpgradeCommand::StartInstaller => {
                self.error = None;
                self.pending = Some(command);
                // The backend's answer to either command ends the pause.
                if self.paused {
                    self.resume_requested = true;
                }
            }
            UpgradeCommand::AbortUpgrade => (),
        }
    }

    /// The installer has been asked to start, and has not exited or failed yet.
    pub fn installer_in_flight(&self) -> bool {
        matches!(
            self.latest,
            Some(UpgradeEvent::StartingInstaller { .. }) | Some(UpgradeEvent::StartedInstaller)
        )
    }

    /// A verified installer is waiting to be started.
    fn installer_ready(&self) -> bool {
        matches!(
            self.latest,
            Some(UpgradeEvent::VerifiedInstaller) | Some(UpgradeEvent::ExitedInstaller)
        )
    }

    /// Samples the override conditions which apply to the current state.
    pub fn overrides(&self, policy: &OverridePolicy) -> Overrides {
        let manual_install_required = policy.manual_install_required()
            || self.error.map_or(false, UpgradeError::forces_manual_install)
            || (policy.never_auto_launch() && self.installer_ready());

        Overrides::new(policy.is_blocked(), manual_install_required)
    }

    pub fn step(&self, overrides: Overrides) -> UpgradeStep {
        derive_step(self.latest(), overrides.blocked, overrides.manual_install_required)
    }

    pub fn view(&self, overrides: Overrides) -> StepView {
        StepView::derive(self.latest(), self.error, overrides)
    }
}
