use crate::{
    event::{error::UpgradeError, UpgradeEvent},
    policy::{suppresses_error, Overrides},
};
use std::{
    fmt::{self, Display},
    time::Duration,
};

/// The coarse-grained phase of an upgrade, as presented to the user.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum UpgradeStep {
    Initial,
    Download,
    Verify,
    Launch,
    Pause,
    Error,
}

impl From<UpgradeStep> for &'static str {
    fn from(step: UpgradeStep) -> Self {
        match step {
            UpgradeStep::Initial => "initial",
            UpgradeStep::Download => "download",
            UpgradeStep::Verify => "verify",
            UpgradeStep::Launch => "launch",
            UpgradeStep::Pause => "pause",
            UpgradeStep::Error => "error",
        }
    }
}

impl Display for UpgradeStep {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(<&'static str>::from(*self))
    }
}

/// Maps the latest event and the override conditions to a step.
///
/// Precedence: a required manual install, then the connectivity override for download
/// failures, then an error, then the event itself.
pub fn derive_step(
    event: Option<&UpgradeEvent>,
    blocked: bool,
    manual_install_required: bool,
) -> UpgradeStep {
    if manual_install_required {
        return UpgradeStep::Launch;
    }

    let event = match event {
        Some(event) => event,
        None => return UpgradeStep::Initial,
    };

    match event {
        UpgradeEvent::Error { error } if suppresses_error(*error, blocked) => {
            phase_of_failure(*error)
        }
        UpgradeEvent::Error { .. } => UpgradeStep::Error,
        UpgradeEvent::DownloadInitiated
        | UpgradeEvent::DownloadStarted
        | UpgradeEvent::DownloadProgress { .. } => UpgradeStep::Download,
        UpgradeEvent::VerifyingInstaller => UpgradeStep::Verify,
        UpgradeEvent::VerifiedInstaller
        | UpgradeEvent::StartingInstaller { .. }
        | UpgradeEvent::StartedInstaller
        | UpgradeEvent::ExitedInstaller => UpgradeStep::Launch,
        UpgradeEvent::Aborted => UpgradeStep::Pause,
    }
}

/// The step that was active when a suppressed failure occurred.
fn phase_of_failure(error: UpgradeError) -> UpgradeStep {
    match error {
        UpgradeError::DownloadFailed => UpgradeStep::Download,
        _ => UpgradeStep::Initial,
    }
}

/// How far along the download is.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DownloadProgress {
    pub percent:   u8,
    pub server:    Option<String>,
    pub time_left: Option<Duration>,
}

impl DownloadProgress {
    /// Progress as shown for the given event, if the event concerns the download at all.
    pub fn from_event(event: &UpgradeEvent) -> Option<Self> {
        let progress = match event {
            UpgradeEvent::DownloadInitiated | UpgradeEvent::DownloadStarted => Self::default(),
            UpgradeEvent::DownloadProgress { percent, server, .. } => Self {
                percent:   (*percent).min(100),
                server:    Some(server.clone()),
                time_left: event.time_left(),
            },
            UpgradeEvent::VerifyingInstaller | UpgradeEvent::VerifiedInstaller => {
                Self { percent: 100, ..Self::default() }
            }
            _ => return None,
        };

        Some(progress)
    }
}

/// Everything a render pass needs to draw the upgrade view.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StepView {
    pub step:               UpgradeStep,
    /// Render the "connection blocked" message in place of the step's usual status.
    pub connection_blocked: bool,
    pub error:              Option<UpgradeError>,
    pub progress:           Option<DownloadProgress>,
}

impl StepView {
    pub fn derive(
        event: Option<&UpgradeEvent>,
        error: Option<UpgradeError>,
        overrides: Overrides,
    ) -> Self {
        let step = derive_step(event, overrides.blocked, overrides.manual_install_required);

        let connection_blocked =
            overrides.blocked && matches!(step, UpgradeStep::Download | UpgradeStep::Initial);

        // A forced launch step hides the download entirely.
        let progress = match step {
            UpgradeStep::Download | UpgradeStep::Verify => {
                event.and_then(DownloadProgress::from_event)
            }
            UpgradeStep::Launch if !overrides.manual_install_required => {
                event.and_then(DownloadProgress::from_event)
            }
            _ => None,
        };

        StepView { step, connection_blocked, error, progress }
    }
}

impl Display for StepView {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(<&'static str>::from(self.step))?;

        if self.connection_blocked {
            fmt.write_str(" (connection blocked)")?;
        }

        if let Some(ref progress) = self.progress {
            write!(fmt, " [{:3}%]", progress.percent)?;
        }

        if self.step == UpgradeStep::Error {
            if let Some(error) = self.error {
                write!(fmt, ": {}", error)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::InstallerMode;
    use test_case::test_case;

    fn error(error: UpgradeError) -> UpgradeEvent { UpgradeEvent::Error { error } }

    #[test_case(None => UpgradeStep::Initial ; "no event yet")]
    #[test_case(Some(UpgradeEvent::DownloadInitiated) => UpgradeStep::Download ; "download initiated")]
    #[test_case(Some(UpgradeEvent::DownloadStarted) => UpgradeStep::Download ; "download started")]
    #[test_case(Some(UpgradeEvent::progress(50, "cdn")) => UpgradeStep::Download ; "download progress")]
    #[test_case(Some(UpgradeEvent::VerifyingInstaller) => UpgradeStep::Verify ; "verifying")]
    #[test_case(Some(UpgradeEvent::VerifiedInstaller) => UpgradeStep::Launch ; "verified")]
    #[test_case(Some(UpgradeEvent::StartingInstaller { mode: InstallerMode::Manual }) => UpgradeStep::Launch ; "starting manually")]
    #[test_case(Some(UpgradeEvent::StartingInstaller { mode: InstallerMode::Automatic }) => UpgradeStep::Launch ; "starting automatically")]
    #[test_case(Some(UpgradeEvent::StartedInstaller) => UpgradeStep::Launch ; "started")]
    #[test_case(Some(UpgradeEvent::ExitedInstaller) => UpgradeStep::Launch ; "exited")]
    #[test_case(Some(UpgradeEvent::Aborted) => UpgradeStep::Pause ; "aborted")]
    #[test_case(Some(error(UpgradeError::DownloadFailed)) => UpgradeStep::Error ; "download failed")]
    #[test_case(Some(error(UpgradeError::GeneralError)) => UpgradeStep::Error ; "general error")]
    fn event_dispatch(event: Option<UpgradeEvent>) -> UpgradeStep {
        derive_step(event.as_ref(), false, false)
    }

    #[test_case(None ; "no event")]
    #[test_case(Some(UpgradeEvent::progress(10, "cdn")) ; "while downloading")]
    #[test_case(Some(UpgradeEvent::VerifyingInstaller) ; "while verifying")]
    #[test_case(Some(UpgradeEvent::Aborted) ; "while paused")]
    #[test_case(Some(error(UpgradeError::InstallerFailed)) ; "after an error")]
    fn manual_install_always_launches(event: Option<UpgradeEvent>) {
        assert_eq!(derive_step(event.as_ref(), false, true), UpgradeStep::Launch);
        assert_eq!(derive_step(event.as_ref(), true, true), UpgradeStep::Launch);
    }

    #[test_case(UpgradeError::DownloadFailed => UpgradeStep::Download ; "download failure is explained by connectivity")]
    #[test_case(UpgradeError::VerificationFailed => UpgradeStep::Error ; "verification failure still shown")]
    #[test_case(UpgradeError::InstallerFailed => UpgradeStep::Error ; "installer failure still shown")]
    #[test_case(UpgradeError::StartInstallerFailed => UpgradeStep::Error ; "start installer failure still shown")]
    #[test_case(UpgradeError::GeneralError => UpgradeStep::Error ; "general error still shown")]
    fn blocked_errors(kind: UpgradeError) -> UpgradeStep {
        derive_step(Some(&error(kind)), true, false)
    }

    #[test]
    fn derivation_is_deterministic() {
        let events = [
            None,
            Some(UpgradeEvent::DownloadStarted),
            Some(UpgradeEvent::VerifiedInstaller),
            Some(UpgradeEvent::Aborted),
            Some(error(UpgradeError::DownloadFailed)),
        ];

        for event in events.iter() {
            for &(blocked, manual) in &[(false, false), (true, false), (false, true), (true, true)]
            {
                assert_eq!(
                    derive_step(event.as_ref(), blocked, manual),
                    derive_step(event.as_ref(), blocked, manual)
                );
            }
        }
    }

    #[test]
    fn blocked_download_failure_renders_connection_blocked() {
        let event = error(UpgradeError::DownloadFailed);
        let view = StepView::derive(
            Some(&event),
            Some(UpgradeError::DownloadFailed),
            Overrides::new(true, false),
        );

        assert_eq!(view.step, UpgradeStep::Download);
        assert!(view.connection_blocked);
        assert_eq!(view.to_string(), "download (connection blocked)");
    }

    #[test]
    fn blocked_does_not_mark_local_steps() {
        let view = StepView::derive(
            Some(&UpgradeEvent::VerifyingInstaller),
            None,
            Overrides::new(true, false),
        );

        assert_eq!(view.step, UpgradeStep::Verify);
        assert!(!view.connection_blocked);
    }

    #[test]
    fn blocked_initial_renders_connection_blocked() {
        let view = StepView::derive(None, None, Overrides::new(true, false));
        assert_eq!(view.step, UpgradeStep::Initial);
        assert!(view.connection_blocked);
    }

    #[test_case(UpgradeEvent::DownloadStarted => Some(0) ; "starting download")]
    #[test_case(UpgradeEvent::progress(90, "cdn") => Some(90) ; "progress event")]
    #[test_case(UpgradeEvent::progress(150, "cdn") => Some(100) ; "clamped")]
    #[test_case(UpgradeEvent::VerifyingInstaller => Some(100) ; "verifying")]
    #[test_case(UpgradeEvent::VerifiedInstaller => Some(100) ; "verified")]
    #[test_case(UpgradeEvent::Aborted => None ; "aborted")]
    fn progress(event: UpgradeEvent) -> Option<u8> {
        StepView::derive(Some(&event), None, Overrides::default()).progress.map(|p| p.percent)
    }

    #[test]
    fn manual_install_hides_progress() {
        let view = StepView::derive(
            Some(&UpgradeEvent::VerifiedInstaller),
            None,
            Overrides::new(false, true),
        );

        assert_eq!(view.step, UpgradeStep::Launch);
        assert_eq!(view.progress, None);
    }

    #[test]
    fn error_view_displays_cause() {
        let event = error(UpgradeError::VerificationFailed);
        let view = StepView::derive(Some(&event), event.error(), Overrides::default());

        assert_eq!(view.to_string(), "error: verification failed");
    }
}
