use crate::dispatcher::UpgradeCommand;
use num_traits::FromPrimitive;
use std::{
    fmt::{self, Display},
    str::FromStr,
};
use thiserror::Error;

/// Failures reported by the updater backend.
///
/// These are data rather than Rust errors: each one is surfaced through the error step, and
/// paired with exactly one retry affordance.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Deserialize, Eq, FromPrimitive, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpgradeError {
    GeneralError = 0,
    DownloadFailed = 1,
    VerificationFailed = 2,
    StartInstallerAutomaticFailed = 3,
    StartInstallerFailed = 4,
    InstallerFailed = 5,
}

/// Where a failure originated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureOrigin {
    /// The download path is involved, so connectivity may explain it.
    Network,
    /// The local file system or installer process failed.
    Local,
    /// Catch-all for failures the backend could not classify.
    Unknown,
}

/// The retry control shown alongside an error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Affordance {
    /// "Retry download", with a link to download the installer manually.
    RetryDownload,
    /// "Retry", which restarts the upgrade.
    Retry,
    /// "Retry", which launches the installer again.
    RetryLaunch,
    /// No error is shown; the launch step is shown with an install button instead.
    InstallManually,
}

impl Affordance {
    pub fn label(self) -> &'static str {
        match self {
            Affordance::RetryDownload => "Retry download",
            Affordance::Retry | Affordance::RetryLaunch => "Retry",
            Affordance::InstallManually => "Install update",
        }
    }

    pub fn offers_manual_download(self) -> bool { self == Affordance::RetryDownload }
}

pub const ALL_ERRORS: [UpgradeError; 6] = [
    UpgradeError::GeneralError,
    UpgradeError::DownloadFailed,
    UpgradeError::VerificationFailed,
    UpgradeError::StartInstallerAutomaticFailed,
    UpgradeError::StartInstallerFailed,
    UpgradeError::InstallerFailed,
];

impl UpgradeError {
    pub fn code(self) -> u8 { self as u8 }

    pub fn origin(self) -> FailureOrigin {
        match self {
            UpgradeError::DownloadFailed => FailureOrigin::Network,
            UpgradeError::GeneralError => FailureOrigin::Unknown,
            UpgradeError::VerificationFailed
            | UpgradeError::StartInstallerAutomaticFailed
            | UpgradeError::StartInstallerFailed
            | UpgradeError::InstallerFailed => FailureOrigin::Local,
        }
    }

    /// The backend command which a retry of this failure sends.
    pub fn retry_target(self) -> UpgradeCommand {
        match self {
            UpgradeError::DownloadFailed
            | UpgradeError::VerificationFailed
            | UpgradeError::GeneralError => UpgradeCommand::StartUpgrade,
            UpgradeError::InstallerFailed
            | UpgradeError::StartInstallerFailed
            | UpgradeError::StartInstallerAutomaticFailed => UpgradeCommand::StartInstaller,
        }
    }

    pub fn affordance(self) -> Affordance {
        match self {
            UpgradeError::DownloadFailed => Affordance::RetryDownload,
            UpgradeError::VerificationFailed | UpgradeError::GeneralError => Affordance::Retry,
            UpgradeError::InstallerFailed | UpgradeError::StartInstallerFailed => {
                Affordance::RetryLaunch
            }
            UpgradeError::StartInstallerAutomaticFailed => Affordance::InstallManually,
        }
    }

    /// A verified installer exists, but the user must start it.
    pub fn forces_manual_install(self) -> bool {
        self == UpgradeError::StartInstallerAutomaticFailed
    }

    /// The message displayed to the user in the error step.
    pub fn message(self) -> &'static str {
        match self {
            UpgradeError::DownloadFailed => {
                "Unable to download update. Check your connection and/or firewall then try \
                 again. If this problem persists, please contact support."
            }
            UpgradeError::VerificationFailed => {
                "The downloaded installer could not be verified. Try downloading it again. If \
                 this problem persists, please contact support."
            }
            UpgradeError::StartInstallerFailed => {
                "Could not start the update installer, try downloading it again. If this \
                 problem persists, please contact support."
            }
            UpgradeError::StartInstallerAutomaticFailed => {
                "Verification successful! Ready to install."
            }
            UpgradeError::InstallerFailed => {
                "The update installer failed. Try starting it again. If this problem persists, \
                 please contact support."
            }
            UpgradeError::GeneralError => {
                "Unable to update the app. If this problem persists, please contact support."
            }
        }
    }
}

impl From<UpgradeError> for &'static str {
    fn from(error: UpgradeError) -> Self {
        match error {
            UpgradeError::GeneralError => "general error",
            UpgradeError::DownloadFailed => "download failed",
            UpgradeError::VerificationFailed => "verification failed",
            UpgradeError::StartInstallerAutomaticFailed => {
                "installer could not be started automatically"
            }
            UpgradeError::StartInstallerFailed => "installer could not be started",
            UpgradeError::InstallerFailed => "installer failed",
        }
    }
}

impl Display for UpgradeError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(<&'static str>::from(*self))
    }
}

#[derive(Debug, Error)]
#[error("unknown upgrade error: {}", _0)]
pub struct UnknownUpgradeError(pub Box<str>);

impl FromStr for UpgradeError {
    type Err = UnknownUpgradeError;

    /// Accepts a numeric code, or a name such as `DOWNLOAD_FAILED` or `download-failed`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();

        if let Ok(code) = input.parse::<u8>() {
            return UpgradeError::from_u8(code).ok_or_else(|| UnknownUpgradeError(input.into()));
        }

        let normalized = input.replace('-', "_").to_ascii_uppercase();
        let error = match normalized.as_str() {
            "GENERAL_ERROR" => UpgradeError::GeneralError,
            "DOWNLOAD_FAILED" => UpgradeError::DownloadFailed,
            "VERIFICATION_FAILED" => UpgradeError::VerificationFailed,
            "START_INSTALLER_AUTOMATIC_FAILED" => UpgradeError::StartInstallerAutomaticFailed,
            "START_INSTALLER_FAILED" => UpgradeError::StartInstallerFailed,
            "INSTALLER_FAILED" => UpgradeError::InstallerFailed,
            _ => return Err(UnknownUpgradeError(input.into())),
        };

        Ok(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(UpgradeError::DownloadFailed => UpgradeCommand::StartUpgrade ; "download failed restarts upgrade")]
    #[test_case(UpgradeError::VerificationFailed => UpgradeCommand::StartUpgrade ; "verification failed restarts upgrade")]
    #[test_case(UpgradeError::GeneralError => UpgradeCommand::StartUpgrade ; "general error restarts upgrade")]
    #[test_case(UpgradeError::InstallerFailed => UpgradeCommand::StartInstaller ; "installer failed relaunches")]
    #[test_case(UpgradeError::StartInstallerFailed => UpgradeCommand::StartInstaller ; "start installer failed relaunches")]
    #[test_case(UpgradeError::StartInstallerAutomaticFailed => UpgradeCommand::StartInstaller ; "automatic start failed launches manually")]
    fn retry_target(error: UpgradeError) -> UpgradeCommand { error.retry_target() }

    #[test_case(UpgradeError::DownloadFailed => Affordance::RetryDownload ; "download failed")]
    #[test_case(UpgradeError::VerificationFailed => Affordance::Retry ; "verification failed")]
    #[test_case(UpgradeError::InstallerFailed => Affordance::RetryLaunch ; "installer failed")]
    #[test_case(UpgradeError::StartInstallerFailed => Affordance::RetryLaunch ; "start installer failed")]
    #[test_case(UpgradeError::StartInstallerAutomaticFailed => Affordance::InstallManually ; "automatic start failed")]
    #[test_case(UpgradeError::GeneralError => Affordance::Retry ; "general error")]
    fn affordance(error: UpgradeError) -> Affordance { error.affordance() }

    #[test_case("DOWNLOAD_FAILED" => Some(UpgradeError::DownloadFailed) ; "screaming snake case")]
    #[test_case("start-installer-failed" => Some(UpgradeError::StartInstallerFailed) ; "kebab case")]
    #[test_case("0" => Some(UpgradeError::GeneralError) ; "numeric code")]
    #[test_case("5" => Some(UpgradeError::InstallerFailed) ; "highest numeric code")]
    #[test_case("6" => None ; "code out of range")]
    #[test_case("nope" => None ; "unknown name")]
    fn parse(input: &str) -> Option<UpgradeError> { input.parse().ok() }

    #[test]
    fn only_download_failures_are_network_origin() {
        let network = ALL_ERRORS
            .iter()
            .filter(|error| error.origin() == FailureOrigin::Network)
            .collect::<Vec<_>>();

        assert_eq!(network, vec![&UpgradeError::DownloadFailed]);
    }

    #[test]
    fn codes_round_trip() {
        for error in ALL_ERRORS.iter() {
            assert_eq!(UpgradeError::from_u8(error.code()), Some(*error));
        }
    }

    #[test]
    fn only_download_failure_offers_manual_download() {
        assert!(UpgradeError::DownloadFailed.affordance().offers_manual_download());
        assert!(!UpgradeError::GeneralError.affordance().offers_manual_download());
    }
}
