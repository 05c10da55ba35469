pub mod error;

use self::error::UpgradeError;
use std::{
    fmt::{self, Display},
    time::Duration,
};

/// How the installer was asked to start.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallerMode {
    /// Started by the user from the launch step.
    Manual,
    /// Started by the backend as soon as the installer was verified.
    Automatic,
}

impl From<InstallerMode> for &'static str {
    fn from(mode: InstallerMode) -> Self {
        match mode {
            InstallerMode::Manual => "manual",
            InstallerMode::Automatic => "automatic",
        }
    }
}

/// A single lifecycle notification from the updater backend.
///
/// Only the most recent event is meaningful to the UI. The serialized form is the one used by
/// the desktop frontend's IPC channel, which is also what scenario scripts contain.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum UpgradeEvent {
    #[serde(rename = "APP_UPGRADE_STATUS_DOWNLOAD_INITIATED")]
    DownloadInitiated,

    #[serde(rename = "APP_UPGRADE_STATUS_DOWNLOAD_STARTED")]
    DownloadStarted,

    #[serde(rename = "APP_UPGRADE_STATUS_DOWNLOAD_PROGRESS")]
    DownloadProgress {
        #[serde(rename = "progress")]
        percent: u8,
        server: String,
        #[serde(rename = "timeLeft", default, skip_serializing_if = "Option::is_none")]
        time_left: Option<u64>,
    },

    #[serde(rename = "APP_UPGRADE_STATUS_VERIFYING_INSTALLER")]
    VerifyingInstaller,

    #[serde(rename = "APP_UPGRADE_STATUS_VERIFIED_INSTALLER")]
    VerifiedInstaller,

    #[serde(rename = "APP_UPGRADE_STATUS_STARTING_INSTALLER")]
    StartingInstaller { mode: InstallerMode },

    #[serde(rename = "APP_UPGRADE_STATUS_STARTED_INSTALLER")]
    StartedInstaller,

    #[serde(rename = "APP_UPGRADE_STATUS_EXITED_INSTALLER")]
    ExitedInstaller,

    #[serde(rename = "APP_UPGRADE_STATUS_ABORTED")]
    Aborted,

    #[serde(rename = "APP_UPGRADE_ERROR")]
    Error { error: UpgradeError },
}

impl UpgradeEvent {
    pub fn progress(percent: u8, server: &str) -> Self {
        UpgradeEvent::DownloadProgress { percent, server: server.to_owned(), time_left: None }
    }

    /// The failure carried by this event, if it is an error event.
    pub fn error(&self) -> Option<UpgradeError> {
        match *self {
            UpgradeEvent::Error { error } => Some(error),
            _ => None,
        }
    }

    /// True for events which announce a fresh download or installer attempt.
    pub fn begins_attempt(&self) -> bool {
        matches!(
            self,
            UpgradeEvent::DownloadInitiated
                | UpgradeEvent::DownloadStarted
                | UpgradeEvent::StartingInstaller { .. }
        )
    }

    /// The estimated time left on a download, if the backend provided one.
    pub fn time_left(&self) -> Option<Duration> {
        match *self {
            UpgradeEvent::DownloadProgress { time_left, .. } => time_left.map(Duration::from_secs),
            _ => None,
        }
    }

    /// A short description of this event, suitable for logs and terminal output.
    pub fn description(&self) -> &'static str {
        match self {
            UpgradeEvent::DownloadInitiated => "download requested",
            UpgradeEvent::DownloadStarted => "starting download",
            UpgradeEvent::DownloadProgress { .. } => "downloading",
            UpgradeEvent::VerifyingInstaller => "verifying installer",
            UpgradeEvent::VerifiedInstaller => "verification successful",
            UpgradeEvent::StartingInstaller { mode: InstallerMode::Manual } => {
                "starting installer"
            }
            UpgradeEvent::StartingInstaller { mode: InstallerMode::Automatic } => {
                "starting installer automatically"
            }
            UpgradeEvent::StartedInstaller => "installer started",
            UpgradeEvent::ExitedInstaller => "installer exited",
            UpgradeEvent::Aborted => "upgrade aborted",
            UpgradeEvent::Error { .. } => "upgrade failed",
        }
    }
}

impl Display for UpgradeEvent {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UpgradeEvent::DownloadProgress { percent, server, time_left } => {
                write!(fmt, "downloading from {}: {}%", server, percent)?;
                if let Some(secs) = time_left {
                    write!(fmt, " ({}s left)", secs)?;
                }

                Ok(())
            }
            UpgradeEvent::Error { error } => write!(fmt, "upgrade failed: {}", error),
            other => fmt.write_str(other.description()),
        }
    }
}
