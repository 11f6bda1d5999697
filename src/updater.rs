//! Update coordinator for the desktop shell.
//!
//! A sibling of the note core: it never reads or writes note data. The host
//! supplies an [`UpdateBackend`]; backend events are folded into an
//! [`UpdateState`] that is pushed to every subscriber on change.
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateStatus {
    #[default]
    Idle,
    Checking,
    Available,
    NotAvailable,
    Downloading,
    Downloaded,
    Error,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateState {
    pub status: UpdateStatus,
    pub current_version: String,
    pub available_version: Option<String>,
    pub release_notes: Option<String>,
    pub release_date: Option<String>,
    /// Whole percent, 0..=100
    pub download_progress: u8,
    pub bytes_per_second: u64,
    pub total_bytes: u64,
    pub downloaded_bytes: u64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettings {
    pub auto_check: bool,
    pub auto_download: bool,
    pub auto_install: bool,
    /// Minutes between automatic checks
    pub check_interval: u32,
    pub allow_prerelease: bool,
    pub allow_downgrade: bool,
}

impl Default for UpdateSettings {
    fn default() -> Self {
        UpdateSettings {
            auto_check: true,
            auto_download: false,
            auto_install: false,
            check_interval: 60,
            allow_prerelease: false,
            allow_downgrade: false,
        }
    }
}

/// Partial settings update; `None` leaves a field as is
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSettingsPatch {
    pub auto_check: Option<bool>,
    pub auto_download: Option<bool>,
    pub auto_install: Option<bool>,
    pub check_interval: Option<u32>,
    pub allow_prerelease: Option<bool>,
    pub allow_downgrade: Option<bool>,
}

/// Events emitted by the host's updater
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateEvent {
    CheckingForUpdate,
    UpdateAvailable {
        version: String,
        release_notes: Option<String>,
        release_date: Option<String>,
    },
    UpdateNotAvailable,
    DownloadProgress {
        percent: f64,
        bytes_per_second: u64,
        total: u64,
        transferred: u64,
    },
    UpdateDownloaded,
    Error(String),
}

/// User-facing category of an updater error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateErrorKind {
    /// No release published yet; shown as "you're up to date"
    NotFound,
    Network,
    Generic,
}

impl UpdateErrorKind {
    pub fn classify(error: &str) -> Self {
        let not_found = ["404", "Cannot find latest.yml", "not found"];
        let network = ["ENOTFOUND", "ETIMEDOUT", "network"];

        if not_found.iter().any(|needle| error.contains(needle)) {
            UpdateErrorKind::NotFound
        } else if network.iter().any(|needle| error.contains(needle)) {
            UpdateErrorKind::Network
        } else {
            UpdateErrorKind::Generic
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            UpdateErrorKind::NotFound => "No Updates Available",
            UpdateErrorKind::Network => "Connection Error",
            UpdateErrorKind::Generic => "Update Check Failed",
        }
    }
}

/// Host-side updater the coordinator drives
pub trait UpdateBackend {
    fn check(&mut self) -> std::result::Result<(), String>;
    fn download(&mut self) -> std::result::Result<(), String>;
    fn install(&mut self);
    fn set_auto_download(&mut self, enabled: bool);
}

pub struct UpdateCoordinator<B: UpdateBackend> {
    backend: B,
    settings: UpdateSettings,
    skipped_version: Option<String>,
    state: UpdateState,
    subscribers: Vec<mpsc::UnboundedSender<UpdateState>>,
}

impl<B: UpdateBackend> UpdateCoordinator<B> {
    pub fn new(backend: B, current_version: impl Into<String>) -> Self {
        let state = UpdateState {
            current_version: current_version.into(),
            ..Default::default()
        };
        let mut coordinator = UpdateCoordinator {
            backend,
            settings: UpdateSettings::default(),
            skipped_version: None,
            state,
            subscribers: Vec::new(),
        };
        let auto_download = coordinator.settings.auto_download;
        coordinator.backend.set_auto_download(auto_download);
        coordinator
    }

    pub fn get_state(&self) -> UpdateState {
        self.state.clone()
    }

    pub fn get_settings(&self) -> UpdateSettings {
        self.settings.clone()
    }

    /// Receives a copy of the state after every change
    pub fn on_state_changed(&mut self) -> mpsc::UnboundedReceiver<UpdateState> {
        let (state_tx, state_rx) = mpsc::unbounded_channel();
        self.subscribers.push(state_tx);
        state_rx
    }

    pub fn skipped_version(&self) -> Option<&str> {
        self.skipped_version.as_deref()
    }

    pub fn check_for_updates(&mut self) -> UpdateState {
        if let Err(e) = self.backend.check() {
            warn!("Update check failed: {}", e);
            self.handle_event(UpdateEvent::Error(e));
        }
        self.get_state()
    }

    pub fn download_update(&mut self) -> UpdateState {
        if let Err(e) = self.backend.download() {
            warn!("Update download failed: {}", e);
            self.handle_event(UpdateEvent::Error(e));
        }
        self.get_state()
    }

    pub fn install_update(&mut self) {
        info!("Installing downloaded update");
        self.backend.install();
    }

    /// Availability of this version is ignored from now on
    pub fn skip_version(&mut self, version: impl Into<String>) {
        let version = version.into();
        info!("Skipping update {}", version);
        if self.state.available_version.as_deref() == Some(version.as_str()) {
            self.publish(|state| {
                state.status = UpdateStatus::Idle;
                state.available_version = None;
                state.release_notes = None;
                state.release_date = None;
            });
        }
        self.skipped_version = Some(version);
    }

    pub fn update_settings(&mut self, patch: UpdateSettingsPatch) -> UpdateSettings {
        let settings = &mut self.settings;
        if let Some(v) = patch.auto_check {
            settings.auto_check = v;
        }
        if let Some(v) = patch.auto_download {
            settings.auto_download = v;
        }
        if let Some(v) = patch.auto_install {
            settings.auto_install = v;
        }
        if let Some(v) = patch.check_interval {
            settings.check_interval = v;
        }
        if let Some(v) = patch.allow_prerelease {
            settings.allow_prerelease = v;
        }
        if let Some(v) = patch.allow_downgrade {
            settings.allow_downgrade = v;
        }
        let auto_download = self.settings.auto_download;
        self.backend.set_auto_download(auto_download);
        self.get_settings()
    }

    /// Folds a backend event into the published state
    pub fn handle_event(&mut self, event: UpdateEvent) {
        debug!("Updater event: {:?}", event);
        match event {
            UpdateEvent::CheckingForUpdate => self.publish(|state| {
                state.status = UpdateStatus::Checking;
                state.error = None;
            }),
            UpdateEvent::UpdateAvailable { version, .. }
                if self.skipped_version.as_deref() == Some(version.as_str()) =>
            {
                info!("Update {} was skipped by the user", version);
                self.publish(|state| state.status = UpdateStatus::NotAvailable);
            }
            UpdateEvent::UpdateAvailable {
                version,
                release_notes,
                release_date,
            } => self.publish(|state| {
                state.status = UpdateStatus::Available;
                state.available_version = Some(version);
                state.release_notes =
                    Some(release_notes.unwrap_or_else(|| "No release notes".to_string()));
                state.release_date = release_date;
            }),
            UpdateEvent::UpdateNotAvailable => {
                self.publish(|state| state.status = UpdateStatus::NotAvailable)
            }
            UpdateEvent::DownloadProgress {
                percent,
                bytes_per_second,
                total,
                transferred,
            } => self.publish(|state| {
                state.status = UpdateStatus::Downloading;
                state.download_progress = percent.round().clamp(0.0, 100.0) as u8;
                state.bytes_per_second = bytes_per_second;
                state.total_bytes = total;
                state.downloaded_bytes = transferred;
            }),
            UpdateEvent::UpdateDownloaded => self.publish(|state| {
                state.status = UpdateStatus::Downloaded;
                state.download_progress = 100;
            }),
            UpdateEvent::Error(message) => self.publish(|state| {
                state.status = UpdateStatus::Error;
                state.error = Some(message);
            }),
        }
    }

    fn publish(&mut self, change: impl FnOnce(&mut UpdateState)) {
        change(&mut self.state);
        let state = &self.state;
        // Dropped receivers are forgotten
        self.subscribers
            .retain(|subscriber| subscriber.send(state.clone()).is_ok());
    }
}
