use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::contract::{AnalysisKind, InferenceContract, ScorePolicy};
use crate::utils::logging;

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "wellcam::settings";

use crate::{log_error, log_warn};

pub const DEFAULT_ENGINE_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub engine_timeout_ms: u64,
    /// Per-kind overrides of the contract's out-of-range score policy.
    pub score_policies: BTreeMap<AnalysisKind, ScorePolicy>,
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine_timeout_ms: DEFAULT_ENGINE_TIMEOUT_MS,
            score_policies: BTreeMap::new(),
            verbose: false,
        }
    }
}

impl Settings {
    pub fn engine_timeout(&self) -> Duration {
        Duration::from_millis(self.engine_timeout_ms.max(1))
    }

    /// The built-in contract for `kind` with any policy override applied.
    pub fn contract_for(&self, kind: AnalysisKind) -> InferenceContract {
        let contract = InferenceContract::for_kind(kind);
        match self.score_policies.get(&kind) {
            Some(policy) => contract.with_score_policy(*policy),
            None => contract,
        }
    }

    /// `verbose` from the file, or forced on by `WELLCAM_DEBUG`.
    pub fn verbose_enabled(&self) -> bool {
        self.verbose || logging::debug_env_enabled()
    }
}

/// JSON-file backed settings shared by every feature session.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<Settings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log_warn!(
                    "ignoring unreadable settings at {}: {err}",
                    path.display()
                );
                Settings::default()
            })
        } else {
            Settings::default()
        };

        logging::set_verbose(data.verbose_enabled());

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn settings(&self) -> Settings {
        self.read().clone()
    }

    pub fn update(&self, settings: Settings) -> Result<()> {
        let mut guard = self.write();
        if let Err(err) = self.persist(&settings) {
            log_error!("settings not saved, keeping the previous values: {err:#}");
            return Err(err);
        }
        logging::set_verbose(settings.verbose_enabled());
        *guard = settings;
        Ok(())
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: Settings = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid settings in {}", self.path.display()))?;
        logging::set_verbose(data.verbose_enabled());
        *self.write() = data;
        Ok(())
    }

    fn persist(&self, data: &Settings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, Settings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Settings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
