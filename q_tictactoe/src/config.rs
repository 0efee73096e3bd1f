use crate::board::DEFAULT_PARTITIONS;
use crate::error::{Error, Result};
use crate::players::check_epsilon;
use crate::q_table::LearningRates;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Hyper-parameters and output location of a training run, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub episodes: usize,
    pub alpha: f32,
    pub gamma: f32,
    pub epsilon: f32,
    /// Subtracted from epsilon every `decay_every` episodes.
    pub epsilon_decay: f32,
    pub min_epsilon: f32,
    /// 0 keeps epsilon fixed for the whole run.
    pub decay_every: usize,
    pub log_every: usize,
    pub partitions: usize,
    pub seed: Option<u64>,
    pub out_dir: PathBuf,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            episodes: 10,
            alpha: 0.3,
            gamma: 0.9,
            epsilon: 0.9,
            epsilon_decay: 0.0,
            min_epsilon: 0.1,
            decay_every: 0,
            log_every: 1_000,
            partitions: DEFAULT_PARTITIONS,
            seed: None,
            out_dir: PathBuf::from("./q_table_archive"),
        }
    }
}

impl TrainingConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TrainingConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`TrainingConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.episodes == 0 {
            return Err(Error::InvalidConfig("episodes must be > 0".into()));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(Error::InvalidConfig("alpha must be in (0, 1]".into()));
        }
        if !(self.gamma > 0.0 && self.gamma <= 1.0) {
            return Err(Error::InvalidConfig("gamma must be in (0, 1]".into()));
        }
        check_epsilon(self.epsilon)?;
        check_epsilon(self.min_epsilon)?;
        if self.epsilon_decay < 0.0 {
            return Err(Error::InvalidConfig("epsilon_decay must be >= 0".into()));
        }
        check_partitions(self.partitions)
    }

    pub fn rates(&self) -> LearningRates {
        LearningRates {
            alpha: self.alpha,
            gamma: self.gamma,
        }
    }
}

pub(crate) fn check_partitions(partitions: usize) -> Result<()> {
    if partitions < DEFAULT_PARTITIONS {
        return Err(Error::InvalidConfig(format!(
            "partitions must be >= {DEFAULT_PARTITIONS}, got {partitions}"
        )));
    }
    Ok(())
}
