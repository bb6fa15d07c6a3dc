// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, WatchError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::WatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.watch))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.poll_interval_ms == 0 {
        return Err(WatchError::Config(
            "[watch].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.watch.retry_delay_ms == 0 {
        return Err(WatchError::Config(
            "[watch].retry_delay_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}
