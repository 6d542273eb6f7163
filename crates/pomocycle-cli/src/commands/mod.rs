pub mod config;
pub mod preset;
pub mod run;
pub mod schedule;
pub mod sessions;
pub mod tag;
pub mod timer;

use pomocycle_core::{Config, CoreError, JsonStore};

/// Config plus the store it points at.
pub fn open() -> Result<(Config, JsonStore), CoreError> {
    let config = Config::load()?;
    let store = JsonStore::open(config.store_root()?)?;
    Ok((config, store))
}
