pub mod api;
pub mod config;
pub mod db;

#[cfg(test)]
pub(crate) mod test_support;

pub use db::DbPool;

use config::Config;

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
}

impl AppState {
    pub fn new(config: Config, db: DbPool) -> Self {
        Self { config, db }
    }
}
