use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::{Builder, Runtime};

use crate::{NioError, Result};

pub const DEFAULT_CAPACITY: usize = 2;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 10;
pub const DEFAULT_WORKER_THREADS: usize = 1;

/// Settings for the readers of this crate.
///
/// Every field has a default, so a JSON file only needs
/// to mention what it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Transfer buffer capacity of the chained reader
    pub capacity: usize,
    /// Buffer capacity used when draining a blocking channel
    pub channel_capacity: usize,
    /// Worker threads of the runtime built by [`ReaderConfig::build_runtime`]
    pub worker_threads: usize,
    /// Upper bound on waiting for a whole file, in milliseconds
    pub timeout_ms: Option<u64>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            worker_threads: DEFAULT_WORKER_THREADS,
            timeout_ms: None,
        }
    }
}

impl ReaderConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    /// Load a JSON configuration file and validate it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        log::debug!("loaded {:?} from {}", config, path.as_ref().display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(NioError::Config(
                "capacity must be positive".to_owned(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(NioError::Config(
                "channel_capacity must be positive".to_owned(),
            ));
        }
        if self.worker_threads == 0 {
            return Err(NioError::Config(
                "worker_threads must be positive".to_owned(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Build the runtime that drives read chains
    pub fn build_runtime(&self) -> Result<Runtime> {
        self.validate()?;
        let runtime = Builder::new_multi_thread()
            .worker_threads(self.worker_threads)
            .thread_name("ark-nio-worker")
            .enable_all()
            .build()?;
        Ok(runtime)
    }
}
