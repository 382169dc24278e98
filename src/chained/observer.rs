use std::io;

use super::signal::Outcome;

const LOG_PREFIX: &str = "[chained-read]";

/// Hooks into the progress of a read chain.
///
/// Called from the runtime driving the chain, so implementations
/// must return quickly.
pub trait ReadObserver: Send + Sync {
    fn read_issued(&self, _offset: u64, _capacity: usize) {}

    fn read_completed(&self, _offset: u64, _result: &io::Result<usize>) {}

    fn chain_finished(&self, _outcome: &Outcome) {}
}

/// Reports chain progress through the `log` facade
pub struct LogObserver {
    log_prefix: String,
}

impl LogObserver {
    pub fn new(label: &str) -> Self {
        Self {
            log_prefix: format!("{} {}", LOG_PREFIX, label),
        }
    }
}

impl ReadObserver for LogObserver {
    fn read_issued(&self, offset: u64, capacity: usize) {
        log::trace!(
            "{} reading up to {} bytes at offset {}",
            self.log_prefix,
            capacity,
            offset
        );
    }

    fn read_completed(&self, offset: u64, result: &io::Result<usize>) {
        match result {
            Ok(n) => log::debug!(
                "{} {} bytes read at offset {}",
                self.log_prefix,
                n,
                offset
            ),
            Err(e) => log::error!(
                "{} read at offset {} failed: {}",
                self.log_prefix,
                offset,
                e
            ),
        }
    }

    fn chain_finished(&self, outcome: &Outcome) {
        match outcome {
            Ok(content) => log::info!(
                "{} read completed, {} bytes in {} fragments",
                self.log_prefix,
                content.len(),
                content.fragments().len()
            ),
            Err(e) => {
                log::error!("{} read chain failed: {}", self.log_prefix, e)
            }
        }
    }
}
