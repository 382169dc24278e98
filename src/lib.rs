use std::sync::Once;

pub mod buffer;
pub mod chained;
pub mod channel;
pub mod config;
mod errors;

pub use buffer::{Buffer, ByteBuffer, CharBuffer};
pub use chained::{read_file, ChainedFileReader, Content, Fragment};
pub use channel::FileChannel;
pub use config::ReaderConfig;
pub use errors::{NioError, ReadError, Result};

static INIT: Once = Once::new();

/// Install `env_logger` as the logger, once per process.
/// Hosts with their own logger should not call this.
pub fn initialize() {
    INIT.call_once(|| {
        if env_logger::try_init().is_ok() {
            log::info!("Initializing ark-nio");
        }
    });
}
