//! Whole-file reads driven by a chain of positioned, non-blocking reads.
//!
//! A [`ChainedFileReader`] issues one read at a time on a tokio runtime.
//! Each completion either appends a fragment and issues the next read,
//! or ends the chain and opens the [`CompletionSignal`] the caller
//! waits on.

mod chain;
mod observer;
mod signal;

use std::fs::File;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task;

pub use chain::{Content, Fragment, ReadChain, Step};
pub use observer::{LogObserver, ReadObserver};
pub use signal::{CompletionSignal, Outcome};

use crate::buffer::ByteBuffer;
use crate::config::ReaderConfig;
use crate::errors::ReadError;
use crate::{NioError, Result};

pub struct ChainedFileReader {
    path: PathBuf,
    capacity: usize,
    runtime: Handle,
    file: Mutex<Option<Arc<File>>>,
    started: AtomicBool,
    released: Arc<AtomicBool>,
    signal: Arc<CompletionSignal>,
    observer: Arc<dyn ReadObserver>,
}

impl ChainedFileReader {
    /// Open `path` read-only. Reads will run on `runtime`.
    pub fn open<P: AsRef<Path>>(
        path: P,
        config: &ReaderConfig,
        runtime: Handle,
    ) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref().to_path_buf();
        let file = open_read_only(&path)?;

        let label = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => path.display().to_string(),
        };
        log::debug!("opened {} for chained reading", path.display());

        Ok(Self {
            path,
            capacity: config.capacity,
            runtime,
            file: Mutex::new(Some(Arc::new(file))),
            started: AtomicBool::new(false),
            released: Arc::new(AtomicBool::new(false)),
            signal: Arc::new(CompletionSignal::new()),
            observer: Arc::new(LogObserver::new(&label)),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn ReadObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Issue the first read at offset 0.
    ///
    /// Only one chain may run per reader, a second call fails
    /// with [`NioError::DoubleStart`].
    pub fn start_read(&self) -> Result<()> {
        let file = self.handle()?;
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(NioError::DoubleStart(self.path.clone()));
        }

        let driver = Driver {
            chain: ReadChain::new(self.capacity),
            file,
            released: self.released.clone(),
            signal: self.signal.clone(),
            observer: self.observer.clone(),
        };
        self.runtime.spawn(driver.run());
        Ok(())
    }

    /// Block until the chain finishes and return the whole content.
    ///
    /// Must not be called from a thread of the runtime driving the chain.
    /// Once the chain has finished every call returns the same outcome.
    pub fn await_completion(&self) -> Result<Content> {
        self.ensure_started()?;
        Ok(self.signal.wait()?)
    }

    pub fn await_completion_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Content> {
        self.ensure_started()?;
        match self.signal.wait_timeout(timeout) {
            Some(outcome) => Ok(outcome?),
            None => Err(NioError::Timeout(timeout)),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.signal.is_open()
    }

    /// Release the file handle.
    ///
    /// A running chain stops before its next read and reports
    /// [`ReadError::Released`]. Releasing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        self.released.store(true, Ordering::Release);

        let (mut slot, poisoned) = match self.file.lock() {
            Ok(slot) => (slot, false),
            Err(poisoned) => (poisoned.into_inner(), true),
        };
        if slot.take().is_none() {
            log::trace!("{} is already released", self.path.display());
            return Ok(());
        }
        log::debug!("released {}", self.path.display());

        if poisoned {
            return Err(NioError::Close {
                path: self.path.clone(),
                reason: "handle lock was poisoned".to_owned(),
            });
        }
        Ok(())
    }

    fn handle(&self) -> Result<Arc<File>> {
        let slot = self
            .file
            .lock()
            .map_err(|_| NioError::Released(self.path.clone()))?;
        slot.clone()
            .ok_or_else(|| NioError::Released(self.path.clone()))
    }

    fn ensure_started(&self) -> Result<()> {
        if self.started.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(NioError::NotStarted(self.path.clone()))
        }
    }
}

impl Drop for ChainedFileReader {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::error!(
                "Failed to release {} because of error: {}",
                self.path.display(),
                e
            )
        }
    }
}

/// Open, read through and release `path` in one call.
///
/// Honors `config.timeout_ms` when waiting.
pub fn read_file<P: AsRef<Path>>(
    path: P,
    config: &ReaderConfig,
    runtime: Handle,
) -> Result<Content> {
    let reader = ChainedFileReader::open(path, config, runtime)?;
    reader.start_read()?;
    let content = match config.timeout() {
        Some(timeout) => reader.await_completion_timeout(timeout),
        None => reader.await_completion(),
    };
    let closed = reader.close();
    let content = content?;
    closed?;
    Ok(content)
}

fn open_read_only(path: &Path) -> Result<File> {
    let open_error = |source| NioError::Open {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(open_error)?;
    let metadata = file.metadata().map_err(open_error)?;
    if metadata.is_dir() {
        return Err(open_error(io::Error::new(
            ErrorKind::InvalidInput,
            "path is a directory",
        )));
    }
    Ok(file)
}

/// Runs one read chain to its end on the runtime.
struct Driver {
    chain: ReadChain,
    file: Arc<File>,
    released: Arc<AtomicBool>,
    signal: Arc<CompletionSignal>,
    observer: Arc<dyn ReadObserver>,
}

impl Driver {
    async fn run(mut self) {
        let outcome = self.drive().await;
        self.observer.chain_finished(&outcome);
        self.signal.open(outcome);
    }

    async fn drive(&mut self) -> Outcome {
        loop {
            let offset = self.chain.cursor();
            if self.released.load(Ordering::Acquire) {
                return Err(ReadError::Released { offset });
            }

            let buffer = self
                .chain
                .check_out()
                .map_err(|e| io_failure(offset, e.to_string()))?;
            self.observer.read_issued(offset, buffer.remaining());

            let file = self.file.clone();
            let (buffer, result) =
                task::spawn_blocking(move || read_at(&file, buffer, offset))
                    .await
                    .map_err(|e| io_failure(offset, e.to_string()))?;
            self.observer.read_completed(offset, &result);

            match self.chain.complete(buffer, result) {
                Step::Next => continue,
                Step::Finished(content) => return Ok(content),
                Step::Failed(e) => return Err(e),
            }
        }
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        // Runtime shut down mid-chain, waiters must not hang
        if !self.signal.is_open() {
            self.signal.open(Err(ReadError::Abandoned {
                offset: self.chain.cursor(),
            }));
        }
    }
}

fn io_failure(offset: u64, message: String) -> ReadError {
    ReadError::Io {
        offset,
        source: Arc::new(io::Error::new(ErrorKind::Other, message)),
    }
}

/// Positioned read into the unfilled part of `buffer`,
/// handing the buffer back with the result.
fn read_at(
    file: &File,
    mut buffer: ByteBuffer,
    offset: u64,
) -> (ByteBuffer, io::Result<usize>) {
    let result =
        positioned_read(file, buffer.unfilled_mut(), offset).and_then(|n| {
            buffer.advance(n).map(|_| n).map_err(|e| {
                io::Error::new(ErrorKind::InvalidData, e.to_string())
            })
        });
    (buffer, result)
}

#[cfg(unix)]
fn positioned_read(
    file: &File,
    buf: &mut [u8],
    offset: u64,
) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(windows)]
fn positioned_read(
    file: &File,
    buf: &mut [u8],
    offset: u64,
) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}
