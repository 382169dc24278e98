use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use crate::buffer::ByteBuffer;
use crate::{NioError, Result};

/// Blocking, sequential read channel over a file.
///
/// Data only moves through a caller-owned [`ByteBuffer`].
pub struct FileChannel {
    file: File,
    path: PathBuf,
    position: u64,
}

impl FileChannel {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| NioError::Open {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            file,
            path,
            position: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Fill the remaining space of `buffer`.
    ///
    /// Returns `None` at end of file. `Some(0)` only happens
    /// when the buffer had no room left.
    pub fn read(&mut self, buffer: &mut ByteBuffer) -> Result<Option<usize>> {
        if !buffer.has_remaining() {
            return Ok(Some(0));
        }

        let n = loop {
            match self.file.read(buffer.unfilled_mut()) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };
        if n == 0 {
            return Ok(None);
        }

        buffer.advance(n)?;
        self.position += n as u64;
        Ok(Some(n))
    }

    /// Read everything left in the channel through a buffer
    /// of the given capacity, flipping between fill and drain.
    pub fn drain(&mut self, capacity: usize) -> Result<Vec<u8>> {
        if capacity == 0 {
            return Err(NioError::Config(
                "buffer capacity must be positive".to_owned(),
            ));
        }

        let mut buffer = ByteBuffer::allocate(capacity);
        let mut content = Vec::new();
        while let Some(n) = self.read(&mut buffer)? {
            log::trace!("{} bytes read from {:?}", n, self.path);
            buffer.flip();
            while buffer.has_remaining() {
                content.push(buffer.get()?);
            }
            buffer.clear();
        }

        log::debug!("{} bytes drained from {:?}", content.len(), self.path);
        Ok(content)
    }
}

/// Open `path` and read it to a string through a small buffer.
pub fn read_to_string<P: AsRef<Path>>(
    path: P,
    capacity: usize,
) -> Result<String> {
    let mut channel = FileChannel::open(path)?;
    let content = channel.drain(capacity)?;
    Ok(String::from_utf8(content)?)
}
