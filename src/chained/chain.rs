use std::borrow::Cow;
use std::io::{self, ErrorKind};
use std::sync::Arc;

use crate::buffer::ByteBuffer;
use crate::errors::ReadError;
use crate::{NioError, Result};

/// Bytes returned by one completed read, with the file offset they came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    pub offset: u64,
    pub bytes: Vec<u8>,
}

impl Fragment {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

/// Whole file content assembled from the fragments of a finished chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Content {
    bytes: Arc<[u8]>,
    fragments: Arc<[Fragment]>,
}

impl Default for Content {
    fn default() -> Self {
        Self::assemble(Vec::new())
    }
}

impl Content {
    fn assemble(fragments: Vec<Fragment>) -> Self {
        let bytes: Vec<u8> = fragments
            .iter()
            .flat_map(|fragment| fragment.bytes.iter().copied())
            .collect();
        Self {
            bytes: bytes.into(),
            fragments: fragments.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Decode the whole content as UTF-8.
    /// Characters split across fragments decode correctly.
    pub fn as_str(&self) -> Result<&str> {
        Ok(std::str::from_utf8(&self.bytes)?)
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

/// What the driver does after a completion.
#[derive(Debug)]
pub enum Step {
    /// Issue the next read at [`ReadChain::cursor`]
    Next,
    Finished(Content),
    Failed(ReadError),
}

/// State of a chained read: cursor, transfer buffer and fragment log.
///
/// The buffer is checked out to a pending read and checked back in
/// by [`ReadChain::complete`], so two reads can never share it.
pub struct ReadChain {
    buffer: Option<ByteBuffer>,
    cursor: u64,
    fragments: Vec<Fragment>,
    finished: bool,
}

impl ReadChain {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Some(ByteBuffer::allocate(capacity)),
            cursor: 0,
            fragments: Vec::new(),
            finished: false,
        }
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_in_flight(&self) -> bool {
        self.buffer.is_none()
    }

    /// Hand the cleared buffer to the next read.
    pub fn check_out(&mut self) -> Result<ByteBuffer> {
        if self.finished {
            return Err(NioError::Other(anyhow::anyhow!(
                "read chain already finished at offset {}",
                self.cursor
            )));
        }
        let mut buffer = self.buffer.take().ok_or(NioError::InFlight)?;
        buffer.clear();
        Ok(buffer)
    }

    /// Feed the result of the pending read back into the chain.
    ///
    /// `result` is the number of bytes the read placed at the buffer's
    /// position, zero meaning end of file.
    pub fn complete(
        &mut self,
        mut buffer: ByteBuffer,
        result: io::Result<usize>,
    ) -> Step {
        match result {
            Ok(0) => {
                self.buffer = Some(buffer);
                self.finished = true;
                Step::Finished(Content::assemble(self.fragments.clone()))
            }
            Ok(n) => {
                buffer.flip();
                // Only the first `n` bytes belong to this read
                let bytes = match buffer.get_slice(n).map(<[u8]>::to_vec) {
                    Ok(bytes) => bytes,
                    Err(_) => {
                        self.buffer = Some(buffer);
                        return self.fail(io::Error::new(
                            ErrorKind::InvalidData,
                            format!("read reported {} bytes beyond buffer", n),
                        ));
                    }
                };
                buffer.clear();
                self.buffer = Some(buffer);

                self.fragments.push(Fragment {
                    offset: self.cursor,
                    bytes,
                });
                self.cursor += n as u64;
                Step::Next
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {
                buffer.clear();
                self.buffer = Some(buffer);
                Step::Next
            }
            Err(e) => {
                self.buffer = Some(buffer);
                self.fail(e)
            }
        }
    }

    fn fail(&mut self, source: io::Error) -> Step {
        self.finished = true;
        Step::Failed(ReadError::Io {
            offset: self.cursor,
            source: Arc::new(source),
        })
    }
}
