use super::{Error, TokenHandler};

/// Tokenizes input that arrives as a sequence of chunks.
///
/// Tokens that lie entirely within one chunk are handed out as slices of that chunk. A token
/// cut by a chunk boundary is copied into a scratch buffer until its delimiter shows up. No
/// token may be longer than the capacity given at construction, wherever the chunk boundaries
/// fall. Empty tokens are skipped.
#[derive(Debug, Clone)]
pub struct ChunkTokenizer {
    delimiter: u8,
    scratch: Vec<u8>,
    capacity: usize,
}

impl ChunkTokenizer {
    /// Creates a tokenizer accepting tokens of at most `capacity` bytes.
    pub fn new(delimiter: u8, capacity: usize) -> Self {
        Self {
            delimiter,
            scratch: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops any partial token left over from an aborted input.
    pub fn reset(&mut self) {
        self.scratch.clear();
    }

    /// Feeds the next chunk of input.
    ///
    /// Every token terminated within `chunk` is delivered before this returns. Bytes after the
    /// last delimiter are kept until the next call to [`feed`](Self::feed) or
    /// [`finish`](Self::finish).
    ///
    /// # Errors
    ///
    /// Returns [`Error::TokenTooLong`] if a token is longer than the capacity, or the first
    /// error returned by `handler`.
    pub fn feed<H>(&mut self, chunk: &[u8], handler: &mut H) -> Result<(), H::Error>
    where
        H: TokenHandler,
        H::Error: From<Error>,
    {
        let mut start = 0;
        while let Some(offset) = chunk[start..].iter().position(|&b| b == self.delimiter) {
            let end = start + offset;
            if self.scratch.is_empty() {
                if end - start > self.capacity {
                    return Err(self.too_long().into());
                }
                if end > start {
                    handler.handle_token(&chunk[start..end])?;
                }
            } else {
                self.buffer(&chunk[start..end])?;
                let result = handler.handle_token(&self.scratch);
                self.scratch.clear();
                result?;
            }
            start = end + 1;
        }
        self.buffer(&chunk[start..])?;
        Ok(())
    }

    /// Flushes a trailing token that was not followed by a delimiter and calls
    /// [`TokenHandler::complete`].
    ///
    /// # Errors
    ///
    /// Returns the first error returned by `handler`.
    pub fn finish<H: TokenHandler>(&mut self, handler: &mut H) -> Result<(), H::Error> {
        if !self.scratch.is_empty() {
            let result = handler.handle_token(&self.scratch);
            self.scratch.clear();
            result?;
        }
        handler.complete()
    }

    fn buffer(&mut self, bytes: &[u8]) -> Result<(), Error> {
        if self.scratch.len() + bytes.len() > self.capacity {
            self.scratch.clear();
            return Err(self.too_long());
        }
        self.scratch.extend_from_slice(bytes);
        Ok(())
    }

    fn too_long(&self) -> Error {
        Error::TokenTooLong {
            capacity: self.capacity,
        }
    }
}
