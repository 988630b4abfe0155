//! Delimiter-based tokenizers that hand out borrowed byte slices instead of owned strings.
//!
//! Two tokenizers cover the two ways a kernel table reaches us:
//!
//! - [`Splitter`] walks a region that is fully in memory.
//! - [`ChunkTokenizer`] accepts the input as a sequence of reads whose boundaries need not
//!   line up with delimiters, stitching tokens that span several reads together in a bounded
//!   scratch buffer.
//!
//! Both report tokens to a [`TokenHandler`]. Rows and columns are parsed by nesting: an outer
//! tokenizer splits on `\n` and hands every row to an inner [`Splitter`] splitting on `' '`.

mod error;
mod split;
mod stream;

pub use error::Error;
pub use split::Splitter;
pub use stream::ChunkTokenizer;

/// Receives the tokens produced by a tokenizer.
pub trait TokenHandler {
    type Error;

    /// Called once per token, in input order. The slice never contains the delimiter.
    fn handle_token(&mut self, token: &[u8]) -> Result<(), Self::Error>;

    /// Called after the last token of a region.
    fn complete(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<H: TokenHandler + ?Sized> TokenHandler for &mut H {
    type Error = H::Error;

    fn handle_token(&mut self, token: &[u8]) -> Result<(), Self::Error> {
        (**self).handle_token(token)
    }

    fn complete(&mut self) -> Result<(), Self::Error> {
        (**self).complete()
    }
}
