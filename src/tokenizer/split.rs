use super::TokenHandler;

/// Splits an in-memory region on a single delimiter byte.
///
/// # Examples
///
/// ```
/// # use netbuf_monitor::tokenizer::{Splitter, TokenHandler};
/// struct Count(usize);
///
/// impl TokenHandler for Count {
///     type Error = ();
///
///     fn handle_token(&mut self, _token: &[u8]) -> Result<(), ()> {
///         self.0 += 1;
///         Ok(())
///     }
/// }
///
/// let mut count = Count(0);
/// Splitter::new(b' ', true).split(b"  sl  local_address rem_address", &mut count).unwrap();
/// assert_eq!(count.0, 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Splitter {
    delimiter: u8,
    skip_consecutive: bool,
}

impl Splitter {
    /// Creates a splitter.
    ///
    /// With `skip_consecutive` set, runs of delimiters count as one and leading delimiters are
    /// ignored, so no empty tokens are produced. Without it every delimiter ends a token, even an
    /// empty one.
    pub const fn new(delimiter: u8, skip_consecutive: bool) -> Self {
        Self {
            delimiter,
            skip_consecutive,
        }
    }

    pub const fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Emits every token of `src` to `handler`, then calls [`TokenHandler::complete`].
    ///
    /// A final token without a trailing delimiter is still emitted. A trailing delimiter does
    /// not produce an empty final token.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first error returned by `handler`.
    pub fn split<H: TokenHandler>(&self, src: &[u8], handler: &mut H) -> Result<(), H::Error> {
        let mut start = 0;
        for (index, &byte) in src.iter().enumerate() {
            if byte != self.delimiter {
                continue;
            }
            if index > start || !self.skip_consecutive {
                handler.handle_token(&src[start..index])?;
            }
            start = index + 1;
        }
        if start < src.len() {
            handler.handle_token(&src[start..])?;
        }
        handler.complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::testing::Collect;

    fn split(src: &[u8], skip: bool) -> Collect {
        let mut collect = Collect::default();
        Splitter::new(b' ', skip).split(src, &mut collect).unwrap();
        collect
    }

    #[test]
    fn test_split_skips_padding() {
        let collect = split(b"   0: 00000000:4E50 00000000:0000 07  ", true);
        assert_eq!(
            collect.strings(),
            vec!["0:", "00000000:4E50", "00000000:0000", "07"]
        );
        assert_eq!(collect.completions, 1);
    }

    #[test]
    fn test_split_keeps_empty_tokens() {
        let collect = split(b"a  b ", false);
        assert_eq!(collect.strings(), vec!["a", "", "b"]);
    }

    #[test]
    fn test_split_final_token_without_delimiter() {
        let collect = split(b"one two", true);
        assert_eq!(collect.strings(), vec!["one", "two"]);
    }

    #[test]
    fn test_split_empty_region() {
        let collect = split(b"", true);
        assert!(collect.tokens.is_empty());
        assert_eq!(collect.completions, 1);
    }

    #[test]
    fn test_split_only_delimiters() {
        let collect = split(b"     ", true);
        assert!(collect.tokens.is_empty());
        assert_eq!(collect.completions, 1);
    }

    #[test]
    fn test_split_stops_on_handler_error() {
        struct FailOnSecond(usize);

        impl TokenHandler for FailOnSecond {
            type Error = &'static str;

            fn handle_token(&mut self, _token: &[u8]) -> Result<(), Self::Error> {
                self.0 += 1;
                if self.0 == 2 { Err("boom") } else { Ok(()) }
            }

            fn complete(&mut self) -> Result<(), Self::Error> {
                panic!("complete must not run after an error");
            }
        }

        let mut handler = FailOnSecond(0);
        let err = Splitter::new(b',', false)
            .split(b"a,b,c", &mut handler)
            .unwrap_err();
        assert_eq!(err, "boom");
        assert_eq!(handler.0, 2);
    }
}
