#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A token spanning several chunks did not fit into the scratch buffer.
    #[error("token exceeds the scratch buffer capacity of {capacity} bytes")]
    TokenTooLong { capacity: usize },
}
