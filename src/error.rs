/// Turns a failed [`Result`] into a logged error so that one failure does not end a loop.
pub trait ResultOkLogExt<T, E> {
    /// Logs the error at `error` level under `target` and returns `None`.
    fn ok_log(self, target: &str) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_log(self, target: &str) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::error!(target: target, "{err}");
                None
            }
        }
    }
}
