use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Error that occurs when opening a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to open file `{path}`: {source}")]
pub struct FileOpenError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Errors returned by [`FileLoader`].
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Open(#[from] FileOpenError),
    #[error("failed to read file `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Opens a file at the given path for reading.
///
/// # Errors
///
/// Returns a [`FileOpenError`] if the file cannot be opened.
///
/// # Example
/// ```no_run
/// # use netbuf_monitor::fsutil;
/// let file = fsutil::open_file("/proc/net/udp")?;
/// # Ok::<(), fsutil::FileOpenError>(())
/// ```
pub fn open_file(path: impl AsRef<Path>) -> Result<File, FileOpenError> {
    let path = path.as_ref();
    File::open(path).map_err(|source| FileOpenError {
        path: path.to_path_buf(),
        source,
    })
}

/// Re-reads one file from the start on every call, into a buffer owned by the loader.
///
/// The file is opened on first use and afterwards only rewound to offset 0, which is all
/// procfs needs to produce fresh contents. The buffer grows when a read fills it and is never
/// shrunk, so steady-state reads do not allocate.
#[derive(Debug)]
pub struct FileLoader {
    path: PathBuf,
    file: Option<File>,
    buffer: Vec<u8>,
}

impl FileLoader {
    /// Creates a loader for `path` without touching the file system.
    pub fn new(path: impl Into<PathBuf>, initial_capacity: usize) -> Self {
        Self {
            path: path.into(),
            file: None,
            buffer: vec![0; initial_capacity.max(1)],
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current size of the read buffer in bytes.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Reads the whole file and returns its contents.
    ///
    /// procfs files report a size of 0, so the loader reads until EOF and doubles the buffer
    /// (or grows it to the reported size, whichever is larger) whenever it fills up.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Open`] if the file cannot be opened and [`LoadError::Read`] if
    /// rewinding or reading it fails.
    pub fn load(&mut self) -> Result<&[u8], LoadError> {
        let file = rewound(&mut self.file, &self.path)?;
        let reported = file.metadata().map_or(0, |m| m.len() as usize);
        if reported > self.buffer.len() {
            self.buffer.resize(reported, 0);
        }

        let mut len = 0;
        loop {
            if len == self.buffer.len() {
                let grown = (self.buffer.len() * 2).max(reported);
                log::trace!(
                    "growing read buffer for `{}` to {grown} bytes",
                    self.path.display()
                );
                self.buffer.resize(grown, 0);
            }
            match file.read(&mut self.buffer[len..]) {
                Ok(0) => break,
                Ok(n) => len += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(LoadError::Read {
                        path: self.path.clone(),
                        source,
                    });
                }
            }
        }
        Ok(&self.buffer[..len])
    }

    /// Reads the file in chunks of at most [`capacity`](Self::capacity) bytes and hands every
    /// chunk to `on_chunk` as soon as it is read.
    ///
    /// # Errors
    ///
    /// Returns the load error converted into `E`, or the first error returned by `on_chunk`.
    pub fn stream<E, F>(&mut self, mut on_chunk: F) -> Result<(), E>
    where
        E: From<LoadError>,
        F: FnMut(&[u8]) -> Result<(), E>,
    {
        let file = rewound(&mut self.file, &self.path)?;
        loop {
            match file.read(&mut self.buffer) {
                Ok(0) => return Ok(()),
                Ok(n) => on_chunk(&self.buffer[..n])?,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(LoadError::Read {
                        path: self.path.clone(),
                        source,
                    }
                    .into());
                }
            }
        }
    }
}

/// Opens the file on first use, otherwise seeks back to its start.
fn rewound<'a>(file: &'a mut Option<File>, path: &Path) -> Result<&'a mut File, LoadError> {
    match file {
        Some(open) => {
            open.seek(SeekFrom::Start(0))
                .map_err(|source| LoadError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
            Ok(open)
        }
        None => Ok(file.insert(open_file(path)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn rewrite(tmp: &tempfile::NamedTempFile, contents: &[u8]) {
        let mut file = tmp.reopen().unwrap();
        file.set_len(0).unwrap();
        file.write_all(contents).unwrap();
    }

    #[test]
    fn test_open_file_success() {
        let tmp = tempfile::NamedTempFile::new().expect("failed to create temp file");
        let file = open_file(tmp.path()).expect("should open test file");
        assert!(file.metadata().unwrap().is_file());
    }

    #[test]
    fn test_open_file_error() {
        let result = open_file("/definitely/does/not/exist");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.path, PathBuf::from("/definitely/does/not/exist"));
        assert_eq!(err.source.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_load_rereads_from_start() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        rewrite(&tmp, b"first");
        let mut loader = FileLoader::new(tmp.path(), 64);
        assert_eq!(loader.load().unwrap(), b"first");
        assert_eq!(loader.load().unwrap(), b"first");

        rewrite(&tmp, b"second!");
        assert_eq!(loader.load().unwrap(), b"second!");
    }

    #[test]
    fn test_load_grows_and_never_shrinks() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let large = vec![b'x'; 1000];
        rewrite(&tmp, &large);

        let mut loader = FileLoader::new(tmp.path(), 8);
        assert_eq!(loader.load().unwrap(), &large[..]);
        let grown = loader.capacity();
        assert!(grown >= 1000);

        rewrite(&tmp, b"tiny");
        assert_eq!(loader.load().unwrap(), b"tiny");
        assert_eq!(loader.capacity(), grown);
    }

    #[test]
    fn test_load_missing_file() {
        let mut loader = FileLoader::new("/definitely/does/not/exist", 8);
        let err = loader.load().unwrap_err();
        assert!(matches!(err, LoadError::Open(FileOpenError { .. })));
    }

    #[test]
    fn test_stream_chunks() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        rewrite(&tmp, b"0123456789");
        let mut loader = FileLoader::new(tmp.path(), 4);

        for _ in 0..2 {
            let mut chunks = Vec::new();
            loader
                .stream(|chunk| {
                    chunks.push(chunk.to_vec());
                    Ok::<_, LoadError>(())
                })
                .unwrap();
            assert!(chunks.iter().all(|c| c.len() <= 4));
            assert_eq!(chunks.concat(), b"0123456789");
        }
        assert_eq!(loader.capacity(), 4);
    }
}
