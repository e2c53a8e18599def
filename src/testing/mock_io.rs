//! Mock I/O helpers for testing without fixture files on disk.

use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

/// A temporary file that is deleted when dropped.
pub struct TempFilePath {
    #[allow(dead_code)]
    temp_file: NamedTempFile,
    path: PathBuf,
}

impl TempFilePath {
    /// Create a new temporary file.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be created.
    pub fn new() -> std::io::Result<Self> {
        let temp_file = NamedTempFile::new()?;
        let path = temp_file.path().to_path_buf();
        Ok(Self { temp_file, path })
    }

    /// Create a new temporary file with a specific extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be created.
    pub fn with_extension(extension: &str) -> std::io::Result<Self> {
        let temp_file = tempfile::Builder::new()
            .suffix(&format!(".{extension}"))
            .tempfile()?;
        let path = temp_file.path().to_path_buf();
        Ok(Self { temp_file, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A temporary directory that is deleted when dropped.
pub struct TempDirPath {
    #[allow(dead_code)]
    temp_dir: TempDir,
    path: PathBuf,
}

impl TempDirPath {
    /// Create a new temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().to_path_buf();
        Ok(Self { temp_dir, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of `filename` inside this directory.
    #[must_use]
    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.path.join(filename)
    }
}

/// Create a temporary data file holding `lines`, each terminated by `\n`.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created or written.
///
/// # Example
///
/// ```
/// use microlector::testing::mock_data_file;
///
/// let temp = mock_data_file(["0001011", "0002022"]).unwrap();
/// assert_eq!(std::fs::read_to_string(temp.path()).unwrap(), "0001011\n0002022\n");
/// ```
pub fn mock_data_file<I>(lines: I) -> std::io::Result<TempFilePath>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let temp = TempFilePath::with_extension("txt")?;
    std::fs::write(temp.path(), joined(lines))?;
    Ok(temp)
}

/// Write `lines` to `filename` inside `dir` and return its path.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_data_file<I>(dir: &TempDirPath, filename: &str, lines: I) -> std::io::Result<PathBuf>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let path = dir.file_path(filename);
    std::fs::write(&path, joined(lines))?;
    Ok(path)
}

/// Create a gzip-compressed temporary data file holding `lines`.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created or written.
#[cfg(feature = "compression-gzip")]
pub fn mock_gzip_file<I>(lines: I) -> std::io::Result<TempFilePath>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let temp = TempFilePath::with_extension("txt.gz")?;
    let mut encoder = GzEncoder::new(std::fs::File::create(temp.path())?, Compression::default());
    encoder.write_all(joined(lines).as_bytes())?;
    encoder.finish()?.flush()?;
    Ok(temp)
}

fn joined<I>(lines: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut out = String::new();
    for line in lines {
        out.push_str(line.as_ref());
        out.push('\n');
    }
    out
}

/// In-memory reader returning at most `chunk` bytes per `read` call.
///
/// Lets tests place read boundaries at exact byte offsets, e.g. between a
/// `\r` and its `\n` or inside a multibyte character.
///
/// ```
/// use std::io::Read;
/// use microlector::testing::ChunkedReader;
///
/// let mut r = ChunkedReader::new("abcde", 2);
/// let mut buf = [0u8; 8];
/// assert_eq!(r.read(&mut buf).unwrap(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ChunkedReader {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
}

impl ChunkedReader {
    pub fn new(data: impl Into<Vec<u8>>, chunk: usize) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            chunk: chunk.max(1),
        }
    }
}

impl Read for ChunkedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.chunk.min(buf.len()).min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
