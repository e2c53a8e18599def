//! Streaming fixed-width line reader.
//!
//! Data files are read in byte chunks whose boundaries fall anywhere: inside
//! a record, between a `\r` and its `\n`, or inside a multibyte UTF-8
//! sequence. [`LineSplitter`] re-assembles lines from text chunks and
//! [`FixedWidthLines`] drives it from any [`Read`], validating every line
//! against the record length.
//!
//! # Notes
//! - `\r\n`, `\r` and `\n` all terminate a line.
//! - Zero-length lines are separators. They are skipped but keep their
//!   place in the line numbering.
//! - A final fragment with no line terminator is still returned as a line.
//! - Length is counted in characters, not bytes.

use crate::definition::FileSpec;
use crate::error::{Error, Result};
use crate::io::compression::auto_detect_reader;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Default read chunk size in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Incremental splitter carrying an unterminated fragment between chunks.
#[derive(Debug, Default)]
pub struct LineSplitter {
    remainder: String,
    /// Physical lines terminated so far
    terminated: u64,
    /// Previous chunk ended on `\r`; a leading `\n` belongs to it
    after_cr: bool,
}

impl LineSplitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `chunk`, returning every non-empty line it completes.
    pub fn feed(&mut self, chunk: &str) -> Vec<Line> {
        let bytes = chunk.as_bytes();
        let mut lines = Vec::new();
        let mut i = 0;
        if self.after_cr && !bytes.is_empty() {
            if bytes[0] == b'\n' {
                i = 1;
            }
            self.after_cr = false;
        }
        let mut start = i;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => {
                    self.complete(&chunk[start..i], &mut lines);
                    i += 1;
                    start = i;
                }
                b'\r' => {
                    self.complete(&chunk[start..i], &mut lines);
                    i += 1;
                    match bytes.get(i) {
                        Some(b'\n') => i += 1,
                        Some(_) => {}
                        None => self.after_cr = true,
                    }
                    start = i;
                }
                _ => i += 1,
            }
        }
        self.remainder.push_str(&chunk[start..]);
        lines
    }

    /// Flush the trailing fragment at end of stream.
    #[must_use]
    pub fn finish(&mut self) -> Option<Line> {
        let text = std::mem::take(&mut self.remainder);
        if text.is_empty() {
            return None;
        }
        self.terminated += 1;
        Some(Line {
            number: self.terminated,
            text,
        })
    }

    fn complete(&mut self, piece: &str, out: &mut Vec<Line>) {
        self.terminated += 1;
        let mut text = std::mem::take(&mut self.remainder);
        text.push_str(piece);
        if !text.is_empty() {
            out.push(Line {
                number: self.terminated,
                text,
            });
        }
    }
}

/// A record line with its position in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based physical line number; skipped blank lines are counted
    pub number: u64,
    pub text: String,
}

/// Lazy iterator over validated record lines of one data stream.
///
/// Yields `Err` once and then stops on the first read failure, invalid
/// UTF-8, or wrong-length line.
pub struct FixedWidthLines<R: Read> {
    reader: R,
    file: String,
    record_length: usize,
    buf: Vec<u8>,
    carry: Vec<u8>,
    splitter: LineSplitter,
    pending: VecDeque<Line>,
    eof: bool,
    stopped: bool,
}

impl<R: Read> FixedWidthLines<R> {
    pub fn new(reader: R, spec: &FileSpec, chunk_size: usize) -> Self {
        Self {
            reader,
            file: spec.id.clone(),
            record_length: spec.record_length,
            buf: vec![0; chunk_size.max(1)],
            carry: Vec::new(),
            splitter: LineSplitter::new(),
            pending: VecDeque::new(),
            eof: false,
            stopped: false,
        }
    }

    /// Read one chunk and split it. Sets `eof` when the reader is drained.
    fn fill(&mut self) -> Result<()> {
        let n = loop {
            match self.reader.read(&mut self.buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::stream(&self.file, e)),
            }
        };

        if n == 0 {
            self.eof = true;
            if !self.carry.is_empty() {
                return Err(Error::stream(&self.file, "stream ends inside a UTF-8 sequence"));
            }
            self.pending.extend(self.splitter.finish());
            return Ok(());
        }

        self.carry.extend_from_slice(&self.buf[..n]);
        let valid = match std::str::from_utf8(&self.carry) {
            Ok(s) => s.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => {
                return Err(Error::stream(
                    &self.file,
                    format!("invalid UTF-8 in data: {e}"),
                ));
            }
        };
        let text = std::str::from_utf8(&self.carry[..valid])
            .map_err(|e| Error::stream(&self.file, e))?;
        let lines = self.splitter.feed(text);
        self.pending.extend(lines);
        self.carry.drain(..valid);
        Ok(())
    }

    fn stop(&mut self) {
        self.stopped = true;
        self.pending.clear();
    }
}

impl<R: Read> Iterator for FixedWidthLines<R> {
    type Item = Result<Line>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.stopped {
                return None;
            }
            if let Some(line) = self.pending.pop_front() {
                let actual = line.text.chars().count();
                if actual != self.record_length {
                    self.stop();
                    return Some(Err(Error::LineLengthMismatch {
                        file: self.file.clone(),
                        line: line.number,
                        expected: self.record_length,
                        actual,
                    }));
                }
                return Some(Ok(line));
            }
            if self.eof {
                return None;
            }
            if let Err(e) = self.fill() {
                self.stop();
                return Some(Err(e));
            }
        }
    }
}

/// Open a data file (transparently decompressed) as a record line stream.
///
/// # Errors
/// Returns [`Error::Stream`] if the file cannot be opened or its
/// compression header cannot be read.
pub fn open_records(
    path: impl AsRef<Path>,
    spec: &FileSpec,
    chunk_size: usize,
) -> Result<FixedWidthLines<Box<dyn Read>>> {
    let path = path.as_ref();
    let f = File::open(path)
        .map_err(|e| Error::stream(&spec.id, format!("open {}: {e}", path.display())))?;
    let rdr = auto_detect_reader(f, path)
        .map_err(|e| Error::stream(&spec.id, format!("decompress {}: {e}", path.display())))?;
    Ok(FixedWidthLines::new(rdr, spec, chunk_size))
}
