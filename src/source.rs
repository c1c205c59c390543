//! access to the text the job reads from
//!
//! training data is pulled through a [`LineSource`] so a worker does not care
//! whether it comes from a file or from memory. test input is read with
//! [`read_records`] which keys every line by its byte offset in its file.
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::PathBuf;
use std::string::FromUtf8Error;

use crate::error::{KnnError, Result};

/// something that can be opened as a sequence of lines
pub trait LineSource: Send + Sync {
    /// human readable name used in logs and errors
    fn name(&self) -> String;

    /// opens the source for reading from the start. an unreachable source
    /// is a [`KnnError::Configuration`]
    fn open(&self) -> Result<Box<dyn BufRead + '_>>;
}

/// lines read from a file on disk
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LineSource for FileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self) -> Result<Box<dyn BufRead + '_>> {
        let file = File::open(&self.path).map_err(|source| KnnError::Configuration {
            path: self.path.clone(),
            source,
        })?;

        Ok(Box::new(BufReader::new(file)))
    }
}

/// lines held in memory
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    text: String,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

impl LineSource for MemorySource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn open(&self) -> Result<Box<dyn BufRead + '_>> {
        Ok(Box::new(Cursor::new(self.text.as_bytes())))
    }
}

/// one line of test input and where it was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRecord {
    /// byte offset of the line within its file
    pub offset: u64,
    /// 1-based line number within its file
    pub number: usize,
    /// the text of the line or the bytes that were not valid UTF-8
    pub line: std::result::Result<String, FromUtf8Error>,
}

impl InputRecord {
    /// the text of the line. a line that is not valid UTF-8 is reported as a
    /// parse error so it falls under the malformed record policy
    pub fn text(&self) -> Result<&str> {
        match &self.line {
            Ok(line) => Ok(line),
            Err(err) => Err(KnnError::parse(
                self.number,
                format!("line is not valid UTF-8. {err}"),
            )),
        }
    }
}

/// drops the trailing line ending left behind by [`BufRead::read_until`]
fn trim_line_ending(line: &mut Vec<u8>) {
    if line.ends_with(b"\n") {
        line.pop();

        if line.ends_with(b"\r") {
            line.pop();
        }
    }
}

/// reads every line of the reader keyed by its byte offset. lines that are
/// not valid UTF-8 are kept so the worker can reject them one by one
pub fn read_records<R>(mut reader: R) -> Result<Vec<InputRecord>>
where
    R: BufRead,
{
    let mut rtn = Vec::new();
    let mut offset = 0u64;

    loop {
        let mut line = Vec::new();
        let read = reader.read_until(b'\n', &mut line)?;

        if read == 0 {
            break;
        }

        trim_line_ending(&mut line);

        rtn.push(InputRecord {
            offset,
            number: rtn.len() + 1,
            line: String::from_utf8(line),
        });

        offset += read as u64;
    }

    Ok(rtn)
}

/// resolves the given input paths into a list of files. a directory
/// contributes every regular file directly inside of it, sorted by name and
/// skipping hidden files and files starting with an underscore
pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        let metadata = std::fs::metadata(input).map_err(|source| KnnError::Configuration {
            path: input.clone(),
            source,
        })?;

        if !metadata.is_dir() {
            files.push(input.clone());
            continue;
        }

        let entries = std::fs::read_dir(input).map_err(|source| KnnError::Configuration {
            path: input.clone(),
            source,
        })?;

        let mut found = Vec::new();

        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();

            if name.starts_with('.') || name.starts_with('_') {
                continue;
            }

            if entry.file_type()?.is_file() {
                found.push(entry.path());
            }
        }

        found.sort();
        files.extend(found);
    }

    Ok(files)
}
