// src/process/mod.rs
use csv::{ReaderBuilder, Trim};
use serde::Serialize;
use std::{fs, io::Read, path::Path};
use tracing::debug;

use crate::error::IngestError;

pub mod transcript;

pub use transcript::{clean_transcript, split_transcript};

/// One data line of the extract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawRow {
    /// 1-based line in the source text, counting any fence or blank lines
    /// stripped ahead of the header.
    pub line: u64,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    /// Cells of the first record, untouched apart from trimming.
    pub header: Vec<String>,
    /// Every following record, whatever its width.
    pub rows: Vec<RawRow>,
}

impl RawTable {
    /// Parse CSV text. Records may differ in width; checking them against the
    /// header is the loader's job.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, IngestError> {
        Self::from_reader_at(reader, 0)
    }

    /// [`Self::from_reader`] for text that starts `line_offset` lines into
    /// its source.
    fn from_reader_at<R: Read>(reader: R, line_offset: u64) -> Result<Self, IngestError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let mut records = rdr.records();
        let header: Vec<String> = match records.next() {
            Some(record) => record?.iter().map(str::to_string).collect(),
            None => return Err(IngestError::EmptyInput),
        };

        let mut rows = Vec::new();
        for result in records {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            rows.push(RawRow {
                line: line + line_offset,
                cells: record.iter().map(str::to_string).collect(),
            });
        }

        debug!(columns = header.len(), rows = rows.len(), "parsed raw table");
        Ok(Self { header, rows })
    }

    /// Parse a transcript, dropping any Markdown fences around it first.
    pub fn from_transcript(text: &str) -> Result<Self, IngestError> {
        let (skipped, body) = split_transcript(text);
        if body.is_empty() {
            return Err(IngestError::EmptyInput);
        }
        Self::from_reader_at(body.as_bytes(), skipped)
    }

    #[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, IngestError> {
        let text = fs::read_to_string(&path).map_err(|source| IngestError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        Self::from_transcript(&text)
    }
}
