//! Delimited text output
//!
//! Writes the query result as one header record followed by one record per
//! row. Fields are quoted only when they contain the delimiter, a quote or a
//! line break.

use crate::adapters::database::TextRow;
use crate::config::OutputConfig;
use crate::domain::{ReporterError, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Formatting options for the tabular file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabularOptions {
    /// Field delimiter
    pub delimiter: u8,

    /// Terminate records with `\r\n` instead of `\n`
    pub crlf: bool,
}

impl Default for TabularOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            crlf: true,
        }
    }
}

impl From<&OutputConfig> for TabularOptions {
    fn from(config: &OutputConfig) -> Self {
        Self {
            delimiter: config.delimiter_byte(),
            crlf: config.uses_crlf(),
        }
    }
}

/// Streaming writer for the local tabular file
pub struct TabularWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: u64,
}

impl TabularWriter {
    /// Truncate-create `path`
    ///
    /// # Errors
    ///
    /// Returns `ReporterError::LocalIo` if the file cannot be created.
    pub fn create(path: &Path, options: TabularOptions) -> Result<Self> {
        let file = File::create(path).map_err(|e| ReporterError::local_io(path, e))?;
        let terminator = if options.crlf {
            Terminator::CRLF
        } else {
            Terminator::Any(b'\n')
        };
        let writer = WriterBuilder::new()
            .delimiter(options.delimiter)
            .terminator(terminator)
            .quote_style(QuoteStyle::Necessary)
            .from_writer(file);

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            rows: 0,
        })
    }

    /// Write the header record
    pub fn write_header(&mut self, columns: &[String]) -> Result<()> {
        self.writer
            .write_record(columns)
            .map_err(|e| ReporterError::local_io(&self.path, e.into()))
    }

    /// Write one data record; `None` becomes an empty field
    pub fn write_row(&mut self, values: &TextRow) -> Result<()> {
        self.writer
            .write_record(values.iter().map(|v| v.as_deref().unwrap_or("")))
            .map_err(|e| ReporterError::local_io(&self.path, e.into()))?;
        self.rows += 1;
        Ok(())
    }

    /// Data rows written so far
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flush and close the file, returning the number of data rows
    pub fn finish(self) -> Result<u64> {
        let TabularWriter { path, writer, rows } = self;
        let file = writer.into_inner().map_err(|e| {
            let cause = e.error();
            ReporterError::local_io(&path, std::io::Error::new(cause.kind(), cause.to_string()))
        })?;
        file.sync_all().map_err(|e| ReporterError::local_io(&path, e))?;
        Ok(rows)
    }
}
