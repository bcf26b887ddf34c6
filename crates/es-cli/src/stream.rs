//! Reading, scrubbing and writing event streams.

use es_scrub::{ScrubSummary, Scrubber};
use serde_json::Value;
use std::io::{self, BufRead, Write};
use std::path::Path;
use thiserror::Error;

/// How input is framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// One JSON document.
    Document,
    /// One JSON document per line; blank lines are skipped.
    Lines,
}

impl InputMode {
    /// Lines for `.jsonl` and `.ndjson` files, a single document otherwise.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("jsonl" | "ndjson") => InputMode::Lines,
            _ => InputMode::Document,
        }
    }
}

/// Errors while processing a stream.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("failed to read input: {0}")]
    Read(#[source] io::Error),

    #[error("failed to write output: {0}")]
    Write(#[source] io::Error),

    #[error("invalid JSON{}: {source}", line_suffix(.line))]
    Parse {
        line: Option<usize>,
        #[source]
        source: serde_json::Error,
    },
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|n| format!(" on line {n}")).unwrap_or_default()
}

/// Totals for one stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamOutcome {
    pub events: usize,
    pub summary: ScrubSummary,
}

/// Scrub every event read from `reader` and write it to `writer`.
///
/// In line mode events already written stay written if a later line fails
/// to parse; nothing unscrubbed is ever written.
pub fn scrub_stream<R, W>(
    scrubber: &Scrubber,
    reader: R,
    mut writer: W,
    mode: InputMode,
    pretty: bool,
) -> Result<StreamOutcome, StreamError>
where
    R: BufRead,
    W: Write,
{
    let mut outcome = StreamOutcome::default();

    match mode {
        InputMode::Document => {
            let mut event: Value = serde_json::from_reader(reader).map_err(|e| {
                if e.is_io() {
                    StreamError::Read(e.into())
                } else {
                    StreamError::Parse {
                        line: None,
                        source: e,
                    }
                }
            })?;
            outcome.summary = scrubber.scrub(&mut event);
            outcome.events = 1;
            write_event(&mut writer, &event, pretty)?;
        }
        InputMode::Lines => {
            for (index, line) in reader.lines().enumerate() {
                let line = line.map_err(StreamError::Read)?;
                if line.trim().is_empty() {
                    continue;
                }

                let mut event: Value =
                    serde_json::from_str(&line).map_err(|source| StreamError::Parse {
                        line: Some(index + 1),
                        source,
                    })?;
                outcome.summary.merge(&scrubber.scrub(&mut event));
                outcome.events += 1;
                // Line framing needs one event per line.
                write_event(&mut writer, &event, false)?;
            }
        }
    }

    writer.flush().map_err(StreamError::Write)?;
    Ok(outcome)
}

fn write_event<W: Write>(writer: &mut W, event: &Value, pretty: bool) -> Result<(), StreamError> {
    let result = if pretty {
        serde_json::to_writer_pretty(&mut *writer, event)
    } else {
        serde_json::to_writer(&mut *writer, event)
    };
    result.map_err(|e| StreamError::Write(e.into()))?;
    writer.write_all(b"\n").map_err(StreamError::Write)
}
