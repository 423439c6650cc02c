//! Plain-text sample streams.
//!
//! Format:
//! - numeric tokens separated by any whitespace, line breaks included
//! - a training record is `input_len` inputs followed by `output_len`
//!   desired outputs; an inference record is `input_len` inputs
//! - records follow each other until end of input

use std::io::{BufRead, Write};

use crate::data::samples::SampleSet;

#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("line {line}: '{token}' is not a number")]
    InvalidToken { line: usize, token: String },

    #[error("record {record} is incomplete: expected {expected} values, found {found}")]
    IncompleteRecord {
        record: usize,
        expected: usize,
        found: usize,
    },

    #[error("a record must hold at least one value")]
    EmptyRecord,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn read_tokens<R: BufRead>(reader: R) -> Result<Vec<f64>, SampleError> {
    let mut values = Vec::new();
    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        for token in line.split_whitespace() {
            let value = token.parse::<f64>().map_err(|_| SampleError::InvalidToken {
                line: line_idx + 1,
                token: token.to_string(),
            })?;
            values.push(value);
        }
    }
    Ok(values)
}

fn split_records(values: Vec<f64>, record_len: usize) -> Result<Vec<Vec<f64>>, SampleError> {
    if record_len == 0 {
        return Err(SampleError::EmptyRecord);
    }
    let records: Vec<Vec<f64>> = values.chunks(record_len).map(|c| c.to_vec()).collect();
    if let Some(last) = records.last() {
        if last.len() != record_len {
            return Err(SampleError::IncompleteRecord {
                record: records.len(),
                expected: record_len,
                found: last.len(),
            });
        }
    }
    Ok(records)
}

/// Reads `input_len` inputs then `output_len` desired outputs per record.
pub fn read_training_samples<R: BufRead>(
    reader: R,
    input_len: usize,
    output_len: usize,
) -> Result<SampleSet, SampleError> {
    let records = split_records(read_tokens(reader)?, input_len + output_len)?;
    let mut samples = SampleSet::default();
    for mut record in records {
        let desired = record.split_off(input_len);
        samples.push(record, desired);
    }
    Ok(samples)
}

/// Reads `input_len` inputs per record.
pub fn read_inference_records<R: BufRead>(
    reader: R,
    input_len: usize,
) -> Result<Vec<Vec<f64>>, SampleError> {
    split_records(read_tokens(reader)?, input_len)
}

/// Writes one line per row, values joined by `delimiter`.
pub fn write_outputs<W: Write>(
    mut writer: W,
    rows: &[Vec<f64>],
    delimiter: &str,
) -> std::io::Result<()> {
    for row in rows {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(writer, "{}", line.join(delimiter))?;
    }
    writer.flush()
}
