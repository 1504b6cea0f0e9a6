//! Minimal tab-separated reading and writing.
//!
//! Cells are split on tabs without any quoting, so written values may not
//! contain tabs or line breaks.

use std::io::{BufRead, Write};

use crate::errors::TextFlowsError;

/// Column positions resolved from a header line.
#[derive(Debug)]
pub(crate) struct Header {
    columns: Vec<String>,
}

impl Header {
    pub(crate) fn parse(line: &str) -> Self {
        Self {
            columns: split(line).map(str::to_owned).collect(),
        }
    }

    pub(crate) fn columns(&self) -> &[String] {
        &self.columns
    }

    pub(crate) fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub(crate) fn require(&self, column: &str) -> Result<usize, TextFlowsError> {
        self.position(column)
            .ok_or_else(|| TextFlowsError::ColumnNotFound {
                column: column.to_owned(),
            })
    }
}

pub(crate) fn split(line: &str) -> impl Iterator<Item = &str> {
    line.trim_end_matches(['\r', '\n']).split('\t')
}

/// Fetches the field at `position` of a data line.
pub(crate) fn field<'a>(
    fields: &[&'a str],
    position: usize,
    line: usize,
    header: &Header,
) -> Result<&'a str, TextFlowsError> {
    fields
        .get(position)
        .copied()
        .ok_or_else(|| TextFlowsError::MissingField {
            line,
            column: header
                .columns()
                .get(position)
                .cloned()
                .unwrap_or_default(),
            expected: position + 1,
            found: fields.len(),
        })
}

/// Reads the header and yields every non-blank data line with its one-based
/// line number.
pub(crate) fn read_table<R: BufRead>(
    reader: R,
) -> Result<(Header, Vec<(usize, String)>), TextFlowsError> {
    let mut lines = reader.lines().enumerate();
    let header = loop {
        match lines.next() {
            Some((_, line)) => {
                let line = line?;
                if !line.trim().is_empty() {
                    break Header::parse(&line);
                }
            }
            None => return Err(TextFlowsError::MissingHeader),
        }
    };
    let mut rows = Vec::new();
    for (index, line) in lines {
        let line = line?;
        if !line.trim().is_empty() {
            rows.push((index + 1, line));
        }
    }
    Ok((header, rows))
}

pub(crate) fn write_record<W, I, S>(writer: &mut W, cells: I) -> Result<(), TextFlowsError>
where
    W: Write,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut first = true;
    for cell in cells {
        let cell = cell.as_ref();
        if cell.contains(['\t', '\n', '\r']) {
            return Err(TextFlowsError::UnwritableValue {
                value: cell.to_owned(),
            });
        }
        if !first {
            writer.write_all(b"\t")?;
        }
        writer.write_all(cell.as_bytes())?;
        first = false;
    }
    writer.write_all(b"\n")?;
    Ok(())
}
