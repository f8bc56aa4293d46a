//! Fixed-position field extraction from comma-separated records.

use crate::utils::error::RecordError;

/// Return the record type tag: the first field with leading spaces removed
///
/// **Public** - used by the dispatcher to classify every line
pub fn record_tag(line: &str) -> &str {
    let line = line.trim_start_matches(' ');
    match line.find(',') {
        Some(end) => &line[..end],
        None => line,
    }
}

/// Remove one pair of surrounding double quotes, if present
pub fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Comma-split view over one record
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    fields: Vec<&'a str>,
}

impl<'a> Fields<'a> {
    pub fn split(line: &'a str) -> Self {
        Self {
            fields: line.split(',').collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field exactly as it appears in the record
    pub fn raw(&self, index: usize) -> Result<&'a str, RecordError> {
        self.fields
            .get(index)
            .copied()
            .ok_or(RecordError::MissingField(index))
    }

    /// Field with leading whitespace removed
    pub fn left(&self, index: usize) -> Result<&'a str, RecordError> {
        self.raw(index).map(str::trim_start)
    }

    /// Field with surrounding whitespace (and line terminators) removed
    pub fn trimmed(&self, index: usize) -> Result<&'a str, RecordError> {
        self.raw(index).map(str::trim)
    }

    /// Trimmed field with one pair of surrounding quotes removed
    pub fn unquoted(&self, index: usize) -> Result<&'a str, RecordError> {
        self.trimmed(index).map(strip_quotes)
    }

    /// Base-16 field, with or without a `0x` prefix
    pub fn hex(&self, index: usize) -> Result<u64, RecordError> {
        let value = self.trimmed(index)?;
        let digits = value
            .strip_prefix("0x")
            .or_else(|| value.strip_prefix("0X"))
            .unwrap_or(value);

        u64::from_str_radix(digits, 16).map_err(|_| invalid(index, value))
    }

    /// Base-10 field
    pub fn decimal(&self, index: usize) -> Result<u64, RecordError> {
        let value = self.trimmed(index)?;
        value.parse::<u64>().map_err(|_| invalid(index, value))
    }

    /// Base-10 field, or base-16 when written with a `0x` prefix
    pub fn number(&self, index: usize) -> Result<u64, RecordError> {
        let value = self.trimmed(index)?;
        if value.starts_with("0x") || value.starts_with("0X") {
            self.hex(index)
        } else {
            self.decimal(index)
        }
    }
}

fn invalid(field: usize, value: &str) -> RecordError {
    RecordError::InvalidNumber {
        field,
        value: value.to_string(),
    }
}
