use std::io::{self, Write};

use crate::error::ConsumeError;

pub const DEFAULT_DELIMITER: u8 = b'\n';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    /// Terminates every record.
    pub delimiter: u8,
    /// When set, keys are printed and followed by this byte.
    pub key_delimiter: Option<u8>,
    pub print_offset: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            key_delimiter: None,
            print_offset: false,
        }
    }
}

impl FormatOptions {
    /// Separator written after the offset and key fields.
    fn field_delimiter(&self) -> u8 {
        self.key_delimiter.unwrap_or(DEFAULT_DELIMITER)
    }
}

/// Renders data records as `[offset<kd>][key<kd>]payload<d>` on a byte sink.
pub struct MessageFormatter<W: Write> {
    sink: W,
    options: FormatOptions,
    flush_each: bool,
}

impl<W: Write> MessageFormatter<W> {
    pub fn new(sink: W, options: FormatOptions) -> Self {
        Self {
            sink,
            options,
            flush_each: false,
        }
    }

    /// Flush after every record instead of leaving it to the sink.
    pub fn unbuffered(mut self, flush_each: bool) -> Self {
        self.flush_each = flush_each;
        self
    }

    pub fn format(
        &mut self,
        offset: i64,
        key: &[u8],
        payload: &[u8],
    ) -> Result<(), ConsumeError> {
        self.write_record(offset, key, payload)
            .map_err(|source| ConsumeError::Output {
                offset,
                len: payload.len(),
                source,
            })
    }

    fn write_record(&mut self, offset: i64, key: &[u8], payload: &[u8]) -> io::Result<()> {
        let field_delimiter = self.options.field_delimiter();

        if self.options.print_offset {
            write!(self.sink, "{offset}")?;
            self.sink.write_all(&[field_delimiter])?;
        }

        if self.options.key_delimiter.is_some() {
            self.sink.write_all(key)?;
            self.sink.write_all(&[field_delimiter])?;
        }

        self.sink.write_all(payload)?;
        self.sink.write_all(&[self.options.delimiter])?;

        if self.flush_each {
            self.sink.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}
