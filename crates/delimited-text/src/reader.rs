//! Delimited-text reader.
//!
//! Turns a byte source into a lazy sequence of entities. The first non-comment
//! line names the columns; every later line becomes one [`Entity`] keyed by
//! those names.

use crate::config::FormatConfig;
use crate::encoding::TextEncoding;
use encoding_rs::{Decoder, DecoderResult};
use entity_core::{ConversionError, Entity, EntityValue, Result};
use std::collections::HashSet;
use std::io::{ErrorKind, Read};
use tokio_util::sync::CancellationToken;
use tracing::debug;

const CHUNK_SIZE: usize = 8 * 1024;

/// Streaming reader yielding one entity per data row.
///
/// The iterator is consume-once. After yielding an error it yields nothing
/// more; use [`read_all`] to get either every record or the error.
pub struct DelimitedReader<'c, R> {
    lines: DecodedLines<R>,
    config: &'c FormatConfig,
    header: Option<Vec<String>>,
    cancellation: Option<CancellationToken>,
    records: usize,
    done: bool,
}

impl<'c, R: Read> DelimitedReader<'c, R> {
    pub fn new(source: R, config: &'c FormatConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            lines: DecodedLines::new(source, config.encoding),
            config,
            header: None,
            cancellation: None,
            records: 0,
            done: false,
        })
    }

    /// Abort with [`ConversionError::Cancelled`] once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Column names, once the header row has been read.
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    fn read_entity(&mut self) -> Result<Option<Entity>> {
        if self.header.is_none() {
            let Some((line, names)) = self.next_record()? else {
                return Ok(None);
            };
            self.header = Some(validate_header(line, names)?);
            debug!("Delimited header columns: {:?}", self.header);
        }

        if self.cancellation.as_ref().is_some_and(|t| t.is_cancelled()) {
            return Err(ConversionError::Cancelled);
        }

        let Some((_, fields)) = self.next_record()? else {
            return Ok(None);
        };

        let header = self.header.as_deref().unwrap_or_default();
        let mut entity = Entity::with_capacity(header.len().min(fields.len()));
        for (name, raw) in header.iter().zip(fields) {
            entity.set(name.clone(), self.field_value(raw));
        }

        self.records += 1;
        Ok(Some(entity))
    }

    fn field_value(&self, raw: String) -> EntityValue {
        match self.config.multi_value_delimiter {
            Some(separator) if raw.contains(separator) => EntityValue::NestedList(
                raw.split(separator)
                    .map(|part| EntityValue::String(part.to_string()))
                    .collect(),
            ),
            _ => EntityValue::String(raw),
        }
    }

    /// Next non-blank, non-comment record with its starting line number.
    ///
    /// A quoted field left open at the end of a line continues on the next
    /// line, keeping the line break it spanned.
    fn next_record(&mut self) -> Result<Option<(usize, Vec<String>)>> {
        loop {
            let Some((line, mut terminator)) = self.lines.next_line()? else {
                return Ok(None);
            };
            let start = self.lines.line_number;

            if line.is_empty() {
                continue;
            }
            if self.config.comment.is_some_and(|c| line.starts_with(c)) {
                continue;
            }

            let mut splitter = FieldSplitter::new(&self.config.delimiter, self.config.quote);
            let mut fed = splitter.feed(&line);
            loop {
                match fed {
                    Ok(true) => return Ok(Some((start, splitter.finish()))),
                    Ok(false) => match self.lines.next_line()? {
                        Some((next, next_terminator)) => {
                            splitter.continue_line(terminator);
                            fed = splitter.feed(&next);
                            terminator = next_terminator;
                        }
                        None => {
                            return Err(ConversionError::parse(start, "unterminated quoted field"))
                        }
                    },
                    Err(TextAfterQuote { field }) => {
                        return Err(ConversionError::parse(
                            start,
                            format!("unexpected text after closing quote in field {field}"),
                        ))
                    }
                }
            }
        }
    }
}

impl<R: Read> Iterator for DelimitedReader<'_, R> {
    type Item = Result<Entity>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_entity() {
            Ok(Some(entity)) => Some(Ok(entity)),
            Ok(None) => {
                self.done = true;
                debug!("Read {} delimited records", self.records);
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Read every record from `source`, or fail without partial results.
pub fn read_all<R: Read>(source: R, config: &FormatConfig) -> Result<Vec<Entity>> {
    DelimitedReader::new(source, config)?.collect()
}

/// Read every record from in-memory text.
pub fn read_str(text: &str, config: &FormatConfig) -> Result<Vec<Entity>> {
    read_all(text.as_bytes(), config)
}

fn validate_header(line: usize, names: Vec<String>) -> Result<Vec<String>> {
    if names.iter().all(|name| name.is_empty()) {
        return Err(ConversionError::parse(line, "header row has no column names"));
    }

    let mut seen = HashSet::new();
    for name in &names {
        if !seen.insert(name.as_str()) {
            return Err(ConversionError::parse(
                line,
                format!("duplicate column name '{name}'"),
            ));
        }
    }

    Ok(names)
}

/// Something other than a delimiter follows a closing quote (1-based field).
#[derive(Debug, PartialEq)]
struct TextAfterQuote {
    field: usize,
}

/// Quote-aware field splitter. A quoted field still open at the end of a
/// line stays open for the next [`FieldSplitter::feed`].
struct FieldSplitter<'a> {
    delimiter: &'a str,
    quote: Option<char>,
    fields: Vec<String>,
    current: String,
    in_quotes: bool,
}

impl<'a> FieldSplitter<'a> {
    fn new(delimiter: &'a str, quote: Option<char>) -> Self {
        Self {
            delimiter,
            quote,
            fields: Vec::new(),
            current: String::new(),
            in_quotes: false,
        }
    }

    /// Split one physical line. `Ok(true)` once the record is complete,
    /// `Ok(false)` while a quoted field is still open.
    fn feed(&mut self, line: &str) -> std::result::Result<bool, TextAfterQuote> {
        let mut rest = line;

        if self.in_quotes {
            match self.close_quoted(rest)? {
                Some(next) => rest = next,
                None => return Ok(!self.in_quotes),
            }
        }

        loop {
            match self.quote {
                Some(q) if rest.starts_with(q) => {
                    self.in_quotes = true;
                    match self.close_quoted(&rest[q.len_utf8()..])? {
                        Some(next) => rest = next,
                        None => return Ok(!self.in_quotes),
                    }
                }
                _ => match rest.find(self.delimiter) {
                    Some(position) => {
                        self.fields.push(rest[..position].to_string());
                        rest = &rest[position + self.delimiter.len()..];
                    }
                    None => {
                        self.fields.push(rest.to_string());
                        return Ok(true);
                    }
                },
            }
        }
    }

    /// Line break inside an open quoted field.
    fn continue_line(&mut self, terminator: &str) {
        self.current.push_str(terminator);
    }

    fn finish(self) -> Vec<String> {
        self.fields
    }

    /// Scan quoted text. Returns the text after the closing quote and its
    /// delimiter, or `None` when the line ends (quote open, or record done).
    fn close_quoted<'t>(
        &mut self,
        text: &'t str,
    ) -> std::result::Result<Option<&'t str>, TextAfterQuote> {
        let Some(q) = self.quote else {
            return Ok(None);
        };

        let mut chars = text.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c != q {
                self.current.push(c);
                continue;
            }
            if chars.peek().is_some_and(|&(_, next)| next == q) {
                self.current.push(q);
                chars.next();
                continue;
            }

            self.in_quotes = false;
            self.fields.push(std::mem::take(&mut self.current));
            let after = &text[i + q.len_utf8()..];
            if after.is_empty() {
                return Ok(None);
            }
            return after
                .strip_prefix(self.delimiter)
                .map(Some)
                .ok_or(TextAfterQuote {
                    field: self.fields.len(),
                });
        }

        Ok(None)
    }
}

/// Incrementally decoded lines of a byte source.
struct DecodedLines<R> {
    source: R,
    decoder: Decoder,
    encoding: TextEncoding,
    buffer: String,
    position: usize,
    exhausted: bool,
    /// 1-based number of the line last returned
    line_number: usize,
}

impl<R: Read> DecodedLines<R> {
    fn new(source: R, encoding: TextEncoding) -> Self {
        Self {
            source,
            decoder: encoding.new_decoder(),
            encoding,
            buffer: String::new(),
            position: 0,
            exhausted: false,
            line_number: 0,
        }
    }

    /// Next line and the terminator removed from it (`"\n"`, `"\r\n"`, or
    /// empty at end of input).
    fn next_line(&mut self) -> Result<Option<(String, &'static str)>> {
        loop {
            let pending = &self.buffer[self.position..];

            if let Some(offset) = pending.find('\n') {
                let (line, terminator) = match pending[..offset].strip_suffix('\r') {
                    Some(line) => (line.to_string(), "\r\n"),
                    None => (pending[..offset].to_string(), "\n"),
                };
                self.position += offset + 1;
                self.line_number += 1;
                return Ok(Some((line, terminator)));
            }

            if self.exhausted {
                if pending.is_empty() {
                    return Ok(None);
                }
                let line = pending.strip_suffix('\r').unwrap_or(pending).to_string();
                self.position = self.buffer.len();
                self.line_number += 1;
                return Ok(Some((line, "")));
            }

            self.fill()?;
        }
    }

    fn fill(&mut self) -> Result<()> {
        if self.position > 0 {
            self.buffer.drain(..self.position);
            self.position = 0;
        }
        let decoded_from = self.buffer.len();

        let mut chunk = [0u8; CHUNK_SIZE];
        let read = loop {
            match self.source.read(&mut chunk) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };
        let last = read == 0;

        let mut input = &chunk[..read];
        loop {
            if let Some(needed) = self
                .decoder
                .max_utf8_buffer_length_without_replacement(input.len())
            {
                self.buffer.reserve(needed);
            }
            let (result, consumed) =
                self.decoder
                    .decode_to_string_without_replacement(input, &mut self.buffer, last);
            input = &input[consumed..];

            match result {
                DecoderResult::InputEmpty => break,
                DecoderResult::OutputFull => continue,
                DecoderResult::Malformed(_, _) => {
                    return Err(ConversionError::EncodingFailure {
                        encoding: self.encoding.name(),
                        reason: format!("malformed input near line {}", self.line_number + 1),
                    })
                }
            }
        }

        if self.encoding == TextEncoding::Ascii && !self.buffer[decoded_from..].is_ascii() {
            return Err(ConversionError::EncodingFailure {
                encoding: self.encoding.name(),
                reason: format!("non-ASCII character near line {}", self.line_number + 1),
            });
        }

        self.exhausted = last;
        Ok(())
    }
}
