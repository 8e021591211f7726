//! Delimited-text writer.
//!
//! The header row comes from the first entity's property names. Every later
//! entity is written in that column order.

use crate::config::FormatConfig;
use chrono::{DateTime, Utc};
use entity_core::{ConversionError, Entity, EntityValue, Result};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::io::Write;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Row terminator, written after every row including the last.
pub const LINE_TERMINATOR: &str = "\n";

/// Streaming writer encoding one row per entity into `sink`.
///
/// Nothing, not even a byte-order mark, is written until the first entity
/// arrives, so an empty sequence produces an empty stream. Output written
/// before an error is not valid and should be discarded.
pub struct DelimitedWriter<'c, W: Write> {
    sink: W,
    config: &'c FormatConfig,
    header: Option<Vec<String>>,
    columns: HashSet<String>,
    cancellation: Option<CancellationToken>,
    records: usize,
    buffer: Vec<u8>,
}

impl<'c, W: Write> DelimitedWriter<'c, W> {
    pub fn new(sink: W, config: &'c FormatConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sink,
            config,
            header: None,
            columns: HashSet::new(),
            cancellation: None,
            records: 0,
            buffer: Vec::new(),
        })
    }

    /// Abort with [`ConversionError::Cancelled`] once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Write one entity, emitting the header row first if needed.
    ///
    /// An entity carrying a property that is not a header column is a schema
    /// violation. Header columns the entity lacks are written as empty fields.
    pub fn write_entity(&mut self, entity: &Entity) -> Result<()> {
        if self.cancellation.as_ref().is_some_and(|t| t.is_cancelled()) {
            return Err(ConversionError::Cancelled);
        }

        if self.header.is_none() {
            let names: Vec<String> = entity.names().map(str::to_string).collect();
            debug!("Delimited header columns: {names:?}");

            let mut row = String::new();
            let sole = names.len() == 1;
            for (i, name) in names.iter().enumerate() {
                if i > 0 {
                    row.push_str(&self.config.delimiter);
                }
                self.push_field(&mut row, name, sole);
            }

            self.buffer.extend_from_slice(self.config.encoding.bom());
            self.emit_row(&row)?;
            self.columns = names.iter().cloned().collect();
            self.header = Some(names);
        }

        if let Some(extra) = entity.names().find(|name| !self.columns.contains(*name)) {
            return Err(ConversionError::SchemaViolation {
                field: extra.to_string(),
                reason: format!(
                    "record {} has a property that is not in the header row",
                    self.records + 1
                ),
            });
        }

        let header = self.header.as_deref().unwrap_or_default();
        let mut row = String::new();
        let sole = header.len() == 1;
        for (i, name) in header.iter().enumerate() {
            if i > 0 {
                row.push_str(&self.config.delimiter);
            }
            let text = match entity.get(name) {
                Some(value) => self.render_value(name, value)?,
                None => String::new(),
            };
            self.push_field(&mut row, &text, sole);
        }

        self.emit_row(&row)?;
        self.records += 1;
        Ok(())
    }

    /// Flush the sink and hand it back.
    pub fn finish(mut self) -> Result<W> {
        self.sink.flush()?;
        debug!("Wrote {} delimited records", self.records);
        Ok(self.sink)
    }

    fn emit_row(&mut self, row: &str) -> Result<()> {
        self.config.encoding.encode_into(row, &mut self.buffer)?;
        self.config
            .encoding
            .encode_into(LINE_TERMINATOR, &mut self.buffer)?;
        self.sink.write_all(&self.buffer)?;
        self.buffer.clear();
        Ok(())
    }

    fn render_value(&self, field: &str, value: &EntityValue) -> Result<String> {
        match value {
            EntityValue::Null => Ok(String::new()),
            EntityValue::String(s) => Ok(s.clone()),
            EntityValue::Integer(i) => Ok(i.to_string()),
            EntityValue::Double(d) => Ok(d.to_string()),
            EntityValue::Boolean(b) => Ok(b.to_string()),
            EntityValue::Enumeration { value, .. } => Ok(value.clone()),
            EntityValue::DateTime(dt) => self.format_datetime(dt),
            EntityValue::NestedEntity(_) => Err(ConversionError::UnsupportedShape {
                field: field.to_string(),
                shape: value.shape_name(),
                target: "delimited text",
            }),
            EntityValue::NestedList(items) => {
                let separator = self.config.multi_value_delimiter.ok_or(
                    ConversionError::MissingConfiguration {
                        parameter: "multi_value_delimiter",
                    },
                )?;

                let mut joined = String::new();
                for (i, item) in items.iter().enumerate() {
                    if !item.is_scalar() {
                        return Err(ConversionError::UnsupportedShape {
                            field: field.to_string(),
                            shape: item.shape_name(),
                            target: "a multi-value field",
                        });
                    }
                    if i > 0 {
                        joined.push(separator);
                    }
                    joined.push_str(&self.render_value(field, item)?);
                }
                Ok(joined)
            }
        }
    }

    fn format_datetime(&self, dt: &DateTime<Utc>) -> Result<String> {
        let mut text = String::new();
        write!(text, "{}", dt.format(&self.config.date_time_format)).map_err(|_| {
            ConversionError::invalid_config(
                "date_time_format",
                format!("cannot format date-time with '{}'", self.config.date_time_format),
            )
        })?;
        Ok(text)
    }

    /// Append `text` as one field, quoting it when required.
    fn push_field(&self, row: &mut String, text: &str, sole: bool) {
        match self.config.quote {
            Some(quote)
                if self.config.always_quote || self.needs_quotes(text, Some(quote), sole) =>
            {
                row.push(quote);
                for c in text.chars() {
                    if c == quote {
                        row.push(quote);
                    }
                    row.push(c);
                }
                row.push(quote);
            }
            Some(_) => row.push_str(text),
            None => {
                if self.needs_quotes(text, None, sole) {
                    warn!("Writing field {text:?} unquoted; it will not read back unchanged");
                }
                row.push_str(text);
            }
        }
    }

    fn needs_quotes(&self, text: &str, quote: Option<char>, sole: bool) -> bool {
        text.contains(self.config.delimiter.as_str())
            || quote.is_some_and(|q| text.contains(q))
            || text.contains(['\n', '\r'])
            || self.config.comment.is_some_and(|c| text.starts_with(c))
            || (sole && text.is_empty())
    }
}

/// Write every entity to `sink` and return it.
pub fn write_all<'e, W, I>(entities: I, config: &FormatConfig, sink: W) -> Result<W>
where
    W: Write,
    I: IntoIterator<Item = &'e Entity>,
{
    let mut writer = DelimitedWriter::new(sink, config)?;
    for entity in entities {
        writer.write_entity(entity)?;
    }
    writer.finish()
}

/// Write every entity into an in-memory buffer.
pub fn write_to_vec(entities: &[Entity], config: &FormatConfig) -> Result<Vec<u8>> {
    write_all(entities, config, Vec::new())
}
