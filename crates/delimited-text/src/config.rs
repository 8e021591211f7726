//! Format configuration shared by the reader and the writer.
//!
//! A [`FormatConfig`] is built once per conversion: a [`Preset`] supplies the
//! defaults, caller [`FormatOverrides`] are layered on top, and the result is
//! validated before the reader or writer borrows it.

use crate::encoding::TextEncoding;
use chrono::format::{Item, StrftimeItems};
use entity_core::{ConversionError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// ISO 8601 date-time with offset, e.g. `2009-06-15T13:45:30.25+00:00`
pub const DEFAULT_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%:z";

/// Concordance field delimiter (DC4).
pub const CONCORDANCE_DELIMITER: &str = "\u{14}";

/// Concordance quote character (thorn).
pub const CONCORDANCE_QUOTE: char = '\u{FE}';

/// Punctuation, encoding and formatting for one delimited conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatConfig {
    /// Separates fields; may be longer than one character
    pub delimiter: String,

    /// Quote character; `None` disables quoting
    pub quote: Option<char>,

    /// Lines starting with this character are skipped on read; `None` disables comments
    pub comment: Option<char>,

    /// Splits one field into a list of values; `None` disables multi-value fields
    pub multi_value_delimiter: Option<char>,

    /// Encoding of the byte stream
    pub encoding: TextEncoding,

    /// Quote every field, header cells included
    pub always_quote: bool,

    /// chrono strftime format for date-time values
    pub date_time_format: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Preset::Csv.reader_config()
    }
}

impl FormatConfig {
    /// Check the configuration is internally consistent.
    pub fn validate(&self) -> Result<()> {
        if self.delimiter.is_empty() {
            return Err(ConversionError::invalid_config(
                "delimiter",
                "delimiter must not be empty",
            ));
        }

        if let Some(quote) = self.quote {
            if self.delimiter.contains(quote) {
                return Err(ConversionError::invalid_config(
                    "quote_character",
                    format!("quote character {quote:?} occurs in the delimiter"),
                ));
            }
        }

        if let Some(multi) = self.multi_value_delimiter {
            if self.delimiter.contains(multi) {
                return Err(ConversionError::invalid_config(
                    "multi_value_delimiter",
                    format!("multi-value delimiter {multi:?} occurs in the delimiter"),
                ));
            }
            if self.quote == Some(multi) {
                return Err(ConversionError::invalid_config(
                    "multi_value_delimiter",
                    "multi-value delimiter must differ from the quote character",
                ));
            }
        }

        if StrftimeItems::new(&self.date_time_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConversionError::invalid_config(
                "date_time_format",
                format!("'{}' is not a valid format string", self.date_time_format),
            ));
        }

        Ok(())
    }
}

/// Named bundles of default punctuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Comma separated, double-quoted, `#` comments
    Csv,
    /// DC4 separated, thorn-quoted, `|` multi-value, no comments
    Concordance,
}

impl Preset {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Concordance => "Concordance",
        }
    }

    /// Defaults for reading.
    pub fn reader_config(&self) -> FormatConfig {
        match self {
            Self::Csv => FormatConfig {
                delimiter: ",".to_string(),
                quote: Some('"'),
                comment: Some('#'),
                multi_value_delimiter: None,
                encoding: TextEncoding::Utf8,
                always_quote: false,
                date_time_format: DEFAULT_DATE_TIME_FORMAT.to_string(),
            },
            Self::Concordance => FormatConfig {
                delimiter: CONCORDANCE_DELIMITER.to_string(),
                quote: Some(CONCORDANCE_QUOTE),
                comment: None,
                multi_value_delimiter: Some('|'),
                encoding: TextEncoding::Utf8,
                always_quote: false,
                date_time_format: DEFAULT_DATE_TIME_FORMAT.to_string(),
            },
        }
    }

    /// Defaults for writing.
    ///
    /// Both presets join list values with `|` when writing. Concordance output
    /// quotes every field.
    pub fn writer_config(&self) -> FormatConfig {
        let mut config = self.reader_config();
        config.multi_value_delimiter = Some('|');
        if *self == Self::Concordance {
            config.always_quote = true;
        }
        config
    }
}

/// Caller-supplied overrides, every field optional.
///
/// Character settings are strings: an empty string disables the feature and a
/// string longer than one character is rejected.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatOverrides {
    pub delimiter: Option<String>,
    pub quote_character: Option<String>,
    pub comment_character: Option<String>,
    pub multi_value_delimiter: Option<String>,
    pub encoding: Option<TextEncoding>,
    pub always_quote: Option<bool>,
    pub date_time_format: Option<String>,
}

impl FormatOverrides {
    /// Load overrides from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse overrides from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| ConversionError::invalid_config("overrides", e.to_string()))
    }

    /// Combine with higher-priority overrides; fields set in `higher` win.
    pub fn merge(self, higher: FormatOverrides) -> FormatOverrides {
        FormatOverrides {
            delimiter: higher.delimiter.or(self.delimiter),
            quote_character: higher.quote_character.or(self.quote_character),
            comment_character: higher.comment_character.or(self.comment_character),
            multi_value_delimiter: higher.multi_value_delimiter.or(self.multi_value_delimiter),
            encoding: higher.encoding.or(self.encoding),
            always_quote: higher.always_quote.or(self.always_quote),
            date_time_format: higher.date_time_format.or(self.date_time_format),
        }
    }

    /// Layer these overrides over `base` and validate the result.
    pub fn apply(&self, base: FormatConfig) -> Result<FormatConfig> {
        let mut config = base;

        if let Some(ref delimiter) = self.delimiter {
            config.delimiter = delimiter.clone();
        }
        if let Some(ref quote) = self.quote_character {
            config.quote = single_char("quote_character", quote)?;
        }
        if let Some(ref comment) = self.comment_character {
            config.comment = single_char("comment_character", comment)?;
        }
        if let Some(ref multi) = self.multi_value_delimiter {
            config.multi_value_delimiter = single_char("multi_value_delimiter", multi)?;
        }
        if let Some(encoding) = self.encoding {
            config.encoding = encoding;
        }
        if let Some(always_quote) = self.always_quote {
            config.always_quote = always_quote;
        }
        if let Some(ref format) = self.date_time_format {
            config.date_time_format = format.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

/// Interpret a setting that must be a single character or empty.
fn single_char(parameter: &'static str, value: &str) -> Result<Option<char>> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Ok(None),
        (Some(c), None) => Ok(Some(c)),
        (Some(_), Some(_)) => Err(ConversionError::invalid_config(
            parameter,
            format!("'{value}' must be a single character or empty"),
        )),
    }
}
