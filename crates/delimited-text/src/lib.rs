//! Delimited-text codecs for structured-data entities.
//!
//! One reader and one writer, parameterized by a [`FormatConfig`], serve both
//! CSV and Concordance load files. The two formats differ only in their
//! [`Preset`] defaults.
//!
//! # Example
//!
//! ```rust
//! use delimited_text::{read_str, write_to_vec, Preset};
//!
//! let entities = read_str("Foo,Bar\nHello,World\n", &Preset::Csv.reader_config()).unwrap();
//! assert_eq!(entities[0].to_string(), "(Foo: \"Hello\" Bar: \"World\")");
//!
//! let bytes = write_to_vec(&entities, &Preset::Csv.writer_config()).unwrap();
//! assert_eq!(bytes, b"Foo,Bar\nHello,World\n");
//! ```

pub mod config;
pub mod encoding;
pub mod reader;
pub mod writer;

pub use config::{FormatConfig, FormatOverrides, Preset, DEFAULT_DATE_TIME_FORMAT};
pub use encoding::TextEncoding;
pub use reader::{read_all, read_str, DelimitedReader};
pub use writer::{write_all, write_to_vec, DelimitedWriter, LINE_TERMINATOR};

// Re-export for callers wiring cancellation
pub use tokio_util::sync::CancellationToken;
