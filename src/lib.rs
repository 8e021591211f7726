//! structured-data library
//!
//! Converts a generic record model ([`Entity`]) to and from text formats:
//!
//! - CSV and Concordance load files ([`delimited_text`])
//! - IDX/DRE tagged-line exports ([`dre_idx`])
//! - JSON arrays of objects ([`json_types`])
//!
//! # CLI Usage
//!
//! ```bash
//! # CSV → JSON array
//! structured-data from-csv --input people.csv
//!
//! # JSON array → Concordance load file, UTF-16 encoded
//! structured-data to-concordance --input people.json --output people.dat --encoding utf-16le
//!
//! # JSON array → IDX documents
//! structured-data to-idx --input docs.json --output docs.idx
//! ```

pub mod config;
pub mod convert;

pub use config::{load_overrides, FormatArgs};
pub use convert::{run_conversion, run_conversion_blocking, Conversion, ConversionRequest};

pub use delimited_text;
pub use dre_idx;
pub use entity_core;
pub use json_types;

pub use delimited_text::{CancellationToken, FormatConfig, FormatOverrides, Preset, TextEncoding};
pub use entity_core::{ConversionError, Entity, EntityValue, ErrorCode, ValueKind};
