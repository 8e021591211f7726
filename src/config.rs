//! Format settings from the command line and YAML override files.
//!
//! Precedence, highest first: command-line flags, the `--config` file, preset
//! defaults.

use anyhow::Context;
use clap::Args;
use delimited_text::{FormatOverrides, TextEncoding};
use std::path::PathBuf;

/// Format flags shared by the delimited-text commands.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct FormatArgs {
    /// YAML file with format overrides
    #[arg(long, value_name = "PATH", env = "STRUCTURED_DATA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Field delimiter (may be longer than one character)
    #[arg(long)]
    pub delimiter: Option<String>,

    /// Quote character; an empty value disables quoting
    #[arg(long = "quote", value_name = "CHAR")]
    pub quote_character: Option<String>,

    /// Comment character; an empty value disables comments
    #[arg(long = "comment", value_name = "CHAR")]
    pub comment_character: Option<String>,

    /// Multi-value delimiter; an empty value disables list fields
    #[arg(long, value_name = "CHAR")]
    pub multi_value_delimiter: Option<String>,

    /// Text encoding (utf-8, utf-8-bom, utf-16le, utf-16be, latin1, ascii)
    #[arg(long)]
    pub encoding: Option<TextEncoding>,

    /// Quote every written field
    #[arg(long, value_name = "BOOL")]
    pub always_quote: Option<bool>,

    /// chrono strftime format for written date-time values
    #[arg(long, value_name = "FORMAT")]
    pub date_time_format: Option<String>,
}

impl FormatArgs {
    /// Overrides given directly on the command line.
    pub fn to_overrides(&self) -> FormatOverrides {
        FormatOverrides {
            delimiter: self.delimiter.clone(),
            quote_character: self.quote_character.clone(),
            comment_character: self.comment_character.clone(),
            multi_value_delimiter: self.multi_value_delimiter.clone(),
            encoding: self.encoding,
            always_quote: self.always_quote,
            date_time_format: self.date_time_format.clone(),
        }
    }
}

/// Merge the `--config` file (if any) with the command-line flags.
pub fn load_overrides(args: &FormatArgs) -> anyhow::Result<FormatOverrides> {
    let from_file = match &args.config {
        Some(path) => {
            tracing::debug!("Loading format overrides from {path:?}");
            FormatOverrides::from_file(path)
                .with_context(|| format!("Failed to load format overrides from {path:?}"))?
        }
        None => FormatOverrides::default(),
    };
    Ok(from_file.merge(args.to_overrides()))
}
