//! Command-line interface for structured-data
//!
//! # Usage Examples
//!
//! ```bash
//! # CSV file → JSON array on stdout
//! structured-data from-csv --input people.csv
//!
//! # Concordance load file → compact JSON
//! structured-data from-concordance --input export.dat --compact
//!
//! # JSON array → CSV with semicolons and a YAML override file
//! structured-data to-csv --input people.json --delimiter ";" --config format.yaml
//!
//! # JSON array → IDX data records
//! structured-data to-idx --input docs.json --data
//! ```
//!
//! Set `RUST_LOG=debug` for progress logging on stderr.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use structured_data::{
    load_overrides, run_conversion_blocking, CancellationToken, Conversion, ConversionRequest,
    FormatArgs, Preset,
};

#[derive(Parser)]
#[command(name = "structured-data")]
#[command(about = "Convert entities between CSV, Concordance, IDX and JSON")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a CSV file and print its entities as a JSON array
    FromCsv {
        #[command(flatten)]
        io: IoArgs,

        #[command(flatten)]
        format: FormatArgs,

        /// Print compact JSON instead of pretty JSON
        #[arg(long)]
        compact: bool,

        /// Convert numeric, boolean and date-time text to typed JSON values
        #[arg(long)]
        infer_types: bool,
    },

    /// Read a Concordance load file and print its entities as a JSON array
    FromConcordance {
        #[command(flatten)]
        io: IoArgs,

        #[command(flatten)]
        format: FormatArgs,

        /// Print compact JSON instead of pretty JSON
        #[arg(long)]
        compact: bool,

        /// Convert numeric, boolean and date-time text to typed JSON values
        #[arg(long)]
        infer_types: bool,
    },

    /// Write a JSON array of objects as CSV
    ToCsv {
        #[command(flatten)]
        io: IoArgs,

        #[command(flatten)]
        format: FormatArgs,
    },

    /// Write a JSON array of objects as a Concordance load file
    ToConcordance {
        #[command(flatten)]
        io: IoArgs,

        #[command(flatten)]
        format: FormatArgs,
    },

    /// Write a JSON array of objects as IDX documents
    ToIdx {
        #[command(flatten)]
        io: IoArgs,

        /// Terminate records with #DREENDDATA instead of #DREENDDOC
        #[arg(long)]
        data: bool,
    },
}

#[derive(Args)]
struct IoArgs {
    /// Input file (default: stdin)
    #[arg(long, short, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(long, short, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let (request, io) = match cli.command {
        Commands::FromCsv {
            io,
            format,
            compact,
            infer_types,
        } => {
            let mut request =
                delimited_request(Conversion::FromDelimited(Preset::Csv), &format, !compact)?;
            request.infer_types = infer_types;
            (request, io)
        }
        Commands::FromConcordance {
            io,
            format,
            compact,
            infer_types,
        } => {
            let mut request = delimited_request(
                Conversion::FromDelimited(Preset::Concordance),
                &format,
                !compact,
            )?;
            request.infer_types = infer_types;
            (request, io)
        }
        Commands::ToCsv { io, format } => (
            delimited_request(Conversion::ToDelimited(Preset::Csv), &format, true)?,
            io,
        ),
        Commands::ToConcordance { io, format } => (
            delimited_request(Conversion::ToDelimited(Preset::Concordance), &format, true)?,
            io,
        ),
        Commands::ToIdx { io, data } => (ConversionRequest::new(Conversion::ToIdx { data }), io),
    };

    let token = setup_shutdown_handler();
    run_conversion_blocking(request, io.input, io.output, token).await
}

fn delimited_request(
    conversion: Conversion,
    format: &FormatArgs,
    pretty: bool,
) -> anyhow::Result<ConversionRequest> {
    Ok(ConversionRequest {
        conversion,
        overrides: load_overrides(format)?,
        pretty,
        infer_types: false,
    })
}

/// Cancel the returned token on Ctrl-C.
fn setup_shutdown_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received interrupt signal (Ctrl+C), cancelling");
            cancel.cancel();
        }
    });

    token
}
