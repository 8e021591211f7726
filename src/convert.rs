//! Conversion driver behind the CLI commands.
//!
//! Each [`Conversion`] reads one whole input and writes one whole output. The
//! codecs are synchronous; [`run_conversion_blocking`] moves the work onto the
//! blocking pool so a Ctrl-C handler can cancel it through the token.

use anyhow::Context;
use delimited_text::{DelimitedReader, DelimitedWriter, FormatOverrides, Preset};
use entity_core::{ConversionError, Entity, EntityValue};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// What to convert from and to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// Delimited text → JSON array
    FromDelimited(Preset),
    /// JSON array → delimited text
    ToDelimited(Preset),
    /// JSON array → IDX; `data` selects `#DREENDDATA` framing
    ToIdx { data: bool },
}

/// A fully resolved conversion.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub conversion: Conversion,
    pub overrides: FormatOverrides,
    /// Pretty-print JSON output
    pub pretty: bool,
    /// Replace text cells with the most specific scalar they parse as
    pub infer_types: bool,
}

impl ConversionRequest {
    pub fn new(conversion: Conversion) -> Self {
        Self {
            conversion,
            overrides: FormatOverrides::default(),
            pretty: true,
            infer_types: false,
        }
    }
}

/// Run a conversion from `source` into `sink`, returning the sink.
pub fn run_conversion<R: Read, W: Write>(
    request: &ConversionRequest,
    mut source: R,
    mut sink: W,
    token: &CancellationToken,
) -> anyhow::Result<W> {
    match request.conversion {
        Conversion::FromDelimited(preset) => {
            let config = request
                .overrides
                .apply(preset.reader_config())
                .with_context(|| format!("Invalid {} reader settings", preset.name()))?;
            let entities = DelimitedReader::new(source, &config)?
                .with_cancellation(token.clone())
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("Failed to read {} input", preset.name()))?;
            info!("Read {} entities from {}", entities.len(), preset.name());

            let entities = if request.infer_types {
                entities.into_iter().map(infer_entity).collect()
            } else {
                entities
            };

            let json = json_types::entities_to_json(&entities, request.pretty)?;
            sink.write_all(json.as_bytes())?;
            sink.write_all(b"\n")?;
        }
        Conversion::ToDelimited(preset) => {
            let entities = read_json_entities(&mut source)?;
            let config = request
                .overrides
                .apply(preset.writer_config())
                .with_context(|| format!("Invalid {} writer settings", preset.name()))?;

            let mut writer = DelimitedWriter::new(&mut sink, &config)?.with_cancellation(token.clone());
            for entity in &entities {
                writer
                    .write_entity(entity)
                    .with_context(|| format!("Failed to write {} output", preset.name()))?;
            }
            writer.finish()?;
            info!("Wrote {} entities as {}", entities.len(), preset.name());
        }
        Conversion::ToIdx { data } => {
            let entities = read_json_entities(&mut source)?;
            for (i, entity) in entities.iter().enumerate() {
                if token.is_cancelled() {
                    return Err(ConversionError::Cancelled.into());
                }
                let idx = if data {
                    dre_idx::to_idx_data(entity)
                } else {
                    dre_idx::to_idx_document(entity)
                }
                .with_context(|| format!("Failed to serialize entity {i} as IDX"))?;
                sink.write_all(idx.as_bytes())?;
                sink.write_all(b"\n")?;
            }
            info!("Wrote {} IDX records", entities.len());
        }
    }

    sink.flush()?;
    Ok(sink)
}

fn read_json_entities<R: Read>(source: &mut R) -> anyhow::Result<Vec<Entity>> {
    let mut text = String::new();
    source
        .read_to_string(&mut text)
        .context("Failed to read JSON input")?;
    let entities =
        json_types::entities_from_json_array(&text).context("Failed to parse JSON input")?;
    debug!("Parsed {} entities from JSON input", entities.len());
    Ok(entities)
}

/// Resolve text cells (and list items) to typed scalars.
fn infer_entity(entity: Entity) -> Entity {
    entity
        .into_iter()
        .map(|(name, value)| (name, infer_value(value)))
        .collect()
}

fn infer_value(value: EntityValue) -> EntityValue {
    match value {
        EntityValue::String(s) if s.is_empty() => EntityValue::Null,
        EntityValue::String(s) => EntityValue::infer(&s),
        EntityValue::NestedList(items) => {
            EntityValue::NestedList(items.into_iter().map(infer_value).collect())
        }
        other => other,
    }
}

/// Run a conversion between files (stdin/stdout when `None`) on the blocking
/// thread pool.
pub async fn run_conversion_blocking(
    request: ConversionRequest,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    token: CancellationToken,
) -> anyhow::Result<()> {
    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let source: Box<dyn Read> = match &input {
            Some(path) => Box::new(BufReader::new(
                File::open(path).with_context(|| format!("Failed to open input {path:?}"))?,
            )),
            None => Box::new(io::stdin().lock()),
        };
        let sink: Box<dyn Write> = match &output {
            Some(path) => Box::new(BufWriter::new(
                File::create(path).with_context(|| format!("Failed to create output {path:?}"))?,
            )),
            None => Box::new(BufWriter::new(io::stdout().lock())),
        };
        run_conversion(&request, source, sink, &token)?;
        Ok(())
    })
    .await
    .context("Conversion task failed")?
}

#[cfg(test)]
mod tests {
    use super::*;
    use entity_core::ErrorCode;

    fn convert(request: &ConversionRequest, input: &str) -> anyhow::Result<String> {
        let out = run_conversion(request, input.as_bytes(), Vec::new(), &CancellationToken::new())?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_csv_to_json() {
        let mut request = ConversionRequest::new(Conversion::FromDelimited(Preset::Csv));
        request.pretty = false;
        let out = convert(&request, "# export\nFoo,Bar\nHello,World\n").unwrap();
        assert_eq!(out, "[{\"Foo\":\"Hello\",\"Bar\":\"World\"}]\n");
    }

    #[test]
    fn test_csv_to_json_with_inferred_types() {
        let mut request = ConversionRequest::new(Conversion::FromDelimited(Preset::Csv));
        request.pretty = false;
        request.infer_types = true;
        let out = convert(&request, "Id,Score,Active,Note\n7,2.5,TRUE,\n").unwrap();
        assert_eq!(
            out,
            "[{\"Id\":7,\"Score\":2.5,\"Active\":true,\"Note\":null}]\n"
        );
    }

    #[test]
    fn test_json_to_concordance() {
        let request = ConversionRequest::new(Conversion::ToDelimited(Preset::Concordance));
        let out = convert(&request, r#"[{"Foo": "Hello", "Bar": ["World", "Earth"]}]"#).unwrap();
        assert_eq!(out, "þFooþ\u{14}þBarþ\nþHelloþ\u{14}þWorld|Earthþ\n");
    }

    #[test]
    fn test_json_to_idx_data() {
        let request = ConversionRequest::new(Conversion::ToIdx { data: true });
        let out = convert(&request, r#"[{"DREREFERENCE": "1", "Foo": "Hello"}]"#).unwrap();
        assert_eq!(out, "#DREREFERENCE 1\n#DREFIELD Foo= \"Hello\"\n#DREENDDATA\n");
    }

    #[test]
    fn test_overrides_are_applied() {
        let mut request = ConversionRequest::new(Conversion::ToDelimited(Preset::Csv));
        request.overrides.delimiter = Some(";".to_string());
        let out = convert(&request, r#"[{"A": 1, "B": "x;y"}]"#).unwrap();
        assert_eq!(out, "A;B\n1;\"x;y\"\n");
    }

    #[test]
    fn test_invalid_overrides_are_reported() {
        let mut request = ConversionRequest::new(Conversion::FromDelimited(Preset::Csv));
        request.overrides.quote_character = Some("ab".to_string());
        let err = convert(&request, "A\n1\n").unwrap_err();
        assert!(format!("{err:#}").contains("Invalid CSV reader settings"));
    }

    #[test]
    fn test_cancelled_token_stops_conversion() {
        let token = CancellationToken::new();
        token.cancel();
        let request = ConversionRequest::new(Conversion::ToIdx { data: false });
        let err = run_conversion(&request, &b"[{\"DREREFERENCE\": 1}]"[..], Vec::new(), &token)
            .unwrap_err();
        let conversion = err.downcast_ref::<ConversionError>().unwrap();
        assert_eq!(conversion.code(), ErrorCode::Cancelled);
    }
}
