use entity_core::{ConversionError, Entity, EntityValue, Result};
use tracing::debug;

pub const DRE_END_DATA: &str = "DREENDDATA";
pub const DRE_FIELD: &str = "DREFIELD";
pub const DRE_END_DOC: &str = "DREENDDOC";
pub const DRE_END_DATA_REFERENCE: &str = "DREENDDATAREFERENCE";

const IDX_DATE_FORMAT: &str = "%Y/%m/%d";

/// How a string value is laid out on its tag line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringStyle {
    /// `#NAME= "value"`
    Quote,
    /// `#NAME` then the raw value on the following line(s)
    Paragraph,
    /// `#NAME value`
    InlineUnquoted,
}

/// Description of one IDX field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec<'a> {
    pub name: &'a str,
    pub style: StringStyle,
    pub mandatory: bool,
    pub allow_list: bool,
    pub use_equals: bool,
}

impl<'a> FieldSpec<'a> {
    const fn fixed(name: &'a str, style: StringStyle, mandatory: bool) -> Self {
        Self {
            name,
            style,
            mandatory,
            allow_list: false,
            use_equals: false,
        }
    }
}

/// Fixed fields, emitted first and in this order when present.
pub const ORDERED_DRE_FIELDS: &[FieldSpec<'static>] = &[
    FieldSpec::fixed("DREREFERENCE", StringStyle::InlineUnquoted, true),
    FieldSpec::fixed("DREDATE", StringStyle::InlineUnquoted, false),
    FieldSpec::fixed("DRETITLE", StringStyle::Paragraph, false),
    FieldSpec::fixed("DRECONTENT", StringStyle::Paragraph, false),
    FieldSpec::fixed("DREDBNAME", StringStyle::InlineUnquoted, false),
];

/// Serialize an entity as an IDX document, terminated by `#DREENDDOC` and
/// `#DREENDDATAREFERENCE`.
///
/// Fails if `DREREFERENCE` is missing, or the entity holds a nested entity, a
/// list in a fixed field, or a list of lists.
pub fn to_idx_document(entity: &Entity) -> Result<String> {
    let mut out = String::new();
    append_values(entity, &mut out)?;
    push_line(&mut out, &format!("#{DRE_END_DOC}"));
    push_line(&mut out, &format!("#{DRE_END_DATA_REFERENCE}"));
    Ok(out.trim().to_string())
}

/// Serialize an entity as IDX data, terminated by `#DREENDDATA`.
pub fn to_idx_data(entity: &Entity) -> Result<String> {
    let mut out = String::new();
    append_values(entity, &mut out)?;
    push_line(&mut out, &format!("#{DRE_END_DATA}"));
    Ok(out.trim().to_string())
}

/// Serialize several entities as consecutive IDX documents.
pub fn to_idx_documents(entities: &[Entity]) -> Result<String> {
    let documents = entities
        .iter()
        .map(to_idx_document)
        .collect::<Result<Vec<_>>>()?;
    debug!("Serialized {} IDX documents", documents.len());
    Ok(documents.join("\n"))
}

fn append_values(entity: &Entity, out: &mut String) -> Result<()> {
    for spec in ORDERED_DRE_FIELDS {
        match entity.get(spec.name) {
            Some(value) => append_value(out, value, spec.name, spec)?,
            None if spec.mandatory => {
                return Err(ConversionError::SchemaViolation {
                    field: spec.name.to_string(),
                    reason: format!("mandatory field is missing from {entity}"),
                })
            }
            None => {}
        }
    }

    for (name, value) in entity.iter() {
        if ORDERED_DRE_FIELDS.iter().any(|spec| spec.name == name) {
            continue;
        }
        let tag = format!("{DRE_FIELD} {name}");
        let spec = FieldSpec {
            name: &tag,
            style: StringStyle::Quote,
            mandatory: false,
            allow_list: true,
            use_equals: true,
        };
        append_value(out, value, name, &spec)?;
    }

    Ok(())
}

/// Append one value under `spec.name`; `property` names the entity property
/// in error reports.
fn append_value(
    out: &mut String,
    value: &EntityValue,
    property: &str,
    spec: &FieldSpec<'_>,
) -> Result<()> {
    match value {
        EntityValue::Null => {}
        EntityValue::String(s) => {
            if s.contains('\n') || spec.style == StringStyle::Paragraph {
                push_line(out, &format!("#{}", spec.name));
                push_line(out, s);
            } else if spec.style == StringStyle::Quote {
                append_field(out, spec, &format!("\"{s}\""));
            } else {
                append_field(out, spec, s);
            }
        }
        EntityValue::Integer(i) => append_field(out, spec, &i.to_string()),
        EntityValue::Double(d) => append_field(out, spec, &d.to_string()),
        EntityValue::Boolean(b) => append_field(out, spec, if *b { "True" } else { "False" }),
        EntityValue::Enumeration { value, .. } => append_field(out, spec, value),
        EntityValue::DateTime(dt) => {
            append_field(out, spec, &dt.format(IDX_DATE_FORMAT).to_string())
        }
        EntityValue::NestedEntity(_) => {
            return Err(ConversionError::UnsupportedShape {
                field: property.to_string(),
                shape: value.shape_name(),
                target: "IDX",
            })
        }
        EntityValue::NestedList(items) => {
            if !spec.allow_list {
                return Err(ConversionError::UnsupportedShape {
                    field: property.to_string(),
                    shape: value.shape_name(),
                    target: "IDX",
                });
            }
            for (i, item) in items.iter().enumerate() {
                let name = format!("{}{}", spec.name, i + 1);
                let member = FieldSpec {
                    name: &name,
                    allow_list: false,
                    ..*spec
                };
                append_value(out, item, property, &member)?;
            }
        }
    }
    Ok(())
}

fn append_field(out: &mut String, spec: &FieldSpec<'_>, text: &str) {
    let equals = if spec.use_equals { "=" } else { "" };
    push_line(out, &format!("#{}{equals} {text}", spec.name));
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use entity_core::ErrorCode;

    #[test]
    fn test_minimal_document() {
        let entity = Entity::new().with_property("DREREFERENCE", "abc");
        assert_eq!(
            to_idx_document(&entity).unwrap(),
            "#DREREFERENCE abc\n#DREENDDOC\n#DREENDDATAREFERENCE"
        );
        assert_eq!(to_idx_data(&entity).unwrap(), "#DREREFERENCE abc\n#DREENDDATA");
    }

    #[test]
    fn test_fixed_fields_follow_table_order() {
        let entity = Entity::new()
            .with_property("Author", "Alice")
            .with_property("DREDBNAME", "Archive")
            .with_property("DRECONTENT", "Body text")
            .with_property("DRETITLE", "Title")
            .with_property("DREDATE", "2020/01/02")
            .with_property("DREREFERENCE", "ref-1");

        assert_eq!(
            to_idx_data(&entity).unwrap(),
            "#DREREFERENCE ref-1\n\
             #DREDATE 2020/01/02\n\
             #DRETITLE\nTitle\n\
             #DRECONTENT\nBody text\n\
             #DREDBNAME Archive\n\
             #DREFIELD Author= \"Alice\"\n\
             #DREENDDATA"
        );
    }

    #[test]
    fn test_missing_reference_is_schema_violation() {
        let entity = Entity::new().with_property("Foo", "Hello");
        let err = to_idx_document(&entity).unwrap_err();
        assert_eq!(err.code(), ErrorCode::SchemaViolation);
        assert!(err.to_string().contains("DREREFERENCE"));
    }

    #[test]
    fn test_nested_entity_is_unsupported() {
        let entity = Entity::new()
            .with_property("DREREFERENCE", "1")
            .with_property("Baz", Entity::new().with_property("Foo", 2));
        let err = to_idx_data(&entity).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedShape);
        assert_eq!(err.to_string(), "Cannot convert nested entity in field 'Baz' to IDX");
    }

    #[test]
    fn test_list_expands_to_numbered_fields() {
        let entity = Entity::new()
            .with_property("DREREFERENCE", "1")
            .with_property("Foo", "Hello")
            .with_property("Bar", vec!["World", "Earth"]);
        assert_eq!(
            to_idx_document(&entity).unwrap(),
            "#DREREFERENCE 1\n\
             #DREFIELD Foo= \"Hello\"\n\
             #DREFIELD Bar1= \"World\"\n\
             #DREFIELD Bar2= \"Earth\"\n\
             #DREENDDOC\n\
             #DREENDDATAREFERENCE"
        );
    }

    #[test]
    fn test_list_in_fixed_field_is_unsupported() {
        let entity = Entity::new().with_property("DREREFERENCE", vec!["a", "b"]);
        let err = to_idx_document(&entity).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedShape);
    }

    #[test]
    fn test_list_of_lists_is_unsupported() {
        let entity = Entity::new().with_property("DREREFERENCE", "1").with_property(
            "Bar",
            EntityValue::NestedList(vec![EntityValue::from("a"), EntityValue::from(vec!["b"])]),
        );
        let err = to_idx_document(&entity).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedShape);
        assert!(err.to_string().contains("nested list in field 'Bar'"));
    }

    #[test]
    fn test_scalar_rendering() {
        let entity = Entity::new()
            .with_property("DREREFERENCE", 17)
            .with_property("DREDATE", Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap())
            .with_property("Score", 1.25)
            .with_property("Flag", true)
            .with_property("Archived", false)
            .with_property("Level", EntityValue::enumeration("Severity", "High"))
            .with_property("Nothing", EntityValue::Null);
        assert_eq!(
            to_idx_data(&entity).unwrap(),
            "#DREREFERENCE 17\n\
             #DREDATE 2021/03/04\n\
             #DREFIELD Score= 1.25\n\
             #DREFIELD Flag= True\n\
             #DREFIELD Archived= False\n\
             #DREFIELD Level= High\n\
             #DREENDDATA"
        );
    }

    #[test]
    fn test_multi_line_string_uses_paragraph_form() {
        let entity = Entity::new()
            .with_property("DREREFERENCE", "1")
            .with_property("Summary", "first\nsecond");
        assert_eq!(
            to_idx_data(&entity).unwrap(),
            "#DREREFERENCE 1\n#DREFIELD Summary\nfirst\nsecond\n#DREENDDATA"
        );
    }

    #[test]
    fn test_to_idx_documents() {
        let entities = vec![
            Entity::new().with_property("DREREFERENCE", "1"),
            Entity::new().with_property("DREREFERENCE", "2"),
        ];
        let output = to_idx_documents(&entities).unwrap();
        assert_eq!(output.matches("#DREENDDOC").count(), 2);
        assert!(output.starts_with("#DREREFERENCE 1\n"));

        let with_bad = vec![entities[0].clone(), Entity::new().with_property("X", 1)];
        assert!(to_idx_documents(&with_bad).is_err());
    }
}
