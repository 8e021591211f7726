//! Write-then-read behaviour of the delimited codecs across presets and overrides

use delimited_text::{
    read_all, read_str, write_to_vec, DelimitedReader, FormatOverrides, Preset, TextEncoding,
};
use entity_core::{Entity, EntityValue};
use std::io::Write;
use tempfile::NamedTempFile;

fn sample_entities() -> Vec<Entity> {
    vec![
        Entity::new()
            .with_property("Id", "1")
            .with_property("Name", "Alice, Esq.")
            .with_property("Quote", "she said \"hi\"")
            .with_property("Notes", "line one\nline two"),
        Entity::new()
            .with_property("Id", "2")
            .with_property("Name", "#hashtag")
            .with_property("Quote", "")
            .with_property("Notes", "þorn and \u{14} control"),
    ]
}

#[test]
fn test_csv_round_trip_preserves_strings() {
    let entities = sample_entities();
    let bytes = write_to_vec(&entities, &Preset::Csv.writer_config()).unwrap();
    let read_back = read_all(bytes.as_slice(), &Preset::Csv.reader_config()).unwrap();
    assert_eq!(read_back, entities);
}

#[test]
fn test_round_trip_keeps_crlf_inside_quoted_fields() {
    let entities = vec![
        Entity::new()
            .with_property("A", "x\r\ny")
            .with_property("B", "z"),
        Entity::new()
            .with_property("A", "mixed\nbreaks\r\nhere\r\n")
            .with_property("B", "\r\n"),
    ];

    let bytes = write_to_vec(&entities, &Preset::Csv.writer_config()).unwrap();
    assert!(bytes.starts_with(b"A,B\n\"x\r\ny\",z\n"));
    let read_back = read_all(bytes.as_slice(), &Preset::Csv.reader_config()).unwrap();
    assert_eq!(read_back, entities);

    let bytes = write_to_vec(&entities, &Preset::Concordance.writer_config()).unwrap();
    let read_back = read_all(bytes.as_slice(), &Preset::Concordance.reader_config()).unwrap();
    assert_eq!(read_back, entities);
}

#[test]
fn test_concordance_round_trip_with_lists() {
    let entities = vec![
        Entity::new()
            .with_property("Foo", "Hello")
            .with_property("Bar", vec!["World", "Earth"]),
        Entity::new()
            .with_property("Foo", "Hello 2")
            .with_property("Bar", vec!["World 2", "Earth 2"]),
    ];
    let bytes = write_to_vec(&entities, &Preset::Concordance.writer_config()).unwrap();
    let read_back = read_all(bytes.as_slice(), &Preset::Concordance.reader_config()).unwrap();
    assert_eq!(read_back, entities);
}

#[test]
fn test_round_trip_with_overrides_and_utf16() {
    let overrides = FormatOverrides {
        delimiter: Some("||".to_string()),
        quote_character: Some("'".to_string()),
        comment_character: Some(String::new()),
        multi_value_delimiter: Some(";".to_string()),
        encoding: Some(TextEncoding::Utf16Be),
        ..Default::default()
    };
    let writer_config = overrides.apply(Preset::Csv.writer_config()).unwrap();
    let mut reader_config = overrides.apply(Preset::Csv.reader_config()).unwrap();
    // The reader sniffs the BOM, so the default encoding also works
    reader_config.encoding = TextEncoding::Utf8;

    let entities = vec![
        Entity::new()
            .with_property("A", "it's")
            .with_property("B", "x||y"),
        Entity::new().with_property("A", "#").with_property("B", "ü"),
    ];
    let bytes = write_to_vec(&entities, &writer_config).unwrap();
    assert_eq!(&bytes[..2], &[0xFE, 0xFF]);

    let read_back = read_all(bytes.as_slice(), &reader_config).unwrap();
    assert_eq!(read_back, entities);
}

#[test]
fn test_round_trip_stringifies_scalars() {
    let entities = vec![Entity::new()
        .with_property("Count", 7)
        .with_property("Ratio", 0.5)
        .with_property("Flag", false)
        .with_property("Missing", EntityValue::Null)];
    let bytes = write_to_vec(&entities, &Preset::Csv.writer_config()).unwrap();
    let read_back = read_all(bytes.as_slice(), &Preset::Csv.reader_config()).unwrap();

    let expected = Entity::new()
        .with_property("Count", "7")
        .with_property("Ratio", "0.5")
        .with_property("Flag", "false")
        .with_property("Missing", "");
    assert_eq!(read_back, vec![expected]);
}

#[test]
fn test_read_concordance_preset() {
    let input = "þFooþ\u{14}þBarþ\r\nþHelloþ\u{14}þWorld|Earthþ\r\nþHello 2þ\u{14}þWorld 2|Earth 2þ";
    let entities = read_str(input, &Preset::Concordance.reader_config()).unwrap();

    let rendered: Vec<String> = entities.iter().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        vec![
            r#"(Foo: "Hello" Bar: ["World", "Earth"])"#,
            r#"(Foo: "Hello 2" Bar: ["World 2", "Earth 2"])"#,
        ]
    );
}

#[test]
fn test_concordance_does_not_skip_hash_lines() {
    let input = "þIdþ\n#1\n";
    let entities = read_str(input, &Preset::Concordance.reader_config()).unwrap();
    assert_eq!(entities[0].get("Id"), Some(&EntityValue::from("#1")));
}

#[test]
fn test_read_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "# exported records").unwrap();
    writeln!(temp_file, "id,name,age").unwrap();
    writeln!(temp_file, "1,Alice,30").unwrap();
    writeln!(temp_file, "2,Bob,25").unwrap();
    temp_file.flush().unwrap();

    let config = Preset::Csv.reader_config();
    let file = std::fs::File::open(temp_file.path()).unwrap();
    let mut reader = DelimitedReader::new(std::io::BufReader::new(file), &config).unwrap();

    let first = reader.next().unwrap().unwrap();
    assert_eq!(
        reader.header().unwrap(),
        &["id".to_string(), "name".to_string(), "age".to_string()]
    );
    assert_eq!(first.to_string(), r#"(id: "1" name: "Alice" age: "30")"#);

    let rest: Vec<Entity> = reader.collect::<Result<_, _>>().unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].get("name"), Some(&EntityValue::from("Bob")));
}
