use json_stream_parser::{
    JsonStreamParser, JsonValue, ParserOptions, PathSegment, Result, SyntaxError,
};

/// Inputs covering the whole grammar, shared by the round-trip and chunking
/// suites.
#[allow(unused)]
pub const FIXTURES: &[&str] = &[
    "null",
    "true",
    "false",
    "0",
    "-50.25e3",
    r#""hello \"world\"""#,
    "[]",
    "{}",
    r#"{"a":1,"b":[true,null,"x"]}"#,
    r#"[1,[2,[3,[4]]],{"deep":{"deeper":{"deepest":[null]}}}]"#,
    r#"{"unicode":"\u0041\u00e9","emoji":"\uD83D\uDCA9","escapes":"\b\f\n\r\t\/\\"}"#,
    r#"{"raw":"Aé💩"}"#,
    "[0.5, -0.25, 1e10, 2E-3, 123456789.125]",
    r#"{"empty_string":"","empty_array":[],"empty_object":{}}"#,
    "{ \"spaced\" :\t[ 1 ,\n2 ] ,\r\n\"out\" : null }",
];

/// Split `text` into chunks of `size` code points each.
#[allow(unused)]
pub fn chunks_of(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[allow(unused)]
pub fn parse_whole(text: &str, options: ParserOptions) -> Result<JsonStreamParser> {
    let mut parser = JsonStreamParser::with_options(options);
    parser.push(text)?;
    parser.close()?;
    Ok(parser)
}

#[allow(unused)]
pub fn parse_chunked(
    text: &str,
    size: usize,
    options: ParserOptions,
) -> Result<JsonStreamParser> {
    let mut parser = JsonStreamParser::with_options(options);
    for chunk in chunks_of(text, size) {
        parser.push(&chunk)?;
    }
    parser.close()?;
    Ok(parser)
}

/// Unwrap the syntax error produced by parsing `text` whole.
#[allow(unused)]
pub fn parse_err(text: &str) -> SyntaxError {
    let error = parse_whole(text, ParserOptions::default())
        .err()
        .expect("input should fail to parse");
    match error {
        json_stream_parser::Error::Syntax(error) => error,
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

#[allow(unused)]
pub fn key(name: &str) -> PathSegment {
    PathSegment::from(name)
}

#[allow(unused)]
pub fn idx(index: usize) -> PathSegment {
    PathSegment::from(index)
}

/// Assert that a parsed tree is structurally equal to a `serde_json` value,
/// comparing numbers through `f64`.
#[allow(unused)]
pub fn assert_matches_serde(actual: &JsonValue, expected: &serde_json::Value) {
    match (actual, expected) {
        (JsonValue::Null, serde_json::Value::Null) => {}
        (JsonValue::Bool(a), serde_json::Value::Bool(b)) => assert_eq!(a, b),
        (JsonValue::Number(a), serde_json::Value::Number(b)) => {
            assert_eq!(Some(*a), b.as_f64());
        }
        (JsonValue::String(a), serde_json::Value::String(b)) => assert_eq!(a, b),
        (JsonValue::Array(a), serde_json::Value::Array(b)) => {
            assert_eq!(a.len(), b.len(), "array lengths differ");
            for (x, y) in a.iter().zip(b) {
                assert_matches_serde(x, y);
            }
        }
        (JsonValue::Object(a), serde_json::Value::Object(b)) => {
            assert_eq!(a.len(), b.len(), "object sizes differ");
            for (name, x) in a {
                let y = b
                    .get(name)
                    .unwrap_or_else(|| panic!("missing property {name:?}"));
                assert_matches_serde(x, y);
            }
        }
        (a, b) => panic!("mismatched values: {a:?} vs {b:?}"),
    }
}
