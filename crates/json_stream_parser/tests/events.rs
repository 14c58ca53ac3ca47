mod harness;

use harness::{idx, key, parse_whole};
use json_stream_parser::{
    Event, EventKind, JsonStreamParser, JsonValue, ParserOptions, PathSegment,
};

fn tracking() -> ParserOptions {
    ParserOptions {
        track_events: true,
        ..ParserOptions::default()
    }
}

fn event(kind: EventKind, path: Vec<PathSegment>) -> Event {
    Event { kind, path }
}

#[test]
fn test_event_sequence_for_nested_document() {
    let mut parser = parse_whole(r#"{"a":1,"b":[true,null,"x"]}"#, tracking()).unwrap();
    let events = parser.take_events().unwrap();
    assert_eq!(
        events,
        vec![
            event(EventKind::Begin, vec![]),
            event(EventKind::Set, vec![key("a")]),
            event(EventKind::Begin, vec![key("b")]),
            event(EventKind::Set, vec![key("b"), idx(0)]),
            event(EventKind::Set, vec![key("b"), idx(1)]),
            event(EventKind::Set, vec![key("b"), idx(2)]),
            event(EventKind::End, vec![key("b")]),
            event(EventKind::End, vec![]),
        ]
    );
}

#[test]
fn test_scalar_root_emits_single_set() {
    let mut parser = parse_whole("42", tracking()).unwrap();
    assert_eq!(
        parser.take_events().unwrap(),
        vec![event(EventKind::Set, vec![])]
    );
}

#[test]
fn test_empty_containers_emit_begin_and_end() {
    let mut parser = parse_whole("[{},[]]", tracking()).unwrap();
    assert_eq!(
        parser.take_events().unwrap(),
        vec![
            event(EventKind::Begin, vec![]),
            event(EventKind::Begin, vec![idx(0)]),
            event(EventKind::End, vec![idx(0)]),
            event(EventKind::Begin, vec![idx(1)]),
            event(EventKind::End, vec![idx(1)]),
            event(EventKind::End, vec![]),
        ]
    );
}

#[test]
fn test_take_events_drains() {
    let mut parser = JsonStreamParser::with_options(tracking());
    parser.push("[1,").unwrap();
    let first = parser.take_events().unwrap();
    assert!(!first.is_empty());
    assert!(parser.take_events().unwrap().is_empty());

    parser.push("2]").unwrap();
    parser.close().unwrap();
    let second = parser.take_events().unwrap();
    assert_eq!(
        second,
        vec![
            event(EventKind::Set, vec![idx(1)]),
            event(EventKind::End, vec![]),
        ]
    );
}

#[test]
fn test_incomplete_string_surfacing_emits_no_events() {
    let options = ParserOptions {
        incomplete_strings: json_stream_parser::IncompleteStrings::Plain,
        track_events: true,
    };
    let mut parser = JsonStreamParser::with_options(options);
    parser.push(r#"["par"#).unwrap();
    let events = parser.take_events().unwrap();
    // Only the array opening is structural; the surfaced partial is not.
    assert_eq!(events, vec![event(EventKind::Begin, vec![])]);
}

/// Rebuild a tree by replaying the event log against an empty root, pulling
/// concrete values from the final tree. The replayed result must equal the
/// final tree itself: every slot of the tree is covered by an event at the
/// right path, in traversal order.
fn replay(events: &[Event], final_tree: &JsonValue) -> JsonValue {
    fn value_at<'a>(root: &'a JsonValue, path: &[PathSegment]) -> &'a JsonValue {
        let mut current = root;
        for segment in path {
            current = match segment {
                PathSegment::Index(index) => current
                    .get_index(*index)
                    .unwrap_or_else(|| panic!("index {index} missing in final tree")),
                PathSegment::Key(name) => current
                    .get(name)
                    .unwrap_or_else(|| panic!("key {name:?} missing in final tree")),
            };
        }
        current
    }

    fn slot_at<'a>(root: &'a mut JsonValue, path: &[PathSegment]) -> &'a mut JsonValue {
        let mut current = root;
        for segment in path {
            current = match (current, segment) {
                (JsonValue::Array(items), PathSegment::Index(index)) => {
                    if *index == items.len() {
                        items.push(JsonValue::Null);
                    }
                    &mut items[*index]
                }
                (JsonValue::Object(map), PathSegment::Key(name)) => {
                    map.entry(name.clone()).or_insert(JsonValue::Null)
                }
                (current, segment) => {
                    panic!("event path segment {segment:?} does not fit {current:?}")
                }
            };
        }
        current
    }

    let mut root = JsonValue::Null;
    for Event { kind, path } in events {
        match kind {
            EventKind::Begin => {
                let empty = match value_at(final_tree, path) {
                    JsonValue::Object(_) => JsonValue::Object(Default::default()),
                    JsonValue::Array(_) => JsonValue::Array(Vec::new()),
                    other => panic!("begin event pointing at non-container {other:?}"),
                };
                *slot_at(&mut root, path) = empty;
            }
            EventKind::Set => {
                *slot_at(&mut root, path) = value_at(final_tree, path).clone();
            }
            EventKind::End => {}
        }
    }
    root
}

#[test]
fn test_replaying_events_reconstructs_the_tree() {
    for fixture in harness::FIXTURES {
        let mut parser = parse_whole(fixture, tracking()).unwrap();
        let events = parser.take_events().unwrap();
        let replayed = replay(&events, parser.value());
        assert_eq!(&replayed, parser.value(), "replay diverged for {fixture:?}");
    }
}
