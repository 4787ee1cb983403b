use std::io;

use yamlstream::{
    make_alias, make_collection_start, make_document_end, make_document_start, make_scalar,
    make_simple, CollectionKind, CollectionStyle, EmitError, EmitMode, EmitterConfig, Event,
    EventEmitter, Node, NodeEmitter, Parser, ScalarStyle, SimpleKind, Tag, TagDirective,
};
use CollectionKind::{Mapping as Map, Sequence as Seq};

/// Test in sequence the parser, emitter and parser with the given input.
///
/// 1. Pass the input through the loader and build the documents from it.
/// 2. Pass the newly created documents through the emitter.
/// 3. Pass the emitted string through the loader and build other documents from it.
/// 4. Assert that the documents from 1. and 3. are the same.
/// 5. Return the string from 2. so the caller can ensure its formatting.
///
/// The assertion done in this function is purely on the contents of the documents and not on
/// their presentation.
fn raw_roundtrip(input: &str, config: EmitterConfig) -> String {
    let original_docs = Node::load_all_from_str(input).unwrap();
    let mut emitter = NodeEmitter::with_config(vec![], config);
    emitter.dump_all(&original_docs).unwrap();
    let emitted_string = String::from_utf8(emitter.finish().unwrap()).unwrap();
    println!("original:\n{input}");
    println!("emitted:\n{emitted_string}");

    let emitted_docs = Node::load_all_from_str(&emitted_string).unwrap();
    assert_eq!(original_docs, emitted_docs);

    emitted_string
}

/// [`raw_roundtrip`] with default configuration
fn roundtrip(input: &str) -> String {
    raw_roundtrip(input, EmitterConfig::default())
}

/// Like [`roundtrip`] but with the compact flag disabled.
fn roundtrip_not_compact(input: &str) -> String {
    raw_roundtrip(input, EmitterConfig::default().compact(false))
}

/// Like [`roundtrip`] but with the multiline strings flag enabled.
fn roundtrip_multiline(input: &str) -> String {
    raw_roundtrip(input, EmitterConfig::default().multiline_strings(true))
}

/// Dump `node`, then check that it loads back unchanged.
fn node_roundtrip(node: &Node, config: EmitterConfig) -> String {
    let mut emitter = NodeEmitter::with_config(vec![], config);
    emitter.dump(node).unwrap();
    let emitted_string = String::from_utf8(emitter.finish().unwrap()).unwrap();
    assert_eq!(Node::load_from_str(&emitted_string).unwrap(), *node);
    emitted_string
}

/// Emit a single document made of `events` with the given configuration.
fn emit_with(config: EmitterConfig, events: &[Event]) -> Result<String, EmitError> {
    let mut emitter = EventEmitter::with_config(vec![], config);
    emitter.emit(&Event::StreamStart)?;
    emitter.emit(&make_document_start(true, None, vec![]))?;
    for event in events {
        emitter.emit(event)?;
    }
    emitter.emit(&make_document_end(true))?;
    emitter.emit(&Event::StreamEnd)?;
    Ok(String::from_utf8(emitter.into_inner()).unwrap())
}

/// Emit a single document made of `events`.
fn emit(events: &[Event]) -> Result<String, EmitError> {
    emit_with(EmitterConfig::default(), events)
}

/// Emit every event of a stream, stopping at the first error.
fn emit_stream(events: &[Event]) -> Result<String, EmitError> {
    let mut emitter = EventEmitter::new(vec![]);
    for event in events {
        emitter.emit(event)?;
    }
    Ok(String::from_utf8(emitter.into_inner()).unwrap())
}

/// Re-emit the events the parser reads from `input`.
fn reemit(input: &str, config: EmitterConfig) -> String {
    let mut emitter = EventEmitter::with_config(vec![], config);
    for event in Parser::new_from_str(input) {
        emitter.emit(&event.unwrap().0).unwrap();
    }
    String::from_utf8(emitter.into_inner()).unwrap()
}

fn scalar(value: &str) -> Event {
    make_scalar(ScalarStyle::Any, value, None, None)
}

fn styled(style: ScalarStyle, value: &str) -> Event {
    make_scalar(style, value, None, None)
}

fn start(kind: CollectionKind) -> Event {
    make_collection_start(kind, CollectionStyle::Any, None, None)
}

fn end(kind: CollectionKind) -> Event {
    match kind {
        CollectionKind::Sequence => make_simple(SimpleKind::SequenceEnd),
        CollectionKind::Mapping => make_simple(SimpleKind::MappingEnd),
    }
}

#[allow(clippy::similar_names)]
#[test]
fn test_emit_simple() {
    let s = "
# comment
a0 bb: val
a1:
    b1: 4
    b2: d
a2: 4 # i'm comment
a3: [1, 2, 3]
a4:
    - [a1, a2]
    - 2
";

    roundtrip(s);
}

#[test]
fn test_emit_complex() {
    let s = r"
catalogue:
  product: &coffee   { name: Coffee,    price: 2.5  ,  unit: 1l  }
  product: &cookies  { name: Cookies!,  price: 3.40 ,  unit: 400g}

products:
  *coffee :
    amount: 4
  *cookies :
    amount: 4
  [1,2,3,4]:
    array key
  2.4:
    real key
  true:
    bool key
  {}:
    empty hash key
";
    roundtrip(s);
}

#[test]
fn test_emit_avoid_quotes() {
    let s = r#"---
a7: 你好
boolean: "true"
boolean2: "false"
date: 2014-12-31
empty_string: ""
empty_string1: " "
empty_string2: "    a"
empty_string3: "    a "
exp: "12e7"
field: ":"
field2: "{"
field3: "\\"
field4: "\n"
field5: "can't avoid quote"
float: "2.6"
int: "4"
nullable: "null"
nullable2: "~"
products: "*coffee"
quoted: "\" \\\""
url: "http://example.org"
"#;

    assert_eq!(roundtrip(s), s);
}

#[test]
fn test_emit_with_anchors() {
    let s = "---
base: &b
  x: 1
  y: [a, b]
derived: *b
list:
  - &i item
  - *i
";
    assert_eq!(roundtrip(s), s);
}

#[test]
fn test_emit_multiple_documents() {
    let s = "---\na\n---\n- b\n---\nc: d\n";
    // Scalar roots stay on the line of the document marker.
    assert_eq!(roundtrip(s), "--- a\n---\n- b\n---\nc: d\n");
}

#[test]
fn test_empty_and_nested_flag_compact() {
    let s = r"---
a:
  b:
    c: hello
  d: {}
e:
  - f
  - g
  - h: []
";
    assert_eq!(roundtrip(s), s);
}

#[test]
fn test_nested_arrays() {
    let s = r"---
a:
  - b
  - - c
    - d
    - - e
      - f
";
    assert_eq!(roundtrip(s), s);
}

#[test]
fn test_deeply_nested_arrays() {
    let s = r"---
a:
  - b
  - - c
    - d
    - - e
      - - f
      - - e
";
    assert_eq!(roundtrip(s), s);
}

#[test]
fn test_nested_hashes() {
    let s = r"---
a:
  b:
    c:
      d:
        e: f
";
    assert_eq!(roundtrip(s), s);
}

#[test]
fn test_compact_mapping_in_sequence() {
    let s = "---\n- a: b\n  c: d\n- - x\n  - y: z\n";
    assert_eq!(roundtrip(s), s);
    assert_eq!(
        roundtrip_not_compact(s),
        "---\n-\n  a: b\n  c: d\n-\n  - x\n  -\n    y: z\n"
    );
}

#[test]
fn test_complex_keys() {
    let s = "---\n? - a\n  - b\n: c\n? x: y\n: [z]\n";
    assert_eq!(roundtrip(s), s);
    assert_eq!(roundtrip("{[a]: b}"), "--- {? [a]: b}\n");
}

#[test]
fn test_long_keys_are_explicit() {
    let key = "k".repeat(200);
    let output = roundtrip(&format!("{key}: v"));
    assert_eq!(output, format!("---\n? {key}\n: v\n"));
}

#[test]
fn test_multiline_strings() {
    let node = Node::from(vec![
        (Node::from("a"), Node::from("x\ny")),
        (Node::from("b"), Node::from("\n")),
        (Node::from("c"), Node::from("z\n")),
    ]);
    assert_eq!(
        node_roundtrip(&node, EmitterConfig::default()),
        "---\na: \"x\\ny\"\nb: \"\\n\"\nc: \"z\\n\"\n"
    );
    assert_eq!(
        node_roundtrip(&node, EmitterConfig::default().multiline_strings(true)),
        "---\na: |-\n  x\n  y\nb: \"\\n\"\nc: |\n  z\n"
    );
    // Styles read from a document are kept.
    roundtrip_multiline("a: \"x\\ny\"");
}

#[test]
fn test_block_scalars_are_kept() {
    let s = "---
literal: |
  line one
   indented

  after blank
folded: >-
  folded text

  second paragraph
keep: |+
  kept

last: |2
   leading space
";
    assert_eq!(roundtrip(s), s);
}

#[test]
fn test_null_is_quoted() {
    assert_eq!(emit(&[scalar("null")]).unwrap(), "\"null\"\n");
    assert_eq!(emit(&[scalar("nothing")]).unwrap(), "nothing\n");
    assert_eq!(
        emit(&[start(Seq), scalar("~"), scalar("12"), scalar(""), end(Seq)]).unwrap(),
        "- \"~\"\n- \"12\"\n- \"\"\n"
    );
}

#[test]
fn test_forced_styles() {
    assert_eq!(
        emit(&[styled(ScalarStyle::SingleQuoted, "it's")]).unwrap(),
        "'it''s'\n"
    );
    assert_eq!(
        emit(&[styled(ScalarStyle::Plain, "true")]).unwrap(),
        "true\n"
    );
    // Plain would change the value.
    assert_eq!(
        emit(&[styled(ScalarStyle::Plain, "a: b")]).unwrap(),
        "\"a: b\"\n"
    );
    assert_eq!(
        emit(&[styled(ScalarStyle::SingleQuoted, "a\nb")]).unwrap(),
        "\"a\\nb\"\n"
    );
}

#[test]
fn test_block_scalar_headers() {
    assert_eq!(
        emit(&[start(Map), scalar("a"), styled(ScalarStyle::Literal, "x\ny\n"), end(Map)])
            .unwrap(),
        "a: |\n  x\n  y\n"
    );
    assert_eq!(
        emit(&[styled(ScalarStyle::Literal, "x")]).unwrap(),
        "|-\n  x\n"
    );
    assert_eq!(
        emit(&[styled(ScalarStyle::Literal, "x\n\n")]).unwrap(),
        "|+\n  x\n\n"
    );
    assert_eq!(
        emit(&[start(Seq), styled(ScalarStyle::Literal, " x\n"), end(Seq)]).unwrap(),
        "- |2\n   x\n"
    );
    assert_eq!(
        emit(&[styled(ScalarStyle::Folded, "a b\nc\n")]).unwrap(),
        ">\n  a b\n\n  c\n"
    );
    // Folding would lose the leading space of the second line.
    assert_eq!(
        emit(&[styled(ScalarStyle::Folded, "a\n b\n")]).unwrap(),
        "|\n  a\n   b\n"
    );
}

#[test]
fn test_block_scalar_fallbacks() {
    let flow = make_collection_start(Seq, CollectionStyle::Flow, None, None);
    assert_eq!(
        emit(&[flow, styled(ScalarStyle::Literal, "a\nb"), end(Seq)]).unwrap(),
        "[\"a\\nb\"]\n"
    );
    // Keys are never block scalars.
    assert_eq!(
        emit(&[start(Map), styled(ScalarStyle::Literal, "k"), scalar("v"), end(Map)]).unwrap(),
        "\"k\": v\n"
    );
    // A line of spaces would be read as indentation.
    assert_eq!(
        emit(&[styled(ScalarStyle::Literal, "a\n  \nb")]).unwrap(),
        "\"a\\n  \\nb\"\n"
    );
}

#[test]
fn test_escapes() {
    assert_eq!(emit(&[scalar("\u{7}\t")]).unwrap(), "\"\\a\\t\"\n");
    assert_eq!(
        emit(&[scalar("\u{feff}x\u{85}")]).unwrap(),
        "\"\\uFEFFx\\N\"\n"
    );
    assert_eq!(emit(&[scalar("\u{1}")]).unwrap(), "\"\\x01\"\n");
    assert_eq!(emit(&[scalar("\"\\")]).unwrap(), "\"\\\"\\\\\"\n");
}

#[test]
fn test_tags() {
    let tagged = |tag: Tag| make_scalar(ScalarStyle::Any, "a", None, Some(tag));
    assert_eq!(
        emit(&[tagged(Tag::parse("!!str"))]).unwrap(),
        "!!str a\n"
    );
    assert_eq!(emit(&[tagged(Tag::parse("!local"))]).unwrap(), "!local a\n");
    assert_eq!(emit(&[tagged(Tag::new("", "!"))]).unwrap(), "! a\n");
    assert_eq!(
        emit(&[tagged(Tag::new("", "tag:x.org,2000:y"))]).unwrap(),
        "!<tag:x.org,2000:y> a\n"
    );
    assert_eq!(
        emit(&[tagged(Tag::new("tag:x.org,2000:", "a b"))]).unwrap(),
        "!<tag:x.org,2000:a%20b> a\n"
    );
    assert_eq!(
        emit_with(
            EmitterConfig::default().strip_tags(true),
            &[tagged(Tag::parse("!!str"))]
        )
        .unwrap(),
        "a\n"
    );
}

#[test]
fn test_tag_directives() {
    let output = emit_stream(&[
        Event::StreamStart,
        make_document_start(
            true,
            None,
            vec![TagDirective::new("!e!", "tag:example.com,2000:")],
        ),
        make_scalar(
            ScalarStyle::Any,
            "a",
            None,
            Some(Tag::new("tag:example.com,2000:", "x")),
        ),
        make_document_end(true),
        Event::StreamEnd,
    ])
    .unwrap();
    assert_eq!(output, "%TAG !e! tag:example.com,2000:\n--- !e!x a\n");
    assert_eq!(
        reemit(&output, EmitterConfig::default()),
        "%TAG !e! tag:example.com,2000:\n--- !e!x a\n"
    );
}

#[test]
fn test_document_markers() {
    let doc = |version: Option<(u32, u32)>, value: &str, implicit_end: bool| {
        [
            make_document_start(true, version, vec![]),
            scalar(value),
            make_document_end(implicit_end),
        ]
    };
    let mut events = vec![Event::StreamStart];
    events.extend(doc(None, "a", true));
    events.extend(doc(None, "b", false));
    events.extend(doc(None, "c", true));
    events.extend(doc(Some((1, 2)), "d", true));
    events.push(Event::StreamEnd);
    assert_eq!(
        emit_stream(&events).unwrap(),
        "a\n--- b\n...\n--- c\n...\n%YAML 1.2\n--- d\n"
    );
}

#[test]
fn test_empty_documents() {
    assert_eq!(emit(&[styled(ScalarStyle::Plain, "")]).unwrap(), "---\n");
    assert_eq!(
        emit(&[start(Map), scalar("a"), styled(ScalarStyle::Plain, ""), end(Map)]).unwrap(),
        "a:\n"
    );
    assert_eq!(
        emit_stream(&[Event::StreamStart, Event::StreamEnd]).unwrap(),
        ""
    );
}

#[test]
fn test_empty_collections() {
    assert_eq!(
        emit(&[start(Map), scalar("a"), start(Seq), end(Seq), scalar("b"), start(Map), end(Map), end(Map)])
            .unwrap(),
        "a: []\nb: {}\n"
    );
    assert_eq!(
        emit(&[start(Seq), start(Seq), end(Seq), end(Seq)]).unwrap(),
        "- []\n"
    );
}

#[test]
fn test_aliases() {
    let anchored = make_scalar(ScalarStyle::Any, "a", Some("k"), None);
    assert_eq!(
        emit(&[start(Map), anchored, scalar("v"), make_alias("k"), scalar("w"), end(Map)])
            .unwrap(),
        "&k a: v\n*k : w\n"
    );
    let anchored_seq = make_collection_start(Seq, CollectionStyle::Block, Some("s"), None);
    assert_eq!(
        emit(&[
            start(Seq),
            anchored_seq,
            scalar("x"),
            end(Seq),
            make_alias("s"),
            end(Seq)
        ])
        .unwrap(),
        "- &s\n  - x\n- *s\n"
    );
}

#[test]
fn test_modes() {
    let events = [
        start(Map),
        scalar("a"),
        make_collection_start(Seq, CollectionStyle::Block, None, None),
        scalar("b"),
        scalar("c"),
        end(Seq),
        end(Map),
    ];
    assert_eq!(
        emit_with(EmitterConfig::default().mode(EmitMode::Flow), &events).unwrap(),
        "{a: [b, c]}\n"
    );
    assert_eq!(
        reemit("[a, {b: c}]", EmitterConfig::default().mode(EmitMode::Block)),
        "- a\n- b: c\n"
    );
    assert_eq!(
        reemit("[a, {b: c}]", EmitterConfig::default()),
        "[a, {b: c}]\n"
    );
    assert_eq!(
        emit_with(EmitterConfig::default().indent(4), &events).unwrap(),
        "a:\n    - b\n    - c\n"
    );
}

#[test]
fn test_ending_newline() {
    assert_eq!(
        emit_with(EmitterConfig::default().ending_newline(false), &[scalar("a")]).unwrap(),
        "a"
    );
    // The line break ends the value of the block scalar.
    assert_eq!(
        emit_with(
            EmitterConfig::default().ending_newline(false),
            &[styled(ScalarStyle::Literal, "a\n")]
        )
        .unwrap(),
        "|\n  a\n"
    );
}

#[test]
fn test_unbalanced_collections() {
    assert!(matches!(
        emit(&[start(Map), end(Seq)]),
        Err(EmitError::UnbalancedCollection(_))
    ));
    assert!(matches!(
        emit(&[end(Seq)]),
        Err(EmitError::EventOutOfOrder(_) | EmitError::UnbalancedCollection(_))
    ));
    assert!(matches!(
        emit(&[start(Map), scalar("a"), end(Map)]),
        Err(EmitError::UnbalancedCollection(_))
    ));
    assert!(matches!(
        emit(&[start(Seq)]),
        Err(EmitError::UnbalancedCollection(_))
    ));
}

#[test]
fn test_events_out_of_order() {
    assert!(matches!(
        emit_stream(&[Event::StreamStart, scalar("a")]),
        Err(EmitError::EventOutOfOrder(_))
    ));
    assert!(matches!(
        emit_stream(&[make_document_start(true, None, vec![])]),
        Err(EmitError::EventOutOfOrder(_))
    ));
    assert!(matches!(
        emit(&[scalar("a"), scalar("b")]),
        Err(EmitError::EventOutOfOrder(_))
    ));
    assert!(matches!(
        emit_stream(&[
            Event::StreamStart,
            make_document_start(true, None, vec![]),
            make_document_end(true),
        ]),
        Err(EmitError::EventOutOfOrder(_))
    ));
}

#[test]
fn test_undefined_aliases() {
    assert!(matches!(
        emit(&[make_alias("x")]),
        Err(EmitError::UndefinedAnchorReferencedByAlias(name)) if name == "x"
    ));
    // The anchor of an open collection is not defined yet.
    let anchored = make_collection_start(Map, CollectionStyle::Any, Some("m"), None);
    assert!(matches!(
        emit(&[anchored, scalar("a"), make_alias("m"), end(Map)]),
        Err(EmitError::UndefinedAnchorReferencedByAlias(_))
    ));
    // Anchors do not cross documents.
    assert!(matches!(
        emit_stream(&[
            Event::StreamStart,
            make_document_start(true, None, vec![]),
            make_scalar(ScalarStyle::Any, "a", Some("x"), None),
            make_document_end(true),
            make_document_start(true, None, vec![]),
            make_alias("x"),
        ]),
        Err(EmitError::UndefinedAnchorReferencedByAlias(_))
    ));
}

#[test]
fn test_errors_are_terminal() {
    let mut emitter = EventEmitter::new(vec![]);
    emitter.emit(&Event::StreamStart).unwrap();
    assert!(emitter.emit(&Event::StreamStart).is_err());
    assert!(matches!(
        emitter.emit(&make_document_start(true, None, vec![])),
        Err(EmitError::EventOutOfOrder(_))
    ));
}

#[test]
fn test_partial_output_is_kept() {
    let mut emitter = EventEmitter::new(vec![]);
    emitter.emit(&Event::StreamStart).unwrap();
    emitter
        .emit(&make_document_start(true, None, vec![]))
        .unwrap();
    emitter.emit(&start(Seq)).unwrap();
    emitter.emit(&scalar("a")).unwrap();
    assert!(emitter.emit(&end(Map)).is_err());
    assert_eq!(emitter.into_inner(), b"- a");
}

struct FailingWriter;

impl io::Write for FailingWriter {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_io_errors() {
    let mut emitter = EventEmitter::new(FailingWriter);
    emitter.emit(&Event::StreamStart).unwrap();
    emitter
        .emit(&make_document_start(true, None, vec![]))
        .unwrap();
    assert!(matches!(
        emitter.emit(&scalar("a")),
        Err(EmitError::Io(e)) if e.kind() == io::ErrorKind::BrokenPipe
    ));
}

#[test]
fn test_node_emitter() {
    let node = Node::from(vec![
        Node::from("a"),
        Node::from(vec![(Node::from("b"), Node::from("true"))]),
    ]);
    assert_eq!(
        yamlstream::to_string(&node).unwrap(),
        "---\n- a\n- b: \"true\"\n"
    );
    assert_eq!(
        yamlstream::to_string_all(&[Node::from("x"), Node::from("y")]).unwrap(),
        "--- x\n--- y\n"
    );
    assert_eq!(yamlstream::to_string_all(&[]).unwrap(), "");
}

/// Dump `node` alone with the given configuration.
fn dump_with(node: &Node, config: EmitterConfig) -> String {
    let mut emitter = NodeEmitter::with_config(vec![], config);
    emitter.dump(node).unwrap();
    String::from_utf8(emitter.finish().unwrap()).unwrap()
}

#[test]
fn test_deep_nesting() {
    let depth = 100_000;
    let node = Node::load_from_str(&("- ".repeat(depth) + "a")).unwrap();
    assert_eq!(
        yamlstream::to_string(&node).unwrap(),
        format!("---\n{}a\n", "- ".repeat(depth))
    );
}

#[test]
fn test_sort_keys() {
    let config = EmitterConfig::default().sort_keys(true);
    let node = Node::load_from_str("b: 1\na: [x]\nc: {z: 1, y: 2}").unwrap();
    assert_eq!(
        dump_with(&node, config),
        "---\na: [x]\nb: 1\nc: {y: 2, z: 1}\n"
    );

    // Keys that are not scalars come last.
    let node = Node::load_from_str("[k]: v\nb: 1\na: 2").unwrap();
    let sorted = Node::load_from_str(&dump_with(&node, config)).unwrap();
    let keys = sorted
        .as_mapping()
        .unwrap()
        .entries
        .iter()
        .map(|(key, _)| key.as_str())
        .collect::<Vec<_>>();
    assert_eq!(keys, [Some("a"), Some("b"), None]);

    // An alias sorted before its anchor is written as a copy.
    let node = Node::load_from_str("b: &x 1\na: *x").unwrap();
    assert_eq!(dump_with(&node, config), "---\na: 1\nb: &x 1\n");
    let node = Node::load_from_str("a: &x 1\nb: *x").unwrap();
    assert_eq!(dump_with(&node, config), "---\na: &x 1\nb: *x\n");
}

#[test]
fn test_strip_anchors() {
    let config = EmitterConfig::default().strip_anchors(true);
    let node = Node::load_from_str("base: &b {x: 1}\nderived: *b").unwrap();
    assert_eq!(
        dump_with(&node, config),
        "---\nbase: {x: 1}\nderived: {x: 1}\n"
    );

    assert_eq!(
        reemit("a: &x [1, 2]\nb: *x\n", config),
        "a: [1, 2]\nb: [1, 2]\n"
    );
    assert_eq!(
        reemit("- &a x\n- &b [*a, y]\n- *b\n", config),
        "- x\n- [x, y]\n- [x, y]\n"
    );

    assert!(matches!(
        emit_with(config, &[make_alias("x")]),
        Err(EmitError::UndefinedAnchorReferencedByAlias(name)) if name == "x"
    ));
    let anchored = make_collection_start(Map, CollectionStyle::Any, Some("m"), None);
    assert!(matches!(
        emit_with(config, &[anchored, scalar("a"), make_alias("m"), end(Map)]),
        Err(EmitError::UndefinedAnchorReferencedByAlias(_))
    ));
}

#[test]
fn test_strip_doc_indicators() {
    let config = EmitterConfig::default().strip_doc_indicators(true);
    let mut emitter = NodeEmitter::with_config(vec![], config);
    emitter
        .dump_all(&[Node::from("x"), Node::from("y")])
        .unwrap();
    assert_eq!(emitter.finish().unwrap(), b"x\n--- y\n");

    // Directives still need their markers.
    let mut emitter = EventEmitter::with_config(vec![], config);
    for event in [
        Event::StreamStart,
        make_document_start(false, None, vec![]),
        scalar("a"),
        make_document_end(false),
        make_document_start(false, Some((1, 2)), vec![]),
        scalar("b"),
        make_document_end(false),
        Event::StreamEnd,
    ] {
        emitter.emit(&event).unwrap();
    }
    assert_eq!(emitter.into_inner(), b"a\n...\n%YAML 1.2\n--- b\n");
}
