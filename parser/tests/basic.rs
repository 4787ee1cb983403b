#![allow(clippy::bool_assert_comparison)]

use yamlstream_parser::{
    make_alias, make_collection_start, make_document_end, make_document_start, make_scalar,
    make_simple, CollectionKind, CollectionStyle, Error, Event, Parser, ScalarStyle, SimpleKind,
    Tag, TagDirective,
};

/// Run the parser through the string.
///
/// # Returns
/// This functions returns the events if parsing succeeds, the error the parser returned otherwise.
fn run_parser(input: &str) -> Result<Vec<Event>, Error> {
    let mut events = vec![];
    for x in Parser::new_from_str(input) {
        events.push(x?.0);
    }
    Ok(events)
}

fn plain(value: &str) -> Event {
    make_scalar(ScalarStyle::Plain, value, None, None)
}

fn block(kind: CollectionKind) -> Event {
    make_collection_start(kind, CollectionStyle::Block, None, None)
}

fn flow(kind: CollectionKind) -> Event {
    make_collection_start(kind, CollectionStyle::Flow, None, None)
}

/// Surround the events of a single implicit document with stream and document boundaries.
fn implicit_doc(events: Vec<Event>) -> Vec<Event> {
    let mut all = vec![
        make_simple(SimpleKind::StreamStart),
        make_document_start(true, None, vec![]),
    ];
    all.extend(events);
    all.push(make_document_end(true));
    all.push(make_simple(SimpleKind::StreamEnd));
    all
}

#[test]
fn test_fail() {
    let s = "
# syntax error
scalar
key: [1, 2]]
key1:a2
";
    let Err(error) = run_parser(s) else { panic!() };
    assert_eq!(
        error.info(),
        "mapping values are not allowed in this context"
    );
    assert_eq!(
        error.to_string(),
        "mapping values are not allowed in this context at byte 26 line 4 column 4"
    );
}

#[test]
fn test_empty_doc() {
    assert_eq!(
        run_parser("").unwrap(),
        [Event::StreamStart, Event::StreamEnd]
    );

    assert_eq!(
        run_parser("---").unwrap(),
        [
            Event::StreamStart,
            make_document_start(false, None, vec![]),
            plain(""),
            Event::DocumentEnd { implicit: true },
            Event::StreamEnd,
        ]
    );
}

#[test]
fn test_utf() {
    assert_eq!(
        run_parser("a: 你好").unwrap(),
        implicit_doc(vec![
            block(CollectionKind::Mapping),
            plain("a"),
            plain("你好"),
            Event::MappingEnd,
        ])
    );
}

#[test]
fn test_comments() {
    let s = "
# This is a comment
a: b # This is another comment
##
  #
";

    assert_eq!(
        run_parser(s).unwrap(),
        implicit_doc(vec![
            block(CollectionKind::Mapping),
            plain("a"),
            plain("b"),
            Event::MappingEnd,
        ])
    );
}

#[test]
fn test_quoting() {
    let s = "
- plain
- 'squote'
- \"dquote\"
";

    assert_eq!(
        run_parser(s).unwrap(),
        implicit_doc(vec![
            block(CollectionKind::Sequence),
            plain("plain"),
            make_scalar(ScalarStyle::SingleQuoted, "squote", None, None),
            make_scalar(ScalarStyle::DoubleQuoted, "dquote", None, None),
            Event::SequenceEnd,
        ])
    );
}

#[test]
fn test_multi_doc() {
    let s = "
a scalar
---
a scalar
---
a scalar
";
    assert_eq!(
        run_parser(s).unwrap(),
        [
            Event::StreamStart,
            make_document_start(true, None, vec![]),
            plain("a scalar"),
            make_document_end(true),
            make_document_start(false, None, vec![]),
            plain("a scalar"),
            make_document_end(true),
            make_document_start(false, None, vec![]),
            plain("a scalar"),
            make_document_end(true),
            Event::StreamEnd,
        ]
    );
}

#[test]
fn test_explicit_document_end() {
    assert_eq!(
        run_parser("a\n...\n...\nb").unwrap(),
        [
            Event::StreamStart,
            make_document_start(true, None, vec![]),
            plain("a"),
            make_document_end(false),
            make_document_start(true, None, vec![]),
            plain("b"),
            make_document_end(true),
            Event::StreamEnd,
        ]
    );
    assert!(run_parser("\"a\"\n%YAML 1.2\n--- b").is_err());
    assert!(run_parser("\"a\"\n...\n%YAML 1.2\n--- b").is_ok());
}

#[test]
fn test_github_27() {
    // https://github.com/chyh1990/yaml-rust/issues/27
    assert_eq!(
        run_parser("&a").unwrap(),
        implicit_doc(vec![make_scalar(ScalarStyle::Plain, "", Some("a"), None)])
    );
}

#[test]
fn test_empty_nodes() {
    assert_eq!(
        run_parser("- \n- b\n-").unwrap(),
        implicit_doc(vec![
            block(CollectionKind::Sequence),
            plain(""),
            plain("b"),
            plain(""),
            Event::SequenceEnd,
        ])
    );
    assert_eq!(
        run_parser("{a, ? : c}").unwrap(),
        implicit_doc(vec![
            flow(CollectionKind::Mapping),
            plain("a"),
            plain(""),
            plain(""),
            plain("c"),
            Event::MappingEnd,
        ])
    );
}

#[test]
fn test_nested_collections() {
    let s = "
seq:
- a
- [b, c: d]
map: {x: *anchor}
";
    let events = run_parser(&format!("anchor: &anchor 1{s}")).unwrap();
    assert_eq!(
        events,
        implicit_doc(vec![
            block(CollectionKind::Mapping),
            plain("anchor"),
            make_scalar(ScalarStyle::Plain, "1", Some("anchor"), None),
            plain("seq"),
            block(CollectionKind::Sequence),
            plain("a"),
            flow(CollectionKind::Sequence),
            plain("b"),
            flow(CollectionKind::Mapping),
            plain("c"),
            plain("d"),
            Event::MappingEnd,
            Event::SequenceEnd,
            Event::SequenceEnd,
            plain("map"),
            flow(CollectionKind::Mapping),
            plain("x"),
            make_alias("anchor"),
            Event::MappingEnd,
            Event::MappingEnd,
        ])
    );
}

#[test]
fn test_tags() {
    let s = "
%TAG !e! tag:example.com,2000:app/
---
- !!str a
- !e!foo b
- !local c
- !<tag:verbatim> d
- ! e
";
    let events = run_parser(s).unwrap();
    assert_eq!(
        events[1],
        make_document_start(
            false,
            None,
            vec![TagDirective::new("!e!", "tag:example.com,2000:app/")]
        )
    );
    let tags: Vec<_> = events.iter().filter_map(Event::tag).cloned().collect();
    assert_eq!(
        tags,
        [
            Tag::new("tag:yaml.org,2002:", "str"),
            Tag::new("tag:example.com,2000:app/", "foo"),
            Tag::new("!", "local"),
            Tag::new("", "tag:verbatim"),
            Tag::new("", "!"),
        ]
    );
    assert!(tags[0].is_yaml_core_schema());
    assert!(tags[4].is_non_specific());

    // Tag handles only live for the document that declares them.
    assert!(run_parser("%TAG !e! tag:e.com:\n--- !e!a x\n--- !e!b y").is_err());
    assert!(run_parser("--- !undeclared!x y").is_err());
}

#[test]
fn test_version_directive() {
    assert_eq!(
        run_parser("%YAML 1.1\n--- a").unwrap()[1],
        make_document_start(false, Some((1, 1)), vec![])
    );
    assert!(run_parser("%YAML 2.0\n--- a").is_err());
    assert!(run_parser("%YAML 1.2\n%YAML 1.2\n--- a").is_err());
}

#[test]
fn test_bad_hyphen() {
    // See: https://github.com/chyh1990/yaml-rust/issues/23
    assert!(run_parser("{-").is_err());
}

#[test]
fn test_issue_65() {
    // See: https://github.com/chyh1990/yaml-rust/issues/65
    let b = "\n\"ll\\\"ll\\\r\n\"ll\\\"ll\\\r\r\r\rU\r\r\rU";
    assert!(run_parser(b).is_err());
}

#[test]
fn test_issue_65_mwe() {
    // A MWE for `test_issue_65`. The error over there is that there is invalid trailing content
    // after a double quoted string.
    let b = r#""foo" l"#;
    assert!(run_parser(b).is_err());
}

#[test]
fn test_comment_after_tag() {
    // https://github.com/Ethiraric/yaml-rust2/issues/21#issuecomment-2053513507
    let s = "
%YAML 1.2
# This is a comment
--- #-------
foobar";

    assert_eq!(
        run_parser(s).unwrap(),
        [
            Event::StreamStart,
            make_document_start(false, Some((1, 2)), vec![]),
            plain("foobar"),
            make_document_end(true),
            Event::StreamEnd,
        ]
    );
}

#[test]
fn test_large_block_scalar_indent() {
    // The indent in the YAML string is greater than the lookahead buffer of `BufferedInput`. The
    // second line is further indented with spaces, and the resulting string should be "a\n    b".
    let s = "
a: |-
                  a
                      b
";

    assert_eq!(
        run_parser(s).unwrap(),
        implicit_doc(vec![
            block(CollectionKind::Mapping),
            plain("a"),
            make_scalar(ScalarStyle::Literal, "a\n    b", None, None),
            Event::MappingEnd,
        ])
    );
    assert_eq!(
        Parser::new_from_iter(s.chars())
            .map(|ev| ev.map(|(ev, _)| ev))
            .collect::<Result<Vec<_>, _>>()
            .unwrap(),
        run_parser(s).unwrap()
    );
}

#[test]
fn test_bad_docstart() {
    run_parser("---This used to cause an infinite loop").unwrap();
    assert_eq!(
        run_parser("----").unwrap(),
        implicit_doc(vec![plain("----")])
    );

    assert_eq!(
        run_parser("--- #comment").unwrap(),
        [
            Event::StreamStart,
            make_document_start(false, None, vec![]),
            plain(""),
            make_document_end(true),
            Event::StreamEnd,
        ]
    );

    assert_eq!(
        run_parser("---- #comment").unwrap(),
        implicit_doc(vec![plain("----")])
    );
}

#[test]
fn test_indentation_equality() {
    let four_spaces = run_parser(
        r"
hash:
    with:
        indentations
",
    )
    .unwrap();

    let two_spaces = run_parser(
        r"
hash:
  with:
    indentations
",
    )
    .unwrap();

    let one_space = run_parser(
        r"
hash:
 with:
  indentations
",
    )
    .unwrap();

    let mixed_spaces = run_parser(
        r"
hash:
     with:
               indentations
",
    )
    .unwrap();

    for (((a, b), c), d) in four_spaces
        .iter()
        .zip(two_spaces.iter())
        .zip(one_space.iter())
        .zip(mixed_spaces.iter())
    {
        assert!(a == b);
        assert!(a == c);
        assert!(a == d);
    }
}

#[test]
fn test_errors_are_sticky() {
    let mut parser = Parser::new_from_str("[a, b");
    let first = loop {
        match parser.next_event() {
            Ok(Some(_)) => {}
            Ok(None) => panic!("unterminated flow sequence was accepted"),
            Err(e) => break e,
        }
    };
    assert_eq!(parser.next_event(), Err(first.clone()));
    assert_eq!(parser.next_event(), Err(first));
    assert!(parser.next().is_none());
}

#[test]
fn test_recursion_depth_check_objects() {
    let s = "{a:".repeat(10_000) + &"}".repeat(10_000);
    assert!(run_parser(&s).is_err());
}

#[test]
fn test_recursion_depth_check_arrays() {
    let s = "[".repeat(10_000) + &"]".repeat(10_000);
    assert!(run_parser(&s).is_err());
}
