use yamlstream_parser::{Error, Event, Parser};

/// Run the parser through the string, returning all the scalars, and collecting their spans to
/// strings.
fn run_parser_and_deref_scalar_spans(input: &str) -> Result<Vec<(String, String)>, Error> {
    let mut events = vec![];
    for x in Parser::new_from_str(input) {
        let (ev, span) = x?;
        if let Event::Scalar { value, .. } = ev {
            let input_s = input[span.start.index()..span.end.index()].to_owned();
            events.push((value, input_s));
        }
    }
    Ok(events)
}

/// Run the parser through the string, returning the source text of every flow sequence.
fn run_parser_and_deref_seq_spans(input: &str) -> Result<Vec<String>, Error> {
    let mut events = vec![];
    let mut start_stack = vec![];
    for x in Parser::new_from_str(input) {
        let (ev, span) = x?;
        match ev {
            Event::SequenceStart { .. } => start_stack.push(span.start.index()),
            Event::SequenceEnd => {
                let start = start_stack.pop().unwrap();
                events.push(input[start..span.end.index()].to_owned());
            }
            _ => {}
        }
    }
    Ok(events)
}

fn deref_pairs(pairs: &[(String, String)]) -> Vec<(&str, &str)> {
    pairs
        .iter()
        .map(|(a, b)| (a.as_str(), b.as_str()))
        .collect()
}

#[test]
fn test_plain() {
    assert_eq!(
        deref_pairs(&run_parser_and_deref_scalar_spans("foo: bar").unwrap()),
        [("foo", "foo"), ("bar", "bar"),]
    );
    assert_eq!(
        deref_pairs(&run_parser_and_deref_scalar_spans("foo: bar ").unwrap()),
        [("foo", "foo"), ("bar", "bar"),]
    );
    assert_eq!(
        deref_pairs(&run_parser_and_deref_scalar_spans("foo :  \t  bar\t ").unwrap()),
        [("foo", "foo"), ("bar", "bar"),]
    );

    assert_eq!(
        deref_pairs(&run_parser_and_deref_scalar_spans("foo :  \n  - bar\n  - baz\n ").unwrap()),
        [("foo", "foo"), ("bar", "bar"), ("baz", "baz")]
    );
}

#[test]
fn test_plain_utf8() {
    // Indices are byte offsets, so spans slice the source directly.
    assert_eq!(
        deref_pairs(&run_parser_and_deref_scalar_spans("a: 你好").unwrap()),
        [("a", "a"), ("你好", "你好")]
    );
    assert_eq!(
        deref_pairs(&run_parser_and_deref_scalar_spans("ü: [ä, ö]").unwrap()),
        [("ü", "ü"), ("ä", "ä"), ("ö", "ö")]
    );
}

#[test]
fn test_quoted() {
    assert_eq!(
        deref_pairs(&run_parser_and_deref_scalar_spans(r#"foo: "bar""#).unwrap()),
        [("foo", "foo"), ("bar", r#""bar""#),]
    );
    assert_eq!(
        deref_pairs(&run_parser_and_deref_scalar_spans(r"foo: 'bar'").unwrap()),
        [("foo", "foo"), ("bar", r"'bar'"),]
    );

    assert_eq!(
        deref_pairs(&run_parser_and_deref_scalar_spans(r#"foo: "bar ""#).unwrap()),
        [("foo", "foo"), ("bar ", r#""bar ""#),]
    );
}

#[test]
fn test_properties_are_part_of_the_node() {
    assert_eq!(
        deref_pairs(&run_parser_and_deref_scalar_spans("a: &x !!str b").unwrap()),
        [("a", "a"), ("b", "&x !!str b")]
    );
}

#[test]
fn test_seq() {
    assert_eq!(
        run_parser_and_deref_seq_spans("[a, b]").unwrap(),
        ["[a, b]"]
    );
    assert_eq!(
        run_parser_and_deref_seq_spans("x: [a, [b, c]]").unwrap(),
        ["[b, c]", "[a, [b, c]]"]
    );
}

#[test]
fn test_lines_and_columns() {
    let s = "a:\n  - b\n  - ĉ";
    let spans: Vec<_> = Parser::new_from_str(s)
        .map(Result::unwrap)
        .filter(|(ev, _)| matches!(ev, Event::Scalar { .. }))
        .map(|(_, span)| (span.start.line(), span.start.col(), span.len()))
        .collect();
    // `len` counts bytes.
    assert_eq!(spans, [(1, 0, 1), (2, 4, 1), (3, 4, 2)]);
}
