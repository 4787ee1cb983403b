use std::io::{self, Read};

use yamlstream_parser::{Error, Event, Parser, ScanErrorKind};

/// Run the parser through the string.
///
/// The parser is run through the `StrInput`, `BufferedInput` and `ReadInput` variants. The
/// resulting events are then compared and must match.
///
/// # Returns
/// This function returns the events if parsing succeeds, the error the parser returned otherwise.
///
/// # Panics
/// This function panics if there is a mismatch between the parser invocations with the different
/// input traits.
fn run_parser(input: &str) -> Result<Vec<Event>, Error> {
    let str_run: Result<Vec<_>, _> = Parser::new_from_str(input).collect();
    let iter_run: Result<Vec<_>, _> = Parser::new_from_iter(input.chars()).collect();
    let read_run: Result<Vec<_>, _> = Parser::new_from_reader(input.as_bytes()).collect();

    assert_eq!(str_run, iter_run);
    assert_eq!(str_run, read_run);

    str_run.map(|events| events.into_iter().map(|x| x.0).collect())
}

/// A reader handing out a single byte per call.
struct Trickle<'a>(&'a [u8]);

impl Read for Trickle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match (self.0.split_first(), buf.first_mut()) {
            (Some((&b, rest)), Some(slot)) => {
                *slot = b;
                self.0 = rest;
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

/// A reader failing after handing out its contents.
struct Failing<'a>(&'a [u8]);

impl Read for Failing<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.0.is_empty() {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer went away"));
        }
        let n = self.0.len().min(buf.len());
        buf[..n].copy_from_slice(&self.0[..n]);
        self.0 = &self.0[n..];
        Ok(n)
    }
}

#[test]
fn test_implicit_flow_mappings() {
    // [a: [42]]
    //        ^ This closing sequence character
    // ^ must not be taken for closing this sequence, where the implicit mapping starts.
    let reference = run_parser("[{a: [42]}]").unwrap();
    assert_eq!(run_parser("[a: [42]]").unwrap(), reference);
    assert_eq!(
        run_parser("[foo: bar, {baz: qux}]").unwrap(),
        run_parser("[{foo: bar}, {baz: qux}]").unwrap()
    );
    assert!(run_parser("[:[:]]").is_err());
    assert!(run_parser("[a:[42]]").is_err());
}

#[test]
fn test_document_markers_in_flow() {
    assert!(run_parser("{---").is_err());
    let Err(error) = run_parser("{...") else {
        panic!("document end marker accepted in a flow mapping")
    };
    assert_eq!(
        error.info(),
        "while parsing a flow mapping, did not find expected ',' or '}'"
    );
    assert!(error.marker().is_some());
}

#[test]
fn test_document_markers_in_plain_scalar() {
    // Document markers only matter at the start of a line.
    let events = run_parser("comment: hello ... world").unwrap();
    assert!(events.iter().any(
        |ev| matches!(ev, Event::Scalar { value, .. } if value == "hello ... world")
    ));
}

#[test]
fn test_multibyte_characters() {
    let s = "ключ: значение\n絵文字: \"😀\"\n";
    let events = run_parser(s).unwrap();
    let scalars: Vec<_> = events
        .iter()
        .filter_map(|ev| match ev {
            Event::Scalar { value, .. } => Some(value.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(scalars, ["ключ", "значение", "絵文字", "😀"]);
}

#[test]
fn test_byte_order_mark() {
    assert_eq!(run_parser("\u{feff}a").unwrap(), run_parser("a").unwrap());
}

#[test]
fn test_reader_reads_in_small_pieces() {
    let s = "a: [1, 2]\nb: \"é\"\n";
    let trickled: Result<Vec<_>, _> = Parser::new_from_reader(Trickle(s.as_bytes())).collect();
    let whole: Result<Vec<_>, _> = Parser::new_from_str(s).collect();
    assert_eq!(trickled.unwrap(), whole.unwrap());
}

#[test]
fn test_reader_failure() {
    let mut parser = Parser::new_from_reader(Failing(b"a: b\nc: "));
    let error = loop {
        match parser.next_event() {
            Ok(Some(_)) => {}
            Ok(None) => panic!("reader failure went unnoticed"),
            Err(e) => break e,
        }
    };
    let Error::Io(io) = &error else {
        panic!("expected an I/O error, got {error:?}")
    };
    assert_eq!(io.kind(), io::ErrorKind::ConnectionReset);
    assert!(error.marker().is_none());
    assert_eq!(parser.next_event(), Err(error));
}

#[test]
fn test_invalid_utf8() {
    let bytes: &[u8] = b"a: \xff\xfe";
    let error = Parser::new_from_reader(bytes)
        .find_map(Result::err)
        .expect("invalid UTF-8 was accepted");
    let Error::Scan(scan) = error else {
        panic!("expected a scan error, got {error:?}")
    };
    assert_eq!(scan.kind(), ScanErrorKind::InvalidEncoding);
}
