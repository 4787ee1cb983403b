#[macro_use]
extern crate quickcheck;

use quickcheck::TestResult;

use yamlstream_parser::{Event, Parser};

quickcheck! {
    fn test_errors_end_the_stream(input: String) -> bool {
        let results: Vec<_> = Parser::new_from_str(&input).collect();
        let errors = results.iter().filter(|r| r.is_err()).count();
        errors == 0 || (errors == 1 && results.last().is_some_and(Result::is_err))
    }

    fn test_errors_are_sticky(input: String) -> TestResult {
        let mut parser = Parser::new_from_str(&input);
        loop {
            match parser.next_event() {
                Ok(Some(_)) => {}
                Ok(None) => return TestResult::discard(),
                Err(e) => return TestResult::from_bool(parser.next_event() == Err(e)),
            }
        }
    }

    fn test_collections_are_balanced(input: String) -> TestResult {
        let mut open = 0_i64;
        for event in Parser::new_from_str(&input) {
            match event {
                Ok((ev, _)) if ev.is_collection_start() => open += 1,
                Ok((Event::SequenceEnd | Event::MappingEnd, _)) => open -= 1,
                Ok(_) => {}
                Err(_) => return TestResult::discard(),
            }
            if open < 0 {
                return TestResult::failed();
            }
        }
        TestResult::from_bool(open == 0)
    }
}
