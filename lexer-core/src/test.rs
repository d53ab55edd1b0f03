////////////////////////////////////////////////////////////////////////////////
// Markup lexer core library
////////////////////////////////////////////////////////////////////////////////
// Copyright 2022 Skylor R. Schermer
// This code is dual licenced using the MIT or Apache 2 license.
// See licence-mit.md and licence-apache.md for details.
////////////////////////////////////////////////////////////////////////////////
//! Lexer tests.
////////////////////////////////////////////////////////////////////////////////

// Internal library imports.
use crate::EventKind;
use crate::Host;
use crate::Lexer;
use crate::LexerConfig;

// External library imports.
use lexer_span::Pos;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::convert::Infallible;


////////////////////////////////////////////////////////////////////////////////
// Recorder
////////////////////////////////////////////////////////////////////////////////
/// A token event, stripped of its byte offset, for comparison against an
/// expected event sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Rec {
    Ranged(EventKind, Vec<u8>),
    Simple(EventKind),
}

fn ranged(kind: EventKind, text: &str) -> Rec {
    Rec::Ranged(kind, text.as_bytes().to_vec())
}

fn simple(kind: EventKind) -> Rec {
    Rec::Simple(kind)
}

/// A minimal [`Host`] that records every event it receives and tracks just
/// enough of the element name stack to answer `html_script_p`/
/// `html_style_p`.
#[derive(Debug, Default)]
struct Recorder {
    html: bool,
    current: Option<Vec<u8>>,
    events: Vec<Rec>,
    lines: i32,
}

impl Recorder {
    fn xml() -> Self {
        Recorder { html: false, ..Recorder::default() }
    }

    fn html() -> Self {
        Recorder { html: true, ..Recorder::default() }
    }
}

impl Host for Recorder {
    type Encoding = ();
    type Error = Infallible;

    fn emit(
        &mut self,
        kind: EventKind,
        text: &[u8],
        _start: Pos,
        _encoding: (),
    ) -> Result<(), Infallible> {
        if matches!(kind, EventKind::ElementName | EventKind::ElementEnd) {
            self.current = Some(text.to_vec());
        }
        self.events.push(Rec::Ranged(kind, text.to_vec()));
        Ok(())
    }

    fn emit_simple(&mut self, kind: EventKind) -> Result<(), Infallible> {
        self.events.push(Rec::Simple(kind));
        Ok(())
    }

    fn advance_line(&mut self, n: i32) {
        self.lines += n;
    }

    fn html_p(&mut self) -> bool {
        self.html
    }

    fn html_script_p(&mut self) -> bool {
        self.html && self.current.as_deref() == Some(b"script".as_slice())
    }

    fn html_style_p(&mut self) -> bool {
        self.html && self.current.as_deref() == Some(b"style".as_slice())
    }
}

/// Runs the whole of `input` through a fresh lexer in one `advance` call,
/// then signals end of input so any trailing mark-recovered or raw-text
/// run still sitting in `pending` is flushed.
fn lex(input: &[u8], host: &mut Recorder) {
    let mut lexer = Lexer::new(LexerConfig::STRICT);
    lexer.advance(input, (), host).expect("advance should not fail on well-formed input");
    lexer.finish((), host).expect("finish should not fail");
}


////////////////////////////////////////////////////////////////////////////////
// Concrete scenarios.
////////////////////////////////////////////////////////////////////////////////
#[test_log::test]
fn simple_element() {
    let mut host = Recorder::xml();
    lex(b"<p>hi</p>", &mut host);

    assert_eq!(host.events, vec![
        ranged(EventKind::ElementName, "p"),
        simple(EventKind::ElementOpenEnd),
        ranged(EventKind::Text, "hi"),
        ranged(EventKind::ElementEnd, "p"),
    ]);
}

#[test_log::test]
fn namespaced_attribute_self_closing() {
    let mut host = Recorder::xml();
    lex(br#"<a x:y="1"/>"#, &mut host);

    assert_eq!(host.events, vec![
        ranged(EventKind::ElementName, "a"),
        ranged(EventKind::AttributeNs, "x"),
        ranged(EventKind::Attribute, "y"),
        simple(EventKind::StringDquote),
        ranged(EventKind::StringBody, "1"),
        simple(EventKind::StringDquote),
        simple(EventKind::ElementEnd),
        simple(EventKind::ElementOpenEnd),
    ]);
}

#[test_log::test]
fn comment_with_internal_dashes() {
    let mut host = Recorder::xml();
    lex(b"<!-- a--b -->", &mut host);

    assert_eq!(host.events, vec![
        simple(EventKind::CommentStart),
        ranged(EventKind::CommentBody, " a--b "),
        simple(EventKind::CommentEnd),
    ]);
}

#[test_log::test]
fn xml_declaration() {
    let mut host = Recorder::xml();
    lex(br#"<?xml version="1.0"?>"#, &mut host);

    assert_eq!(host.events, vec![
        simple(EventKind::XmlDeclStart),
        ranged(EventKind::Attribute, "version"),
        simple(EventKind::StringDquote),
        ranged(EventKind::StringBody, "1.0"),
        simple(EventKind::StringDquote),
        simple(EventKind::XmlDeclEnd),
    ]);
}

#[test_log::test]
fn processing_instruction_without_internal_whitespace() {
    let mut host = Recorder::xml();
    lex(b"<?xmlfoo?>", &mut host);

    assert_eq!(host.events, vec![
        simple(EventKind::ProcInsStart),
        ranged(EventKind::ProcInsName, "xmlfoo"),
        simple(EventKind::ProcInsEnd),
    ]);
}

#[test_log::test]
fn processing_instruction_target_longer_than_disambiguation_window() {
    let mut host = Recorder::xml();
    lex(br#"<?xml-stylesheet href="a"?>"#, &mut host);

    assert_eq!(host.events, vec![
        simple(EventKind::ProcInsStart),
        ranged(EventKind::ProcInsName, "xml-stylesheet"),
        ranged(EventKind::ProcInsBody, " href=\"a\""),
        simple(EventKind::ProcInsEnd),
    ]);
}

#[test_log::test]
fn processing_instruction_target_name_split_across_advance_calls() {
    let input: &[u8] = br#"<?xml-stylesheet href="a"?>"#;
    let mut whole_host = Recorder::xml();
    lex(input, &mut whole_host);

    for split in 0..=input.len() {
        let (first, second) = input.split_at(split);
        let mut lexer = Lexer::new(LexerConfig::STRICT);
        let mut host = Recorder::xml();
        lexer.advance(first, (), &mut host).unwrap();
        lexer.advance(second, (), &mut host).unwrap();
        lexer.finish((), &mut host).unwrap();

        assert_eq!(
            host.events, whole_host.events,
            "split at {split} produced a different event stream",
        );
    }
}

#[test_log::test]
fn xml_decl_without_trailing_space_is_still_a_declaration() {
    let mut host = Recorder::xml();
    lex(b"<?xml?>", &mut host);

    assert_eq!(host.events, vec![
        simple(EventKind::XmlDeclStart),
        simple(EventKind::XmlDeclEnd),
    ]);
}

#[test_log::test]
fn html_raw_text_script() {
    let mut host = Recorder::html();
    lex(b"<script>a<b</script>", &mut host);

    assert_eq!(host.events, vec![
        ranged(EventKind::ElementName, "script"),
        simple(EventKind::ElementOpenEnd),
        ranged(EventKind::Text, "a<b"),
        ranged(EventKind::ElementEnd, "script"),
    ]);
}

#[test_log::test]
fn html_raw_text_closer_split_right_after_a_stray_angle() {
    let input: &[u8] = b"<script>1<2</script>";
    let mut whole_host = Recorder::html();
    lex(input, &mut whole_host);

    assert_eq!(whole_host.events, vec![
        ranged(EventKind::ElementName, "script"),
        simple(EventKind::ElementOpenEnd),
        ranged(EventKind::Text, "1<2"),
        ranged(EventKind::ElementEnd, "script"),
    ]);

    // A stray `<` landing right at the end of one `advance` call used
    // to make the real closer starting a byte later in the next call
    // invisible.
    let split = input.iter().position(|&b| b == b'1').unwrap() + 2;
    let (first, second) = input.split_at(split);
    let mut lexer = Lexer::new(LexerConfig::STRICT);
    let mut host = Recorder::html();
    lexer.advance(first, (), &mut host).unwrap();
    lexer.advance(second, (), &mut host).unwrap();
    lexer.finish((), &mut host).unwrap();

    assert_eq!(host.events, whole_host.events);
}

#[test_log::test]
fn stray_angle_in_text_is_not_split() {
    let mut host = Recorder::xml();
    lex(b"hello < world", &mut host);

    assert_eq!(host.events, vec![
        ranged(EventKind::Text, "hello < world"),
    ]);
}

#[test_log::test]
fn cdata_with_embedded_bracket_pair() {
    let mut host = Recorder::xml();
    lex(b"<![CDATA[a]]b]]>", &mut host);

    assert_eq!(host.events, vec![
        simple(EventKind::CdataStart),
        ranged(EventKind::CdataBody, "a]]b"),
        simple(EventKind::CdataEnd),
    ]);
}

#[test_log::test]
fn closing_tag_with_namespace() {
    let mut host = Recorder::xml();
    lex(b"<a:b></a:b>", &mut host);

    assert_eq!(host.events, vec![
        ranged(EventKind::ElementNs, "a"),
        ranged(EventKind::ElementName, "b"),
        simple(EventKind::ElementOpenEnd),
        ranged(EventKind::ElementNs, "a"),
        ranged(EventKind::ElementEnd, "b"),
    ]);
}

#[test_log::test]
fn doctype_with_public_identifier() {
    let mut host = Recorder::xml();
    lex(br#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0//EN" "xhtml1.dtd">"#, &mut host);

    assert_eq!(host.events, vec![
        simple(EventKind::DoctypeStart),
        ranged(EventKind::DoctypeName, "html"),
        ranged(EventKind::DoctypeType, "PUBLIC"),
        simple(EventKind::StringDquote),
        ranged(EventKind::StringBody, "-//W3C//DTD XHTML 1.0//EN"),
        simple(EventKind::StringDquote),
        simple(EventKind::StringDquote),
        ranged(EventKind::StringBody, "xhtml1.dtd"),
        simple(EventKind::StringDquote),
        simple(EventKind::DoctypeEnd),
    ]);
}

#[test_log::test]
fn html_unquoted_attribute_value() {
    let mut host = Recorder::html();
    lex(b"<input value=abc>", &mut host);

    assert_eq!(host.events, vec![
        ranged(EventKind::ElementName, "input"),
        ranged(EventKind::Attribute, "value"),
        ranged(EventKind::StringBody, "abc"),
        simple(EventKind::ElementOpenEnd),
    ]);
}


////////////////////////////////////////////////////////////////////////////////
// Boundary cases.
////////////////////////////////////////////////////////////////////////////////
#[test_log::test]
fn empty_input_emits_nothing() {
    let mut host = Recorder::xml();
    lex(b"", &mut host);
    assert_eq!(host.events, Vec::new());
}

#[test_log::test]
fn text_then_angle_then_finish_emits_one_text_event() {
    let mut lexer = Lexer::new(LexerConfig::STRICT);
    let mut host = Recorder::xml();
    lexer.advance(b"hello<", (), &mut host).unwrap();
    lexer.finish((), &mut host).unwrap();

    assert_eq!(host.events, vec![ranged(EventKind::Text, "hello<")]);
}

#[test_log::test]
fn mark_resolved_as_tag_opener_excludes_the_angle_from_preceding_text() {
    // The '<' lands exactly at a buffer boundary, so it is carried
    // speculatively by the mark rule; the next call's first byte ('p',
    // a name-start) confirms it opens a tag, and the previously-carried
    // text must not include that '<'.
    let mut lexer = Lexer::new(LexerConfig::STRICT);
    let mut host = Recorder::xml();
    lexer.advance(b"hello<", (), &mut host).unwrap();
    lexer.advance(b"p>hi</p>", (), &mut host).unwrap();

    assert_eq!(host.events, vec![
        ranged(EventKind::Text, "hello"),
        ranged(EventKind::ElementName, "p"),
        simple(EventKind::ElementOpenEnd),
        ranged(EventKind::Text, "hi"),
        ranged(EventKind::ElementEnd, "p"),
    ]);
}

#[test_log::test]
fn unterminated_comment_emits_nothing_on_finish() {
    let mut lexer = Lexer::new(LexerConfig::STRICT);
    let mut host = Recorder::xml();
    lexer.advance(b"<!-- unterminated", (), &mut host).unwrap();
    lexer.finish((), &mut host).unwrap();

    assert_eq!(host.events, vec![simple(EventKind::CommentStart)]);
}


////////////////////////////////////////////////////////////////////////////////
// Resumability (split feeding).
////////////////////////////////////////////////////////////////////////////////
#[test_log::test]
fn resumability_matches_whole_input_at_every_split_point() {
    let input: &[u8] = br#"<a x:y="1"><!-- c --><b/></a>text<script>1<2</script>"#;

    let mut whole_host = Recorder::html();
    lex(input, &mut whole_host);

    for split in 0..=input.len() {
        let (first, second) = input.split_at(split);
        let mut lexer = Lexer::new(LexerConfig::STRICT);
        let mut host = Recorder::html();
        lexer.advance(first, (), &mut host).unwrap();
        lexer.advance(second, (), &mut host).unwrap();

        assert_eq!(
            host.events, whole_host.events,
            "split at {split} produced a different event stream",
        );
    }
}

#[test_log::test]
fn resumability_preserves_line_count_sum() {
    let input: &[u8] = b"line one\nline two\nline three\n<p>\nhi\n</p>\n";
    let newline_count = input.iter().filter(|&&b| b == b'\n').count() as i32;

    for split in [0, 5, input.len() / 2, input.len() - 1, input.len()] {
        let (first, second) = input.split_at(split);
        let mut lexer = Lexer::new(LexerConfig::STRICT);
        let mut host = Recorder::xml();
        lexer.advance(first, (), &mut host).unwrap();
        lexer.advance(second, (), &mut host).unwrap();
        assert_eq!(
            host.lines, newline_count,
            "split at {split} lost or double-counted a newline",
        );
    }
}

#[test_log::test]
fn line_count_flushes_within_a_single_advance_call() {
    let mut lexer = Lexer::new(LexerConfig::STRICT);
    let mut host = Recorder::xml();
    lexer.advance(b"a\nb\nc", (), &mut host).unwrap();
    assert_eq!(host.lines, 2);
}


////////////////////////////////////////////////////////////////////////////////
// Property tests: range coverage under randomized input.
////////////////////////////////////////////////////////////////////////////////
proptest! {
    /// Plain text containing no markup bytes is never split: the single
    /// `on_text` event's range must reproduce the input byte-for-byte.
    #[test]
    fn plain_text_round_trips(s in "[a-zA-Z0-9 .,]{0,64}") {
        let mut host = Recorder::xml();
        lex(s.as_bytes(), &mut host);
        if s.is_empty() {
            prop_assert!(host.events.is_empty());
        } else {
            prop_assert_eq!(&host.events, &vec![ranged(EventKind::Text, &s)]);
        }
    }

    /// A balanced `<tag>text</tag>` fragment, for any element-name-safe
    /// `tag` and any markup-free `text`, reproduces both substrings
    /// byte-for-byte across its `ElementName`/`Text`/`ElementEnd` events,
    /// regardless of how the input is split across two `advance` calls.
    #[test]
    fn balanced_element_round_trips_under_any_split(
        tag in "[a-z][a-z0-9]{0,7}",
        text in "[a-zA-Z0-9 ]{0,32}",
        split_frac in 0.0f64..1.0,
    ) {
        let input = format!("<{tag}>{text}</{tag}>");
        let bytes = input.as_bytes();
        let split = ((bytes.len() as f64) * split_frac) as usize;
        let (first, second) = bytes.split_at(split);

        let mut host = Recorder::xml();
        let mut lexer = Lexer::new(LexerConfig::STRICT);
        lexer.advance(first, (), &mut host).unwrap();
        lexer.advance(second, (), &mut host).unwrap();

        let mut expected = vec![
            ranged(EventKind::ElementName, &tag),
            simple(EventKind::ElementOpenEnd),
        ];
        if !text.is_empty() {
            expected.push(ranged(EventKind::Text, &text));
        }
        expected.push(ranged(EventKind::ElementEnd, &tag));
        prop_assert_eq!(&host.events, &expected);
    }
}


////////////////////////////////////////////////////////////////////////////////
// Invariants.
////////////////////////////////////////////////////////////////////////////////
#[test_log::test]
fn reset_is_idempotent() {
    let mut lexer = Lexer::new(LexerConfig::STRICT);
    let mut host = Recorder::xml();
    lexer.advance(b"<a", (), &mut host).unwrap();
    lexer.reset();
    lexer.reset();
    assert_eq!(lexer.machine(), crate::Machine::Main);
    assert_eq!(lexer.position(), Pos::ZERO);
}

#[test_log::test]
fn balanced_stack_after_complete_scan() {
    let mut lexer = Lexer::new(LexerConfig::STRICT);
    let mut host = Recorder::xml();
    lexer.advance(br#"<a x="1" y='2'><b/></a>"#, (), &mut host).unwrap();
    assert_eq!(lexer.machine(), crate::Machine::Text);
}

#[test_log::test]
fn malformed_bang_is_fatal_by_default() {
    let mut lexer = Lexer::new(LexerConfig::STRICT);
    let mut host = Recorder::xml();
    let err = lexer.advance(b"<!nonsense>", (), &mut host).unwrap_err();
    assert!(matches!(err, crate::LexerError::DfaStuck { .. }));
    assert_eq!(lexer.machine(), crate::Machine::Error);
}

#[test_log::test]
fn malformed_bang_recovers_as_text_when_configured() {
    let mut lexer = Lexer::new(LexerConfig::LENIENT);
    let mut host = Recorder::xml();
    lexer.advance(b"<!nonsense>ok", (), &mut host).unwrap();
    lexer.finish((), &mut host).unwrap();

    assert_eq!(host.events, vec![
        ranged(EventKind::Text, "<!nonsense"),
        ranged(EventKind::Text, ">ok"),
    ]);
}

#[test_log::test]
fn raw_text_closer_is_case_sensitive_by_default() {
    let mut host = Recorder::html();
    // `</SCRIPT>` does not match the lowercase-only closer, so it is
    // swallowed as ordinary raw text and the element never closes.
    lex(b"<script>a</SCRIPT>", &mut host);

    assert_eq!(host.events, vec![
        ranged(EventKind::ElementName, "script"),
        simple(EventKind::ElementOpenEnd),
        ranged(EventKind::Text, "a</SCRIPT>"),
    ]);
}

#[test_log::test]
fn raw_text_closer_case_insensitive_when_configured() {
    let mut lexer = Lexer::new(LexerConfig::LENIENT);
    let mut host = Recorder::html();
    lexer.advance(b"<script>a</SCRIPT>", (), &mut host).unwrap();

    assert_eq!(host.events, vec![
        ranged(EventKind::ElementName, "script"),
        simple(EventKind::ElementOpenEnd),
        ranged(EventKind::Text, "a"),
        ranged(EventKind::ElementEnd, "script"),
    ]);
}
