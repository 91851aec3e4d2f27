//! Unit tests for the streaming decoder.

use rstest::rstest;

use super::*;
use crate::{Command, CommandPolicy, CommandRequest, Response, encode};

fn sample_requests() -> Vec<CommandRequest> {
    vec![
        CommandRequest::from(&Command::Add(String::from("err.*"))),
        CommandRequest::from(&Command::List),
        CommandRequest::from(&Command::Search(String::from("disk {full}"))),
        CommandRequest::from(&Command::Regex(String::from(r#"quote "\" inside"#))),
        CommandRequest::from(&Command::Remove(String::from("err.*"))),
        CommandRequest::from(&Command::RemoveAll),
    ]
}

fn concatenated(requests: &[CommandRequest]) -> Vec<u8> {
    requests
        .iter()
        .flat_map(|request| encode(request).expect("encode request"))
        .collect()
}

fn decode_all(
    decoder: &mut MessageDecoder<CommandRequest>,
    bytes: &[u8],
    chunk: usize,
) -> Vec<CommandRequest> {
    bytes
        .chunks(chunk)
        .flat_map(|piece| decoder.feed(piece))
        .map(|outcome| outcome.expect("valid message"))
        .collect()
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
#[case(7)]
#[case(64)]
#[case(4096)]
fn decodes_values_across_any_chunking(#[case] chunk: usize) {
    let requests = sample_requests();
    let bytes = concatenated(&requests);
    let mut decoder = MessageDecoder::<CommandRequest>::new();

    let decoded = decode_all(&mut decoder, &bytes, chunk);

    assert_eq!(decoded, requests);
    assert_eq!(decoder.pending(), 0);
    assert!(decoder.finish().is_none());
}

#[test]
fn decodes_back_to_back_values_without_separators() {
    let mut decoder = MessageDecoder::<CommandRequest>::new();
    let outcomes = decoder.feed(br#"{"command":{"list":true}}{"command":{"add":"a"}}"#);
    let commands: Vec<Command> = outcomes
        .into_iter()
        .map(|outcome| {
            outcome
                .expect("valid")
                .into_command(CommandPolicy::Legacy)
                .expect("resolved")
        })
        .collect();
    assert_eq!(commands, vec![Command::List, Command::Add(String::from("a"))]);
}

#[test]
fn tolerates_whitespace_between_values() {
    let mut decoder = MessageDecoder::<Response>::new();
    let outcomes = decoder.feed(
        b"  \n{\"message\":\"a\",\"lastMessage\":false}\r\n\t {\"message\":\"b\",\"lastMessage\":true}\n\n",
    );
    assert_eq!(outcomes.len(), 2);
    assert_eq!(decoder.pending(), 0);
}

#[test]
fn holds_incomplete_value_until_remainder_arrives() {
    let mut decoder = MessageDecoder::<CommandRequest>::new();
    assert!(decoder.feed(br#"{"command":{"add":"#).is_empty());
    assert!(decoder.pending() > 0);

    let outcomes = decoder.feed(br#""x"}}"#);
    assert_eq!(outcomes.len(), 1);
}

#[test]
fn malformed_fragment_does_not_block_following_values() {
    let mut decoder = MessageDecoder::<CommandRequest>::new();
    let outcomes = decoder.feed(br#"{"command" oops}{"command":{"list":true}}"#);

    assert_eq!(outcomes.len(), 2);
    assert!(matches!(outcomes.first(), Some(Err(DecodeError::Malformed { .. }))));
    assert!(matches!(outcomes.get(1), Some(Ok(_))));
}

#[test]
fn garbage_without_value_start_is_discarded() {
    let mut decoder = MessageDecoder::<CommandRequest>::new();
    let outcomes = decoder.feed(b"not json at all");
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(
        outcomes.first(),
        Some(Err(DecodeError::Malformed { skipped: 15, .. }))
    ));
    assert_eq!(decoder.pending(), 0);
}

#[test]
fn schema_mismatch_is_reported_without_resync() {
    let mut decoder = MessageDecoder::<CommandRequest>::new();
    let outcomes = decoder.feed(br#"{"command":{"list":"yes"}}{"command":{"list":true}}"#);
    assert!(matches!(outcomes.first(), Some(Err(DecodeError::Schema { .. }))));
    assert!(matches!(outcomes.get(1), Some(Ok(_))));
}

#[test]
fn oversized_pending_value_is_dropped() {
    let mut decoder = MessageDecoder::<CommandRequest>::with_limit(16);
    let outcomes = decoder.feed(br#"{"command":{"add":"a very long pattern"#);
    assert!(matches!(
        outcomes.last(),
        Some(Err(DecodeError::Oversized { limit: 16 }))
    ));
    assert_eq!(decoder.pending(), 0);
}

#[test]
fn finish_reports_truncated_value() {
    let mut decoder = MessageDecoder::<CommandRequest>::new();
    assert!(decoder.feed(br#"{"command":"#).is_empty());
    assert!(matches!(
        decoder.finish(),
        Some(DecodeError::Truncated { pending: 11 })
    ));
}

fn commands(outcomes: Vec<Result<CommandRequest, DecodeError>>) -> Vec<Option<Command>> {
    outcomes
        .into_iter()
        .map(|outcome| {
            outcome
                .ok()
                .map(|request| request.into_command(CommandPolicy::Legacy).expect("resolved"))
        })
        .collect()
}

#[rstest]
#[case(1)]
#[case(5)]
#[case(4096)]
fn objects_nested_in_a_malformed_value_are_not_decoded(#[case] chunk: usize) {
    let bytes = br#"{"note": oops, "inner": {"command":{"removeall":true}}}"#;
    let mut decoder = MessageDecoder::<CommandRequest>::new();

    let outcomes: Vec<_> = bytes
        .chunks(chunk)
        .flat_map(|piece| decoder.feed(piece))
        .collect();

    assert_eq!(commands(outcomes), vec![None]);
    assert_eq!(decoder.pending(), 0);
    assert!(decoder.finish().is_none());
}

#[test]
fn malformed_value_yields_one_error_before_the_next_message() {
    let mut decoder = MessageDecoder::<CommandRequest>::new();

    let outcomes = decoder.feed(br#"{"command":{"add":"x"} junk }{"command":{"list":true}}"#);

    assert!(matches!(
        outcomes.first(),
        Some(Err(DecodeError::Malformed { skipped: 29, .. }))
    ));
    assert_eq!(commands(outcomes), vec![None, Some(Command::List)]);
}

#[test]
fn braces_inside_strings_of_a_malformed_value_are_ignored() {
    let mut decoder = MessageDecoder::<CommandRequest>::new();

    let outcomes =
        decoder.feed(br#"{"a": x, "b": "}{\"}"}{"command":{"add":"a"}}"#);

    assert_eq!(
        commands(outcomes),
        vec![None, Some(Command::Add(String::from("a")))]
    );
}

#[test]
fn tail_of_an_oversized_value_is_not_decoded() {
    let mut decoder = MessageDecoder::<CommandRequest>::with_limit(16);
    let first = decoder.feed(br#"{"padding":"0123456789abcdef","#);
    assert!(matches!(
        first.as_slice(),
        [Err(DecodeError::Oversized { limit: 16 })]
    ));

    let rest = decoder.feed(br#""inner":{"command":{"list":true}}}{"command":{"add":"b"}}"#);

    assert_eq!(commands(rest), vec![Some(Command::Add(String::from("b")))]);
}

#[test]
fn trickled_value_is_held_until_a_closing_bracket_arrives() {
    let bytes = br#"{"command":{"search":"a b c d e f"}}"#;
    let (body, close) = bytes.split_at(bytes.len() - 2);
    let mut decoder = MessageDecoder::<CommandRequest>::new();

    for byte in body {
        assert!(decoder.feed(std::slice::from_ref(byte)).is_empty());
    }
    assert_eq!(decoder.pending(), body.len());
    assert!(decoder.feed(close.get(..1).expect("first brace")).is_empty());
    let outcomes = decoder.feed(close.get(1..).expect("second brace"));

    assert_eq!(
        commands(outcomes),
        vec![Some(Command::Search(String::from("a b c d e f")))]
    );
}

#[test]
fn malformed_value_trickled_bytewise_is_reported_once() {
    let bytes = br#"{"command": nope {"command":{"list":true}}}{"command":{"list":true}}"#;
    let mut decoder = MessageDecoder::<CommandRequest>::new();

    let outcomes: Vec<_> = bytes.chunks(1).flat_map(|piece| decoder.feed(piece)).collect();

    assert_eq!(commands(outcomes), vec![None, Some(Command::List)]);
}
