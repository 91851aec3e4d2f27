//! Unit tests for the terminal editor.

use rstest::{fixture, rstest};

use super::*;

const REMOVE_KEYWORDS: &[&str] = &["remove:", "removeall"];

#[fixture]
fn editor() -> TerminalEditor {
    TerminalEditor::default()
}

fn type_text(editor: &mut TerminalEditor, text: &str) {
    editor.handle(KeyAction::Insert(String::from(text)));
}

#[test]
fn ambiguous_completion_lists_candidates_and_keeps_line() {
    let mut editor = TerminalEditor::with_keywords(REMOVE_KEYWORDS);
    type_text(&mut editor, "r");

    let effects = editor.handle(KeyAction::Tab);

    assert_eq!(
        effects,
        vec![EditorEffect::ShowCandidates {
            candidates: vec!["remove:", "removeall"],
            line: String::from("r"),
        }]
    );
    assert_eq!(editor.line(), "r");
}

#[rstest]
#[case("rem", vec!["remove:", "removeall"])]
#[case("x", Vec::new())]
fn unresolved_completion_leaves_line(
    mut editor: TerminalEditor,
    #[case] typed: &str,
    #[case] expected: Vec<&'static str>,
) {
    type_text(&mut editor, typed);

    let effects = editor.handle(KeyAction::Tab);

    assert_eq!(
        effects,
        vec![EditorEffect::ShowCandidates {
            candidates: expected,
            line: String::from(typed),
        }]
    );
}

#[rstest]
fn unique_completion_replaces_line(mut editor: TerminalEditor) {
    type_text(&mut editor, "se");

    let effects = editor.handle(KeyAction::Tab);

    assert_eq!(effects, vec![EditorEffect::Redraw(String::from("search:"))]);
    assert_eq!(editor.line(), "search:");
}

#[rstest]
fn enter_submits_and_records_history(mut editor: TerminalEditor) {
    type_text(&mut editor, "list");

    let effects = editor.handle(KeyAction::Enter);

    assert_eq!(effects, vec![EditorEffect::Submit(String::from("list"))]);
    assert_eq!(editor.line(), "");
    assert_eq!(editor.history().entries(), [String::from("list")]);
}

#[rstest]
fn empty_enter_is_submitted_but_not_recorded(mut editor: TerminalEditor) {
    let effects = editor.handle(KeyAction::Enter);

    assert_eq!(effects, vec![EditorEffect::Submit(String::new())]);
    assert!(editor.history().entries().is_empty());
}

#[rstest]
fn backspace_drops_the_last_character(mut editor: TerminalEditor) {
    type_text(&mut editor, "lisx");

    let effects = editor.handle(KeyAction::Backspace);

    assert_eq!(effects, vec![EditorEffect::Redraw(String::from("lis"))]);
}

#[rstest]
fn history_rotation_restores_the_draft(mut editor: TerminalEditor) {
    for line in ["add:a", "list"] {
        type_text(&mut editor, line);
        editor.handle(KeyAction::Enter);
    }
    type_text(&mut editor, "sea");

    editor.handle(KeyAction::HistoryPrevious);
    assert_eq!(editor.line(), "list");
    editor.handle(KeyAction::HistoryPrevious);
    assert_eq!(editor.line(), "add:a");
    editor.handle(KeyAction::HistoryNext);
    assert_eq!(editor.line(), "list");
    let effects = editor.handle(KeyAction::HistoryNext);
    assert_eq!(effects, vec![EditorEffect::Redraw(String::from("sea"))]);
}

#[rstest]
#[case(KeyAction::Interrupt, EditorEffect::Interrupt)]
#[case(KeyAction::EndOfInput, EditorEffect::Exit)]
#[case(KeyAction::ClearScreen, EditorEffect::ClearScreen(String::new()))]
fn control_keys_map_to_effects(
    mut editor: TerminalEditor,
    #[case] action: KeyAction,
    #[case] expected: EditorEffect,
) {
    assert_eq!(editor.handle(action), vec![expected]);
}
