//! Parses submitted lines into local actions or server commands.

use dygrep_protocol::Command;

/// Words offered by tab completion, in display order.
pub(crate) const KEYWORDS: &[&str] = &[
    "add:",
    "clear",
    "help",
    "list",
    "regex:",
    "remove:",
    "removeall",
    "search:",
];

/// Outcome of parsing one submitted line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ClientCommand {
    /// Nothing was typed.
    Empty,
    /// Clear the local screen.
    ClearScreen,
    /// Show the keyword list.
    Help,
    /// Transmit a command to the server.
    Remote(Command),
    /// The line matched no keyword or prefix.
    Unrecognized(String),
}

pub(crate) fn parse(line: &str) -> ClientCommand {
    let line = line.trim().to_lowercase();
    match line.as_str() {
        "" => ClientCommand::Empty,
        "clear" => ClientCommand::ClearScreen,
        "help" => ClientCommand::Help,
        "list" => ClientCommand::Remote(Command::List),
        "removeall" => ClientCommand::Remote(Command::RemoveAll),
        other => {
            parse_prefixed(other).unwrap_or_else(|| ClientCommand::Unrecognized(line.clone()))
        }
    }
}

fn parse_prefixed(line: &str) -> Option<ClientCommand> {
    let prefixed: [(&str, fn(String) -> Command); 4] = [
        ("add:", Command::Add),
        ("remove:", Command::Remove),
        ("search:", Command::Search),
        ("regex:", Command::Regex),
    ];
    prefixed.iter().find_map(|(prefix, build)| {
        line.strip_prefix(prefix)
            .map(|argument| ClientCommand::Remote(build(argument.to_owned())))
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("", ClientCommand::Empty)]
    #[case("   ", ClientCommand::Empty)]
    #[case("help", ClientCommand::Help)]
    #[case("CLEAR", ClientCommand::ClearScreen)]
    #[case(" list ", ClientCommand::Remote(Command::List))]
    #[case("removeall", ClientCommand::Remote(Command::RemoveAll))]
    #[case("add:Err.*", ClientCommand::Remote(Command::Add(String::from("err.*"))))]
    #[case("remove:warn", ClientCommand::Remote(Command::Remove(String::from("warn"))))]
    #[case("search:disk", ClientCommand::Remote(Command::Search(String::from("disk"))))]
    #[case("regex:^a+$", ClientCommand::Remote(Command::Regex(String::from("^a+$"))))]
    #[case("add:", ClientCommand::Remote(Command::Add(String::new())))]
    #[case("lis", ClientCommand::Unrecognized(String::from("lis")))]
    #[case("Bogus Stuff", ClientCommand::Unrecognized(String::from("bogus stuff")))]
    fn lines_parse_into_commands(#[case] line: &str, #[case] expected: ClientCommand) {
        assert_eq!(parse(line), expected);
    }

    #[test]
    fn keywords_are_sorted_for_display() {
        let mut sorted = KEYWORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, KEYWORDS);
    }
}
