//! Terminal output for the interactive client.
//!
//! The terminal is in raw mode while the client runs, so every line ends with
//! an explicit carriage return. All writes are queued and flushed once per
//! operation.

use std::io::{self, IsTerminal, Stdout, Write};

use crossterm::cursor::{MoveTo, MoveToColumn};
use crossterm::queue;
use crossterm::style::{Print, Stylize};
use crossterm::terminal::{Clear, ClearType};

use dygrep_config::Endpoint;
use dygrep_protocol::{Command, RegexListing, Response, ResponseMessage};

const LINE_END: &str = "\r\n";
const RESPONSE_HEADER: &str = "dygrep server response:";

/// Prompt-aware writer over the client's standard output.
#[derive(Debug)]
pub(crate) struct Screen<W: Write> {
    out: W,
    prompt: String,
    colour: bool,
}

impl Screen<Stdout> {
    pub(crate) fn stdout(endpoint: &Endpoint) -> Self {
        let out = io::stdout();
        let colour = out.is_terminal();
        Self::new(out, endpoint, colour)
    }
}

impl<W: Write> Screen<W> {
    pub(crate) fn new(out: W, endpoint: &Endpoint, colour: bool) -> Self {
        Self {
            out,
            prompt: format!("({}:{}) dygrep > ", endpoint.host, endpoint.port),
            colour,
        }
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.out
    }

    /// Rewrites the current terminal line as the prompt followed by `line`.
    pub(crate) fn redraw(&mut self, line: &str) -> io::Result<()> {
        self.clear_line()?;
        queue!(self.out, Print(&self.prompt), Print(line))?;
        self.out.flush()
    }

    pub(crate) fn echo(&mut self, text: &str) -> io::Result<()> {
        queue!(self.out, Print(text))?;
        self.out.flush()
    }

    /// Ends the submitted line.
    pub(crate) fn submitted(&mut self) -> io::Result<()> {
        queue!(self.out, Print(LINE_END))?;
        self.out.flush()
    }

    /// Prints a notice above the prompt without losing the typed line.
    pub(crate) fn notice(&mut self, text: &str, line: &str) -> io::Result<()> {
        self.clear_line()?;
        self.write_line(text)?;
        self.redraw(line)
    }

    /// Prints a notice on a fresh line and leaves the prompt off.
    pub(crate) fn farewell(&mut self, text: &str) -> io::Result<()> {
        queue!(self.out, Print(LINE_END))?;
        self.write_line(text)?;
        self.out.flush()
    }

    pub(crate) fn candidates(&mut self, candidates: &[&str], line: &str) -> io::Result<()> {
        queue!(self.out, Print(LINE_END))?;
        self.write_line(&candidates.join("  "))?;
        self.redraw(line)
    }

    pub(crate) fn clear(&mut self, line: &str) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        self.redraw(line)
    }

    pub(crate) fn help(&mut self, keywords: &[&str]) -> io::Result<()> {
        if self.colour {
            queue!(self.out, Print("Available commands:".bold()))?;
            queue!(self.out, Print(LINE_END))?;
        } else {
            self.write_line("Available commands:")?;
        }
        for keyword in keywords {
            self.write_line(&format!("  {keyword}"))?;
        }
        self.redraw("")
    }

    pub(crate) fn unrecognized(&mut self, line: &str) -> io::Result<()> {
        self.write_line(&format!("Command not recognized: {line}"))?;
        self.write_line("Try using \"help\" to view available commands.")?;
        self.redraw("")
    }

    pub(crate) fn sending(&mut self, command: &Command) -> io::Result<()> {
        self.write_line(&format!("sending message to server: {command}"))?;
        self.out.flush()
    }

    /// Prints one server message; the prompt returns after the final one.
    pub(crate) fn response(&mut self, response: &Response, line: &str) -> io::Result<()> {
        self.clear_line()?;
        if self.colour {
            queue!(self.out, Print(RESPONSE_HEADER.green().underlined()))?;
            queue!(self.out, Print(LINE_END))?;
        } else {
            self.write_line(RESPONSE_HEADER)?;
        }
        match &response.message {
            ResponseMessage::Text(text) => self.write_line(text)?,
            ResponseMessage::Lines { lines } => {
                for matched in lines {
                    self.write_line(matched)?;
                }
            }
            ResponseMessage::Regexes { regexes } => self.write_listing(regexes)?,
        }
        if response.is_final() {
            self.redraw(line)
        } else {
            self.out.flush()
        }
    }

    fn write_listing(&mut self, regexes: &[RegexListing]) -> io::Result<()> {
        if regexes.is_empty() {
            return self.write_line("no regexes are active");
        }
        for listing in regexes {
            self.write_line(&format!("  /{}/ (from \"{}\")", listing.regex, listing.source))?;
        }
        Ok(())
    }

    fn write_line(&mut self, text: &str) -> io::Result<()> {
        for part in text.split('\n') {
            queue!(self.out, Print(part), Print(LINE_END))?;
        }
        Ok(())
    }

    fn clear_line(&mut self) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::CurrentLine), MoveToColumn(0))
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn screen() -> Screen<Vec<u8>> {
        Screen::new(Vec::new(), &Endpoint::new("127.0.0.1", 4900), false)
    }

    /// Drops terminal control sequences so assertions see only the text.
    fn visible(screen: Screen<Vec<u8>>) -> String {
        let raw = String::from_utf8_lossy(&screen.into_inner()).into_owned();
        let mut text = String::new();
        let mut chars = raw.chars();
        while let Some(character) = chars.next() {
            if character == '\u{1b}' {
                for next in chars.by_ref() {
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
                continue;
            }
            text.push(character);
        }
        text.replace('\r', "")
    }

    #[rstest]
    fn prompt_names_the_endpoint(mut screen: Screen<Vec<u8>>) {
        screen.redraw("lis").expect("redraw");
        assert_eq!(visible(screen), "(127.0.0.1:4900) dygrep > lis");
    }

    #[rstest]
    fn listing_reply_redraws_prompt(mut screen: Screen<Vec<u8>>) {
        let reply = Response::regexes(vec![RegexListing {
            regex: String::from("err.*"),
            source: String::from("err.*"),
        }]);

        screen.response(&reply, "").expect("response");

        insta::assert_snapshot!(visible(screen).trim_end(), @r#"
        dygrep server response:
          /err.*/ (from "err.*")
        (127.0.0.1:4900) dygrep >
        "#);
    }

    #[rstest]
    fn partial_pages_keep_the_prompt_away(mut screen: Screen<Vec<u8>>) {
        let page = Response::lines(vec![String::from("disk ok")], false);

        screen.response(&page, "").expect("response");

        assert_eq!(visible(screen), "dygrep server response:\ndisk ok\n");
    }

    #[rstest]
    fn unrecognized_lines_suggest_help(mut screen: Screen<Vec<u8>>) {
        screen.unrecognized("bogus").expect("unrecognized");

        let text = visible(screen);
        assert!(text.starts_with("Command not recognized: bogus\n"));
        assert!(text.contains("\"help\""));
    }

    #[rstest]
    fn transmitted_commands_are_announced(mut screen: Screen<Vec<u8>>) {
        screen
            .sending(&Command::Add(String::from("err.*")))
            .expect("sending");
        assert_eq!(visible(screen), "sending message to server: add:err.*\n");
    }
}
