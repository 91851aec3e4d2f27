//! Request envelope and command disambiguation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Request envelope sent from the client to the server.
///
/// The `command` object is a bag of optional fields. Only one is meant to be
/// set; [`CommandRequest::into_command`] resolves the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    /// Command fields; absent when the client sent an empty envelope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<CommandFields>,
}

/// Optional command fields carried by a request.
///
/// String fields count as present only when non-empty and boolean fields only
/// when `true`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandFields {
    /// Pattern to add to the live filter set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add: Option<String>,
    /// Pattern to remove from the live filter set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove: Option<String>,
    /// Requests removal of every filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removeall: Option<bool>,
    /// Legacy alias of `removeall`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clear: Option<bool>,
    /// Requests a listing of the live filters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<bool>,
    /// Searches buffered history with a term.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Matches buffered history against a one-off pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
}

/// A single operation requested by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List the live filter set.
    List,
    /// Drop every live filter.
    RemoveAll,
    /// Search buffered history for lines matching the term.
    Search(String),
    /// Match buffered history against a one-off pattern.
    Regex(String),
    /// Add (or replace) a live filter.
    Add(String),
    /// Remove a live filter.
    Remove(String),
    /// No recognised field was present.
    Unrecognized,
}

impl Command {
    /// Returns the wire name of the command, used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::RemoveAll => "removeall",
            Self::Search(_) => "search",
            Self::Regex(_) => "regex",
            Self::Add(_) => "add",
            Self::Remove(_) => "remove",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Search(argument)
            | Self::Regex(argument)
            | Self::Add(argument)
            | Self::Remove(argument) => write!(formatter, "{}:{argument}", self.name()),
            Self::List | Self::RemoveAll | Self::Unrecognized => formatter.write_str(self.name()),
        }
    }
}

/// How multi-field requests are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommandPolicy {
    /// Pick the first present field in the order
    /// `list > removeall/clear > search > regex > add > remove`.
    #[default]
    Legacy,
    /// Reject requests that set more than one field.
    Strict,
}

/// Reasons a request envelope cannot be turned into a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandRejection {
    /// More than one command field was set under [`CommandPolicy::Strict`].
    #[error("ambiguous command: fields {} are all set", .fields.join(", "))]
    Ambiguous {
        /// Names of the present fields, in priority order.
        fields: Vec<&'static str>,
    },
}

impl CommandRequest {
    /// Resolves the envelope into a single command.
    ///
    /// A missing `command` object, or one with no present field, yields
    /// [`Command::Unrecognized`].
    ///
    /// # Errors
    ///
    /// Returns [`CommandRejection::Ambiguous`] when the policy is
    /// [`CommandPolicy::Strict`] and several fields are present.
    pub fn into_command(self, policy: CommandPolicy) -> Result<Command, CommandRejection> {
        let Some(fields) = self.command else {
            return Ok(Command::Unrecognized);
        };
        let mut present = fields.into_present();
        if policy == CommandPolicy::Strict && present.len() > 1 {
            return Err(CommandRejection::Ambiguous {
                fields: present.iter().map(Command::name).collect(),
            });
        }
        if present.is_empty() {
            return Ok(Command::Unrecognized);
        }
        Ok(present.swap_remove(0))
    }
}

impl CommandFields {
    /// Present commands in priority order.
    fn into_present(self) -> Vec<Command> {
        let mut present = Vec::new();
        if is_set(self.list) {
            present.push(Command::List);
        }
        if is_set(self.removeall) || is_set(self.clear) {
            present.push(Command::RemoveAll);
        }
        if let Some(term) = non_empty(self.search) {
            present.push(Command::Search(term));
        }
        if let Some(pattern) = non_empty(self.regex) {
            present.push(Command::Regex(pattern));
        }
        if let Some(pattern) = non_empty(self.add) {
            present.push(Command::Add(pattern));
        }
        if let Some(pattern) = non_empty(self.remove) {
            present.push(Command::Remove(pattern));
        }
        present
    }
}

fn is_set(flag: Option<bool>) -> bool {
    flag.unwrap_or(false)
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|value| !value.is_empty())
}

impl From<&Command> for CommandRequest {
    fn from(command: &Command) -> Self {
        let mut fields = CommandFields::default();
        match command {
            Command::List => fields.list = Some(true),
            Command::RemoveAll => fields.removeall = Some(true),
            Command::Search(term) => fields.search = Some(term.clone()),
            Command::Regex(pattern) => fields.regex = Some(pattern.clone()),
            Command::Add(pattern) => fields.add = Some(pattern.clone()),
            Command::Remove(pattern) => fields.remove = Some(pattern.clone()),
            Command::Unrecognized => {}
        }
        Self {
            command: Some(fields),
        }
    }
}
