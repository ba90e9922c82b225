//! Turns parsed command-line state into the list of per-item inputs that
//! dispatch will issue one remote call for.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::client::{ResourceKind, Status};
use crate::format::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Get,
    Create,
    Delete,
    Search,
    Edit,
}

/// The `type` positional: a resource kind plus whether it was given in
/// plural form (`channels`, `blocks`, `users`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceType {
    pub kind: ResourceKind,
    pub plural: bool,
}

impl ResourceType {
    pub fn singular(kind: ResourceKind) -> Self {
        Self {
            kind,
            plural: false,
        }
    }

    pub fn plural(kind: ResourceKind) -> Self {
        Self { kind, plural: true }
    }

    /// The name as typed on the command line.
    pub fn name(self) -> &'static str {
        if self.plural {
            self.kind.collection()
        } else {
            self.kind.singular()
        }
    }
}

/// Everything the user asked for, as parsed. Never modified after parsing.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: CommandKind,
    pub resource: ResourceType,
    /// Slugs/ids, titles/urls or query words depending on the command.
    pub values: Vec<String>,
    pub multiple: bool,
    pub select: Vec<Field>,
    pub link: bool,
    pub status: Option<Status>,
    pub file: Option<PathBuf>,
}

/// The normalized request: one remote call per entry in `inputs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub command: CommandKind,
    pub resource: ResourceType,
    pub inputs: Vec<String>,
    /// Destination channel when posting blocks.
    pub channel: Option<String>,
    pub multiple: bool,
    pub selection: Vec<Field>,
}

impl Invocation {
    pub fn is_multiple(&self) -> bool {
        self.resource.plural || self.multiple
    }

    /// Fields printed when `--select` was not given.
    pub fn default_selection(&self) -> Vec<Field> {
        if self.link {
            return vec![Field::Link];
        }
        match self.command {
            CommandKind::Get | CommandKind::Search => {
                vec![Field::Title, Field::Author, Field::Slug]
            }
            CommandKind::Create | CommandKind::Edit => vec![Field::Slug],
            CommandKind::Delete => Vec::new(),
        }
    }
}

/// Read the `--file` argument in full. `-` reads standard input.
pub fn read_file(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read arguments from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read arguments from {}", path.display()))
}

/// Split file text into extra inputs: one per line when `multiple`,
/// otherwise the whole trimmed text as a single item.
pub fn file_inputs(text: &str, multiple: bool) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        Vec::new()
    } else if multiple {
        text.lines().map(str::to_string).collect()
    } else {
        vec![text.to_string()]
    }
}

pub fn normalize(invocation: &Invocation, file_text: Option<&str>) -> Plan {
    let multiple = invocation.is_multiple();
    let kind = invocation.resource.kind;

    let mut inputs = invocation.values.clone();
    if let Some(text) = file_text {
        inputs.extend(file_inputs(text, multiple));
    }

    let mut channel = None;
    if invocation.command == CommandKind::Create && kind == ResourceKind::Block && !inputs.is_empty()
    {
        channel = Some(inputs.remove(0));
    }

    if !multiple && !inputs.is_empty() {
        inputs = vec![inputs.join(" ")];
    }

    if invocation.command == CommandKind::Get
        && invocation.resource == ResourceType::plural(ResourceKind::Channel)
        && inputs.is_empty()
    {
        inputs.push(String::new());
    }

    if channel.is_some() && inputs.is_empty() {
        if let Some(status) = invocation.status {
            inputs.push(status.as_str().to_string());
        }
    }

    let selection = if invocation.select.is_empty() {
        invocation.default_selection()
    } else {
        invocation.select.clone()
    };

    Plan {
        command: invocation.command,
        resource: invocation.resource,
        inputs,
        channel,
        multiple,
        selection,
    }
}
