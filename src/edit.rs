use std::env;
use std::io::Write;
use std::process::Command;

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::client::{ArenaClient, ResourceKind, Transport};

/// Fields a user may change, in the order they are presented.
pub fn editable_fields(kind: ResourceKind) -> &'static [&'static str] {
    match kind {
        ResourceKind::Block => &["content", "title", "description"],
        ResourceKind::Channel => &["title", "status"],
        ResourceKind::User => &["title"],
    }
}

/// Copy the named fields that are present on `item`.
pub fn pick(item: &Value, fields: &[&str]) -> Map<String, Value> {
    fields
        .iter()
        .filter_map(|field| {
            item.get(*field)
                .map(|value| (field.to_string(), value.clone()))
        })
        .collect()
}

/// Something that lets the user rewrite a buffer.
pub trait Editor {
    fn edit(&self, initial: &str, suffix: &str) -> Result<String>;
}

/// A buffer on disk for one editor run. The file is removed when the
/// session is dropped, whether or not the editor succeeded.
pub struct EditSession {
    file: NamedTempFile,
}

impl EditSession {
    pub fn new(initial: &str, suffix: &str) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("arena-edit-")
            .suffix(suffix)
            .tempfile()
            .context("Failed to create temporary file for editing")?;
        file.write_all(initial.as_bytes())
            .context("Failed to write temporary file")?;
        file.flush().context("Failed to write temporary file")?;
        Ok(Self { file })
    }

    /// Run `command` on the buffer and return what the user saved.
    pub fn run(&self, command: &str) -> Result<String> {
        let mut parts = command.split_whitespace();
        let program = parts.next().context("Editor command is empty")?;
        let path = self.file.path();

        let status = Command::new(program)
            .args(parts)
            .arg(path)
            .status()
            .with_context(|| format!("Failed to launch editor '{command}'"))?;

        if !status.success() {
            bail!("Editor '{command}' exited with non-zero status");
        }

        std::fs::read_to_string(path).context("Failed to read edited file")
    }
}

/// Opens `$VISUAL`, then `$EDITOR`, falling back to `vi`.
pub struct ExternalEditor;

impl ExternalEditor {
    pub fn command() -> String {
        ["VISUAL", "EDITOR"]
            .iter()
            .filter_map(|var| env::var(var).ok())
            .find(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "vi".to_string())
    }
}

impl Editor for ExternalEditor {
    fn edit(&self, initial: &str, suffix: &str) -> Result<String> {
        let session = EditSession::new(initial, suffix)?;
        session.run(&Self::command())
    }
}

/// Present the editable subset of `item` for modification. Returns the full
/// merged field set to send when anything changed, `None` otherwise.
pub fn review(
    item: &Value,
    kind: ResourceKind,
    yaml: bool,
    editor: &dyn Editor,
) -> Result<Option<Map<String, Value>>> {
    let fields = editable_fields(kind);

    let (before, after) = if yaml {
        let before = pick(item, fields);
        let buffer = serde_yaml::to_string(&before).context("Failed to serialize fields")?;
        let edited = editor.edit(&buffer, ".yml")?;
        let after = match serde_yaml::from_str::<Value>(&edited)
            .context("Failed to parse edited YAML")?
        {
            Value::Object(map) => map,
            _ => bail!("Edited YAML must be a mapping of field names to values"),
        };
        (before, after)
    } else {
        let field = fields[0];
        let current = item.get(field).cloned().unwrap_or(Value::Null);
        let initial = current.as_str().unwrap_or_default().to_string();
        let edited = editor.edit(&initial, ".txt")?;
        let edited = edited.trim_end_matches(['\r', '\n']).to_string();

        // A null field is shown as an empty buffer; leaving it empty is no edit.
        let edited = if edited == initial {
            current.clone()
        } else {
            Value::String(edited)
        };

        let mut before = Map::new();
        before.insert(field.to_string(), current);
        let mut after = Map::new();
        after.insert(field.to_string(), edited);
        (before, after)
    };

    if after == before {
        return Ok(None);
    }

    let mut merged = pick(item, fields);
    merged.extend(after);
    Ok(Some(merged))
}

/// Fetch, edit and (if changed) update one resource. Returns the line to
/// report for it.
pub async fn edit_one<T: Transport>(
    client: &ArenaClient<T>,
    kind: ResourceKind,
    slug: &str,
    yaml: bool,
    editor: &dyn Editor,
) -> Result<String> {
    let item = client
        .get(kind, slug, &Default::default())
        .await
        .with_context(|| format!("Failed to fetch {} {slug}", kind.singular()))?;

    let Some(fields) = review(&item, kind, yaml, editor)
        .with_context(|| format!("Failed to edit {} {slug}", kind.singular()))?
    else {
        tracing::info!(slug, "edit left the resource unchanged");
        return Ok(format!("{slug}: No change, not updated."));
    };

    let target = item
        .get("id")
        .and_then(id_string)
        .unwrap_or_else(|| slug.to_string());
    tracing::debug!(id = %target, ?fields, "updating resource");

    let result = client.update(kind, &target, &fields).await?;
    let reported = result
        .as_ref()
        .and_then(|value| value.get("id"))
        .and_then(id_string)
        .unwrap_or_else(|| slug.to_string());

    Ok(format!("{reported}: OK."))
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
