//! Output rendering: JSON passthrough or field-selected text lines.

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use serde_json::Value;

use crate::client::{ApiError, ResourceKind};
use crate::dispatch::Report;
use crate::normalize::ResourceType;

/// A field the user may select for printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Field {
    Title,
    Author,
    Date,
    Slug,
    Link,
    Id,
}

/// Where a field is read from, and how it is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Title,
    Author,
    Date,
    Slug,
    ChannelLink,
    Id,
    BlockLink,
    UserLink,
    UserAuthor,
}

impl Rule {
    /// Resolve a selected field against the resource kind. Blocks have no
    /// human slug and their own link form; users keep their name at the
    /// top level.
    pub fn resolve(field: Field, kind: ResourceKind) -> Self {
        match (field, kind) {
            (Field::Link, ResourceKind::Block) => Self::BlockLink,
            (Field::Slug, ResourceKind::Block) => Self::Id,
            (Field::Link, ResourceKind::User) => Self::UserLink,
            (Field::Author, ResourceKind::User) => Self::UserAuthor,
            (Field::Title, _) => Self::Title,
            (Field::Author, _) => Self::Author,
            (Field::Date, _) => Self::Date,
            (Field::Slug, _) => Self::Slug,
            (Field::Link, _) => Self::ChannelLink,
            (Field::Id, _) => Self::Id,
        }
    }

    fn path(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Author => "user.username",
            Self::Date => "created_at",
            Self::Slug | Self::ChannelLink | Self::UserLink => "slug",
            Self::Id | Self::BlockLink => "id",
            Self::UserAuthor => "username",
        }
    }

    pub fn extract(self, item: &Value) -> String {
        let raw = lookup(item, self.path()).map(display).unwrap_or_default();
        if raw.is_empty() {
            return raw;
        }
        match self {
            Self::ChannelLink => format!("https://www.are.na/channels/{raw}"),
            Self::BlockLink => format!("https://www.are.na/block/{raw}"),
            Self::UserLink => format!("https://www.are.na/{raw}"),
            _ => raw,
        }
    }
}

/// Follow a dotted path into nested objects. Missing segments yield `None`.
pub fn lookup<'a>(item: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(item, |value, key| value.get(key))
        .filter(|value| !value.is_null())
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct FormatOptions {
    pub resource: ResourceType,
    pub selection: Vec<Field>,
    pub join: String,
    pub json: bool,
    pub pretty: bool,
    pub multiple: bool,
}

impl FormatOptions {
    fn rules(&self) -> Vec<Rule> {
        self.selection
            .iter()
            .map(|field| Rule::resolve(*field, self.resource.kind))
            .collect()
    }

    fn line(&self, rules: &[Rule], item: &Value) -> String {
        rules
            .iter()
            .map(|rule| rule.extract(item))
            .collect::<Vec<_>>()
            .join(&self.join)
    }
}

/// Render fetched results as output lines.
pub fn render_results(options: &FormatOptions, results: &[Value]) -> Result<Vec<String>> {
    if options.json {
        let null = Value::Null;
        let whole = Value::Array(results.to_vec());
        let value = if options.multiple {
            &whole
        } else {
            results.first().unwrap_or(&null)
        };
        let text = if options.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
        .context("Failed to serialize results")?;
        return Ok(vec![text]);
    }

    let rules = options.rules();
    let collection_key = options.resource.plural.then(|| options.resource.name());
    let mut lines = Vec::new();

    for result in results {
        let nested = collection_key
            .and_then(|key| result.get(key))
            .and_then(Value::as_array);
        match nested {
            Some(items) => lines.extend(items.iter().map(|item| options.line(&rules, item))),
            None => lines.push(options.line(&rules, result)),
        }
    }

    Ok(lines)
}

/// Render any command report as output lines.
pub fn render(report: &Report, options: &FormatOptions) -> Result<Vec<String>> {
    match report {
        Report::Results(results) => render_results(options, results),
        Report::Deleted(count) => Ok(vec!["OK.".to_string(); *count]),
        Report::Edited(messages) => Ok(messages.clone()),
    }
}

pub fn print(report: &Report, options: &FormatOptions) -> Result<()> {
    for line in render(report, options)? {
        println!("{line}");
    }
    Ok(())
}

/// Print a fatal error to stderr. Remote errors are shown as the API
/// described them; everything else with its context chain.
pub fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<ApiError>() {
        Some(api) => eprintln!("{api}"),
        None => eprintln!("{} {err:#}", "Error:".red().bold()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn options(resource: ResourceType, selection: Vec<Field>) -> FormatOptions {
        FormatOptions {
            resource,
            selection,
            join: ", ".to_string(),
            json: false,
            pretty: false,
            multiple: resource.plural,
        }
    }

    fn channel_item() -> Value {
        json!({
            "id": 7,
            "slug": "great-clothes-4295553",
            "title": "Great Clothes",
            "created_at": "2019-01-02T03:04:05.000Z",
            "user": { "username": "Ada" }
        })
    }

    #[test]
    fn block_link_uses_id() {
        let rule = Rule::resolve(Field::Link, ResourceKind::Block);
        assert_eq!(rule, Rule::BlockLink);
        assert_eq!(
            rule.extract(&json!({ "id": 42 })),
            "https://www.are.na/block/42"
        );
    }

    #[test]
    fn contextual_remaps() {
        assert_eq!(Rule::resolve(Field::Slug, ResourceKind::Block), Rule::Id);
        assert_eq!(
            Rule::resolve(Field::Link, ResourceKind::User),
            Rule::UserLink
        );
        assert_eq!(
            Rule::resolve(Field::Author, ResourceKind::User),
            Rule::UserAuthor
        );
        assert_eq!(
            Rule::resolve(Field::Link, ResourceKind::Channel),
            Rule::ChannelLink
        );
        assert_eq!(Rule::resolve(Field::Slug, ResourceKind::User), Rule::Slug);
    }

    #[test]
    fn user_rules_read_top_level_fields() {
        let user = json!({ "id": 3, "slug": "ada-l", "username": "Ada L" });
        assert_eq!(Rule::UserAuthor.extract(&user), "Ada L");
        assert_eq!(Rule::UserLink.extract(&user), "https://www.are.na/ada-l");
    }

    #[test]
    fn lookup_is_safe_on_missing_paths() {
        let item = json!({ "user": null, "title": "x" });
        assert!(lookup(&item, "user.username").is_none());
        assert!(lookup(&item, "nothing.here").is_none());
        assert_eq!(Rule::Author.extract(&item), "");
        assert_eq!(Rule::ChannelLink.extract(&item), "");
    }

    #[test]
    fn single_item_prints_one_joined_line() {
        let opts = options(
            ResourceType::singular(ResourceKind::Channel),
            vec![Field::Title, Field::Author, Field::Slug],
        );
        let lines = render_results(&opts, &[channel_item()]).unwrap();
        assert_eq!(lines, vec!["Great Clothes, Ada, great-clothes-4295553"]);
    }

    #[test]
    fn custom_join_and_link() {
        let mut opts = options(
            ResourceType::singular(ResourceKind::Channel),
            vec![Field::Id, Field::Link],
        );
        opts.join = "\t".to_string();
        let lines = render_results(&opts, &[channel_item()]).unwrap();
        assert_eq!(
            lines,
            vec!["7\thttps://www.are.na/channels/great-clothes-4295553"]
        );
    }

    #[test]
    fn wrapped_collections_are_flattened() {
        let opts = options(
            ResourceType::plural(ResourceKind::Channel),
            vec![Field::Slug],
        );
        let results = vec![
            json!({ "channels": [{ "slug": "a" }, { "slug": "b" }] }),
            json!({ "slug": "c" }),
        ];
        let lines = render_results(&opts, &results).unwrap();
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn singular_type_never_flattens() {
        let opts = options(
            ResourceType::singular(ResourceKind::Channel),
            vec![Field::Slug],
        );
        let results = vec![json!({ "slug": "outer", "channel": [{ "slug": "inner" }] })];
        assert_eq!(render_results(&opts, &results).unwrap(), vec!["outer"]);
    }

    #[test]
    fn json_single_prints_first_element_only() {
        let mut opts = options(ResourceType::singular(ResourceKind::Block), vec![]);
        opts.json = true;
        opts.pretty = true;
        let results = vec![json!({ "id": 1 }), json!({ "id": 2 })];
        let lines = render_results(&opts, &results).unwrap();
        assert_eq!(lines, vec!["{\n  \"id\": 1\n}"]);
    }

    #[test]
    fn json_multiple_prints_whole_array_compact() {
        let mut opts = options(ResourceType::plural(ResourceKind::Block), vec![]);
        opts.json = true;
        let results = vec![json!({ "id": 1 }), json!({ "id": 2 })];
        let lines = render_results(&opts, &results).unwrap();
        assert_eq!(lines, vec![r#"[{"id":1},{"id":2}]"#]);
    }

    #[test]
    fn deletes_print_one_ok_per_operation() {
        let opts = options(ResourceType::plural(ResourceKind::Channel), vec![]);
        let lines = render(&Report::Deleted(3), &opts).unwrap();
        assert_eq!(lines, vec!["OK.", "OK.", "OK."]);
        assert!(render(&Report::Deleted(0), &opts).unwrap().is_empty());
    }
}
