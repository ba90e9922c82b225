use std::fmt;

use reqwest::Method;
use serde_json::{json, Map, Value};

use super::{Query, ResourceKind, Status};

/// A fully described API call, independent of how it is carried out.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    fn new(method: Method, path: String) -> Self {
        Self {
            method,
            path,
            query: Vec::new(),
            body: None,
        }
    }

    fn with_query(mut self, query: &Query) -> Self {
        self.query.extend(query.pairs());
        self
    }

    fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Fetch one resource. An empty channel identifier lists channels.
    pub fn get(kind: ResourceKind, id: &str, query: &Query) -> Self {
        Self::new(Method::GET, resource_path(kind, id)).with_query(query)
    }

    pub fn create_channel(title: &str, status: Option<Status>) -> Self {
        let mut body = Map::new();
        body.insert("title".into(), Value::String(title.to_string()));
        if let Some(status) = status {
            body.insert("status".into(), Value::String(status.as_str().into()));
        }
        Self::new(Method::POST, "channels".into()).with_body(Value::Object(body))
    }

    /// Post a block into a channel. URLs are sent as a `source`, anything
    /// else as text `content`.
    pub fn create_block(channel: &str, content: &str) -> Self {
        let body = if is_web_url(content) {
            json!({ "source": content })
        } else {
            json!({ "content": content })
        };
        Self::new(Method::POST, format!("channels/{}/blocks", segment(channel))).with_body(body)
    }

    pub fn delete(kind: ResourceKind, id: &str) -> Self {
        Self::new(Method::DELETE, resource_path(kind, id))
    }

    pub fn update(kind: ResourceKind, id: &str, fields: &Map<String, Value>) -> Self {
        Self::new(Method::PUT, resource_path(kind, id)).with_body(Value::Object(fields.clone()))
    }

    pub fn search(kind: ResourceKind, term: &str, query: &Query) -> Self {
        let mut request = Self::new(Method::GET, format!("search/{}", kind.collection()));
        if !term.is_empty() {
            request.query.push(("q".into(), term.to_string()));
        }
        request.with_query(query)
    }
}

impl fmt::Display for ApiRequest {
    /// `GET channels/foo?page=2 {"title":"x"}`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method.as_str().to_uppercase(), self.path)?;
        if !self.query.is_empty() {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.query.iter())
                .finish();
            write!(f, "?{encoded}")?;
        }
        if let Some(body) = &self.body {
            write!(f, " {body}")?;
        }
        Ok(())
    }
}

fn resource_path(kind: ResourceKind, id: &str) -> String {
    if id.is_empty() {
        kind.collection().to_string()
    } else {
        format!("{}/{}", kind.collection(), segment(id))
    }
}

fn segment(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

fn is_web_url(content: &str) -> bool {
    url::Url::parse(content.trim())
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}
