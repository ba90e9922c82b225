mod error;
mod http;
mod inspect;
mod request;

use std::future::Future;

use anyhow::Result;
use clap::ValueEnum;
use serde_json::{Map, Value};

pub use error::ApiError;
pub use http::{HttpTransport, DEFAULT_API_URL};
pub use inspect::InspectTransport;
pub use request::ApiRequest;

/// The category of entity a command operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Channel,
    Block,
    User,
}

impl ResourceKind {
    /// Plural name, used both as the API collection segment and as the key
    /// that list/search envelopes nest their items under.
    pub fn collection(self) -> &'static str {
        match self {
            Self::Channel => "channels",
            Self::Block => "blocks",
            Self::User => "users",
        }
    }

    pub fn singular(self) -> &'static str {
        match self {
            Self::Channel => "channel",
            Self::Block => "block",
            Self::User => "user",
        }
    }
}

/// Channel visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Status {
    Public,
    Closed,
    Private,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Closed => "closed",
            Self::Private => "private",
        }
    }
}

/// Paging and filtering parameters forwarded on reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Query {
    pub page: Option<u32>,
    pub per: Option<u32>,
    pub status: Option<Status>,
}

impl Query {
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(per) = self.per {
            pairs.push(("per".to_string(), per.to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status".to_string(), status.as_str().to_string()));
        }
        pairs
    }
}

/// Carries out a described request. Resolves to `None` when the API
/// answered successfully without a body.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, request: ApiRequest) -> impl Future<Output = Result<Option<Value>>> + Send;
}

/// The remote resource capability set: get, create, delete, update, search.
pub struct ArenaClient<T> {
    transport: T,
}

impl<T: Transport> ArenaClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub async fn get(&self, kind: ResourceKind, id: &str, query: &Query) -> Result<Value> {
        let response = self.transport.send(ApiRequest::get(kind, id, query)).await?;
        Ok(response.unwrap_or(Value::Null))
    }

    pub async fn create_channel(&self, title: &str, status: Option<Status>) -> Result<Value> {
        let response = self
            .transport
            .send(ApiRequest::create_channel(title, status))
            .await?;
        Ok(response.unwrap_or(Value::Null))
    }

    pub async fn create_block(&self, channel: &str, content: &str) -> Result<Value> {
        let response = self
            .transport
            .send(ApiRequest::create_block(channel, content))
            .await?;
        Ok(response.unwrap_or(Value::Null))
    }

    pub async fn delete(&self, kind: ResourceKind, id: &str) -> Result<Value> {
        let response = self.transport.send(ApiRequest::delete(kind, id)).await?;
        Ok(response.unwrap_or(Value::Null))
    }

    /// Replace the editable fields of a resource. Channels answer with the
    /// updated object, blocks with nothing.
    pub async fn update(
        &self,
        kind: ResourceKind,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<Option<Value>> {
        self.transport
            .send(ApiRequest::update(kind, id, fields))
            .await
    }

    /// Search one category and return the bare result list.
    pub async fn search(&self, kind: ResourceKind, term: &str, query: &Query) -> Result<Value> {
        let response = self
            .transport
            .send(ApiRequest::search(kind, term, query))
            .await?;
        Ok(match response {
            Some(Value::Object(mut envelope)) => match envelope.remove(kind.collection()) {
                Some(list) => list,
                None => Value::Object(envelope),
            },
            Some(other) => other,
            None => Value::Array(Vec::new()),
        })
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::testing::RecordingTransport;
    use super::*;

    #[tokio::test]
    async fn search_unwraps_category_envelope() {
        let transport = RecordingTransport::with_responses(vec![Ok(Some(json!({
            "term": "art",
            "channels": [{ "slug": "a" }, { "slug": "b" }]
        })))]);
        let client = ArenaClient::new(transport);
        let result = client
            .search(ResourceKind::Channel, "art", &Query::default())
            .await
            .unwrap();
        assert_eq!(result, json!([{ "slug": "a" }, { "slug": "b" }]));
    }

    #[tokio::test]
    async fn update_passes_through_empty_response() {
        let transport = RecordingTransport::with_responses(vec![Ok(None)]);
        let client = ArenaClient::new(transport);
        let mut fields = Map::new();
        fields.insert("title".into(), json!("New"));
        let result = client
            .update(ResourceKind::Block, "42", &fields)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn query_pairs_keep_declaration_order() {
        let query = Query {
            page: Some(1),
            per: Some(10),
            status: Some(Status::Public),
        };
        let names: Vec<_> = query.pairs().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["page", "per", "status"]);
    }
}
