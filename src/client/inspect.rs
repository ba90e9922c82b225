use std::io::Write;

use anyhow::Result;
use serde_json::{Map, Value};

use super::{ApiRequest, Transport};

/// Dry-run transport: prints each request instead of sending it and
/// answers with an empty object.
#[derive(Debug, Default)]
pub struct InspectTransport;

impl Transport for InspectTransport {
    async fn send(&self, request: ApiRequest) -> Result<Option<Value>> {
        writeln!(std::io::stdout(), "{request}")?;
        Ok(Some(Value::Object(Map::new())))
    }
}
