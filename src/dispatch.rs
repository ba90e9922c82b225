//! Turns a normalized plan into remote calls: one operation per input,
//! spawned together and settled in input order.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tokio::task::JoinHandle;

use crate::client::{ArenaClient, Query, ResourceKind, Status, Transport};
use crate::edit::{self, Editor};
use crate::normalize::{CommandKind, Plan};

/// Settled outcome of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// Fetched, created or found resources, in input order.
    Results(Vec<Value>),
    /// Number of deletions carried out.
    Deleted(usize),
    /// One status line per edited item.
    Edited(Vec<String>),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchOptions {
    pub query: Query,
    pub status: Option<Status>,
    pub yaml: bool,
    /// Requests are only being printed; skip interactive steps.
    pub inspect: bool,
}

pub async fn execute<T: Transport>(
    client: Arc<ArenaClient<T>>,
    plan: &Plan,
    options: &DispatchOptions,
    editor: &dyn Editor,
) -> Result<Report> {
    let kind = plan.resource.kind;
    let query = options.query;
    tracing::debug!(command = ?plan.command, operations = plan.inputs.len(), "dispatching");

    match plan.command {
        CommandKind::Get => {
            let results = fan_out(&client, &plan.inputs, move |client, id| async move {
                client.get(kind, &id, &query).await
            })
            .await?;
            Ok(Report::Results(results))
        }
        CommandKind::Create => {
            let results = match (kind, plan.channel.clone()) {
                (ResourceKind::Block, Some(channel)) => {
                    fan_out(&client, &plan.inputs, move |client, content| {
                        let channel = channel.clone();
                        async move { client.create_block(&channel, &content).await }
                    })
                    .await?
                }
                _ => {
                    let status = options.status;
                    fan_out(&client, &plan.inputs, move |client, title| async move {
                        client.create_channel(&title, status).await
                    })
                    .await?
                }
            };
            Ok(Report::Results(results))
        }
        CommandKind::Delete => {
            let results = fan_out(&client, &plan.inputs, move |client, id| async move {
                client.delete(kind, &id).await
            })
            .await?;
            Ok(Report::Deleted(results.len()))
        }
        CommandKind::Search => {
            let key = plan.resource.name();
            let results = fan_out(&client, &plan.inputs, move |client, term| async move {
                let found = client.search(kind, &term, &query).await?;
                let mut wrapped = Map::new();
                wrapped.insert(key.to_string(), found);
                Ok::<_, anyhow::Error>(Value::Object(wrapped))
            })
            .await?;
            Ok(Report::Results(results))
        }
        CommandKind::Edit => {
            let mut messages = Vec::with_capacity(plan.inputs.len());
            for slug in &plan.inputs {
                if options.inspect {
                    client.get(kind, slug, &Query::default()).await?;
                    continue;
                }
                messages.push(edit::edit_one(&client, kind, slug, options.yaml, editor).await?);
            }
            Ok(Report::Edited(messages))
        }
    }
}

/// Spawn one task per input right away, then await them in order. The
/// first failure is returned; tasks already running are left to finish.
async fn fan_out<T, F, Fut>(
    client: &Arc<ArenaClient<T>>,
    inputs: &[String],
    operation: F,
) -> Result<Vec<Value>>
where
    T: Transport,
    F: Fn(Arc<ArenaClient<T>>, String) -> Fut,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    let handles: Vec<JoinHandle<Result<Value>>> = inputs
        .iter()
        .map(|input| tokio::spawn(operation(Arc::clone(client), input.clone())))
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.context("Operation task failed")??);
    }
    Ok(results)
}
