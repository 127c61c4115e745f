// Paginated enumeration over GitHub listing endpoints.
// Supports GraphQL cursor paging and REST Link-header paging behind one interface.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::{Result, StatsError};

use super::transport::Transport;
use super::types::Connection;

/// Describes a paged listing and how to walk it.
#[derive(Debug, Clone)]
pub enum Endpoint {
    /// GraphQL query taking a `$cursor` variable. `connection` is a JSON pointer to the
    /// `{ nodes, pageInfo }` object inside the response.
    Cursor {
        url: String,
        query: String,
        variables: Value,
        connection: String,
    },
    /// REST listing whose further pages are announced in the `Link` header.
    Link { url: String },
}

/// Continuation state of an enumeration in progress.
#[derive(Debug, Clone)]
enum PageCursor {
    Cursor(Option<String>),
    Url(String),
}

/// Lazily walks the pages of an [`Endpoint`], one request per page.
pub struct Paginator<'a, X, T> {
    transport: &'a X,
    endpoint: Endpoint,
    next: Option<PageCursor>,
    pages_fetched: usize,
    page_limit: Option<usize>,
    _item: PhantomData<fn() -> T>,
}

impl<'a, X: Transport, T: DeserializeOwned> Paginator<'a, X, T> {
    pub fn new(transport: &'a X, endpoint: Endpoint) -> Self {
        let next = match &endpoint {
            Endpoint::Cursor { .. } => PageCursor::Cursor(None),
            Endpoint::Link { url } => PageCursor::Url(url.clone()),
        };
        Self {
            transport,
            endpoint,
            next: Some(next),
            pages_fetched: 0,
            page_limit: None,
            _item: PhantomData,
        }
    }

    /// Stop after `limit` pages. `None` follows every page.
    pub fn with_page_limit(mut self, limit: Option<usize>) -> Self {
        self.page_limit = limit;
        self
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// True when the page limit cut the enumeration short.
    pub fn truncated(&self) -> bool {
        self.next.is_some() && self.limit_reached()
    }

    fn limit_reached(&self) -> bool {
        self.page_limit
            .is_some_and(|limit| self.pages_fetched >= limit)
    }

    /// Fetch the next page. Returns `Ok(None)` once the remote reports no further page.
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>> {
        if self.next.is_none() {
            return Ok(None);
        }
        if self.limit_reached() {
            debug!(
                pages = self.pages_fetched,
                "page limit reached, remaining pages not fetched"
            );
            return Ok(None);
        }
        let Some(cursor) = self.next.take() else {
            return Ok(None);
        };

        let (items, next) = match (&self.endpoint, cursor) {
            (
                Endpoint::Cursor {
                    url,
                    query,
                    variables,
                    connection,
                },
                PageCursor::Cursor(after),
            ) => {
                let mut variables = variables.clone();
                if let Some(map) = variables.as_object_mut() {
                    map.insert("cursor".to_string(), json!(after));
                }
                let body = json!({ "query": query, "variables": variables });
                let response = self.transport.post_json(url, &body).await?;
                let value: Value = response.error_for_status()?.json()?;
                let page: Connection<T> = extract_connection(value, connection)?;

                let next = match (page.page_info.has_next_page, page.page_info.end_cursor) {
                    (true, Some(end)) => Some(PageCursor::Cursor(Some(end))),
                    (true, None) => {
                        warn!("hasNextPage set without endCursor, stopping enumeration");
                        None
                    }
                    (false, _) => None,
                };
                (page.nodes, next)
            }
            (Endpoint::Link { .. }, PageCursor::Url(url)) => {
                let response = self.transport.get(&url).await?.error_for_status()?;
                let items: Vec<T> = response.json()?;
                (items, response.next_link.map(PageCursor::Url))
            }
            _ => return Err(StatsError::Other("cursor does not match endpoint".to_string())),
        };

        self.pages_fetched += 1;
        self.next = next;
        debug!(
            page = self.pages_fetched,
            items = items.len(),
            more = self.next.is_some(),
            "fetched page"
        );
        Ok(Some(items))
    }

    /// Drain every remaining page into one flat collection, in page order.
    pub async fn collect_all(mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page);
        }
        Ok(items)
    }
}

/// Fail with `Query` if a GraphQL body carries an `errors` array.
pub(crate) fn check_query_errors(value: &Value) -> Result<()> {
    match value.get("errors").and_then(Value::as_array) {
        Some(errors) if !errors.is_empty() => {
            let messages: Vec<&str> = errors
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .collect();
            Err(StatsError::Query(messages.join("; ")))
        }
        _ => Ok(()),
    }
}

fn extract_connection<T: DeserializeOwned>(mut value: Value, pointer: &str) -> Result<Connection<T>> {
    check_query_errors(&value)?;
    match value.pointer_mut(pointer).map(Value::take) {
        Some(Value::Null) | None => Err(StatsError::Query(format!(
            "response has no connection at {pointer}"
        ))),
        Some(connection) => Ok(serde_json::from_value(connection)?),
    }
}
