//! Query client abstraction for the profiling backend.
//!
//! This module provides a trait-based abstraction over the backend's
//! "query graph profile" call, so the view controller can be driven by a
//! live HTTP endpoint, a local JSON fixture, or a test double.

mod error;
mod file;
mod http;

pub use error::QueryError;
pub use file::FileQuery;
pub use http::{HttpQuery, HttpQueryBuilder, DEFAULT_ENDPOINT};

use std::collections::BTreeMap;
use std::fmt::Debug;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::data::{DiagramType, Diagrams, TimeRange};

/// Filter fields merged into every request (`app_name`, `service_name`, …).
///
/// Owned by whoever configures the view; the controller only ever replaces
/// it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<String, Value>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// A string field, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Short label for the header bar: `app/service`, or whichever is set.
    pub fn label(&self) -> String {
        match (self.get_str("app_name"), self.get_str("service_name")) {
            (Some(app), Some(service)) => format!("{}/{}", app, service),
            (Some(app), None) => app.to_string(),
            (None, Some(service)) => service.to_string(),
            (None, None) => "-".to_string(),
        }
    }
}

impl From<BTreeMap<String, Value>> for QueryParams {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

/// A single request to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub params: QueryParams,
    /// Start of the window, microseconds since the epoch.
    pub start: u64,
    /// End of the window, microseconds since the epoch.
    pub end: u64,
    pub diagram_types: Vec<DiagramType>,
    /// Backend sort directive for table data, e.g. `"-total"`.
    pub sort: Option<String>,
}

impl QueryRequest {
    pub fn new(params: &QueryParams, range: &TimeRange, diagram_types: &[DiagramType]) -> Self {
        let (start, end) = range.to_micros();
        Self {
            params: params.clone(),
            start,
            end,
            diagram_types: diagram_types.to_vec(),
            sort: None,
        }
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn wants(&self, diagram_type: DiagramType) -> bool {
        self.diagram_types.contains(&diagram_type)
    }

    /// The JSON body: parameters first, then the request's own fields on top.
    pub fn to_json(&self) -> Value {
        let mut body: Map<String, Value> = self
            .params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        body.insert("start".to_string(), Value::from(self.start));
        body.insert("end".to_string(), Value::from(self.end));
        body.insert(
            "diagram_types".to_string(),
            Value::from(
                self.diagram_types
                    .iter()
                    .map(|t| t.as_str())
                    .collect::<Vec<_>>(),
            ),
        );
        if let Some(ref sort) = self.sort {
            body.insert("sort".to_string(), Value::from(sort.as_str()));
        }
        Value::Object(body)
    }
}

/// The backend's answer. `diagrams` is absent when there is nothing to show.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub diagrams: Option<Diagrams>,
}

impl QueryResponse {
    /// Parse raw response bytes.
    ///
    /// Flame trees routinely nest deeper than serde_json's default limit of
    /// 128, so the limit is lifted and the stack grown on demand instead.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, QueryError> {
        Self::from_json(parse_unbounded(bytes)?)
    }

    /// Parse a response body.
    ///
    /// Accepts both the bare `{"diagrams": …}` shape and the API envelope
    /// `{"result": true, "data": {"diagrams": …}, "message": ""}`.
    pub fn from_json(value: Value) -> Result<Self, QueryError> {
        let Value::Object(mut obj) = value else {
            return Err(QueryError::Parse("response is not a JSON object".to_string()));
        };

        if obj.get("result").and_then(Value::as_bool) == Some(false) {
            let message = obj
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("request rejected")
                .to_string();
            return Err(QueryError::Api(message));
        }

        match obj.remove("data") {
            Some(Value::Object(data)) => decode(Value::Object(data)),
            Some(Value::Null) | None => decode(Value::Object(obj)),
            Some(_) => Err(QueryError::Parse("unexpected `data` field".to_string())),
        }
    }
}

fn parse_unbounded(bytes: &[u8]) -> Result<Value, QueryError> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    de.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, QueryError> {
    Ok(T::deserialize(serde_stacker::Deserializer::new(value))?)
}

/// Trait for answering profile queries.
///
/// Implementations talk to the real backend ([`HttpQuery`]), replay a local
/// fixture ([`FileQuery`]), or script answers in tests.
#[async_trait]
pub trait ProfileQuery: Send + Sync + Debug {
    /// Run one query.
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, QueryError>;

    /// Returns a human-readable description of the backend.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;
}
