//! HTTP-shaped request and response types.
//!
//! The same `Request`/`Response` pair is the wire contract at both layers:
//! external clients talking to the gateway, and the gateway delegating
//! sub-requests to a table instance. Keeping the two layers structurally
//! identical lets them share test fixtures.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::Value;

/// Request method. Only the verbs the surface uses are modeled; anything
/// else never matches a route and falls through to 404.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    /// Parses a method name case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("get") {
            Some(Method::Get)
        } else if s.eq_ignore_ascii_case("post") {
            Some(Method::Post)
        } else {
            None
        }
    }

    /// Canonical uppercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// An HTTP-shaped request: method, path, and optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl Request {
    /// Builds a GET request for `path`.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    /// Builds a POST request for `path` carrying `body`.
    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
        }
    }

    /// Returns the `index`-th path segment, where the leading `/` produces
    /// an empty segment 0 (so `/table/{id}` puts the id at segment 2).
    #[must_use]
    pub fn path_segment(&self, index: usize) -> Option<&str> {
        self.path.split('/').nth(index)
    }

    /// Decodes the JSON body into `T`.
    ///
    /// # Errors
    ///
    /// Fails when the body is absent or does not match `T`'s shape.
    pub fn json_body<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        let body = self
            .body
            .clone()
            .ok_or_else(|| anyhow::anyhow!("request body required for {}", self.path))?;
        Ok(serde_json::from_value(body.into_json())?)
    }
}

/// Response payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// No payload (route miss).
    Empty,
    /// JSON payload.
    Json(Value),
    /// Static HTML payload (landing page).
    Html(&'static str),
}

/// An HTTP-shaped response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: ResponseBody,
}

impl Response {
    /// 200 response with a JSON body serialized from `data`.
    ///
    /// # Errors
    ///
    /// Fails when `data` cannot be represented as JSON.
    pub fn json<T: Serialize>(data: &T) -> anyhow::Result<Self> {
        Ok(Self::json_value(Value::from_json(serde_json::to_value(
            data,
        )?)))
    }

    /// 200 response wrapping an already-built JSON value.
    #[must_use]
    pub fn json_value(value: Value) -> Self {
        Self {
            status: 200,
            body: ResponseBody::Json(value),
        }
    }

    /// 200 response with static HTML content.
    #[must_use]
    pub fn html(content: &'static str) -> Self {
        Self {
            status: 200,
            body: ResponseBody::Html(content),
        }
    }

    /// 404 with an empty body. A route miss is a normal outcome, not a fault.
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            status: 404,
            body: ResponseBody::Empty,
        }
    }

    /// Renders a handler fault as the surface's failure signal: HTTP 200
    /// carrying `{message, stack}`. `message` is the outermost error,
    /// `stack` the full source chain, one cause per line.
    ///
    /// Clients must inspect the body shape, not the status code, to detect
    /// failure.
    #[must_use]
    pub fn fault(err: &anyhow::Error) -> Self {
        let stack = err
            .chain()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        let mut body = std::collections::BTreeMap::new();
        body.insert("message".to_string(), Value::String(err.to_string()));
        body.insert("stack".to_string(), Value::String(stack));
        Self::json_value(Value::Object(body))
    }

    /// Consumes the response, yielding its JSON body (null when empty/HTML).
    #[must_use]
    pub fn into_json_body(self) -> Value {
        match self.body {
            ResponseBody::Json(v) => v,
            ResponseBody::Empty | ResponseBody::Html(_) => Value::Null,
        }
    }

    /// True when the body carries the `{message, stack}` failure shape.
    #[must_use]
    pub fn is_fault(&self) -> bool {
        match &self.body {
            ResponseBody::Json(v) => v.get("message").is_some() && v.get("stack").is_some(),
            _ => false,
        }
    }
}
