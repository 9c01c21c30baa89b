//! Spec-compliant error objects.
//!
//! An [`ErrorValue`] represents one denied or failed access outcome. It
//! carries its own cacheability: a 403 still contributes invalidation tags
//! and contexts, so the denial itself is invalidated correctly when
//! permissions change.

use serde_json::{Map, Value, json};
use url::Url;

use crate::cache::CacheDescriptor;

/// Base detail for access-denial errors, before any collaborator-supplied
/// reason is appended.
const ACCESS_DENIED_DETAIL: &str =
    "The current user is not allowed to access the requested resource.";

/// One error object in the sense of the specification.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorValue {
    status: u16,
    title: String,
    detail: Option<String>,
    source_pointer: Option<String>,
    via: Option<Url>,
    info: Option<Url>,
    cache: CacheDescriptor,
}

impl ErrorValue {
    /// Create an error for the given HTTP status.
    ///
    /// The title is the status reason phrase; the `info` link points at the
    /// section of the HTTP specification defining the status.
    pub fn new(status: u16, cache: CacheDescriptor) -> Self {
        Self {
            status,
            title: reason_phrase(status).to_string(),
            detail: None,
            source_pointer: None,
            via: None,
            info: info_url(status),
            cache,
        }
    }

    /// Create a 403 access-denial error.
    ///
    /// The optional human-readable `reason` from the access decision is
    /// appended to the base detail. `via` points at the resource that was
    /// withheld, and is what `meta.omitted` entries link to.
    pub fn access_denied(
        pointer: impl Into<String>,
        reason: Option<&str>,
        via: Option<Url>,
        cache: CacheDescriptor,
    ) -> Self {
        let detail = match reason {
            Some(reason) => format!("{ACCESS_DENIED_DETAIL} {reason}"),
            None => ACCESS_DENIED_DETAIL.to_string(),
        };

        let mut error = Self::new(403, cache);
        error.detail = Some(detail);
        error.source_pointer = Some(pointer.into());
        error.via = via;
        error
    }

    /// Set the detail, builder style.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Set the source pointer, builder style.
    pub fn with_source_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.source_pointer = Some(pointer.into());
        self
    }

    /// Set the `via` link, builder style.
    pub fn with_via(mut self, via: Url) -> Self {
        self.via = Some(via);
        self
    }

    /// The HTTP status this error maps to.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// The human-readable detail, if any.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// The link to the resource this error is about, if any.
    pub fn via(&self) -> Option<&Url> {
        self.via.as_ref()
    }

    /// The error's cacheability.
    pub fn cache(&self) -> &CacheDescriptor {
        &self.cache
    }

    /// Project the error into its wire form.
    pub fn rasterize(&self) -> Value {
        let mut rasterized = Map::new();
        rasterized.insert("status".to_string(), json!(self.status));
        rasterized.insert("title".to_string(), json!(self.title));
        if let Some(detail) = &self.detail {
            rasterized.insert("detail".to_string(), json!(detail));
        }
        if let Some(pointer) = &self.source_pointer {
            rasterized.insert("source".to_string(), json!({ "pointer": pointer }));
        }

        let mut links = Map::new();
        if let Some(info) = &self.info {
            links.insert("info".to_string(), json!(info.as_str()));
        }
        if let Some(via) = &self.via {
            links.insert("via".to_string(), json!(via.as_str()));
        }
        if !links.is_empty() {
            rasterized.insert("links".to_string(), Value::Object(links));
        }

        Value::Object(rasterized)
    }
}

/// The HTTP reason phrase for a status code.
fn reason_phrase(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        409 => "Conflict",
        412 => "Precondition Failed",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        503 => "Service Unavailable",
        _ => "Error",
    }
}

/// Link to the section of RFC 2616 defining a status code.
fn info_url(status: u16) -> Option<Url> {
    let section = match status {
        400..=417 => format!("sec10.4.{}", status - 399),
        500..=505 => format!("sec10.5.{}", status - 499),
        _ => return None,
    };
    Url::parse(&format!(
        "http://www.w3.org/Protocols/rfc2616/rfc2616-sec10.html#{section}"
    ))
    .ok()
}
