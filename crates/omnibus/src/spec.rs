//! JSON:API specification constants.
//!
//! Centralizes every protocol-level constant the assembler emits, so that a
//! version bump touches exactly one file.

/// The specification version implemented by this crate.
pub const VERSION: &str = "1.0";

/// Permalink identifying the supported specification version.
pub const SPEC_PERMALINK: &str = "http://jsonapi.org/format/1.0/";

/// The JSON:API media type.
pub const MEDIA_TYPE: &str = "application/vnd.api+json";

/// Query parameter names reserved by the specification.
///
/// Assembled documents vary on each of these, since any of them changes the
/// shape of the output.
pub const RESERVED_QUERY_PARAMETERS: [&str; 5] = ["fields", "filter", "include", "page", "sort"];

/// Human-readable detail shared by every `meta.omitted` block.
pub const OMITTED_DETAIL: &str =
    "Some resources have been omitted because of insufficient authorization.";

/// Help link shared by every `meta.omitted` block.
pub const OMITTED_HELP_LINK: &str = "https://github.com/omnibus-rs/omnibus#omissions";

/// Cache contexts every assembled resource document varies on.
///
/// Documents contain absolute URLs, so they vary on the site; they also vary
/// on every reserved query parameter.
pub fn document_cache_contexts() -> impl Iterator<Item = String> {
    std::iter::once("url.site".to_string()).chain(
        RESERVED_QUERY_PARAMETERS
            .iter()
            .map(|name| format!("url.query_args:{name}")),
    )
}
