//! Request URL construction.

use crate::Result;
use formquery_core::{Error, Query};
use url::Url;

/// Join `base_url` and `path`, appending `?` and the encoded query when the
/// query has any parameters.
///
/// The base and path are concatenated as given; no slash is inserted.
///
/// # Errors
///
/// Returns [`Error::InvalidEndpoint`] when the result is not a valid URL.
///
/// ```
/// use formquery_core::query;
/// use formquery_http::request_url;
///
/// let url = request_url("https://api.example.com", "/v1/orders", &query!("limit", 10))?;
/// assert_eq!(url.as_str(), "https://api.example.com/v1/orders?limit=10");
/// # Ok::<(), formquery_core::Error>(())
/// ```
pub fn request_url(base_url: &str, path: &str, query: &Query) -> Result<Url> {
    let encoded = query.encode();
    let mut raw = String::with_capacity(base_url.len() + path.len() + encoded.len() + 1);
    raw.push_str(base_url);
    raw.push_str(path);
    if !encoded.is_empty() {
        raw.push('?');
        raw.push_str(&encoded);
    }

    Url::parse(&raw)
        .map_err(|err| Error::InvalidEndpoint(format!("Invalid request URL `{raw}`: {err}")))
}
