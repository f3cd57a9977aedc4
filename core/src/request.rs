use bytes::Bytes;
use http::uri::PathAndQuery;
use http::HeaderMap;
use http::Method;

use crate::Result;

/// A read-only projection of the request being signed.
///
/// Holds exactly the request material a signature covers: method, raw
/// URL-encoded path, decoded query pairs, headers as supplied, and the body
/// bytes that will be transmitted. Building a view copies out of the request;
/// the request itself is never touched, so a signer can be handed a view for
/// a request that some other layer owns and will transmit.
///
/// Query pairs keep duplicates and empty values, in URL order. They are
/// stored *decoded* (`form_urlencoded` decoding, the reverse of what the URL
/// carries) so that canonicalization re-encodes them with canonical escape
/// casing no matter how the caller originally escaped them.
#[derive(Debug, Clone, Default)]
pub struct RequestView {
    /// HTTP method, an uppercase token.
    pub method: Method,
    /// Raw URL-encoded path. May be empty and is not assumed normalized.
    pub path: String,
    /// Decoded query pairs in URL order. Duplicates and empty values kept.
    pub query: Vec<(String, String)>,
    /// Headers with names and values as supplied.
    pub headers: HeaderMap,
    /// Body bytes that will be transmitted, if any.
    pub body: Option<Bytes>,
}

impl RequestView {
    /// Build a view from [`http::request::Parts`] and the body that will be
    /// sent with it.
    ///
    /// Pass `None` for bodyless requests; an empty `Bytes` is a present,
    /// zero-length body and hashes identically to `None`.
    pub fn build(parts: &http::request::Parts, body: Option<Bytes>) -> Result<Self> {
        let uri = parts.uri.clone().into_parts();
        let paq = uri
            .path_and_query
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        Ok(RequestView {
            method: parts.method.clone(),
            path: paq.path().to_string(),
            query: paq
                .query()
                .map(|v| {
                    form_urlencoded::parse(v.as_bytes())
                        .map(|(k, v)| (k.into_owned(), v.into_owned()))
                        .collect()
                })
                .unwrap_or_default(),
            headers: parts.headers.clone(),
            body,
        })
    }
}
