use std::fmt::Write as _;
use std::sync::Arc;

use http::header;
use http::HeaderMap;
use http::HeaderValue;
use log::debug;
use percent_encoding::utf8_percent_encode;

use awsign_core::hash::{hex_hmac_sha256, hex_sha256, hmac_sha256};
use awsign_core::time::{format_date, format_iso8601, DateTime};
use awsign_core::{Clock, Error, RequestView, Result, SystemClock};

use crate::constants::{
    AWS4_HMAC_SHA256, AWS4_REQUEST, AWS_QUERY_ENCODE_SET, EMPTY_PAYLOAD_HASH, X_AMZ_DATE,
};
use crate::SigningIdentity;

/// Signer that implements AWS SigV4.
///
/// - [Signature Version 4 signing process](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)
///
/// Holds an immutable [`SigningIdentity`] and a [`Clock`]. Signing reads the
/// clock once per call and is otherwise a pure function of the request view,
/// so a shared signer can serve any number of threads concurrently.
#[derive(Debug, Clone)]
pub struct Signer {
    identity: SigningIdentity,
    clock: Arc<dyn Clock>,
}

impl Signer {
    /// Create a new SigV4 signer driven by the system clock.
    pub fn new(identity: SigningIdentity) -> Self {
        Self {
            identity,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests. Only use this
    /// function for testing, or when an external layer owns time.
    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Sign a request, producing the header values to attach.
    ///
    /// Never mutates or transmits anything. The caller must strip any
    /// pre-existing `Authorization` header and attach both returned values
    /// before transmission; [`SigningOutput::apply`] does exactly that for
    /// `http` requests.
    pub fn sign(&self, req: &RequestView) -> Result<SigningOutput> {
        if !self.identity.is_valid() {
            return Err(Error::credential_invalid(
                "signing identity is missing required fields",
            ));
        }

        // The single clock read; every timestamp below derives from it.
        let now = self.clock.now();

        let creq = CanonicalRequest::build(req, now)?;
        debug!("calculated canonical request: {}", creq.text);

        // Scope: "20150830/<region>/<service>/aws4_request"
        let scope = format!(
            "{}/{}/{}/{}",
            format_date(now),
            self.identity.region,
            self.identity.service,
            AWS4_REQUEST
        );
        debug!("calculated scope: {scope}");

        let string_to_sign = string_to_sign(now, &scope, &hex_sha256(creq.text.as_bytes()));
        debug!("calculated string to sign: {string_to_sign}");

        let signing_key = generate_signing_key(
            &self.identity.secret_access_key,
            now,
            &self.identity.region,
            &self.identity.service,
        );
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            AWS4_HMAC_SHA256,
            self.identity.access_key_id,
            scope,
            creq.signed_headers.join(";"),
            signature
        );

        Ok(SigningOutput {
            authorization,
            x_amz_date: format_iso8601(now),
        })
    }
}

/// The product of a signing operation: the two header values to attach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningOutput {
    /// Value for the `Authorization` header.
    pub authorization: String,
    /// Value for the `x-amz-date` header. Matches the timestamp signed into
    /// the canonical request.
    pub x_amz_date: String,
}

impl SigningOutput {
    /// Attach both header values to a request, replacing any stale
    /// `Authorization` or `x-amz-date` from a prior signing attempt.
    pub fn apply(&self, parts: &mut http::request::Parts) -> Result<()> {
        let mut authorization = HeaderValue::from_str(&self.authorization)?;
        authorization.set_sensitive(true);

        parts.headers.insert(header::AUTHORIZATION, authorization);
        parts
            .headers
            .insert(X_AMZ_DATE, HeaderValue::from_str(&self.x_amz_date)?);
        Ok(())
    }
}

/// The canonical request string plus the header names it covers.
///
/// Built fresh per signing operation; it embeds the signing timestamp and
/// must never be reused across requests.
struct CanonicalRequest {
    text: String,
    signed_headers: Vec<String>,
}

impl CanonicalRequest {
    // CanonicalRequest =
    //     HTTPRequestMethod + '\n' +
    //     CanonicalURI + '\n' +
    //     CanonicalQueryString + '\n' +
    //     CanonicalHeaders + '\n' + '\n' +
    //     SignedHeaders + '\n' +
    //     HexEncode(Hash(RequestPayload))
    fn build(req: &RequestView, now: DateTime) -> Result<Self> {
        let (header_block, signed_headers) = canonical_headers(&req.headers, now)?;

        // 256 is specially chosen to avoid reallocation for most requests.
        let mut f = String::with_capacity(256);
        writeln!(f, "{}", req.method)?;
        writeln!(f, "{}", canonical_path(&req.path))?;
        writeln!(f, "{}", canonical_query_string(&req.query))?;
        writeln!(f, "{header_block}")?;
        // The blank line after the header block is structural, required even
        // when there are no headers.
        writeln!(f)?;
        writeln!(f, "{}", signed_headers.join(";"))?;
        write!(f, "{}", payload_hash(req.body.as_deref()))?;

        Ok(CanonicalRequest {
            text: f,
            signed_headers,
        })
    }
}

/// Collapse every run of `/` in the raw URL-encoded path to a single `/`.
///
/// An empty or all-whitespace path becomes `/`. Dot segments are not
/// resolved.
fn canonical_path(path: &str) -> String {
    if path.trim().is_empty() {
        return "/".to_string();
    }

    let mut s = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && s.ends_with('/') {
            continue;
        }
        s.push(c);
    }
    s
}

/// Percent-encode each decoded name and value, then sort the encoded pairs
/// byte-lexicographically and join `name=value` pairs with `&`.
///
/// Equal names order by encoded value; a parameter without a value still
/// yields `name=`.
fn canonical_query_string(query: &[(String, String)]) -> String {
    if query.is_empty() {
        return String::new();
    }

    let mut pairs = query
        .iter()
        .map(|(k, v)| {
            (
                utf8_percent_encode(k, &AWS_QUERY_ENCODE_SET).to_string(),
                utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET).to_string(),
            )
        })
        .collect::<Vec<_>>();
    pairs.sort();

    let mut s = String::with_capacity(pairs.iter().map(|(k, v)| k.len() + v.len() + 2).sum());
    for (idx, (k, v)) in pairs.iter().enumerate() {
        if idx != 0 {
            s.push('&');
        }
        s.push_str(k);
        s.push('=');
        s.push_str(v);
    }
    s
}

/// Build the canonical header block and the signed-header name set.
///
/// Names are lowercased (`http::HeaderName` guarantees this), multiple values
/// of one header joined with `,` in arrival order after whitespace
/// normalization, and lines sorted by name. Any incoming `x-amz-date` or
/// `Authorization` is dropped; a fresh `x-amz-date` carrying the signing
/// timestamp is always included, so the header covered by the signature can
/// never drift from the string-to-sign.
fn canonical_headers(headers: &HeaderMap, now: DateTime) -> Result<(String, Vec<String>)> {
    let mut merged: Vec<(String, String)> = Vec::with_capacity(headers.keys_len() + 1);
    for name in headers.keys() {
        if name.as_str() == header::AUTHORIZATION.as_str() || name.as_str() == X_AMZ_DATE {
            continue;
        }

        let values = headers
            .get_all(name)
            .iter()
            .map(header_value_collapsed)
            .collect::<Result<Vec<_>>>()?;
        merged.push((name.as_str().to_string(), values.join(",")));
    }
    merged.push((X_AMZ_DATE.to_string(), format_iso8601(now)));
    merged.sort();

    let mut block = String::with_capacity(64);
    for (idx, (name, value)) in merged.iter().enumerate() {
        if idx != 0 {
            block.push('\n');
        }
        block.push_str(name);
        block.push(':');
        block.push_str(value);
    }

    let names = merged.into_iter().map(|(name, _)| name).collect();
    Ok((block, names))
}

/// Trim a header value and collapse internal whitespace runs to one space.
fn header_value_collapsed(value: &HeaderValue) -> Result<String> {
    Ok(value
        .to_str()?
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" "))
}

/// Hex SHA-256 of the exact bytes that will be transmitted, or the fixed
/// empty-payload digest for bodyless requests.
fn payload_hash(body: Option<&[u8]>) -> String {
    match body {
        Some(bs) => hex_sha256(bs),
        None => EMPTY_PAYLOAD_HASH.to_string(),
    }
}

// StringToSign:
//
// AWS4-HMAC-SHA256
// 20150830T123600Z
// 20150830/<region>/<service>/aws4_request
// <hashed_canonical_request>
fn string_to_sign(now: DateTime, scope: &str, canonical_request_hash: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}",
        AWS4_HMAC_SHA256,
        format_iso8601(now),
        scope,
        canonical_request_hash
    )
}

/// Derive the date/region/service-scoped signing key: the fixed four-round
/// HMAC-SHA256 chain over `"AWS4" + secret`.
///
/// This is the only place that reads the secret key.
fn generate_signing_key(secret: &str, now: DateTime, region: &str, service: &str) -> Vec<u8> {
    let secret = format!("AWS4{secret}");
    let k_date = hmac_sha256(secret.as_bytes(), format_date(now).as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());

    hmac_sha256(&k_service, AWS4_REQUEST.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use awsign_core::time::parse_rfc3339;
    use awsign_core::{ErrorKind, FixedClock};
    use pretty_assertions::assert_eq;

    fn test_time() -> DateTime {
        parse_rfc3339("2015-08-30T12:36:00Z").expect("in range")
    }

    fn iam_identity() -> SigningIdentity {
        SigningIdentity::new(
            "AKIDEXAMPLE",
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "us-east-1",
            "iam",
        )
    }

    fn iam_request() -> RequestView {
        let (parts, _) = http::Request::builder()
            .method(http::Method::GET)
            .uri("https://iam.amazonaws.com/?Action=ListUsers&Version=2010-05-08")
            .header("Host", "iam.amazonaws.com")
            .header(
                "Content-Type",
                "application/x-www-form-urlencoded; charset=utf-8",
            )
            .body(())
            .expect("request must be valid")
            .into_parts();
        RequestView::build(&parts, None).expect("view must build")
    }

    #[test]
    fn test_canonical_path() {
        let cases = vec![
            ("", "/"),
            ("   ", "/"),
            ("/", "/"),
            ("//", "/"),
            ("//example//", "/example/"),
            ("/a///b", "/a/b"),
            ("/%20/foo", "/%20/foo"),
        ];
        for (input, expected) in cases {
            assert_eq!(canonical_path(input), expected, "path {input:?}");
        }
    }

    #[test]
    fn test_canonical_query_string_empty() {
        assert_eq!(canonical_query_string(&[]), "");
    }

    #[test]
    fn test_canonical_query_string_sorts_names_then_values() {
        let query = vec![
            ("Param2".to_string(), "value2".to_string()),
            ("Param1".to_string(), "value2".to_string()),
            ("Param1".to_string(), "value1".to_string()),
        ];
        assert_eq!(
            canonical_query_string(&query),
            "Param1=value1&Param1=value2&Param2=value2"
        );
    }

    #[test]
    fn test_canonical_query_string_encodes_decoded_input() {
        let query = vec![
            ("p".to_string(), "b c".to_string()),
            ("ሴ".to_string(), "bar".to_string()),
            ("empty".to_string(), String::new()),
        ];
        assert_eq!(
            canonical_query_string(&query),
            "%E1%88%B4=bar&empty=&p=b%20c"
        );
    }

    #[test]
    fn test_canonical_query_string_resort_is_noop() {
        let query = vec![
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "%&=".to_string()),
            ("a".to_string(), " ".to_string()),
        ];
        let canonical = canonical_query_string(&query);
        let mut resorted = canonical.split('&').collect::<Vec<_>>();
        resorted.sort_unstable();
        assert_eq!(resorted.join("&"), canonical);
    }

    #[test]
    fn test_canonical_headers_sorted_and_unique() {
        let mut headers = HeaderMap::new();
        headers.insert("zulu", HeaderValue::from_static("z"));
        headers.insert("Host", HeaderValue::from_static("example.amazonaws.com"));
        headers.append("my-header1", HeaderValue::from_static("a"));
        headers.append("my-header1", HeaderValue::from_static("b"));

        let (block, names) = canonical_headers(&headers, test_time()).expect("must build");
        assert_eq!(names, vec!["host", "my-header1", "x-amz-date", "zulu"]);
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted, names);
        assert_eq!(
            block,
            "host:example.amazonaws.com\nmy-header1:a,b\nx-amz-date:20150830T123600Z\nzulu:z"
        );
    }

    #[test]
    fn test_canonical_headers_replaces_stale_signing_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("example.amazonaws.com"));
        headers.insert("x-amz-date", HeaderValue::from_static("19990101T000000Z"));
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("AWS4-HMAC-SHA256 stale"),
        );

        let (block, names) = canonical_headers(&headers, test_time()).expect("must build");
        assert_eq!(names, vec!["host", "x-amz-date"]);
        assert_eq!(
            block,
            "host:example.amazonaws.com\nx-amz-date:20150830T123600Z"
        );
    }

    #[test]
    fn test_header_value_collapsed() {
        let value = HeaderValue::from_static("  a    b  c ");
        assert_eq!(header_value_collapsed(&value).expect("ascii"), "a b c");
    }

    #[test]
    fn test_payload_hash() {
        assert_eq!(payload_hash(None), EMPTY_PAYLOAD_HASH);
        // A present but empty body hashes to the same constant.
        assert_eq!(payload_hash(Some(b"")), EMPTY_PAYLOAD_HASH);
        assert_eq!(
            payload_hash(Some(b"Param1=value1")),
            "9095672bbd1f56dfc5b65f3e153adc8731a4a654192329106275f4c7b24d0b6e"
        );
    }

    #[test]
    fn test_generate_signing_key() {
        // Published AWS example for 2015-08-30 / us-east-1 / iam.
        let key = generate_signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            test_time(),
            "us-east-1",
            "iam",
        );
        assert_eq!(
            hex::encode(key),
            "c4afb1cc5771d871763a393e44b703571b55cc28424d1a5e86da6ed3c154a4b9"
        );
    }

    #[test]
    fn test_string_to_sign() {
        let sts = string_to_sign(
            test_time(),
            "20150830/us-east-1/iam/aws4_request",
            "f536975d06c0309214f805bb90ccff089219ecd68b2577efef23edd43b7e1a59",
        );
        assert_eq!(
            sts,
            "AWS4-HMAC-SHA256\n\
             20150830T123600Z\n\
             20150830/us-east-1/iam/aws4_request\n\
             f536975d06c0309214f805bb90ccff089219ecd68b2577efef23edd43b7e1a59"
        );
    }

    #[test]
    fn test_canonical_request_published_iam_example() {
        let creq = CanonicalRequest::build(&iam_request(), test_time()).expect("must build");
        assert_eq!(
            creq.text,
            "GET\n\
             /\n\
             Action=ListUsers&Version=2010-05-08\n\
             content-type:application/x-www-form-urlencoded; charset=utf-8\n\
             host:iam.amazonaws.com\n\
             x-amz-date:20150830T123600Z\n\
             \n\
             content-type;host;x-amz-date\n\
             e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            hex_sha256(creq.text.as_bytes()),
            "f536975d06c0309214f805bb90ccff089219ecd68b2577efef23edd43b7e1a59"
        );
        assert_eq!(creq.signed_headers, vec!["content-type", "host", "x-amz-date"]);
    }

    #[test]
    fn test_sign_published_iam_example() {
        let signer = Signer::new(iam_identity()).with_clock(FixedClock(test_time()));
        let out = signer.sign(&iam_request()).expect("must sign");

        assert_eq!(
            out.authorization,
            "AWS4-HMAC-SHA256 \
             Credential=AKIDEXAMPLE/20150830/us-east-1/iam/aws4_request, \
             SignedHeaders=content-type;host;x-amz-date, \
             Signature=5d672d79c15b13162d9279b0855cfba6789a8edb4c82c400e06b5924a6f2b5d7"
        );
        assert_eq!(out.x_amz_date, "20150830T123600Z");
    }

    #[test]
    fn test_sign_is_deterministic_for_fixed_clock() {
        let signer = Signer::new(iam_identity()).with_clock(FixedClock(test_time()));
        let req = iam_request();
        assert_eq!(signer.sign(&req).expect("must sign"), signer.sign(&req).expect("must sign"));
    }

    #[test]
    fn test_sign_rejects_invalid_identity() {
        let identity = SigningIdentity::new("AKIDEXAMPLE", "", "us-east-1", "iam");
        let err = Signer::new(identity)
            .sign(&iam_request())
            .expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::CredentialInvalid);
    }

    #[test]
    fn test_intermediates_never_contain_secret() {
        let creq = CanonicalRequest::build(&iam_request(), test_time()).expect("must build");
        assert!(!creq.text.contains("wJalrXUtnFEMI"));

        let sts = string_to_sign(
            test_time(),
            "20150830/us-east-1/iam/aws4_request",
            &hex_sha256(creq.text.as_bytes()),
        );
        assert!(!sts.contains("wJalrXUtnFEMI"));
    }
}
