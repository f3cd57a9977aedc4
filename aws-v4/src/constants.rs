use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;

/// The SigV4 algorithm identifier, first token of the `Authorization` value
/// and first line of the string-to-sign.
pub const AWS4_HMAC_SHA256: &str = "AWS4-HMAC-SHA256";

/// Terminator of the credential scope and final message of key derivation.
pub const AWS4_REQUEST: &str = "aws4_request";

/// Header carrying the signing timestamp.
pub const X_AMZ_DATE: &str = "x-amz-date";

/// SHA-256 of the empty byte sequence, used when a request has no body.
pub const EMPTY_PAYLOAD_HASH: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// AsciiSet for [AWS UriEncode](https://docs.aws.amazon.com/general/latest/gr/sigv4-create-canonical-request.html)
/// applied to query parameter names and values.
///
/// URI encode every byte except the unreserved characters: 'A'-'Z', 'a'-'z',
/// '0'-'9', '-', '.', '_', and '~'. The escapes come out with uppercase hex
/// digits, as SigV4 requires.
pub static AWS_QUERY_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');
