//! AWS Signature Version 4 request signing.
//!
//! Computes the `Authorization` and `x-amz-date` header values for a request
//! according to the [SigV4 signing process][sigv4]. The crate never touches
//! the request itself: the HTTP layer builds a [`RequestView`] projection,
//! calls [`Signer::sign`], and attaches the returned header values before
//! transmission.
//!
//! ```no_run
//! use awsign_aws_v4::{Signer, SigningIdentity};
//! use awsign_core::RequestView;
//!
//! # fn example(parts: &mut http::request::Parts) -> awsign_core::Result<()> {
//! let identity = SigningIdentity::new("AKID...", "secret...", "us-east-1", "iam");
//! let signer = Signer::new(identity);
//!
//! let view = RequestView::build(parts, None)?;
//! signer.sign(&view)?.apply(parts)?;
//! # Ok(())
//! # }
//! ```
//!
//! [sigv4]: https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html

#![warn(missing_docs)]

mod constants;

mod identity;
pub use identity::SigningIdentity;

mod signer;
pub use signer::Signer;
pub use signer::SigningOutput;
