use std::fmt::{Debug, Formatter};

use awsign_core::utils::Redact;

/// The immutable identity a signature is issued under.
///
/// Created once at client setup and held for the client's lifetime. The
/// secret key is consumed only inside signing-key derivation; it never
/// appears in any intermediate string, and `Debug` output redacts both keys.
#[derive(Clone)]
pub struct SigningIdentity {
    /// Access key id, placed in the `Credential` declaration.
    pub access_key_id: String,
    /// Secret access key. Read only by signing-key derivation.
    pub secret_access_key: String,
    /// Region name, e.g. `us-east-1`.
    pub region: String,
    /// Service name, e.g. `iam` or `s3`.
    pub service: String,
}

impl SigningIdentity {
    /// Create an identity from its four parts.
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
            service: service.into(),
        }
    }

    /// Whether this identity can produce a signature at all.
    pub fn is_valid(&self) -> bool {
        !self.access_key_id.is_empty()
            && !self.secret_access_key.is_empty()
            && !self.region.is_empty()
            && !self.service.is_empty()
    }
}

impl Debug for SigningIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("secret_access_key", &Redact::from(&self.secret_access_key))
            .field("region", &self.region)
            .field("service", &self.service)
            .finish()
    }
}
