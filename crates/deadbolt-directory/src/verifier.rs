//! Fail-closed credential verification.

use tracing::{debug, warn};

use crate::client::{DirectoryClient, DirectoryConfig};
use crate::error::DirectoryResult;
use crate::record::HashRecord;

/// Verifies door credentials against the member directory.
///
/// The single entry point, [`check_credentials`](Self::check_credentials),
/// returns a bare `bool` and never raises: every failure mode (directory
/// unreachable, no matching member, missing or malformed hash attribute)
/// collapses to `false` with a logged warning. The gateway in front of this
/// only ever needs to branch on the boolean.
///
/// The verifier is stateless besides the network round trip and is safe for
/// concurrent calls.
#[derive(Debug, Clone)]
pub struct CredentialVerifier<C> {
    client: C,
    config: DirectoryConfig,
}

impl<C: DirectoryClient> CredentialVerifier<C> {
    /// Create a verifier over the given directory client.
    pub fn new(client: C, config: DirectoryConfig) -> Self {
        Self { client, config }
    }

    /// Check `password` for the member `username`.
    ///
    /// Returns `true` only when the directory holds exactly this member with
    /// the door service enabled and the password matches its salted hash
    /// record. All error paths return `false` (fail-closed).
    pub async fn check_credentials(&self, username: &str, password: &str) -> bool {
        match self.lookup_record(username).await {
            Ok(Some(record)) => {
                let ok = record.verify(password);
                debug!(username, granted = ok, "credential check completed");
                ok
            }
            Ok(None) => {
                warn!(username, "no usable password record for member");
                false
            }
            Err(e) => {
                warn!(username, error = %e, "directory lookup failed, denying");
                false
            }
        }
    }

    /// Fetch and decode the member's hash record.
    ///
    /// `Ok(None)` covers the benign misses: no matching member, or a member
    /// without a (non-empty) password attribute. Malformed records are
    /// errors, surfaced to the caller above for logging.
    async fn lookup_record(&self, username: &str) -> DirectoryResult<Option<HashRecord>> {
        let filter = self.config.filter_for(username);
        let value = self
            .client
            .fetch_attribute(&filter, &self.config.password_attribute)
            .await?;

        match value {
            Some(v) if !v.is_empty() => Ok(Some(HashRecord::parse(&v)?)),
            _ => Ok(None),
        }
    }
}
