//! Directory lookup client.
//!
//! The [`DirectoryClient`] trait is the narrow contract the verifier needs:
//! given a rendered filter and an attribute name, return the first matching
//! record's attribute value, or nothing. [`LdapDirectoryClient`] implements
//! it over [`ldap3`]; tests substitute an in-memory implementation.

use ldap3::{LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{DirectoryError, DirectoryResult};

/// Placeholder substituted with the escaped username in the filter template.
pub const USERNAME_PLACEHOLDER: &str = "{username}";

/// Connection and search parameters for the member directory.
///
/// Supplied by the process configuration loader at construction time; this
/// crate never reads the environment itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Directory URL, e.g. `ldaps://directory.example.org:636`.
    pub url: String,

    /// Service account bind DN.
    pub bind_dn: String,

    /// Service account bind password.
    pub bind_password: String,

    /// Search base for member records.
    pub search_base: String,

    /// Search filter with a `{username}` placeholder. The substituted value
    /// is always escaped first; see [`escape_filter_value`].
    pub filter_template: String,

    /// Attribute carrying the salted password hash record.
    pub password_attribute: String,

    /// Validate the directory server's certificate.
    ///
    /// Historical deployments of this controller disabled peer validation
    /// entirely. That behavior is still reachable for such installations,
    /// but it is opt-in and logged loudly; the default is to validate.
    pub verify_certificates: bool,
}

impl DirectoryConfig {
    /// Build a config with the stock member filter and attribute names.
    pub fn new(
        url: impl Into<String>,
        bind_dn: impl Into<String>,
        bind_password: impl Into<String>,
        search_base: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            bind_dn: bind_dn.into(),
            bind_password: bind_password.into(),
            search_base: search_base.into(),
            filter_template:
                "(&(objectClass=doorMember)(serviceEnabled=door)(uid={username}))".to_string(),
            password_attribute: "doorPassword".to_string(),
            verify_certificates: true,
        }
    }

    /// Render the member filter for `username`.
    ///
    /// The username is escaped before substitution, so attacker-controlled
    /// input cannot alter the filter structure.
    #[must_use]
    pub fn filter_for(&self, username: &str) -> String {
        self.filter_template
            .replace(USERNAME_PLACEHOLDER, &escape_filter_value(username))
    }
}

/// Escapes special characters in LDAP filter values (RFC 4515).
#[must_use]
pub fn escape_filter_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\5c"),
            '*' => result.push_str("\\2a"),
            '(' => result.push_str("\\28"),
            ')' => result.push_str("\\29"),
            '\0' => result.push_str("\\00"),
            _ => result.push(c),
        }
    }
    result
}

/// Lookup contract between the verifier and the directory.
///
/// Implementations return zero-or-one matching record's attribute value.
/// Multi-entry results are truncated to the first entry; the door filter is
/// keyed on a unique uid.
///
/// Declared in the desugared RPITIT form with a `Send` bound so lookups can
/// run inside spawned request handlers; implementations may use plain
/// `async fn`.
pub trait DirectoryClient: Send + Sync {
    /// Fetch `attribute` from the first record matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory is unreachable, the bind fails, or
    /// the search fails. `Ok(None)` means no record matched or the record
    /// lacks the attribute.
    fn fetch_attribute(
        &self,
        filter: &str,
        attribute: &str,
    ) -> impl std::future::Future<Output = DirectoryResult<Option<String>>> + Send;
}

/// [`ldap3`]-backed directory client.
///
/// Opens a fresh connection per lookup: door authentications are rare (a
/// handful per hour), so pooling buys nothing here.
#[derive(Debug, Clone)]
pub struct LdapDirectoryClient {
    config: DirectoryConfig,
}

impl LdapDirectoryClient {
    /// Create a client for the given directory.
    pub fn new(config: DirectoryConfig) -> Self {
        if !config.verify_certificates {
            warn!(url = %config.url, "directory certificate validation is DISABLED");
        }
        Self { config }
    }

    /// The client's configuration.
    #[must_use]
    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    async fn connect(&self) -> DirectoryResult<ldap3::Ldap> {
        let settings =
            LdapConnSettings::new().set_no_tls_verify(!self.config.verify_certificates);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &self.config.url)
            .await
            .map_err(|e| DirectoryError::Connection(e.to_string()))?;

        // Drive the connection in the background for the lifetime of the
        // lookup.
        ldap3::drive!(conn);

        ldap.simple_bind(&self.config.bind_dn, &self.config.bind_password)
            .await
            .map_err(|e| DirectoryError::Bind(e.to_string()))?
            .success()
            .map_err(|e| DirectoryError::Bind(format!("bind failed: {e}")))?;

        Ok(ldap)
    }
}

impl DirectoryClient for LdapDirectoryClient {
    async fn fetch_attribute(
        &self,
        filter: &str,
        attribute: &str,
    ) -> DirectoryResult<Option<String>> {
        let mut ldap = self.connect().await?;

        let (entries, _result) = ldap
            .search(
                &self.config.search_base,
                Scope::Subtree,
                filter,
                vec![attribute],
            )
            .await
            .map_err(|e| DirectoryError::Search(e.to_string()))?
            .success()
            .map_err(|e| DirectoryError::Search(format!("search failed: {e}")))?;

        let _ = ldap.unbind().await;

        Ok(entries
            .into_iter()
            .next()
            .map(SearchEntry::construct)
            .and_then(|entry| {
                entry
                    .attrs
                    .get(attribute)
                    .and_then(|values| values.first())
                    .cloned()
            }))
    }
}
