//! Configuration for the tenancy storage models.
//!
//! # Example
//!
//! ```rust
//! use enclave_tenancy::config::StoreConfig;
//!
//! // Use defaults
//! let config = StoreConfig::default();
//! assert_eq!(config.default_group_name, "users");
//!
//! // Or customize
//! let config = StoreConfig {
//!     default_domain: "example.com".to_owned(),
//!     ..Default::default()
//! };
//! assert_eq!(config.default_domain, "example.com");
//! ```

/// Environment variable consulted by [`StoreConfig::from_env`].
pub const DEFAULT_DOMAIN_ENV: &str = "DEFAULT_DOMAIN";

/// Settings shared by every backend.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Domain assigned to organizations created without one.
    ///
    /// Default: `localhost`
    pub default_domain: String,

    /// Name given to groups created without one.
    ///
    /// Default: `users`
    pub default_group_name: String,

    /// Name of the group looked up by the general-group helper.
    ///
    /// Default: `general`
    pub general_group_name: String,

    /// Suffix appended to a team id to name its group collection.
    ///
    /// Default: `_groups`
    pub group_collection_suffix: String,

    /// Length of generated opaque tokens (in characters).
    ///
    /// Default: 32
    pub token_length: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_domain: "localhost".to_owned(),
            default_group_name: "users".to_owned(),
            general_group_name: "general".to_owned(),
            group_collection_suffix: "_groups".to_owned(),
            token_length: crate::crypto::DEFAULT_TOKEN_LENGTH,
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, with the organization domain taken from `DEFAULT_DOMAIN`
    /// when it is set and non-empty.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(domain) = std::env::var(DEFAULT_DOMAIN_ENV) {
            let domain = domain.trim();
            if !domain.is_empty() {
                domain.clone_into(&mut config.default_domain);
            }
        }
        config
    }

    #[must_use]
    pub fn with_default_domain(mut self, domain: impl Into<String>) -> Self {
        self.default_domain = domain.into();
        self
    }
}
