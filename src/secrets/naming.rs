//! Secret id composition.
//!
//! Named lookups resolve to `<prefix>/<key>` where
//! `prefix = prefix_fmt(app_name, env_name)` and `key = key_fmt(name)`.

use crate::utils::format::{sprintf, validate_template};

use super::error::{Result, SecretsError};

pub const DEFAULT_PREFIX_FMT: &str = "%s/%s";
pub const DEFAULT_KEY_FMT: &str = "%s";

/// Namespacing rules for one application in one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretNaming {
    prefix: String,
    key_fmt: String,
}

impl SecretNaming {
    /// Compute the prefix once and check `key_fmt`.
    ///
    /// # Errors
    ///
    /// - [`SecretsError::ConfigError`] if `prefix_fmt` does not take exactly
    ///   two arguments or `key_fmt` exactly one, or either uses a verb other
    ///   than `%s`/`%v`
    pub fn new(app_name: &str, env_name: &str, prefix_fmt: &str, key_fmt: &str) -> Result<Self> {
        let prefix = sprintf(prefix_fmt, &[app_name, env_name])
            .map_err(|e| SecretsError::config_error(format!("Invalid secret prefix format: {}", e)))?;
        validate_template(key_fmt, 1)
            .map_err(|e| SecretsError::config_error(format!("Invalid secret key format: {}", e)))?;

        Ok(Self { prefix, key_fmt: key_fmt.to_string() })
    }

    /// Naming with the default `"%s/%s"` prefix and `"%s"` key formats.
    pub fn with_defaults(app_name: &str, env_name: &str) -> Result<Self> {
        Self::new(app_name, env_name, DEFAULT_PREFIX_FMT, DEFAULT_KEY_FMT)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn key_fmt(&self) -> &str {
        &self.key_fmt
    }

    /// Fully qualified id for a named string secret: `<prefix>/<key>`.
    pub fn qualify(&self, name: &str) -> Result<String> {
        let key = sprintf(&self.key_fmt, &[name])
            .map_err(|e| SecretsError::internal(format!("Secret key format rejected '{}': {}", name, e)))?;
        Ok(format!("{}/{}", self.prefix, key))
    }

    /// Store id for a binary secret.
    ///
    /// This is `prefix + id` with no separator and no key formatting, unlike
    /// [`qualify`](Self::qualify). Deployed binary secrets are addressed this
    /// way, so callers must pass the leading `/` themselves.
    pub fn binary_id(&self, id: &str) -> String {
        format!("{}{}", self.prefix, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_default_naming() {
        let naming = SecretNaming::with_defaults("svc", "dev1").unwrap();
        assert_eq!(naming.prefix(), "svc/dev1");
        assert_eq!(naming.qualify("db-pwd").unwrap(), "svc/dev1/db-pwd");
    }

    #[test]
    fn test_custom_key_format() {
        let naming = SecretNaming::new("svc", "dev1", DEFAULT_PREFIX_FMT, "k_%s").unwrap();
        assert_eq!(naming.qualify("x").unwrap(), "svc/dev1/k_x");
    }

    #[test]
    fn test_custom_prefix_format() {
        let naming = SecretNaming::new("svc", "dev1", "%s-%s", DEFAULT_KEY_FMT).unwrap();
        assert_eq!(naming.qualify("token").unwrap(), "svc-dev1/token");
    }

    #[test]
    fn test_binary_id_has_no_separator() {
        let naming = SecretNaming::with_defaults("svc", "dev1").unwrap();
        assert_eq!(naming.binary_id("cert"), "svc/dev1cert");
        assert_eq!(naming.binary_id("/cert"), "svc/dev1/cert");
    }

    #[test]
    fn test_malformed_prefix_format() {
        for fmt in ["%s", "%s/%s/%s", "%d/%s", "%s/%s%"] {
            let err = SecretNaming::new("svc", "dev1", fmt, DEFAULT_KEY_FMT).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::BadArgument, "prefix_fmt = {}", fmt);
        }
    }

    #[test]
    fn test_malformed_key_format() {
        for fmt in ["", "static", "%s_%s", "%q"] {
            let err = SecretNaming::new("svc", "dev1", DEFAULT_PREFIX_FMT, fmt).unwrap_err();
            assert!(matches!(err, SecretsError::ConfigError { .. }), "key_fmt = {}", fmt);
        }
    }

    #[test]
    fn test_escaped_percent() {
        let naming = SecretNaming::new("svc", "dev1", "%s/%s", "100%%_%s").unwrap();
        assert_eq!(naming.qualify("x").unwrap(), "svc/dev1/100%_x");
    }
}
