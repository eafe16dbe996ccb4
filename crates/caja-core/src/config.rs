//! # Register Configuration
//!
//! Per-register behavior loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`CAJA_*`)
//! 2. Defaults (this file)
//!
//! Configuration is read-only after initialization.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::DEFAULT_TENANT_ID;

/// What to do with a cash sale whose change cannot be made exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortfallPolicy {
    /// Reject the sale; the drawer is left untouched.
    #[default]
    Block,
    /// Keep the deposit, give no change, and record the shortfall so a
    /// supervisor can settle it by hand.
    RecordShortfall,
}

impl FromStr for ShortfallPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "block" => Ok(ShortfallPolicy::Block),
            "record" | "record_shortfall" => Ok(ShortfallPolicy::RecordShortfall),
            other => Err(format!("unknown shortfall policy: {}", other)),
        }
    }
}

/// Register configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterConfig {
    /// Tenant ID for multi-tenant support.
    pub tenant_id: String,

    /// Register this process operates.
    pub register_id: String,

    /// Currency code (ISO 4217)
    pub currency_code: String,

    pub shortfall_policy: ShortfallPolicy,

    /// When true, hand-entered change that exceeds the drawer is an error
    /// instead of being floored at zero.
    pub strict_debit: bool,
}

impl Default for RegisterConfig {
    fn default() -> Self {
        RegisterConfig {
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            register_id: "caja-1".to_string(),
            currency_code: "MXN".to_string(),
            shortfall_policy: ShortfallPolicy::Block,
            strict_debit: true,
        }
    }
}

impl RegisterConfig {
    /// Creates a RegisterConfig from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `CAJA_TENANT_ID`: Override tenant ID
    /// - `CAJA_REGISTER_ID`: Override register ID
    /// - `CAJA_SHORTFALL_POLICY`: `block` or `record`
    /// - `CAJA_STRICT_DEBIT`: `true` / `false`
    ///
    /// Unparseable values keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = RegisterConfig::default();

        if let Some(tenant_id) = lookup("CAJA_TENANT_ID") {
            config.tenant_id = tenant_id;
        }

        if let Some(register_id) = lookup("CAJA_REGISTER_ID") {
            config.register_id = register_id;
        }

        if let Some(policy) = lookup("CAJA_SHORTFALL_POLICY") {
            if let Ok(policy) = policy.parse() {
                config.shortfall_policy = policy;
            }
        }

        if let Some(strict) = lookup("CAJA_STRICT_DEBIT") {
            if let Ok(strict) = strict.trim().parse::<bool>() {
                config.strict_debit = strict;
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = RegisterConfig::default();
        assert_eq!(config.currency_code, "MXN");
        assert_eq!(config.shortfall_policy, ShortfallPolicy::Block);
        assert!(config.strict_debit);
    }

    #[test]
    fn test_lookup_overrides() {
        let env: HashMap<&str, &str> = [
            ("CAJA_REGISTER_ID", "sucursal2-caja3"),
            ("CAJA_SHORTFALL_POLICY", "record"),
            ("CAJA_STRICT_DEBIT", "false"),
        ]
        .into_iter()
        .collect();

        let config = RegisterConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.register_id, "sucursal2-caja3");
        assert_eq!(config.shortfall_policy, ShortfallPolicy::RecordShortfall);
        assert!(!config.strict_debit);
        assert_eq!(config.tenant_id, DEFAULT_TENANT_ID);
    }

    #[test]
    fn test_bad_values_keep_defaults() {
        let config = RegisterConfig::from_lookup(|k| match k {
            "CAJA_SHORTFALL_POLICY" => Some("sometimes".to_string()),
            "CAJA_STRICT_DEBIT" => Some("yes".to_string()),
            _ => None,
        });

        assert_eq!(config.shortfall_policy, ShortfallPolicy::Block);
        assert!(config.strict_debit);
    }
}
