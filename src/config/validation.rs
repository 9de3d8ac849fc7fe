//! Configuration validation.
//!
//! Semantic checks on top of serde's syntactic ones; returns all
//! violations, not just the first, so an operator can fix a config file
//! in one pass.

use crate::config::schema::GatewayConfig;

/// One semantic violation in a loaded config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration before it is accepted into the system.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.network.rpc_url.is_empty() {
        push(&mut errors, "network.rpc_url", "must not be empty");
    }
    if config.network.chain_id == 0 {
        push(&mut errors, "network.chain_id", "must be non-zero");
    }
    if config.network.rpc_timeout_secs == 0 {
        push(&mut errors, "network.rpc_timeout_secs", "must be at least 1");
    }
    // U256 holds at most 78 decimal digits; anything near that ceiling
    // would overflow whole-amount conversion.
    if config.currency.decimals > 36 {
        push(&mut errors, "currency.decimals", "must be 36 or fewer");
    }
    if config.gas.transfer_limit < 21_000 {
        push(
            &mut errors,
            "gas.transfer_limit",
            "below the intrinsic cost of a transfer (21000)",
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn push(errors: &mut Vec<ValidationError>, field: &str, message: &str) {
    errors.push(ValidationError {
        field: field.to_string(),
        message: message.to_string(),
    });
}
