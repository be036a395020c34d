use anyhow::Result;
use regex::Regex;
use std::env;
use tracing::{debug, warn};

const ENV_VAR_PATTERN: &str = r"\$\{(\w+)\}";

/// Substitute environment variables written as `${VAR_NAME}`
///
/// Unset variables keep their placeholder so validation can report them.
pub fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(ENV_VAR_PATTERN)?;
    let mut result = content.to_string();
    let mut missing_vars = Vec::new();

    for caps in re.captures_iter(content) {
        let (Some(placeholder), Some(var_name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        match env::var(var_name.as_str()) {
            Ok(value) => {
                debug!("Substituting environment variable: {}", var_name.as_str());
                result = result.replace(placeholder.as_str(), &value);
            }
            Err(_) => {
                warn!("Environment variable '{}' not set", var_name.as_str());
                missing_vars.push(var_name.as_str().to_string());
            }
        }
    }

    if !missing_vars.is_empty() {
        debug!(
            "Environment variables not set (may fail validation): {:?}",
            missing_vars
        );
    }

    Ok(result)
}

/// Check if a string contains unresolved environment variable placeholders
pub fn has_unresolved_env_vars(content: &str) -> bool {
    Regex::new(ENV_VAR_PATTERN)
        .map(|re| re.is_match(content))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitutes_set_variable() {
        env::set_var("RP_TEST_ASSET_ENDPOINT", "http://assets:8090");
        let out = substitute_env_vars("endpoint: ${RP_TEST_ASSET_ENDPOINT}").unwrap();
        assert_eq!(out, "endpoint: http://assets:8090");
        assert!(!has_unresolved_env_vars(&out));
    }

    #[test]
    fn test_keeps_unset_placeholder() {
        let out = substitute_env_vars("endpoint: ${RP_TEST_DEFINITELY_UNSET_VAR}").unwrap();
        assert_eq!(out, "endpoint: ${RP_TEST_DEFINITELY_UNSET_VAR}");
        assert!(has_unresolved_env_vars(&out));
    }
}
