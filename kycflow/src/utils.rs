//! Common utilities and helper functions.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static ENV_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{env:([^}]*)\}").expect("static pattern"));

/// Replaces `${env:VAR_NAME}` placeholders with environment values.
///
/// Unset variables expand to an empty string. Anything that is not a
/// complete `env:` placeholder is left as written.
///
/// # Example
///
/// ```rust
/// use kycflow::utils::replace_env_placeholders;
///
/// unsafe { std::env::set_var("KYC_HOME", "/srv/kyc"); }
/// assert_eq!(replace_env_placeholders("${env:KYC_HOME}/forms"), "/srv/kyc/forms");
/// ```
pub fn replace_env_placeholders(input: &str) -> String {
    ENV_PLACEHOLDER
        .replace_all(input, |caps: &Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

/// Splits a `field=value` assignment given on the command line.
///
/// Only the first `=` separates; the value may contain more of them and
/// may be empty.
pub fn parse_assignment(s: &str) -> anyhow::Result<(String, String)> {
    let Some((id, value)) = s.split_once('=') else {
        bail!("expected FIELD=VALUE, got `{s}`");
    };
    let id = id.trim();
    if id.is_empty() {
        bail!("missing field id in `{s}`");
    }
    Ok((id.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_replace_env_placeholders() {
        unsafe {
            env::set_var("KYCFLOW_TEST_DIR", "/home/test");
        }
        assert_eq!(replace_env_placeholders("${env:KYCFLOW_TEST_DIR}"), "/home/test");
        assert_eq!(
            replace_env_placeholders("${env:KYCFLOW_TEST_DIR}/config"),
            "/home/test/config"
        );
        assert_eq!(replace_env_placeholders("${env:KYCFLOW_NOT_SET}"), "");
        assert_eq!(replace_env_placeholders("config"), "config");
    }

    #[test]
    fn test_malformed_placeholders_untouched() {
        assert_eq!(replace_env_placeholders("${env:VAR"), "${env:VAR");
        assert_eq!(replace_env_placeholders("${other:VAR}"), "${other:VAR}");
        assert_eq!(replace_env_placeholders("$env:VAR}"), "$env:VAR}");
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("first_name=Sam").unwrap(),
            ("first_name".to_string(), "Sam".to_string())
        );
        assert_eq!(
            parse_assignment("note=a=b").unwrap(),
            ("note".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_assignment("age=").unwrap(),
            ("age".to_string(), String::new())
        );
        assert!(parse_assignment("age").is_err());
        assert!(parse_assignment("=40").is_err());
    }
}
