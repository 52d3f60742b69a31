//! Deployment environment selection.
//!
//! The environment indicator picks the origin every relative request path is
//! resolved against. Only the exact strings `production` and `test` are
//! recognised; anything else is local development.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Environment variable holding the deployment indicator
pub const ENV_VAR: &str = "COURIER_ENV";

const PRODUCTION_BASE_URL: &str = "http://api.zhufengpeixun.cn";
const TEST_BASE_URL: &str = "http://192.168.20.12:8080";
const DEVELOPMENT_BASE_URL: &str = "http://127.0.0.1:3000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Test,
    #[default]
    Development,
}

impl Environment {
    pub fn from_indicator(indicator: &str) -> Self {
        match indicator {
            "production" => Environment::Production,
            "test" => Environment::Test,
            _ => Environment::Development,
        }
    }

    /// Read the indicator from `COURIER_ENV`, or `None` when it is unset
    pub fn from_env() -> Option<Self> {
        std::env::var(ENV_VAR)
            .ok()
            .map(|value| Self::from_indicator(&value))
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Production => PRODUCTION_BASE_URL,
            Environment::Test => TEST_BASE_URL,
            Environment::Development => DEVELOPMENT_BASE_URL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Test => "test",
            Environment::Development => "development",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_per_environment() {
        assert_eq!(
            Environment::from_indicator("production").base_url(),
            "http://api.zhufengpeixun.cn"
        );
        assert_eq!(
            Environment::from_indicator("test").base_url(),
            "http://192.168.20.12:8080"
        );
        assert_eq!(
            Environment::from_indicator("development").base_url(),
            "http://127.0.0.1:3000"
        );
    }

    #[test]
    fn test_unknown_indicator_is_development() {
        assert_eq!(Environment::from_indicator(""), Environment::Development);
        assert_eq!(Environment::from_indicator("staging"), Environment::Development);
        // Matching is exact
        assert_eq!(Environment::from_indicator("Production"), Environment::Development);
        assert_eq!(Environment::from_indicator(" test"), Environment::Development);
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Environment::Production).expect("serialize");
        assert_eq!(json, "\"production\"");

        let env: Environment = serde_json::from_str("\"test\"").expect("deserialize");
        assert_eq!(env, Environment::Test);
        assert_eq!(env.to_string(), "test");
    }
}
