/// Configuration errors raised by the shell before any provider is contacted.
#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    #[error("{0} environment variable not set")]
    MissingEnv(String),

    #[error("Invalid value for {name}: {message}")]
    InvalidEnv { name: String, message: String },

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Read a required environment variable.
pub fn require_env(name: &str) -> Result<String, Error> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::MissingEnv(name.to_string()))
}

/// Read an optional environment variable and parse it.
pub fn parse_env<T>(name: &str) -> Result<Option<T>, Error>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => value
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::InvalidEnv {
                name: name.to_string(),
                message: e.to_string(),
            }),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_env_message() {
        let err = require_env("APIWRAP_TEST_SURELY_UNSET_VARIABLE").unwrap_err();
        assert_eq!(
            err.to_string(),
            "APIWRAP_TEST_SURELY_UNSET_VARIABLE environment variable not set"
        );
    }

    #[test]
    fn test_parse_env_unset_is_none() {
        let value: Option<u32> = parse_env("APIWRAP_TEST_SURELY_UNSET_NUMBER").unwrap();
        assert_eq!(value, None);
    }
}
