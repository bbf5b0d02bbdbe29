use std::{env, str::FromStr};

/// Parse an `envvar` as `T`. Return `fallback` if env missing or parsing fails.
pub fn parse_env_or<T: FromStr>(envvar: &str, fallback: T) -> T {
    env::var(envvar)
        .ok()
        .and_then(|s| T::from_str(&s).ok())
        .unwrap_or(fallback)
}

/// Reads an optional, non-empty string envvar.
pub fn get_env_nonempty(envvar: &str) -> Option<String> {
    env::var(envvar).ok().filter(|s| !s.is_empty())
}
