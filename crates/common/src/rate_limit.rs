//! Recognizes provider errors that mean "slow down" rather than "broken".

/// Fragments various upstream providers put in their quota errors. Matching is
/// plain, case-sensitive substring containment.
const RATE_LIMIT_PATTERNS: &[&str] = &[
    // compute-unit budget exhausted
    "compute units per second capacity",
    "rate limit",
    "rate-limit",
    "project ID request rate exceeded",
    // http 429
    "Too Many Requests",
    "Rate limited",
    "RequestRateLimitExceeded",
];

/// How a provider failure should be treated by whoever retries the call.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RateLimitClass {
    /// Upstream is throttling us, backing off and retrying makes sense.
    Retryable,

    /// Some other failure. Says nothing about whether the call succeeded.
    NotRateLimited,
}

pub fn classify(error_message: &str) -> RateLimitClass {
    if RATE_LIMIT_PATTERNS
        .iter()
        .any(|pat| error_message.contains(pat))
    {
        RateLimitClass::Retryable
    } else {
        RateLimitClass::NotRateLimited
    }
}

pub fn is_rate_limited(error_message: &str) -> bool {
    classify(error_message) == RateLimitClass::Retryable
}
