use super::Backoff;

/// Same delay before every retry.
#[derive(Copy, Clone, Debug)]
pub struct FixedBackoff {
    delay_ms: u64,
}

impl FixedBackoff {
    pub fn new(delay_ms: u64) -> Self {
        Self { delay_ms }
    }
}

impl Backoff for FixedBackoff {
    fn base_delay_ms(&self) -> u64 {
        self.delay_ms
    }

    fn next_delay_ms(&self, _curr_delay_ms: u64) -> u64 {
        self.delay_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_stays_put() {
        let b = FixedBackoff::new(60_000);
        assert_eq!(b.base_delay_ms(), 60_000);
        assert_eq!(b.next_delay_ms(60_000), 60_000);
    }
}
