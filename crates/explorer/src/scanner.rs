//! Finds every block an address moved funds in.

use std::{collections::BTreeSet, time::Duration};

use cswatch_common::retry::{policies::FixedBackoff, retry_with_backoff};
use cswatch_config::explorer::ExplorerConfig;
use cswatch_primitives::{address::Address, network::NetworkMode, ss58::NetworkTextAddress};
use cswatch_tasks::ShutdownGuard;
use tokio::{
    sync::Mutex,
    time::{sleep_until, Instant},
};
use tracing::*;

use crate::{client::TransferIndex, error::ScanError};

#[derive(Clone, Debug)]
pub struct ScannerConfig {
    pub page_size: u32,

    /// Minimum spacing between two requests issued by one scanner.
    pub rate_floor: Duration,

    /// Retries after the first failed attempt. 6 gives 7 attempts in total.
    pub max_retries: u16,

    /// Pause before a failed scan is retried.
    pub retry_delay_ms: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        (&ExplorerConfig::default()).into()
    }
}

impl From<&ExplorerConfig> for ScannerConfig {
    fn from(value: &ExplorerConfig) -> Self {
        Self {
            page_size: value.page_size,
            rate_floor: Duration::from_millis(value.rate_floor_ms),
            max_retries: value.max_retries,
            retry_delay_ms: value.retry_delay_ms,
        }
    }
}

/// Pages through an address's transfers and collects the block heights.
///
/// All requests made through one scanner, across concurrent scans, are spaced
/// at least `rate_floor` apart. Separate scanners don't throttle each other.
pub struct ActivityScanner<C> {
    client: C,
    network: NetworkMode,
    config: ScannerConfig,

    /// When the last request went out. Held across the wait so concurrent
    /// scans queue up behind each other.
    last_request: Mutex<Option<Instant>>,
}

impl<C: TransferIndex> ActivityScanner<C> {
    pub fn new(client: C, network: NetworkMode, config: ScannerConfig) -> Self {
        Self {
            client,
            network,
            config,
            last_request: Mutex::new(None),
        }
    }

    pub fn network(&self) -> NetworkMode {
        self.network
    }

    /// Returns the sorted, deduplicated heights of blocks with transfers
    /// involving `address`, limited to heights at or above `start_block` if
    /// given.
    ///
    /// A failed attempt is retried from scratch after `retry_delay_ms`, up to
    /// `max_retries` times.
    pub async fn scan(
        &self,
        address: &Address,
        start_block: Option<u64>,
    ) -> Result<Vec<u64>, ScanError> {
        let account =
            NetworkTextAddress::from_account_id(&address.to_canonical_account_id(), self.network);
        let account = &account;
        debug!(%address, %account, ?start_block, "scanning transfer activity");

        let backoff = FixedBackoff::new(self.config.retry_delay_ms);
        let max_retries = self.config.max_retries;

        retry_with_backoff("activity-scan", max_retries, &backoff, |attempt| async move {
            self.scan_once(account, start_block)
                .instrument(debug_span!("scan_attempt", %attempt))
                .await
        })
        .await
        .map_err(|e| ScanError::RetriesExhausted {
            attempts: u32::from(max_retries) + 1,
            source: Box::new(e),
        })
    }

    /// [`Self::scan`], giving up early with [`ScanError::Cancelled`] once
    /// shutdown is signalled.
    pub async fn scan_until(
        &self,
        address: &Address,
        start_block: Option<u64>,
        shutdown: &ShutdownGuard,
    ) -> Result<Vec<u64>, ScanError> {
        tokio::select! {
            res = self.scan(address, start_block) => res,
            _ = shutdown.wait_for_shutdown() => {
                info!(%address, "activity scan cancelled");
                Err(ScanError::Cancelled)
            }
        }
    }

    async fn scan_once(
        &self,
        account: &NetworkTextAddress,
        start_block: Option<u64>,
    ) -> Result<Vec<u64>, ScanError> {
        let page_size = self.config.page_size;
        let mut heights = BTreeSet::new();
        let mut page = 0;

        loop {
            self.wait_for_rate_floor().await;

            let resp = self
                .client
                .get_transfers(account, page, page_size)
                .await
                .inspect_err(|e| {
                    if e.is_rate_limited() {
                        warn!(%account, %page, "explorer is rate limiting us");
                    }
                })?;

            let Some(items) = resp.items else {
                if resp.total == Some(0) && resp.page.unwrap_or(page) == 0 {
                    debug!(%account, "no transfer activity");
                    break;
                }
                return Err(ScanError::MalformedPage {
                    page,
                    reason: format!("no items (total {:?}, page {:?})", resp.total, resp.page),
                });
            };

            let page_min = items.iter().map(|i| i.block_height()).min();
            heights.extend(items.iter().map(|i| i.block_height()));
            trace!(%account, %page, count = items.len(), ?page_min, "got transfers page");

            if items.is_empty() || items.len() < page_size as usize {
                break;
            }

            // Pages run newest to oldest, nothing further back is wanted.
            if let (Some(start), Some(min)) = (start_block, page_min) {
                if min < start {
                    break;
                }
            }

            page += 1;
        }

        // The last page read may straddle the start block.
        let heights = match start_block {
            Some(start) => heights.split_off(&start),
            None => heights,
        };

        Ok(heights.into_iter().collect())
    }

    async fn wait_for_rate_floor(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let next = prev + self.config.rate_floor;
            if next > Instant::now() {
                sleep_until(next).await;
            }
        }
        *last = Some(Instant::now());
    }
}
