use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use cswatch_common::deadline::{with_deadline, DeadlineError};
use cswatch_primitives::ss58::NetworkTextAddress;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use tracing::*;

use crate::{error::ExplorerError, types::TransfersPage};

/// Paginated access to an account's transfer history.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TransferIndex: Send + Sync + 'static {
    /// Fetches page `page` (0-indexed) of `account`'s transfers.
    async fn get_transfers(
        &self,
        account: &NetworkTextAddress,
        page: u32,
        page_size: u32,
    ) -> Result<TransfersPage, ExplorerError>;
}

/// An `async` client for the block explorer's REST API.
#[derive(Debug, Clone)]
pub struct ExplorerClient {
    base_url: String,
    client: Client,
}

impl ExplorerClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, ExplorerError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ExplorerError::Other(format!("could not create client: {e}")))?;

        let base_url = base_url.trim_end_matches('/').to_string();
        trace!(%base_url, "created explorer client");

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn transfers_url(&self, account: &NetworkTextAddress) -> String {
        format!("{}/accounts/{}/transfers", self.base_url, account)
    }
}

#[async_trait]
impl TransferIndex for ExplorerClient {
    async fn get_transfers(
        &self,
        account: &NetworkTextAddress,
        page: u32,
        page_size: u32,
    ) -> Result<TransfersPage, ExplorerError> {
        let url = self.transfers_url(account);
        trace!(%url, %page, %page_size, "fetching transfers page");

        let resp = self
            .client
            .get(&url)
            .query(&[("page", page), ("page_size", page_size)])
            .send()
            .await?
            .error_for_status()?;

        let body = resp.text().await?;
        serde_json::from_str::<TransfersPage>(&body)
            .map_err(|e| ExplorerError::MalformedResponse(e.to_string()))
    }
}

/// Puts a hard deadline on every call to the wrapped index, on top of
/// whatever timeout the transport has.
#[derive(Debug)]
pub struct DeadlineBound<C> {
    inner: Arc<C>,
    limit: Duration,
}

impl<C> DeadlineBound<C> {
    pub fn new(inner: C, limit: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            limit,
        }
    }
}

#[async_trait]
impl<C: TransferIndex> TransferIndex for DeadlineBound<C> {
    async fn get_transfers(
        &self,
        account: &NetworkTextAddress,
        page: u32,
        page_size: u32,
    ) -> Result<TransfersPage, ExplorerError> {
        let inner = self.inner.clone();
        let account = account.clone();
        let call = async move { inner.get_transfers(&account, page, page_size).await };

        match with_deadline(call, self.limit).await {
            Ok(res) => res,
            Err(DeadlineError::Elapsed { limit_ms }) => Err(ExplorerError::DeadlineExceeded(limit_ms)),
            Err(DeadlineError::Aborted) => Err(ExplorerError::Other("request aborted".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use cswatch_primitives::{address::Address, network::NetworkMode};

    use super::*;

    struct HangingIndex;

    #[async_trait]
    impl TransferIndex for HangingIndex {
        async fn get_transfers(
            &self,
            _account: &NetworkTextAddress,
            _page: u32,
            _page_size: u32,
        ) -> Result<TransfersPage, ExplorerError> {
            std::future::pending().await
        }
    }

    fn some_account() -> NetworkTextAddress {
        NetworkTextAddress::from_account_id(
            &Address::new([0; 20]).to_canonical_account_id(),
            NetworkMode::Mainnet,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_bound_cuts_hanging_call() {
        let bounded = DeadlineBound::new(HangingIndex, Duration::from_millis(50));

        let err = bounded
            .get_transfers(&some_account(), 0, 100)
            .await
            .unwrap_err();
        assert!(matches!(err, ExplorerError::DeadlineExceeded(50)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_bound_passes_results_through() {
        let mut mock = MockTransferIndex::new();
        mock.expect_get_transfers()
            .times(1)
            .returning(|_, page, _| {
                Ok(TransfersPage {
                    page: Some(page),
                    ..Default::default()
                })
            });

        let bounded = DeadlineBound::new(mock, Duration::from_secs(1));
        let page = bounded.get_transfers(&some_account(), 3, 100).await.unwrap();
        assert_eq!(page.page, Some(3));
    }

    #[test]
    fn test_transfers_url() {
        let client =
            ExplorerClient::new("https://explorer.example/api/", Duration::from_secs(5)).unwrap();
        let account = some_account();

        assert_eq!(client.base_url(), "https://explorer.example/api");
        assert_eq!(
            client.transfers_url(&account),
            format!("https://explorer.example/api/accounts/{account}/transfers")
        );
    }
}
