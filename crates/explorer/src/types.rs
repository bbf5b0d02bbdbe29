use serde::{Deserialize, Serialize};

/// One page of `/accounts/{address}/transfers`.
///
/// `items` is missing entirely (rather than empty) on some responses, the
/// scanner tells those apart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransfersPage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<TransferItem>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferItem {
    pub indexer: IndexerInfo,
}

impl TransferItem {
    pub fn at_height(block_height: u64) -> Self {
        Self {
            indexer: IndexerInfo { block_height },
        }
    }

    pub fn block_height(&self) -> u64 {
        self.indexer.block_height
    }
}

/// Where the indexer saw the transfer. Other fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexerInfo {
    pub block_height: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transfers_page() {
        let raw = r#"{
            "items": [
                {
                    "indexer": { "blockHeight": 1204, "blockHash": "0xab", "eventIndex": 3 },
                    "from": "d1aaa",
                    "to": "d1bbb",
                    "balance": "1000000000000"
                },
                { "indexer": { "blockHeight": 1190 } }
            ],
            "page": 0,
            "pageSize": 100,
            "total": 2
        }"#;

        let page: TransfersPage = serde_json::from_str(raw).unwrap();
        let heights: Vec<_> = page
            .items
            .as_ref()
            .unwrap()
            .iter()
            .map(TransferItem::block_height)
            .collect();
        assert_eq!(heights, vec![1204, 1190]);
        assert_eq!(page.total, Some(2));
        assert_eq!(page.page, Some(0));
        assert_eq!(page.page_size, Some(100));
    }

    #[test]
    fn test_parse_page_without_items() {
        let page: TransfersPage = serde_json::from_str(r#"{"total":0,"page":0}"#).unwrap();
        assert_eq!(page.items, None);
        assert_eq!(page.total, Some(0));
    }
}
