//! Raw and decoded log types.

use crate::call::hex_bytes;
use crate::types::{NormalizedValue, Parameters};
use serde::{Deserialize, Serialize};

/// A raw, undecoded log as found in a transaction receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    /// Contract address that emitted the log
    pub address: String,
    /// topics[0] is the event signature hash; additional topics are indexed params.
    pub topics: Vec<String>,
    /// ABI-encoded non-indexed parameters
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    pub transaction_hash: String,
    pub block_number: u64,
    pub log_index: u32,
}

impl RawLog {
    pub fn new(address: impl Into<String>, topics: Vec<String>, data: Vec<u8>) -> Self {
        Self {
            address: address.into(),
            topics,
            data,
            ..Default::default()
        }
    }

    /// topics[0], if present.
    pub fn topic0(&self) -> Option<&str> {
        self.topics.first().map(|s| s.as_str())
    }
}

/// Block range, emitter and topic constraints for a one-shot log query.
///
/// `topics[i]` constrains topic position `i`; `None` matches anything.
/// An empty `addresses` list matches every emitter. Open block bounds
/// are left to the node (`latest`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub addresses: Vec<String>,
    pub topics: Vec<Option<String>>,
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
}

impl LogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.addresses.push(address.into());
        self
    }

    /// Constrain topics[0] to an event signature hash.
    pub fn event(self, topic0: impl Into<String>) -> Self {
        self.topic(0, topic0)
    }

    pub fn topic(mut self, position: usize, topic: impl Into<String>) -> Self {
        if self.topics.len() <= position {
            self.topics.resize(position + 1, None);
        }
        self.topics[position] = Some(topic.into());
        self
    }

    pub fn from_block(mut self, block: u64) -> Self {
        self.from_block = Some(block);
        self
    }

    pub fn to_block(mut self, block: u64) -> Self {
        self.to_block = Some(block);
        self
    }

    /// Whether `log` satisfies every constraint. Hex comparisons ignore case.
    pub fn matches(&self, log: &RawLog) -> bool {
        if !self.addresses.is_empty()
            && !self
                .addresses
                .iter()
                .any(|a| a.eq_ignore_ascii_case(&log.address))
        {
            return false;
        }
        if self.from_block.map_or(false, |from| log.block_number < from)
            || self.to_block.map_or(false, |to| log.block_number > to)
        {
            return false;
        }
        self.topics.iter().enumerate().all(|(i, want)| match want {
            None => true,
            Some(want) => log
                .topics
                .get(i)
                .map_or(false, |got| got.eq_ignore_ascii_case(want)),
        })
    }
}

/// A fully decoded log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedEvent {
    /// Emitting contract (checksummed)
    #[serde(rename = "contract")]
    pub contract_address: String,
    /// Event name, e.g. "Transfer"
    pub name: String,
    /// Canonical signature, e.g. "Transfer(address,address,uint256)"
    pub signature: String,
    /// topics[0] as "0x…" lowercase hex
    #[serde(rename = "topic")]
    pub topic_hex: String,
    /// Decoded parameters in declaration order
    pub parameters: Parameters,
    pub transaction_hash: String,
    pub block_number: u64,
    pub log_index: u32,
}

impl DecodedEvent {
    /// Look up a decoded parameter by name.
    pub fn param(&self, name: &str) -> Option<&NormalizedValue> {
        self.parameters.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_log_deserializes_receipt_shape() {
        let json = r#"{
            "address": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
            "topics": ["0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"],
            "data": "0x00ff",
            "transactionHash": "0xabc",
            "blockNumber": 19000000,
            "logIndex": 3
        }"#;
        let log: RawLog = serde_json::from_str(json).unwrap();
        assert_eq!(log.data, vec![0x00, 0xff]);
        assert_eq!(log.log_index, 3);
        assert!(log.topic0().unwrap().starts_with("0xddf252ad"));
    }

    #[test]
    fn filter_matches_emitter_topics_and_range() {
        let mut log = RawLog::new(
            "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
            vec![crate::TRANSFER_TOPIC.into(), "0x01".into()],
            vec![],
        );
        log.block_number = 100;

        assert!(LogFilter::new().matches(&log));
        assert!(LogFilter::new()
            .address("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48")
            .event(crate::TRANSFER_TOPIC.to_uppercase())
            .from_block(100)
            .to_block(100)
            .matches(&log));

        // Wildcard at topics[0], constraint on topics[1]
        assert!(LogFilter::new().topic(1, "0x01").matches(&log));
        assert!(!LogFilter::new().topic(1, "0x02").matches(&log));
        assert!(!LogFilter::new().topic(2, "0x01").matches(&log));
        assert!(!LogFilter::new().address("0x00").matches(&log));
        assert!(!LogFilter::new().from_block(101).matches(&log));
        assert!(!LogFilter::new().to_block(99).matches(&log));
    }

    #[test]
    fn filter_topic_pads_earlier_positions() {
        let filter = LogFilter::new().topic(2, "0xff");
        assert_eq!(filter.topics, vec![None, None, Some("0xff".to_string())]);
    }

    #[test]
    fn empty_log_has_no_topic0() {
        let log = RawLog::new("0x00", vec![], vec![]);
        assert!(log.topic0().is_none());
    }
}
