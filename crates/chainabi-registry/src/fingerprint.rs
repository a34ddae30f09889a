//! Keccak-256 fingerprints of canonical ABI signatures.
//!
//! A method selector is the first four bytes of
//! `keccak256("name(type1,type2,...)")`; an event topic is the full 32-byte
//! hash of the event's canonical signature:
//!   keccak256("Transfer(address,address,uint256)")
//!   → 0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef

use tiny_keccak::{Hasher, Keccak};

/// keccak256 of arbitrary bytes.
pub fn keccak256(data: impl AsRef<[u8]>) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data.as_ref());
    hasher.finalize(&mut output);
    output
}

/// 4-byte method selector of a canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// 32-byte event topic of a canonical signature.
pub fn topic(signature: &str) -> [u8; 32] {
    keccak256(signature.as_bytes())
}

/// Hex rendering of a selector or topic, `0x`-prefixed lowercase.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse a `0x`-prefixed 32-byte topic. Returns `None` if malformed.
pub fn parse_topic(topic: &str) -> Option<[u8; 32]> {
    let digits = topic.strip_prefix("0x").unwrap_or(topic);
    if digits.len() != 64 {
        return None;
    }
    let mut out = [0u8; 32];
    hex::decode_to_slice(digits, &mut out).ok()?;
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erc20_transfer_topic() {
        assert_eq!(
            to_hex(&topic("Transfer(address,address,uint256)")),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn delegate_changed_topic() {
        assert_eq!(
            to_hex(&topic("DelegateChanged(address,address,address)")),
            "0x3134e8a2e6d97e929a7e54011ea5485d7d196dd5f0ba4d4ef95803e8e3fc257f"
        );
    }

    #[test]
    fn uniswap_v3_swap_topic() {
        let sig = "Swap(address,address,int256,int256,uint160,uint128,int24)";
        assert_eq!(
            to_hex(&topic(sig)),
            "0xc42079f94a6350d7e6235f29174924f928cc2ac818eb64fed8004e115fbcca67"
        );
    }

    #[test]
    fn transfer_selector() {
        assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(to_hex(&selector("balanceOf(address)")), "0x70a08231");
    }

    #[test]
    fn parse_topic_rejects_short_input() {
        assert!(parse_topic("0xddf252ad").is_none());
        assert!(parse_topic("0xzz").is_none());
        let t = parse_topic("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");
        assert_eq!(t.map(|t| t[0]), Some(0xdd));
    }
}
