//! Well-known literals the decoder and classifier depend on.

/// The canonical zero address. Contract-creation transactions are attributed
/// to it, and it is never re-rendered with checksum casing.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// `keccak256("Transfer(address,address,uint256)")`, shared by ERC-20 and ERC-721.
pub const TRANSFER_TOPIC: &str =
    "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";
