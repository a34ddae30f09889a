//! Token standard detection from deployed bytecode.
//!
//! Classification checks fragment sets in the order ERC-721, ERC-20,
//! ERC-1155. The ERC-721 and ERC-20 sets share the token base (Transfer
//! topic + `balanceOf(address)`) and are otherwise independent, so a
//! contract carrying both extensions is reported as ERC-721.

use std::fmt;

use chainabi_registry::InterfaceDefinition;
use serde::{Deserialize, Serialize};

use crate::bytecode::{matches_all, FragmentSet};

/// `chainabi_core::TRANSFER_TOPIC` without its `0x` prefix, as it appears
/// inside bytecode.
pub const TRANSFER_TOPIC_FRAGMENT: &str = "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";
/// keccak256("TransferSingle(address,address,address,uint256,uint256)")
pub const TRANSFER_SINGLE_FRAGMENT: &str =
    "c3d58168c5ae7397731d063d5bbf3d657854427343f4c083240f7aacaa2d0f62";

/// Transfer topic + `balanceOf(address)`
pub const TOKEN_FRAGMENTS: [&str; 2] = [TRANSFER_TOPIC_FRAGMENT, "70a08231"];

/// `ownerOf(uint256)`
pub const ERC721_FRAGMENTS: [&str; 1] = ["6352211e"];

/// `transfer(address,uint256)`, `allowance(address,address)`, `totalSupply()`
pub const ERC20_FRAGMENTS: [&str; 3] = ["a9059cbb", "dd62ed3e", "18160ddd"];

pub const ERC1155_FRAGMENTS: [&str; 7] = [
    TRANSFER_SINGLE_FRAGMENT,
    "00fdd58e", // balanceOf(address,uint256)
    "4e1273f4", // balanceOfBatch(address[],uint256[])
    "a22cb465", // setApprovalForAll(address,bool)
    "e985e9c5", // isApprovedForAll(address,address)
    "f242432a", // safeTransferFrom(address,address,uint256,uint256,bytes)
    "2eb2c2d6", // safeBatchTransferFrom(address,address,uint256[],uint256[],bytes)
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenStandard {
    #[serde(rename = "ERC721")]
    Erc721,
    #[serde(rename = "ERC20")]
    Erc20,
    #[serde(rename = "ERC1155")]
    Erc1155,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl TokenStandard {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Erc721 => "ERC721",
            Self::Erc20 => "ERC20",
            Self::Erc1155 => "ERC1155",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn is_token(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for TokenStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn token_set() -> FragmentSet {
    FragmentSet::new(TOKEN_FRAGMENTS)
}

pub fn erc721_set() -> FragmentSet {
    token_set().extend(ERC721_FRAGMENTS)
}

pub fn erc20_set() -> FragmentSet {
    token_set().extend(ERC20_FRAGMENTS)
}

pub fn erc1155_set() -> FragmentSet {
    FragmentSet::new(ERC1155_FRAGMENTS)
}

/// Transfer topic and `balanceOf(address)` are both present.
pub fn is_token(bytecode: &str) -> bool {
    matches_all(bytecode, &TOKEN_FRAGMENTS)
}

pub fn is_erc721(bytecode: &str) -> bool {
    erc721_set().matches(bytecode)
}

pub fn is_erc20(bytecode: &str) -> bool {
    erc20_set().matches(bytecode)
}

pub fn is_erc1155(bytecode: &str) -> bool {
    erc1155_set().matches(bytecode)
}

/// Classify deployed bytecode (hex, with or without `0x`).
pub fn classify(bytecode: &str) -> TokenStandard {
    if is_erc721(bytecode) {
        TokenStandard::Erc721
    } else if is_erc20(bytecode) {
        TokenStandard::Erc20
    } else if is_erc1155(bytecode) {
        TokenStandard::Erc1155
    } else {
        TokenStandard::Unknown
    }
}

/// Every selector and topic of `interface` occurs in `bytecode`.
pub fn validate_bytecode(bytecode: &str, interface: &InterfaceDefinition) -> bool {
    FragmentSet::from_interface(interface).matches(bytecode)
}
