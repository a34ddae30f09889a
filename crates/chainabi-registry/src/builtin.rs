//! Interface definitions bundled with the crate.

use std::sync::Arc;

use chainabi_core::RegistryError;

use crate::interface::InterfaceDefinition;

pub const ERC20_ABI: &str = include_str!("../abis/erc20.json");
pub const ERC721_ABI: &str = include_str!("../abis/erc721.json");
pub const ERC1155_ABI: &str = include_str!("../abis/erc1155.json");
pub const WETH_ABI: &str = include_str!("../abis/weth.json");
pub const ERC20_VOTES_ABI: &str = include_str!("../abis/erc20votes.json");

/// `(name, json)` pairs in default search order.
pub const BUILTIN_ABIS: [(&str, &str); 5] = [
    ("erc20", ERC20_ABI),
    ("erc721", ERC721_ABI),
    ("erc1155", ERC1155_ABI),
    ("weth", WETH_ABI),
    ("erc20votes", ERC20_VOTES_ABI),
];

/// The three definitions a contract decoder is assigned from after
/// classification.
#[derive(Debug, Clone)]
pub struct StandardInterfaces {
    pub erc20: Arc<InterfaceDefinition>,
    pub erc721: Arc<InterfaceDefinition>,
    /// `merge(erc20, erc721)`, used for contracts of any other kind
    pub fallback: Arc<InterfaceDefinition>,
}

impl StandardInterfaces {
    pub fn load() -> Result<Self, RegistryError> {
        let erc20 = InterfaceDefinition::parse(ERC20_ABI)?;
        let erc721 = InterfaceDefinition::parse(ERC721_ABI)?;
        let fallback = erc20.merge(&erc721);
        Ok(Self {
            erc20: Arc::new(erc20),
            erc721: Arc::new(erc721),
            fallback: Arc::new(fallback),
        })
    }
}
