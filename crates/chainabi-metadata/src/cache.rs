//! `MetadataCache`: per-address contract metadata with single-flight
//! resolution.
//!
//! Entries live in a sharded `DashMap` as `Arc<OnceCell<…>>`. The shard lock
//! is held only long enough to fetch or insert the cell; resolution then runs
//! on the cell itself, so concurrent lookups of one address share a single
//! resolution while unrelated addresses proceed independently.
//!
//! A resolution that fails or times out removes its cell; one that is
//! dropped leaves the cell empty. Either way the next caller starts over.

use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{Address, U256};
use chainabi_core::{ChainClient, ClientError, DecodeError};
use chainabi_evm::{classify, ContractDecoder, NormalizerOptions, TokenStandard};
use chainabi_registry::{InterfaceDefinition, StandardInterfaces};
use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::MetadataConfig;
use crate::error::MetadataError;
use crate::metadata::{
    decode_decimals, decode_text, ContractMetadata, DECIMALS_SELECTOR, NAME_SELECTOR,
    SYMBOL_SELECTOR,
};

type Slot = Arc<OnceCell<Arc<ContractMetadata>>>;

/// Lookup counters since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

pub struct MetadataCache {
    client: Option<Arc<dyn ChainClient>>,
    config: MetadataConfig,
    interfaces: StandardInterfaces,
    entries: DashMap<Address, Slot>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MetadataCache {
    /// Create a cache. With `client = None` only seeded entries are served
    /// and every resolution fails with `ClientError::NotConfigured`.
    pub fn new(
        client: Option<Arc<dyn ChainClient>>,
        config: MetadataConfig,
    ) -> Result<Self, MetadataError> {
        Ok(Self {
            client,
            config,
            interfaces: StandardInterfaces::load()?,
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    pub fn with_client(client: Arc<dyn ChainClient>) -> Result<Self, MetadataError> {
        Self::new(Some(client), MetadataConfig::default())
    }

    pub fn offline() -> Result<Self, MetadataError> {
        Self::new(None, MetadataConfig::default())
    }

    pub fn config(&self) -> &MetadataConfig {
        &self.config
    }

    pub fn interfaces(&self) -> &StandardInterfaces {
        &self.interfaces
    }

    // ─── Lookup ──────────────────────────────────────────────────────────────

    /// Cached metadata for `address`, resolving it through the chain client
    /// on first use.
    pub async fn get(&self, address: &str) -> Result<Arc<ContractMetadata>, MetadataError> {
        let key = parse_address(address)?;
        let slot: Slot = Arc::clone(self.entries.entry(key).or_default().value());

        if let Some(found) = slot.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(found));
        }

        let resolved = slot
            .get_or_try_init(|| async {
                self.misses.fetch_add(1, Ordering::Relaxed);
                self.resolve(key).await
            })
            .await;
        match resolved {
            Ok(meta) => Ok(Arc::clone(meta)),
            Err(e) => {
                // Drop the empty cell unless a concurrent caller has
                // since filled it.
                self.entries
                    .remove_if(&key, |_, cell| !cell.initialized());
                Err(e)
            }
        }
    }

    /// Cached metadata without touching the chain.
    pub fn get_cached(&self, address: &str) -> Option<Arc<ContractMetadata>> {
        let key = parse_address(address).ok()?;
        self.cached(&key)
    }

    fn cached(&self, key: &Address) -> Option<Arc<ContractMetadata>> {
        self.entries
            .get(key)
            .and_then(|slot| slot.value().get().cloned())
    }

    pub fn contains(&self, address: &str) -> bool {
        self.get_cached(address).is_some()
    }

    /// Seed or overwrite an entry.
    pub fn insert(&self, metadata: ContractMetadata) -> Result<(), MetadataError> {
        let key = parse_address(&metadata.address)?;
        let interface = metadata
            .interface
            .clone()
            .unwrap_or_else(|| Arc::clone(self.interface_for(metadata.standard)));
        let metadata = ContractMetadata {
            address: key.to_checksum(None),
            interface: Some(interface),
            ..metadata
        };
        self.entries
            .insert(key, Arc::new(OnceCell::new_with(Some(Arc::new(metadata)))));
        Ok(())
    }

    /// Number of resolved entries.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    // ─── Decoder binding ─────────────────────────────────────────────────────

    /// A decoder bound to the interface matching the contract's standard.
    ///
    /// The address must already be cached. A decoder for the zero address
    /// is not bound to a contract, so it accepts logs from any emitter.
    pub fn decoder_for(&self, address: &str) -> Result<ContractDecoder, MetadataError> {
        let key = parse_address(address)?;
        let options = NormalizerOptions {
            debug: self.config.debug,
        };
        let meta = self.cached(&key).ok_or_else(|| MetadataError::NotFound {
            address: key.to_checksum(None),
        })?;
        let interface = match &meta.interface {
            Some(assigned) => Arc::clone(assigned),
            None => Arc::clone(self.interface_for(meta.standard)),
        };
        let decoder = ContractDecoder::new(interface)
            .with_verified(meta.verified)
            .with_options(options);
        if key.is_zero() {
            Ok(decoder)
        } else {
            Ok(decoder.with_contract(meta.address.clone()))
        }
    }

    // ─── Chain reads ─────────────────────────────────────────────────────────

    /// `balanceOf(holder)` on `token`, encoded from the token's assigned
    /// interface (ERC-20 when the token is not cached).
    pub async fn balance_of(&self, token: &str, holder: &str) -> Result<U256, MetadataError> {
        let token_key = parse_address(token)?;
        let holder_key = parse_address(holder)?;

        let interface = match self.cached(&token_key) {
            Some(meta) => match &meta.interface {
                Some(assigned) => Arc::clone(assigned),
                None => Arc::clone(self.interface_for(meta.standard)),
            },
            None => Arc::clone(&self.interfaces.erc20),
        };
        let method = interface
            .method("balanceOf")
            .ok_or_else(|| DecodeError::NoMatch {
                kind: "method",
                id: "balanceOf".into(),
            })?;

        let mut data = method.selector.to_vec();
        data.extend(DynSolValue::Tuple(vec![DynSolValue::Address(holder_key)]).abi_encode_params());

        let client = self.client()?;
        let ret = timed(
            self.config.call_timeout_ms,
            client.call(&token_key.to_checksum(None), &data),
        )
        .await?;

        let decoded = DynSolType::Tuple(method.output_types())
            .abi_decode_params(&ret)
            .map_err(|e| DecodeError::AbiDecodeFailed {
                signature: method.signature.clone(),
                reason: e.to_string(),
            })?;
        match decoded {
            DynSolValue::Tuple(vals) => match vals.first() {
                Some(DynSolValue::Uint(balance, _)) => Ok(*balance),
                _ => Err(DecodeError::AbiDecodeFailed {
                    signature: method.signature.clone(),
                    reason: "expected a uint256 return".into(),
                }
                .into()),
            },
            _ => Err(DecodeError::AbiDecodeFailed {
                signature: method.signature.clone(),
                reason: "expected a tuple return".into(),
            }
            .into()),
        }
    }

    /// ERC-20 and ERC-721 get their own interface; everything else the
    /// merged fallback.
    fn interface_for(&self, standard: TokenStandard) -> &Arc<InterfaceDefinition> {
        match standard {
            TokenStandard::Erc20 => &self.interfaces.erc20,
            TokenStandard::Erc721 => &self.interfaces.erc721,
            TokenStandard::Erc1155 | TokenStandard::Unknown => &self.interfaces.fallback,
        }
    }

    fn client(&self) -> Result<&Arc<dyn ChainClient>, ClientError> {
        self.client.as_ref().ok_or(ClientError::NotConfigured)
    }

    async fn resolve(&self, address: Address) -> Result<Arc<ContractMetadata>, MetadataError> {
        let client = self.client()?;
        let checksummed = address.to_checksum(None);
        let ms = self.config.call_timeout_ms;

        let code = timed(ms, client.code_at(&checksummed)).await?;
        let standard = classify(&hex::encode(&code));

        let mut meta = ContractMetadata::new(checksummed.clone(), standard)
            .with_interface(Arc::clone(self.interface_for(standard)));
        meta.verified = true;
        if !code.is_empty() {
            meta = meta.with_bytecode(&code);
        }
        if !code.is_empty() {
            meta.name = self
                .view_call(client, &checksummed, NAME_SELECTOR)
                .await?
                .and_then(|ret| decode_text(&ret));
            meta.symbol = self
                .view_call(client, &checksummed, SYMBOL_SELECTOR)
                .await?
                .and_then(|ret| decode_text(&ret));
            meta.decimals = self
                .view_call(client, &checksummed, DECIMALS_SELECTOR)
                .await?
                .and_then(|ret| decode_decimals(&ret));
        }

        info!(
            address = %checksummed,
            standard = %standard,
            symbol = meta.symbol.as_deref().unwrap_or("-"),
            client = client.name(),
            "resolved contract metadata"
        );
        Ok(Arc::new(meta))
    }

    /// A reverted view call yields `None`; an unreachable client fails.
    async fn view_call(
        &self,
        client: &Arc<dyn ChainClient>,
        address: &str,
        selector: [u8; 4],
    ) -> Result<Option<Vec<u8>>, MetadataError> {
        match timed(self.config.call_timeout_ms, client.call(address, &selector)).await {
            Ok(ret) => Ok(Some(ret)),
            Err(e) if !e.is_unavailable() => {
                debug!(
                    address,
                    selector = %hex::encode(selector),
                    error = %e,
                    "view call failed"
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Bound a chain-client call by `ms` milliseconds.
pub(crate) async fn timed<T, F>(ms: u64, call: F) -> Result<T, ClientError>
where
    F: Future<Output = Result<T, ClientError>>,
{
    match tokio::time::timeout(Duration::from_millis(ms), call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(timeout_ms = ms, "chain client call timed out");
            Err(ClientError::Timeout { ms })
        }
    }
}

fn parse_address(address: &str) -> Result<Address, MetadataError> {
    Address::from_str(address.trim()).map_err(|_| MetadataError::InvalidAddress(address.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainabi_core::ZERO_ADDRESS;

    #[test]
    fn parse_address_accepts_any_case() {
        let a = parse_address("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48").unwrap();
        let b = parse_address("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48").unwrap();
        assert_eq!(a, b);
        assert!(parse_address("0x1234").is_err());
    }

    #[tokio::test]
    async fn offline_cache_serves_seeded_entries() {
        let cache = MetadataCache::offline().unwrap();
        cache
            .insert(
                ContractMetadata::new("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2", TokenStandard::Erc20)
                    .with_symbol("WETH"),
            )
            .unwrap();

        let meta = cache.get("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2").await.unwrap();
        assert_eq!(meta.address, "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
        assert_eq!(meta.symbol.as_deref(), Some("WETH"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 0 });
    }

    #[tokio::test]
    async fn unset_client_fails_fast() {
        let cache = MetadataCache::offline().unwrap();
        let err = cache
            .get("0x6B175474E89094C44Da98b954EedeAC495271d0F")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MetadataError::CollaboratorUnavailable(ClientError::NotConfigured)
        ));
        assert!(cache.is_empty());
        assert!(!cache.contains("0x6B175474E89094C44Da98b954EedeAC495271d0F"));
        assert!(cache.entries.is_empty());
        assert_eq!(cache.stats(), CacheStats { hits: 0, misses: 1 });
    }

    #[test]
    fn decoder_for_zero_address_requires_an_entry() {
        let cache = MetadataCache::offline().unwrap();
        let err = cache.decoder_for(ZERO_ADDRESS).unwrap_err();
        assert!(matches!(err, MetadataError::NotFound { .. }));
    }

    #[test]
    fn decoder_for_zero_address_is_unbound() {
        let cache = MetadataCache::offline().unwrap();
        cache
            .insert(ContractMetadata::new(ZERO_ADDRESS, TokenStandard::Erc20))
            .unwrap();
        let decoder = cache.decoder_for(ZERO_ADDRESS).unwrap();
        assert!(decoder.contract_address().is_none());
        assert!(Arc::ptr_eq(decoder.interface(), &cache.interfaces().erc20));

        cache
            .insert(ContractMetadata::new(ZERO_ADDRESS, TokenStandard::Unknown))
            .unwrap();
        let fallback = cache.decoder_for(ZERO_ADDRESS).unwrap();
        assert!(fallback.contract_address().is_none());
        assert!(Arc::ptr_eq(fallback.interface(), &cache.interfaces().fallback));
    }

    #[test]
    fn decoder_for_uncached_is_not_found() {
        let cache = MetadataCache::offline().unwrap();
        let err = cache
            .decoder_for("0x6B175474E89094C44Da98b954EedeAC495271d0F")
            .unwrap_err();
        assert!(matches!(err, MetadataError::NotFound { .. }));
    }

    #[test]
    fn decoder_for_picks_interface_by_standard() {
        let cache = MetadataCache::offline().unwrap();
        let nft = "0xBC4CA0EdA7647A8aB7C2061c2E118A18a936f13D";
        let coin = "0x6B175474E89094C44Da98b954EedeAC495271d0F";
        cache.insert(ContractMetadata::new(nft, TokenStandard::Erc721)).unwrap();
        cache.insert(ContractMetadata::new(coin, TokenStandard::Erc20)).unwrap();

        let d721 = cache.decoder_for(nft).unwrap();
        assert!(Arc::ptr_eq(d721.interface(), &cache.interfaces().erc721));
        assert_eq!(d721.contract_address(), Some(nft));
        assert!(!d721.is_verified());

        let d20 = cache.decoder_for(coin).unwrap();
        assert!(Arc::ptr_eq(d20.interface(), &cache.interfaces().erc20));
    }

    #[test]
    fn pinned_interface_overrides_standard() {
        let cache = MetadataCache::offline().unwrap();
        let weth = Arc::new(
            InterfaceDefinition::parse(chainabi_registry::builtin::WETH_ABI).unwrap(),
        );
        let addr = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";
        cache
            .insert(ContractMetadata::new(addr, TokenStandard::Erc20).with_interface(Arc::clone(&weth)))
            .unwrap();

        let decoder = cache.decoder_for(addr).unwrap();
        assert!(Arc::ptr_eq(decoder.interface(), &weth));
        assert!(decoder.interface().method("deposit").is_some());
    }

    #[tokio::test]
    async fn timed_maps_elapsed_to_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, ClientError>(())
        };
        let err = timed(10, slow).await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout { ms: 10 }));
    }
}
