//! Metadata cache behaviour against an in-memory chain.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_core::dyn_abi::DynSolValue;
use alloy_primitives::U256;
use async_trait::async_trait;
use chainabi_core::{
    ChainClient, ClientError, LogFilter, RawLog, RawTransaction, TRANSFER_TOPIC, ZERO_ADDRESS,
};
use chainabi_evm::TokenStandard;
use chainabi_metadata::{ContractMetadata, MetadataCache, MetadataConfig, MetadataError, TxScanner};

const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
const HOLDER: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";
const DAI: &str = "0x6B175474E89094C44Da98b954EedeAC495271d0F";

// ─── Mock chain ───────────────────────────────────────────────────────────────

struct MockChain {
    code: Vec<u8>,
    name: Result<Vec<u8>, ClientError>,
    symbol: Result<Vec<u8>, ClientError>,
    decimals: Result<Vec<u8>, ClientError>,
    balance: U256,
    delay: Duration,
    code_fetches: AtomicUsize,
    view_calls: AtomicUsize,
    last_call: Mutex<Vec<u8>>,
    tx: Option<RawTransaction>,
    logs: Vec<RawLog>,
}

fn erc20_code() -> Vec<u8> {
    let hex = format!(
        "6080604052{}63{}63{}63{}63{}00",
        &TRANSFER_TOPIC[2..],
        "70a08231",
        "a9059cbb",
        "dd62ed3e",
        "18160ddd"
    );
    hex::decode(hex).unwrap()
}

fn abi_string(s: &str) -> Vec<u8> {
    DynSolValue::Tuple(vec![DynSolValue::String(s.into())]).abi_encode_params()
}

fn abi_uint(v: U256) -> Vec<u8> {
    DynSolValue::Tuple(vec![DynSolValue::Uint(v, 256)]).abi_encode_params()
}

impl MockChain {
    fn usdc() -> Self {
        Self {
            code: erc20_code(),
            name: Ok(abi_string("USD Coin")),
            symbol: Ok(abi_string("USDC")),
            decimals: Ok(abi_uint(U256::from(6u8))),
            balance: U256::from(1_234_567u64),
            delay: Duration::ZERO,
            code_fetches: AtomicUsize::new(0),
            view_calls: AtomicUsize::new(0),
            last_call: Mutex::new(vec![]),
            tx: None,
            logs: vec![],
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn code_at(&self, _address: &str) -> Result<Vec<u8>, ClientError> {
        self.code_fetches.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.code.clone())
    }

    async fn call(&self, _to: &str, data: &[u8]) -> Result<Vec<u8>, ClientError> {
        self.view_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_call.lock().unwrap() = data.to_vec();
        match &data[..4] {
            [0x06, 0xfd, 0xde, 0x03] => self.name.clone(),
            [0x95, 0xd8, 0x9b, 0x41] => self.symbol.clone(),
            [0x31, 0x3c, 0xe5, 0x67] => self.decimals.clone(),
            [0x70, 0xa0, 0x82, 0x31] => Ok(abi_uint(self.balance)),
            _ => Err(ClientError::Rpc {
                code: 3,
                message: "execution reverted".into(),
            }),
        }
    }

    async fn transaction_by_hash(&self, _hash: &str) -> Result<Option<RawTransaction>, ClientError> {
        Ok(self.tx.clone())
    }

    async fn receipt_logs(&self, _hash: &str) -> Result<Vec<RawLog>, ClientError> {
        Ok(self.logs.clone())
    }

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, ClientError> {
        Ok(self.logs.iter().filter(|log| filter.matches(log)).cloned().collect())
    }
}

fn transfer_log(emitter: &str, value: u64, block: u64) -> RawLog {
    let mut log = RawLog::new(
        emitter,
        vec![
            TRANSFER_TOPIC.to_string(),
            format!("0x{:0>64}", &HOLDER[2..]),
            format!("0x{:0>64}", &HOLDER[2..]),
        ],
        abi_uint(U256::from(value)),
    );
    log.block_number = block;
    log
}

fn cache_over(chain: Arc<MockChain>, config: MetadataConfig) -> MetadataCache {
    let client: Arc<dyn ChainClient> = chain;
    MetadataCache::new(Some(client), config).unwrap()
}

// ─── Resolution ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn resolves_erc20_metadata() {
    let chain = Arc::new(MockChain::usdc());
    let cache = cache_over(chain.clone(), MetadataConfig::default());

    let meta = cache.get(&USDC.to_lowercase()).await.unwrap();
    assert_eq!(meta.address, USDC);
    assert_eq!(meta.standard, TokenStandard::Erc20);
    assert_eq!(meta.name.as_deref(), Some("USD Coin"));
    assert_eq!(meta.symbol.as_deref(), Some("USDC"));
    assert_eq!(meta.decimals, Some(6));
    assert!(meta.verified);
    assert!(meta.bytecode.as_deref().unwrap().starts_with("0x6080604052"));

    // Second lookup is served from the cache
    cache.get(USDC).await.unwrap();
    assert_eq!(chain.code_fetches.load(Ordering::SeqCst), 1);
    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses), (1, 1));

    let decoder = cache.decoder_for(USDC).unwrap();
    assert!(decoder.is_verified());
    assert!(Arc::ptr_eq(decoder.interface(), &cache.interfaces().erc20));
}

#[tokio::test]
async fn concurrent_gets_share_one_resolution() {
    let chain = Arc::new(MockChain::usdc().with_delay(Duration::from_millis(50)));
    let cache = Arc::new(cache_over(chain.clone(), MetadataConfig::default()));

    let lookups = (0..16).map(|_| {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.get(USDC).await.map(|m| m.symbol.clone()) })
    });
    let results = futures::future::join_all(lookups).await;

    for r in results {
        assert_eq!(r.unwrap().unwrap().as_deref(), Some("USDC"));
    }
    assert_eq!(chain.code_fetches.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats().misses, 1);
}

#[tokio::test]
async fn lookups_of_different_addresses_run_in_parallel() {
    let chain = Arc::new(MockChain::usdc().with_delay(Duration::from_millis(300)));
    let cache = cache_over(chain.clone(), MetadataConfig::default());

    let started = tokio::time::Instant::now();
    let (usdc, dai) = tokio::join!(cache.get(USDC), cache.get(DAI));
    let elapsed = started.elapsed();

    assert_eq!(usdc.unwrap().address, USDC);
    assert_eq!(dai.unwrap().address, DAI);
    assert_eq!(chain.code_fetches.load(Ordering::SeqCst), 2);
    assert!(
        elapsed < Duration::from_millis(550),
        "lookups serialized: took {elapsed:?}"
    );
}

#[tokio::test]
async fn reverted_view_call_leaves_field_empty() {
    let mut chain = MockChain::usdc();
    chain.symbol = Err(ClientError::Rpc {
        code: 3,
        message: "execution reverted".into(),
    });
    let cache = cache_over(Arc::new(chain), MetadataConfig::default());

    let meta = cache.get(USDC).await.unwrap();
    assert_eq!(meta.name.as_deref(), Some("USD Coin"));
    assert!(meta.symbol.is_none());
}

#[tokio::test]
async fn unreachable_client_fails_resolution_and_retries_later() {
    let mut chain = MockChain::usdc();
    chain.name = Err(ClientError::Transport("connection reset".into()));
    let chain = Arc::new(chain);
    let cache = cache_over(chain.clone(), MetadataConfig::default());

    let err = cache.get(USDC).await.unwrap_err();
    assert!(matches!(
        err,
        MetadataError::CollaboratorUnavailable(ClientError::Transport(_))
    ));
    assert!(!cache.contains(USDC));

    let _ = cache.get(USDC).await;
    assert_eq!(chain.code_fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn timeout_leaves_no_entry() {
    let chain = Arc::new(MockChain::usdc().with_delay(Duration::from_millis(500)));
    let config = MetadataConfig::default().with_call_timeout(Duration::from_millis(20));
    let cache = cache_over(chain, config);

    let err = cache.get(USDC).await.unwrap_err();
    assert!(matches!(
        err,
        MetadataError::CollaboratorUnavailable(ClientError::Timeout { ms: 20 })
    ));
    assert!(err.is_transient());
    assert!(cache.is_empty());
    assert!(cache.get_cached(USDC).is_none());
}

#[tokio::test]
async fn dropped_lookup_does_not_poison_the_entry() {
    let chain = Arc::new(MockChain::usdc().with_delay(Duration::from_millis(100)));
    let cache = cache_over(chain.clone(), MetadataConfig::default());

    let abandoned = tokio::time::timeout(Duration::from_millis(10), cache.get(USDC)).await;
    assert!(abandoned.is_err());
    assert!(!cache.contains(USDC));

    let meta = cache.get(USDC).await.unwrap();
    assert_eq!(meta.decimals, Some(6));
    assert_eq!(chain.code_fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn externally_owned_account_is_unknown_without_view_calls() {
    let mut chain = MockChain::usdc();
    chain.code = vec![];
    let chain = Arc::new(chain);
    let cache = cache_over(chain.clone(), MetadataConfig::default());

    let meta = cache.get(HOLDER).await.unwrap();
    assert_eq!(meta.standard, TokenStandard::Unknown);
    assert!(meta.name.is_none());
    assert!(meta.bytecode.is_none());
    assert_eq!(chain.view_calls.load(Ordering::SeqCst), 0);

    let decoder = cache.decoder_for(HOLDER).unwrap();
    assert!(Arc::ptr_eq(decoder.interface(), &cache.interfaces().fallback));
}

// ─── balance_of ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn balance_of_encodes_holder() {
    let chain = Arc::new(MockChain::usdc());
    let cache = cache_over(chain.clone(), MetadataConfig::default());

    let balance = cache.balance_of(USDC, HOLDER).await.unwrap();
    assert_eq!(balance, U256::from(1_234_567u64));

    let sent = chain.last_call.lock().unwrap().clone();
    assert_eq!(&sent[..4], &[0x70, 0xa0, 0x82, 0x31]);
    assert_eq!(sent.len(), 36);
    assert_eq!(hex::encode(&sent[16..]), HOLDER[2..].to_lowercase());
}

#[tokio::test]
async fn balance_of_without_client() {
    let cache = MetadataCache::offline().unwrap();
    cache
        .insert(ContractMetadata::new(USDC, TokenStandard::Erc20))
        .unwrap();
    let err = cache.balance_of(USDC, HOLDER).await.unwrap_err();
    assert!(matches!(
        err,
        MetadataError::CollaboratorUnavailable(ClientError::NotConfigured)
    ));
}

// ─── Scanner ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn scanner_decodes_transaction_and_receipt() {
    let mut input = hex::decode("a9059cbb").unwrap();
    input.extend(DynSolValue::Tuple(vec![
        DynSolValue::Address(HOLDER.parse().unwrap()),
        DynSolValue::Uint(U256::from(5u8), 256),
    ])
    .abi_encode_params());

    let mut chain = MockChain::usdc();
    chain.tx = Some(RawTransaction::new(Some(USDC.into()), input).with_hash("0xfeed"));
    chain.logs = vec![RawLog::new(
        USDC,
        vec![
            TRANSFER_TOPIC.to_string(),
            format!("0x{:0>64}", &HOLDER[2..]),
            format!("0x{:0>64}", &HOLDER[2..]),
        ],
        abi_uint(U256::from(5u8)),
    )];
    let chain = Arc::new(chain);
    let cache = cache_over(chain.clone(), MetadataConfig::default());
    cache.get(USDC).await.unwrap();
    let decoder = cache.decoder_for(USDC).unwrap();

    let scanner = TxScanner::new(chain.clone(), cache.config());
    let call = scanner.decode_transaction("0xfeed", &decoder).await.unwrap();
    assert_eq!(call.name, "transfer");
    assert_eq!(call.transaction_hash, "0xfeed");

    let events = scanner.decode_receipt("0xfeed", &decoder).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].param("value").and_then(|v| v.as_decimal()), Some("5"));

    let candidates = vec![
        Arc::clone(&cache.interfaces().erc20),
        Arc::clone(&cache.interfaces().erc721),
    ];
    let any = scanner.decode_transaction_any("0xfeed", &candidates).await.unwrap();
    assert_eq!(any.signature, "transfer(address,uint256)");
    assert_eq!(scanner.decode_receipt_any("0xfeed", &candidates).await.unwrap().len(), 1);
}

#[tokio::test]
async fn scanner_reports_missing_transaction() {
    let chain = Arc::new(MockChain::usdc());
    let scanner = TxScanner::new(chain, &MetadataConfig::default());
    let cache = MetadataCache::offline().unwrap();
    cache
        .insert(ContractMetadata::new(ZERO_ADDRESS, TokenStandard::Unknown))
        .unwrap();
    let decoder = cache.decoder_for(ZERO_ADDRESS).unwrap();
    let err = scanner.decode_transaction("0xdead", &decoder).await.unwrap_err();
    assert!(matches!(err, MetadataError::TransactionNotFound { .. }));
}

#[tokio::test]
async fn scanner_decodes_filtered_logs() {
    let mut chain = MockChain::usdc();
    chain.logs = vec![
        transfer_log(USDC, 5, 10),
        transfer_log(DAI, 7, 12),
        transfer_log(USDC, 9, 20),
    ];
    let chain = Arc::new(chain);
    let cache = cache_over(chain.clone(), MetadataConfig::default());
    cache.get(USDC).await.unwrap();
    let decoder = cache.decoder_for(USDC).unwrap();
    let scanner = TxScanner::new(chain.clone(), cache.config());

    let range = LogFilter::new().event(TRANSFER_TOPIC).from_block(0).to_block(15);
    let events = scanner.decode_filtered_logs(&range, &decoder).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].contract_address, USDC);
    assert_eq!(events[0].block_number, 10);
    assert_eq!(events[0].param("value").and_then(|v| v.as_decimal()), Some("5"));

    let candidates = vec![Arc::clone(&cache.interfaces().erc20)];
    let all = scanner
        .decode_filtered_logs_any(&LogFilter::new().event(TRANSFER_TOPIC), &candidates)
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[1].contract_address, DAI);

    let dai_only = LogFilter::new().address(DAI.to_lowercase());
    let events = scanner.decode_filtered_logs_any(&dai_only, &candidates).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].param("value").and_then(|v| v.as_decimal()), Some("7"));

    let nobody = LogFilter::new().topic(1, format!("0x{:0>64}", "01"));
    assert!(scanner.decode_filtered_logs_any(&nobody, &candidates).await.unwrap().is_empty());
}

#[tokio::test]
async fn unbound_decoder_accepts_filtered_logs_from_any_emitter() {
    let mut chain = MockChain::usdc();
    chain.logs = vec![transfer_log(USDC, 5, 10), transfer_log(DAI, 7, 12)];
    let chain = Arc::new(chain);
    let cache = MetadataCache::offline().unwrap();
    cache
        .insert(ContractMetadata::new(ZERO_ADDRESS, TokenStandard::Erc20))
        .unwrap();
    let decoder = cache.decoder_for(ZERO_ADDRESS).unwrap();
    let scanner = TxScanner::new(chain, &MetadataConfig::default());

    let events = scanner
        .decode_filtered_logs(&LogFilter::new(), &decoder)
        .await
        .unwrap();
    assert_eq!(events.len(), 2);
}
