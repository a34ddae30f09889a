//! Commands that read chain state through the JSON-RPC client.

use anyhow::{anyhow, Context, Result};
use chainabi_core::ChainClient;
use chainabi_metadata::{
    JsonRpcChainClient, MetadataCache, MetadataConfig, RpcClientConfig, TxScanner,
};
use std::sync::Arc;
use std::time::Duration;

use crate::{load_registry, print_call, print_event, App};

fn chain_client(app: &App) -> Result<Arc<dyn ChainClient>> {
    let url = app.config.rpc_url.as_deref().ok_or_else(|| {
        anyhow!(
            "no RPC endpoint configured (use --rpc, {} or rpc_url in the config file)",
            crate::config::RPC_URL_ENV
        )
    })?;
    let client = JsonRpcChainClient::new(RpcClientConfig::new(url))
        .with_context(|| format!("create JSON-RPC client for '{url}'"))?;
    Ok(Arc::new(client))
}

fn metadata_config(app: &App) -> MetadataConfig {
    MetadataConfig::default().with_call_timeout(Duration::from_millis(app.config.call_timeout_ms))
}

pub async fn fetch_code(app: &App, address: &str) -> Result<String> {
    let client = chain_client(app)?;
    let code = tokio::time::timeout(
        Duration::from_millis(app.config.call_timeout_ms),
        client.code_at(address),
    )
    .await
    .map_err(|_| anyhow!("eth_getCode timed out after {}ms", app.config.call_timeout_ms))?
    .with_context(|| format!("fetch bytecode of {address}"))?;
    Ok(hex::encode(code))
}

pub async fn token_info(app: &App, address: &str, holder: Option<&str>) -> Result<()> {
    let cache = MetadataCache::new(Some(chain_client(app)?), metadata_config(app))?;
    let meta = cache
        .get(address)
        .await
        .with_context(|| format!("resolve metadata of {address}"))?;
    let balance = match holder {
        Some(holder) => Some(cache.balance_of(address, holder).await?),
        None => None,
    };
    let stats = cache.stats();
    app.metrics.record_cache(stats.hits, stats.misses);

    if app.json {
        let mut out = serde_json::to_value(meta.as_ref())?;
        if let Some(fields) = out.as_object_mut() {
            fields.remove("bytecode");
        }
        if let Some(balance) = balance {
            out["balance"] = serde_json::json!(balance.to_string());
        }
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Address:   {}", meta.address);
        println!("Standard:  {}", meta.standard);
        println!("Name:      {}", meta.name.as_deref().unwrap_or("-"));
        println!("Symbol:    {}", meta.symbol.as_deref().unwrap_or("-"));
        match meta.decimals {
            Some(d) => println!("Decimals:  {}", d),
            None => println!("Decimals:  -"),
        }
        if let Some(balance) = balance {
            println!("Balance:   {}", balance);
        }
    }
    Ok(())
}

pub async fn decode_tx(app: &App, hash: &str) -> Result<()> {
    let registry = load_registry(&app.config, &[])?;
    let candidates = registry.candidates();
    let scanner = TxScanner::new(chain_client(app)?, &metadata_config(app));

    // Plain ETH transfers and unknown methods still have decodable logs.
    let call = match scanner.decode_transaction_any(hash, &candidates).await {
        Ok(call) => {
            app.metrics.record_call(&call.signature);
            Some(call)
        }
        Err(chainabi_metadata::MetadataError::Decode(e)) => {
            app.metrics.record_error(&e);
            tracing::debug!(tx = hash, error = %e, "calldata not decoded");
            None
        }
        Err(e) => return Err(e).with_context(|| format!("fetch transaction {hash}")),
    };
    let events = scanner
        .decode_receipt_any(hash, &candidates)
        .await
        .with_context(|| format!("fetch receipt of {hash}"))?;
    for event in &events {
        app.metrics.record_event(&event.signature);
    }

    if app.json {
        let out = serde_json::json!({ "call": call, "events": events });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        match &call {
            Some(call) => print_call(call),
            None => println!("Method:    (not decoded)"),
        }
        println!();
        println!("Logs decoded: {}", events.len());
        for event in &events {
            println!();
            print_event(event);
        }
    }
    Ok(())
}
