// src/config.rs

use crate::swap::{DexContext, Slippage};
use anyhow::{anyhow, Context, Result};
use ethers_core::types::{Address, U256};
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Router and factory of one V2-style DEX deployment.
#[derive(Debug, Clone, Deserialize)]
pub struct DexConfig {
    pub router: Address,
    pub factory: Address,
}

// A struct to hold all configuration, loaded once at startup from the .env file.
#[derive(Debug)]
pub struct Config {
    // Server settings
    pub port: u16,

    // Chain settings
    pub rpc_url: String,
    /// Read from the node when unset.
    pub chain_id: Option<u64>,
    pub native_symbol: String,

    // DEX settings
    pub base_asset: Address,
    pub dex_routers: BTreeMap<String, DexConfig>,
    pub default_router: String,
    pub default_slippage: Slippage,
    pub min_pool_reserve: U256,

    // Transaction settings
    pub tx_private_key: Option<SecretString>,
    pub receipt_timeout: Duration,
    pub receipt_poll_interval: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rpc_url = lookup("RPC_URL").context("RPC_URL must be set")?;

        let base_asset = lookup("BASE_ASSET_ADDRESS")
            .context("BASE_ASSET_ADDRESS must be set to the wrapped native token")?;
        let base_asset = Address::from_str(base_asset.trim())
            .context("BASE_ASSET_ADDRESS must be a 0x-prefixed address")?;

        let routers_str = lookup("DEX_ROUTERS").context(
            "DEX_ROUTERS must be set to a JSON map of name -> {\"router\": \"0x..\", \"factory\": \"0x..\"}",
        )?;
        let dex_routers: BTreeMap<String, DexConfig> =
            serde_json::from_str(&routers_str).context("Invalid DEX_ROUTERS JSON format")?;

        // Default to the first router name in sorted order
        let default_router = match lookup("DEFAULT_ROUTER") {
            Some(name) => name,
            None => dex_routers
                .keys()
                .next()
                .cloned()
                .ok_or_else(|| anyhow!("DEX_ROUTERS must name at least one router"))?,
        };
        if !dex_routers.contains_key(&default_router) {
            return Err(anyhow!(
                "DEFAULT_ROUTER '{}' is not one of DEX_ROUTERS",
                default_router
            ));
        }

        let default_slippage = match lookup("DEFAULT_SLIPPAGE_PERCENT") {
            Some(raw) => Slippage::parse(&raw)
                .map_err(|e| anyhow!("DEFAULT_SLIPPAGE_PERCENT: {}", e))?,
            None => Slippage::from_tenths(5).map_err(|e| anyhow!(e))?,
        };

        let min_pool_reserve = match lookup("MIN_POOL_RESERVE") {
            Some(raw) => U256::from_dec_str(raw.trim())
                .context("MIN_POOL_RESERVE must be a decimal integer")?,
            None => U256::from(1000u64),
        };

        Ok(Config {
            // Server settings
            port: parse_or(&lookup, "PORT", 8080)?,

            // Chain settings
            rpc_url,
            chain_id: lookup("CHAIN_ID")
                .map(|s| s.trim().parse::<u64>())
                .transpose()
                .context("CHAIN_ID must be a valid number")?,
            native_symbol: lookup("NATIVE_SYMBOL").unwrap_or_else(|| "ETH".to_string()),

            // DEX settings
            base_asset,
            dex_routers,
            default_router,
            default_slippage,
            min_pool_reserve,

            // Transaction settings
            tx_private_key: lookup("TX_PRIVATE_KEY").map(SecretString::new),
            receipt_timeout: Duration::from_secs(parse_or(&lookup, "RECEIPT_TIMEOUT_SECS", 180)?),
            receipt_poll_interval: Duration::from_millis(parse_or(
                &lookup,
                "RECEIPT_POLL_MILLIS",
                2000,
            )?),
        })
    }

    /// Names of the configured routers.
    pub fn supported_routers(&self) -> Vec<String> {
        self.dex_routers.keys().cloned().collect()
    }

    /// Engine settings for the named router, or the default one.
    pub fn dex_context(&self, router: Option<&str>) -> Result<DexContext, String> {
        let name = router.unwrap_or(&self.default_router);
        let dex = self.dex_routers.get(name).ok_or_else(|| {
            format!(
                "Router '{}' is not configured. Available: {}",
                name,
                self.supported_routers().join(", ")
            )
        })?;
        Ok(DexContext {
            router: dex.router,
            factory: dex.factory,
            base_asset: self.base_asset,
            reserve_floor: self.min_pool_reserve,
            native_symbol: self.native_symbol.clone(),
            default_slippage: self.default_slippage,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow!("{} must be a valid number", key)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(extra: &[(&str, &str)]) -> HashMap<String, String> {
        let mut map: HashMap<String, String> = [
            ("RPC_URL", "http://localhost:8545"),
            ("BASE_ASSET_ADDRESS", "0x0000000000000000000000000000000000000b0b"),
            (
                "DEX_ROUTERS",
                r#"{"zeta":{"router":"0x0000000000000000000000000000000000000001","factory":"0x0000000000000000000000000000000000000002"},
                    "alpha":{"router":"0x0000000000000000000000000000000000000003","factory":"0x0000000000000000000000000000000000000004"}}"#,
            ),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in extra {
            map.insert(k.to_string(), v.to_string());
        }
        map
    }

    fn load(map: HashMap<String, String>) -> Result<Config> {
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(vars(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.default_router, "alpha");
        assert_eq!(config.default_slippage.tenths(), 5);
        assert_eq!(config.min_pool_reserve, U256::from(1000));
        assert_eq!(config.receipt_timeout, Duration::from_secs(180));
        assert_eq!(config.receipt_poll_interval, Duration::from_millis(2000));
        assert_eq!(config.native_symbol, "ETH");
        assert!(config.chain_id.is_none());
        assert!(config.tx_private_key.is_none());
    }

    #[test]
    fn unknown_default_router_is_rejected() {
        assert!(load(vars(&[("DEFAULT_ROUTER", "missing")])).is_err());
    }

    #[test]
    fn dex_context_resolves_named_router() {
        let config = load(vars(&[("MIN_POOL_RESERVE", "5000")])).unwrap();
        let ctx = config.dex_context(Some("zeta")).unwrap();
        assert_eq!(ctx.router, Address::from_low_u64_be(1));
        assert_eq!(ctx.factory, Address::from_low_u64_be(2));
        assert_eq!(ctx.reserve_floor, U256::from(5000));
        assert!(config.dex_context(Some("nope")).unwrap_err().contains("alpha, zeta"));
    }

    #[test]
    fn missing_rpc_url_fails() {
        let mut map = vars(&[]);
        map.remove("RPC_URL");
        assert!(load(map).is_err());
    }
}
