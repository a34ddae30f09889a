//! `chainabi.yaml`: optional settings shared by every command.

use anyhow::{Context, Result};
use chainabi_observability::LogConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides `rpc_url`.
pub const RPC_URL_ENV: &str = "CHAINABI_RPC_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// JSON-RPC endpoint for commands that read chain state
    #[serde(default)]
    pub rpc_url: Option<String>,
    /// Extra ABI files registered after the bundled interfaces
    #[serde(default)]
    pub abi_dir: Option<PathBuf>,
    /// Per-call bound on chain client requests
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    #[serde(default)]
    pub log: LogConfig,
}

fn default_call_timeout_ms() -> u64 {
    10_000
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            abi_dir: None,
            call_timeout_ms: default_call_timeout_ms(),
            log: LogConfig::default(),
        }
    }
}

impl CliConfig {
    /// Read `path` if given, otherwise start from defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("read config file '{}'", path.display()))?;
                Self::parse(&text).with_context(|| format!("parse config file '{}'", path.display()))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn parse(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// The command-line flag wins over the environment, which wins over the
    /// file.
    pub fn with_rpc_override(mut self, env: Option<String>, flag: Option<String>) -> Self {
        if let Some(url) = flag.or(env).filter(|u| !u.trim().is_empty()) {
            self.rpc_url = Some(url);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_is_default() {
        let config = CliConfig::parse("{}").unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.call_timeout_ms, 10_000);
    }

    #[test]
    fn parses_full_file() {
        let config = CliConfig::parse(
            r#"
rpc_url: http://localhost:8545
abi_dir: ./abis
call_timeout_ms: 2500
log:
  level: debug
  json: true
  components:
    chainabi-metadata: trace
"#,
        )
        .unwrap();
        assert_eq!(config.rpc_url.as_deref(), Some("http://localhost:8545"));
        assert_eq!(config.abi_dir, Some(PathBuf::from("./abis")));
        assert_eq!(config.call_timeout_ms, 2500);
        assert!(config.log.json);
        assert_eq!(config.log.directives(), "debug,chainabi_metadata=trace");
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "call_timeout_ms: 500").unwrap();
        let config = CliConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.call_timeout_ms, 500);
        assert!(CliConfig::load(Some(Path::new("/nonexistent/chainabi.yaml"))).is_err());
    }

    #[test]
    fn rpc_override_precedence() {
        let file = CliConfig {
            rpc_url: Some("http://file".into()),
            ..CliConfig::default()
        };
        let env = file.clone().with_rpc_override(Some("http://env".into()), None);
        assert_eq!(env.rpc_url.as_deref(), Some("http://env"));
        let flag = file
            .clone()
            .with_rpc_override(Some("http://env".into()), Some("http://flag".into()));
        assert_eq!(flag.rpc_url.as_deref(), Some("http://flag"));
        let blank = file.with_rpc_override(Some("  ".into()), None);
        assert_eq!(blank.rpc_url.as_deref(), Some("http://file"));
    }
}
