//! SignalPool client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use signalpool_core::{Address, OperatingMode};
use tracing::debug;

use crate::{Result, SettingsError};

pub const ENV_MODE: &str = "SIGNALPOOL_MODE";
pub const ENV_RPC_URL: &str = "SIGNALPOOL_RPC_URL";
pub const ENV_WALLET_RPC_URL: &str = "SIGNALPOOL_WALLET_RPC_URL";
pub const ENV_GATEWAY_URL: &str = "SIGNALPOOL_GATEWAY_URL";
pub const ENV_CONTRACT_PLAINTEXT: &str = "SIGNALPOOL_CONTRACT_PLAINTEXT";
pub const ENV_CONTRACT_ENCRYPTED: &str = "SIGNALPOOL_CONTRACT_ENCRYPTED";
pub const ENV_SENDER: &str = "SIGNALPOOL_SENDER";

pub const DEFAULT_RPC_URL: &str = "https://eth-sepolia.public.blastapi.io";
pub const DEFAULT_GATEWAY_URL: &str = "https://gateway.sepolia.zama.ai";

/// Bounded polling: attempt count and the pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub interval_ms: u64,
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    pub item_delay_ms: u64,
    pub rate_limit_backoff_factor: u32,
}

impl BatchConfig {
    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            item_delay_ms: 200,
            rate_limit_backoff_factor: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Chosen per run from `SIGNALPOOL_MODE` or the caller; never read from
    /// or written to the settings file.
    #[serde(skip)]
    pub mode: OperatingMode,
    /// Public endpoint for reads and receipts.
    pub rpc_url: String,
    /// Endpoint that signs `eth_sendTransaction`. Falls back to `rpc_url`.
    pub wallet_rpc_url: Option<String>,
    pub gateway_url: String,
    pub plaintext_contract: Address,
    pub encrypted_contract: Address,
    pub sender: Option<Address>,
    pub confirmation: PollConfig,
    pub decryption: PollConfig,
    pub batch: BatchConfig,
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            mode: OperatingMode::Plaintext,
            rpc_url: DEFAULT_RPC_URL.to_string(),
            wallet_rpc_url: None,
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            plaintext_contract: Address::ZERO,
            encrypted_contract: Address::ZERO,
            sender: None,
            confirmation: PollConfig {
                max_attempts: 60,
                interval_ms: 2_000,
            },
            decryption: PollConfig {
                max_attempts: 60,
                interval_ms: 5_000,
            },
            batch: BatchConfig::default(),
            request_timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    pub fn contract_for(&self, mode: OperatingMode) -> Address {
        match mode {
            OperatingMode::Plaintext => self.plaintext_contract,
            OperatingMode::Encrypted => self.encrypted_contract,
        }
    }

    /// Encrypted mode needs a deployed encrypted contract.
    pub fn encrypted_available(&self) -> bool {
        self.encrypted_contract != Address::ZERO
    }

    pub fn wallet_rpc_url(&self) -> &str {
        self.wallet_rpc_url.as_deref().unwrap_or(&self.rpc_url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Override fields from `SIGNALPOOL_*` environment variables.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Override fields from any key lookup using the `SIGNALPOOL_*` names.
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_MODE) {
            self.mode = v.parse().map_err(|_| invalid(ENV_MODE, &v))?;
        }
        if let Some(v) = get(ENV_RPC_URL) {
            self.rpc_url = v;
        }
        if let Some(v) = get(ENV_WALLET_RPC_URL) {
            self.wallet_rpc_url = Some(v);
        }
        if let Some(v) = get(ENV_GATEWAY_URL) {
            self.gateway_url = v;
        }
        if let Some(v) = get(ENV_CONTRACT_PLAINTEXT) {
            self.plaintext_contract = v.parse().map_err(|_| invalid(ENV_CONTRACT_PLAINTEXT, &v))?;
        }
        if let Some(v) = get(ENV_CONTRACT_ENCRYPTED) {
            self.encrypted_contract = v.parse().map_err(|_| invalid(ENV_CONTRACT_ENCRYPTED, &v))?;
        }
        if let Some(v) = get(ENV_SENDER) {
            self.sender = Some(v.parse().map_err(|_| invalid(ENV_SENDER, &v))?);
        }
        debug!(mode = %self.mode, rpc = %self.rpc_url, "configuration overrides applied");
        Ok(())
    }

    /// Whether `mode` can be used with this configuration.
    pub fn ensure_mode(&self, mode: OperatingMode) -> Result<()> {
        if mode.is_encrypted() && !self.encrypted_available() {
            return Err(SettingsError::ModeUnavailable(mode));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.ensure_mode(self.mode)?;
        if self.rpc_url.trim().is_empty() {
            return Err(invalid("rpc_url", &self.rpc_url));
        }
        if self.mode.is_encrypted() && self.gateway_url.trim().is_empty() {
            return Err(invalid("gateway_url", &self.gateway_url));
        }
        for (key, poll) in [
            ("confirmation.max_attempts", self.confirmation),
            ("decryption.max_attempts", self.decryption),
        ] {
            if poll.max_attempts == 0 {
                return Err(invalid(key, "0"));
            }
        }
        Ok(())
    }
}

fn invalid(key: &str, value: &str) -> SettingsError {
    SettingsError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::Settings;

    const ENCRYPTED: &str = "0x00000000000000000000000000000000000000e1";

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.mode, OperatingMode::Plaintext);
        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.gateway_url, DEFAULT_GATEWAY_URL);
        assert_eq!(config.confirmation.interval(), Duration::from_secs(2));
        assert_eq!(config.decryption.interval(), Duration::from_secs(5));
        assert_eq!(config.batch.item_delay(), Duration::from_millis(200));
        assert!(!config.encrypted_available());
        assert_eq!(config.wallet_rpc_url(), DEFAULT_RPC_URL);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: ClientConfig =
            serde_json::from_str(&format!(r#"{{"encrypted_contract":"{ENCRYPTED}"}}"#)).unwrap();
        assert!(config.encrypted_available());
        assert_eq!(config.decryption.max_attempts, 60);
        config.validate().unwrap();
    }

    #[test]
    fn test_mode_key_in_file_is_ignored() {
        let config: ClientConfig =
            serde_json::from_str(&format!(r#"{{"mode":"encrypted","encrypted_contract":"{ENCRYPTED}"}}"#))
                .unwrap();
        assert_eq!(config.mode, OperatingMode::Plaintext);
        assert!(config.encrypted_available());
    }

    #[test]
    fn test_contract_for_mode() {
        let config = ClientConfig {
            plaintext_contract: Address::repeat_byte(0x0a),
            encrypted_contract: Address::repeat_byte(0x0b),
            ..ClientConfig::default()
        };
        assert_eq!(config.contract_for(OperatingMode::Plaintext), Address::repeat_byte(0x0a));
        assert_eq!(config.contract_for(OperatingMode::Encrypted), Address::repeat_byte(0x0b));
    }

    #[test]
    fn test_overrides() {
        let mut config = ClientConfig::default();
        config
            .apply_overrides(lookup(&[
                (ENV_MODE, "fhe"),
                (ENV_RPC_URL, "http://localhost:8545"),
                (ENV_CONTRACT_ENCRYPTED, ENCRYPTED),
                (ENV_SENDER, "0x00000000000000000000000000000000000000aa"),
                (ENV_GATEWAY_URL, "  "),
            ]))
            .unwrap();

        assert_eq!(config.mode, OperatingMode::Encrypted);
        assert_eq!(config.rpc_url, "http://localhost:8545");
        assert_eq!(config.wallet_rpc_url(), "http://localhost:8545");
        assert_eq!(config.gateway_url, DEFAULT_GATEWAY_URL);
        assert_eq!(config.encrypted_contract, ENCRYPTED.parse::<Address>().unwrap());
        assert_eq!(config.sender, Some(Address::with_last_byte(0xaa)));
    }

    #[test]
    fn test_invalid_override() {
        let mut config = ClientConfig::default();
        let err = config
            .apply_overrides(lookup(&[(ENV_CONTRACT_PLAINTEXT, "0x1234")]))
            .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { ref key, .. } if key == ENV_CONTRACT_PLAINTEXT));
    }

    #[test]
    fn test_encrypted_mode_unavailable() {
        let config = ClientConfig {
            mode: OperatingMode::Encrypted,
            ..ClientConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SettingsError::ModeUnavailable(OperatingMode::Encrypted))
        ));
        assert!(config.ensure_mode(OperatingMode::Plaintext).is_ok());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = ClientConfig::default();
        config.confirmation.max_attempts = 0;
        assert!(matches!(config.validate(), Err(SettingsError::InvalidValue { .. })));
    }

    #[test]
    fn test_persisted_round_trip_without_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings: Settings<ClientConfig> =
            Settings::load_or_default("signalpool", Some(&path)).unwrap();
        settings.config.encrypted_contract = ENCRYPTED.parse().unwrap();
        settings.config.mode = OperatingMode::Encrypted;
        settings.save().unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("\"mode\""));
        assert!(raw.contains("encrypted_contract"));

        let loaded: Settings<ClientConfig> =
            Settings::load_or_default("signalpool", Some(&path)).unwrap();
        assert_eq!(loaded.config.mode, OperatingMode::Plaintext);
        assert_eq!(
            loaded.config,
            ClientConfig {
                mode: OperatingMode::Plaintext,
                ..settings.config.clone()
            }
        );
    }
}
