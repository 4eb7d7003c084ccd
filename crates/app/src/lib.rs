//! SignalPool App
//!
//! Unified initialization for SignalPool clients: logging, settings and the
//! wiring of a ready [`SignalPoolClient`] plus the [`Session`] for the
//! configured mode.

pub mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use signalpool_core::OperatingMode;
use signalpool_ledger::LedgerInterface;
use signalpool_orchestrator::{
    BatchOptions, ClientOptions, ConfirmOptions, DecryptionOptions, EncryptionAdapter, Session,
    SignalPoolClient, WalletRpcSubmitter,
};
use signalpool_rpc::{GatewayError, HttpGateway, JsonRpcClient, RpcClientError, RpcLedgerReader};
use signalpool_settings::{expand_path, ClientConfig, Settings, SettingsError};
use thiserror::Error;
use tracing::info;

pub use logging::LogLevel;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Initialization failed: {0}")]
    InitError(String),
    #[error("Settings error: {0}")]
    SettingsError(#[from] SettingsError),
    #[error("RPC client error: {0}")]
    RpcError(#[from] RpcClientError),
    #[error("Gateway error: {0}")]
    GatewayError(#[from] GatewayError),
}

/// Orchestrator options from the persisted configuration.
pub fn client_options(config: &ClientConfig) -> ClientOptions {
    ClientOptions {
        confirmation: ConfirmOptions {
            max_attempts: config.confirmation.max_attempts,
            interval: config.confirmation.interval(),
        },
        decryption: DecryptionOptions {
            max_attempts: config.decryption.max_attempts,
            interval: config.decryption.interval(),
        },
        batch: BatchOptions {
            item_delay: config.batch.item_delay(),
            rate_limit_backoff_factor: config.batch.rate_limit_backoff_factor,
        },
    }
}

fn build_session(rpc: &Arc<JsonRpcClient>, config: &ClientConfig, mode: OperatingMode) -> Session {
    let contract = config.contract_for(mode);
    let reader = RpcLedgerReader::new(rpc.clone(), LedgerInterface::for_mode(mode), contract);
    Session::new(Arc::new(reader), contract, config.sender)
}

/// Initialized application context.
pub struct App {
    pub service: String,
    pub settings: Settings<ClientConfig>,
    client: Arc<SignalPoolClient>,
    session: Session,
    read_rpc: Arc<JsonRpcClient>,
}

impl App {
    pub fn client(&self) -> Arc<SignalPoolClient> {
        self.client.clone()
    }

    /// The current session. Operations started with it keep it across a
    /// later [`App::switch_mode`].
    pub fn session(&self) -> Session {
        self.session.clone()
    }

    pub fn mode(&self) -> OperatingMode {
        self.session.mode()
    }

    /// Replace the session with one for `mode`.
    pub fn switch_mode(&mut self, mode: OperatingMode) -> Result<(), AppError> {
        self.settings.config.ensure_mode(mode)?;
        if mode.is_encrypted() && !self.client.has_encryption() {
            return Err(AppError::InitError(
                "encrypted mode requires an encryption adapter".to_string(),
            ));
        }
        self.session = build_session(&self.read_rpc, &self.settings.config, mode);
        self.settings.config.mode = mode;
        info!(mode = %mode, contract = %self.session.contract(), "operating mode switched");
        Ok(())
    }

    /// Persist the current configuration. The operating mode is not part of
    /// it; each run picks its own.
    pub fn save_settings(&self) -> Result<(), AppError> {
        Ok(self.settings.save()?)
    }
}

/// Builder for constructing an App with configurable options.
pub struct AppBuilder {
    service: String,
    log_level: LogLevel,
    skip_logging: bool,
    skip_env: bool,
    config_path: Option<PathBuf>,
    mode: Option<OperatingMode>,
    encryption: Option<Arc<dyn EncryptionAdapter>>,
}

impl AppBuilder {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
            log_level: LogLevel::Info,
            skip_logging: false,
            skip_env: false,
            config_path: None,
            mode: None,
            encryption: None,
        }
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.log_level = LogLevel::from_verbose(verbose);
        self
    }

    pub fn skip_logging(mut self) -> Self {
        self.skip_logging = true;
        self
    }

    /// Ignore `SIGNALPOOL_*` environment overrides.
    pub fn skip_env_overrides(mut self) -> Self {
        self.skip_env = true;
        self
    }

    pub fn config_path(mut self, path: &str) -> Self {
        self.config_path = Some(expand_path(path));
        self
    }

    /// Operating mode for this run. Without it, `SIGNALPOOL_MODE` decides,
    /// then plaintext.
    pub fn mode(mut self, mode: OperatingMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn encryption(mut self, adapter: Arc<dyn EncryptionAdapter>) -> Self {
        self.encryption = Some(adapter);
        self
    }

    pub fn build(self) -> Result<App, AppError> {
        if !self.skip_logging {
            let _ = logging::try_init(self.log_level);
        }

        let mut settings: Settings<ClientConfig> =
            Settings::load_or_default(&self.service, self.config_path.as_deref())?;
        if !self.skip_env {
            settings.config.apply_env_overrides()?;
        }
        if let Some(mode) = self.mode {
            settings.config.mode = mode;
        }
        settings.config.validate()?;
        let config = &settings.config;

        let timeout = config.request_timeout();
        let read_rpc = Arc::new(JsonRpcClient::new(&config.rpc_url, timeout)?);
        let wallet_rpc = Arc::new(JsonRpcClient::new(config.wallet_rpc_url(), timeout)?);
        let gateway = HttpGateway::new(&config.gateway_url, timeout)?;

        let mut client = SignalPoolClient::new(
            Arc::new(WalletRpcSubmitter::new(wallet_rpc)),
            Arc::new(gateway),
        )
        .with_options(client_options(config));
        if let Some(adapter) = self.encryption {
            client = client.with_encryption(adapter);
        }

        let session = build_session(&read_rpc, config, config.mode);
        if session.mode().is_encrypted() && !client.has_encryption() {
            return Err(AppError::InitError(
                "encrypted mode requires an encryption adapter".to_string(),
            ));
        }

        info!(
            service = %self.service,
            version = env!("CARGO_PKG_VERSION"),
            mode = %session.mode(),
            contract = %session.contract(),
            rpc = %config.rpc_url,
            "client ready"
        );

        Ok(App {
            service: self.service,
            settings,
            client: Arc::new(client),
            session,
            read_rpc,
        })
    }
}
