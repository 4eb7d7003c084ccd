//! Orchestration facade.
//!
//! Each state-changing operation runs the same pipeline:
//! encrypt (encrypted mode only) → encode → submit → confirm → extract event.
//! Progress is tracked in a [`PendingOperation`] that is reported to an
//! optional listener on every stage change.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use signalpool_core::{
    Address, AggType, Aggregation, CiphertextHandle, Receipt, Signal, SignalType, TxHash, U256,
};
use signalpool_ledger::{
    AggregationCompleted, AggregationRequested, CompletedOutcome, ContributionPayload,
    DistributionDetails, EncodeError, EncodedCall, LedgerCall, LedgerEvent, LedgerInterface,
    SignalContributed, MAX_SIGNAL_VALUE,
};
use signalpool_rpc::DecryptionGateway;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::batch::{BatchLoader, BatchOptions, BatchReport};
use crate::confirm::{ConfirmOptions, ConfirmationPoller};
use crate::decryption::{DecryptionOptions, DecryptionSession};
use crate::encryption::{EncryptionAdapter, EncryptionContext, EncryptionError};
use crate::error::{ClientError, Result};
use crate::extract::extract_typed;
use crate::session::Session;
use crate::submitter::{BuiltTransaction, TransactionSubmitter};
use crate::wait::{Sleeper, TokioSleeper};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    Contribute,
    Aggregate,
    DistributeRevenue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Draft,
    Encrypting,
    Encoding,
    Submitting,
    Confirming,
    ExtractingEvent,
    Done,
    Failed(String),
}

/// One in-flight facade call. Cannot be cancelled once submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOperation {
    pub kind: OperationKind,
    pub stage: Stage,
    pub payload: Option<EncodedCall>,
    pub tx_hash: Option<TxHash>,
    pub receipt: Option<Receipt>,
    pub extracted_id: Option<u64>,
}

impl PendingOperation {
    fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            stage: Stage::Draft,
            payload: None,
            tx_hash: None,
            receipt: None,
            extracted_id: None,
        }
    }
}

pub type StageListener = Arc<dyn Fn(&PendingOperation) + Send + Sync>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOptions {
    pub confirmation: ConfirmOptions,
    pub decryption: DecryptionOptions,
    pub batch: BatchOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContributeRequest {
    pub signal_type: SignalType,
    /// Cleartext signal value; must fit `uint32`.
    pub value: u64,
    pub weight: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributeOutcome {
    pub tx_hash: TxHash,
    pub signal_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRequest {
    pub agg_type: AggType,
    pub signal_ids: Vec<u64>,
    /// Wei paid into the aggregation.
    pub revenue: U256,
}

/// Aggregation result as far as it is known right after confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationValue {
    Plain(u64),
    /// Resolve with [`SignalPoolClient::decryption_session`].
    Encrypted(CiphertextHandle),
    /// The transaction is final but the follow-up read failed.
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateOutcome {
    pub tx_hash: TxHash,
    pub aggregation_id: u64,
    pub result: AggregationValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributeOutcome {
    pub tx_hash: TxHash,
    pub receipt: Receipt,
    /// `None` when the receipt carried no `RevenueDistributed` event.
    pub details: Option<DistributionDetails>,
}

/// Mode-independent orchestration client. Every operation takes the session
/// it should run against.
pub struct SignalPoolClient {
    submitter: Arc<dyn TransactionSubmitter>,
    encryption: Option<Arc<dyn EncryptionAdapter>>,
    gateway: Arc<dyn DecryptionGateway>,
    sleeper: Arc<dyn Sleeper>,
    options: ClientOptions,
    submit_lock: Mutex<()>,
    listener: Option<StageListener>,
}

impl SignalPoolClient {
    pub fn new(
        submitter: Arc<dyn TransactionSubmitter>,
        gateway: Arc<dyn DecryptionGateway>,
    ) -> Self {
        Self {
            submitter,
            encryption: None,
            gateway,
            sleeper: Arc::new(TokioSleeper),
            options: ClientOptions::default(),
            submit_lock: Mutex::new(()),
            listener: None,
        }
    }

    pub fn with_encryption(mut self, adapter: Arc<dyn EncryptionAdapter>) -> Self {
        self.encryption = Some(adapter);
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_stage_listener(mut self, listener: StageListener) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn has_encryption(&self) -> bool {
        self.encryption.is_some()
    }

    // ========== Operations ==========

    /// Contribute a signal and return the id the ledger assigned.
    pub async fn contribute(
        &self,
        session: &Session,
        request: ContributeRequest,
    ) -> Result<ContributeOutcome> {
        let mut op = self.begin(OperationKind::Contribute);
        let result = self.run_contribute(session, request, &mut op).await;
        self.finish(&mut op, result)
    }

    /// Aggregate signals. Encrypted results are returned as a handle without
    /// waiting for decryption.
    pub async fn aggregate(
        &self,
        session: &Session,
        request: AggregateRequest,
    ) -> Result<AggregateOutcome> {
        let mut op = self.begin(OperationKind::Aggregate);
        let result = self.run_aggregate(session, request, &mut op).await;
        self.finish(&mut op, result)
    }

    pub async fn distribute_revenue(
        &self,
        session: &Session,
        aggregation_id: u64,
    ) -> Result<DistributeOutcome> {
        let mut op = self.begin(OperationKind::DistributeRevenue);
        let result = self.run_distribute(session, aggregation_id, &mut op).await;
        self.finish(&mut op, result)
    }

    /// Wait for a transaction submitted earlier, knowing only its hash.
    pub async fn resume_confirmation(&self, session: &Session, tx_hash: TxHash) -> Result<Receipt> {
        let poller = ConfirmationPoller::new(session.reader(), self.sleeper.clone());
        Ok(poller.confirm(tx_hash, &self.options.confirmation).await?)
    }

    /// A fresh poller for an encrypted result. Drive it with
    /// [`DecryptionSession::start_polling`] and `self.options().decryption`.
    pub fn decryption_session(&self, handle: CiphertextHandle) -> DecryptionSession {
        DecryptionSession::new(handle, self.gateway.clone(), self.sleeper.clone())
    }

    // ========== Reads ==========

    pub async fn signal(&self, session: &Session, id: u64) -> Result<Signal> {
        Ok(session.reader().signal(id).await?)
    }

    pub async fn aggregation(&self, session: &Session, id: u64) -> Result<Aggregation> {
        Ok(session.reader().aggregation(id).await?)
    }

    /// Current result of an aggregation in the session's representation.
    pub async fn aggregation_result(&self, session: &Session, id: u64) -> Result<AggregationValue> {
        let reader = session.reader();
        Ok(match session.interface() {
            LedgerInterface::Plaintext => AggregationValue::Plain(reader.aggregation_result(id).await?),
            LedgerInterface::Encrypted => {
                AggregationValue::Encrypted(reader.encrypted_result_handle(id).await?)
            }
        })
    }

    pub async fn contributor_revenue(&self, session: &Session, contributor: Address) -> Result<U256> {
        Ok(session.reader().contributor_revenue(contributor).await?)
    }

    /// Every signal from 1 to the ledger's counter. Individual misses are
    /// reported, not raised.
    pub async fn list_signals(&self, session: &Session) -> Result<BatchReport<Signal>> {
        let reader = session.reader();
        let count = reader.signal_count().await?;
        let loader = BatchLoader::new(self.options.batch.clone(), self.sleeper.clone());
        Ok(loader
            .load_range(count, |id| {
                let reader = reader.clone();
                async move { reader.signal(id).await }
            })
            .await)
    }

    pub async fn active_signal_ids(&self, session: &Session) -> Result<Vec<u64>> {
        let report = self.list_signals(session).await?;
        Ok(report
            .into_loaded()
            .into_iter()
            .filter(|s| s.active)
            .map(|s| s.id)
            .collect())
    }

    pub async fn list_aggregations(&self, session: &Session) -> Result<BatchReport<Aggregation>> {
        let reader = session.reader();
        let count = reader.aggregation_count().await?;
        let loader = BatchLoader::new(self.options.batch.clone(), self.sleeper.clone());
        Ok(loader
            .load_range(count, |id| {
                let reader = reader.clone();
                async move { reader.aggregation(id).await }
            })
            .await)
    }

    // ========== Pipeline ==========

    async fn run_contribute(
        &self,
        session: &Session,
        request: ContributeRequest,
        op: &mut PendingOperation,
    ) -> Result<ContributeOutcome> {
        // An encrypted input is bound to both accounts, so a missing one is an
        // encryption failure in that mode.
        let (sender, contract) = match session.interface() {
            LedgerInterface::Plaintext => (session.require_sender()?, session.require_contract()?),
            LedgerInterface::Encrypted => {
                let context = EncryptionContext {
                    target: session.contract(),
                    submitter: session.sender(),
                };
                (context.validate()?, context.target)
            }
        };

        let payload = match session.interface() {
            LedgerInterface::Plaintext => ContributionPayload::Plain {
                value: request.value,
            },
            LedgerInterface::Encrypted => {
                self.advance(op, Stage::Encrypting);
                let adapter = self
                    .encryption
                    .as_ref()
                    .ok_or(EncryptionError::NotConfigured)?;
                let context = EncryptionContext {
                    target: contract,
                    submitter: Some(sender),
                };
                let value = u32::try_from(request.value).map_err(|_| {
                    EncodeError::InvalidArgument(format!(
                        "signal value {} exceeds {}",
                        request.value, MAX_SIGNAL_VALUE
                    ))
                })?;
                let input = adapter.encrypt(value, &context).await?;
                ContributionPayload::Encrypted {
                    handle: input.handle,
                    proof: input.proof,
                }
            }
        };

        let call = LedgerCall::Contribute {
            signal_type: request.signal_type,
            payload,
            weight: request.weight,
        };
        let description = format!(
            "contributeSignal(type={:?}, weight={}, mode={})",
            request.signal_type,
            request.weight,
            session.mode()
        );
        let receipt = self
            .submit_and_confirm(session, op, call, sender, contract, description)
            .await?;

        self.advance(op, Stage::ExtractingEvent);
        let event: SignalContributed = extract_typed(session.interface(), &receipt)?;
        op.extracted_id = Some(event.signal_id);

        info!(signal_id = event.signal_id, tx = %receipt.transaction_hash, "signal contributed");
        Ok(ContributeOutcome {
            tx_hash: receipt.transaction_hash,
            signal_id: event.signal_id,
        })
    }

    async fn run_aggregate(
        &self,
        session: &Session,
        request: AggregateRequest,
        op: &mut PendingOperation,
    ) -> Result<AggregateOutcome> {
        let sender = session.require_sender()?;
        let contract = session.require_contract()?;

        let description = format!(
            "aggregateSignals(type={:?}, signals={}, revenue={})",
            request.agg_type,
            request.signal_ids.len(),
            request.revenue
        );
        let call = LedgerCall::Aggregate {
            agg_type: request.agg_type,
            signal_ids: request.signal_ids,
            revenue: request.revenue,
        };
        let receipt = self
            .submit_and_confirm(session, op, call, sender, contract, description)
            .await?;

        self.advance(op, Stage::ExtractingEvent);
        let requested: AggregationRequested = extract_typed(session.interface(), &receipt)?;
        let aggregation_id = requested.aggregation_id;
        op.extracted_id = Some(aggregation_id);

        let result = self.follow_up_result(session, aggregation_id, &receipt).await;

        info!(
            aggregation_id,
            tx = %receipt.transaction_hash,
            result = ?result,
            "aggregation requested"
        );
        Ok(AggregateOutcome {
            tx_hash: receipt.transaction_hash,
            aggregation_id,
            result,
        })
    }

    /// Never fails: the transaction is already final at this point.
    async fn follow_up_result(
        &self,
        session: &Session,
        aggregation_id: u64,
        receipt: &Receipt,
    ) -> AggregationValue {
        let reader = session.reader();
        match session.interface() {
            LedgerInterface::Plaintext => match reader.aggregation_result(aggregation_id).await {
                Ok(value) => AggregationValue::Plain(value),
                Err(e) => {
                    warn!(aggregation_id, error = %e, "aggregation result read failed");
                    AggregationValue::Unavailable(e.to_string())
                }
            },
            LedgerInterface::Encrypted => {
                let from_event = AggregationCompleted::find_in(session.interface(), &receipt.logs)
                    .filter(|e| e.aggregation_id == aggregation_id);
                if let Some(AggregationCompleted {
                    outcome: CompletedOutcome::Encrypted(handle),
                    ..
                }) = from_event
                {
                    return AggregationValue::Encrypted(handle);
                }
                match reader.encrypted_result_handle(aggregation_id).await {
                    Ok(handle) => AggregationValue::Encrypted(handle),
                    Err(e) => {
                        warn!(aggregation_id, error = %e, "result handle read failed");
                        AggregationValue::Unavailable(e.to_string())
                    }
                }
            }
        }
    }

    async fn run_distribute(
        &self,
        session: &Session,
        aggregation_id: u64,
        op: &mut PendingOperation,
    ) -> Result<DistributeOutcome> {
        let sender = session.require_sender()?;
        let contract = session.require_contract()?;

        let call = LedgerCall::DistributeRevenue { aggregation_id };
        let description = format!("distributeRevenue(aggregation={aggregation_id})");
        let receipt = self
            .submit_and_confirm(session, op, call, sender, contract, description)
            .await?;

        self.advance(op, Stage::ExtractingEvent);
        let details = match extract_typed::<DistributionDetails>(session.interface(), &receipt) {
            Ok(details) => {
                op.extracted_id = Some(details.aggregation_id);
                Some(details)
            }
            Err(e) => {
                warn!(aggregation_id, error = %e, "distribution confirmed without details");
                None
            }
        };

        info!(aggregation_id, tx = %receipt.transaction_hash, "revenue distributed");
        Ok(DistributeOutcome {
            tx_hash: receipt.transaction_hash,
            receipt,
            details,
        })
    }

    async fn submit_and_confirm(
        &self,
        session: &Session,
        op: &mut PendingOperation,
        call: LedgerCall,
        from: Address,
        to: Address,
        description: String,
    ) -> Result<Receipt> {
        self.advance(op, Stage::Encoding);
        let encoded = session.interface().encode(&call)?;
        let tx = BuiltTransaction {
            from,
            to,
            data: encoded.data.clone(),
            value: encoded.value,
            description,
        };
        op.payload = Some(encoded);

        self.advance(op, Stage::Submitting);
        let tx_hash = {
            let _guard = self.submit_lock.lock().await;
            self.submitter.submit(&tx).await?
        };
        op.tx_hash = Some(tx_hash);

        self.advance(op, Stage::Confirming);
        let poller = ConfirmationPoller::new(session.reader(), self.sleeper.clone());
        let receipt = poller.confirm(tx_hash, &self.options.confirmation).await?;
        op.receipt = Some(receipt.clone());

        if !receipt.status {
            return Err(ClientError::RemoteRejected { tx_hash });
        }
        Ok(receipt)
    }

    fn begin(&self, kind: OperationKind) -> PendingOperation {
        let op = PendingOperation::new(kind);
        self.notify(&op);
        op
    }

    fn advance(&self, op: &mut PendingOperation, stage: Stage) {
        op.stage = stage;
        self.notify(op);
    }

    fn notify(&self, op: &PendingOperation) {
        debug!(kind = ?op.kind, stage = ?op.stage, tx = ?op.tx_hash, "operation stage");
        if let Some(listener) = &self.listener {
            listener(op);
        }
    }

    fn finish<T>(&self, op: &mut PendingOperation, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.advance(op, Stage::Done),
            Err(e) => {
                warn!(kind = ?op.kind, category = ?e.category(), error = %e, "operation failed");
                self.advance(op, Stage::Failed(e.to_string()));
            }
        }
        result
    }
}
