//! Protocol descriptors for the two ledger variants.
//!
//! A [`LedgerInterface`] is picked once per session from the operating mode and
//! is the only place that knows which wire signatures apply. Encoding a call
//! for one variant and decoding it with the other fails instead of silently
//! producing different arguments.

use alloy_sol_types::{SolCall, SolEvent};
use serde::{Deserialize, Serialize};
use signalpool_core::{
    encode_hex, Address, AggType, CiphertextHandle, OperatingMode, SignalType, B256, U256,
};
use thiserror::Error;

use crate::bindings::{per_mode, ISignalPoolFhe, ISignalPoolPlain};

/// Wei transferred per unit of signal value in plaintext mode.
pub const VALUE_SCALE: u64 = 1_000_000_000_000_000;

/// Largest signal value the ledger accepts (`uint32`).
pub const MAX_SIGNAL_VALUE: u64 = u32::MAX as u64;

pub const CONTRIBUTE: &str = "contributeSignal";
pub const AGGREGATE: &str = "aggregateSignals";
pub const DISTRIBUTE_REVENUE: &str = "distributeRevenue";
pub const GET_SIGNAL_METADATA: &str = "getSignalMetadata";
pub const GET_AGGREGATION_RESULT: &str = "getAggregationResult";
pub const GET_ENCRYPTED_RESULT: &str = "getEncryptedResult";
pub const GET_CONTRIBUTOR_REVENUE: &str = "getContributorRevenue";
pub const SIGNAL_COUNTER: &str = "signalCounter";
pub const AGGREGATION_COUNTER: &str = "aggregationCounter";
pub const AGGREGATIONS: &str = "aggregations";

pub const SIGNAL_CONTRIBUTED: &str = "SignalContributed";
pub const AGGREGATION_REQUESTED: &str = "AggregationRequested";
pub const AGGREGATION_COMPLETED: &str = "AggregationCompleted";
pub const REVENUE_DISTRIBUTED: &str = "RevenueDistributed";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("operation {name} is not part of the {mode} interface")]
    UnsupportedOperation { name: String, mode: OperatingMode },
    #[error("{mode} interface cannot carry {detail}")]
    ModeMismatch {
        mode: OperatingMode,
        detail: &'static str,
    },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{field} out of range: {value}")]
    InvalidField { field: &'static str, value: String },
    #[error("unknown event topic {0}")]
    UnknownEvent(B256),
    #[error("abi: {0}")]
    Abi(String),
}

impl From<alloy_sol_types::Error> for EncodeError {
    fn from(e: alloy_sol_types::Error) -> Self {
        Self::Abi(e.to_string())
    }
}

/// A ledger function as declared in the bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionInfo {
    pub name: &'static str,
    pub signature: &'static str,
    pub selector: [u8; 4],
    pub payable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventInfo {
    pub name: &'static str,
    pub signature: &'static str,
    /// Topic 0 of every log emitted for this event.
    pub topic: B256,
}

const fn function<C: SolCall>(name: &'static str, payable: bool) -> FunctionInfo {
    FunctionInfo {
        name,
        signature: C::SIGNATURE,
        selector: C::SELECTOR,
        payable,
    }
}

const fn event<E: SolEvent>(name: &'static str) -> EventInfo {
    EventInfo {
        name,
        signature: E::SIGNATURE,
        topic: E::SIGNATURE_HASH,
    }
}

static PLAINTEXT_FUNCTIONS: &[FunctionInfo] = &[
    function::<ISignalPoolPlain::contributeSignalCall>(CONTRIBUTE, true),
    function::<ISignalPoolPlain::aggregateSignalsCall>(AGGREGATE, true),
    function::<ISignalPoolPlain::distributeRevenueCall>(DISTRIBUTE_REVENUE, false),
    function::<ISignalPoolPlain::getSignalMetadataCall>(GET_SIGNAL_METADATA, false),
    function::<ISignalPoolPlain::getAggregationResultCall>(GET_AGGREGATION_RESULT, false),
    function::<ISignalPoolPlain::getContributorRevenueCall>(GET_CONTRIBUTOR_REVENUE, false),
    function::<ISignalPoolPlain::signalCounterCall>(SIGNAL_COUNTER, false),
    function::<ISignalPoolPlain::aggregationCounterCall>(AGGREGATION_COUNTER, false),
    function::<ISignalPoolPlain::aggregationsCall>(AGGREGATIONS, false),
];

static ENCRYPTED_FUNCTIONS: &[FunctionInfo] = &[
    function::<ISignalPoolFhe::contributeSignalCall>(CONTRIBUTE, true),
    function::<ISignalPoolFhe::aggregateSignalsCall>(AGGREGATE, true),
    function::<ISignalPoolFhe::distributeRevenueCall>(DISTRIBUTE_REVENUE, false),
    function::<ISignalPoolFhe::getSignalMetadataCall>(GET_SIGNAL_METADATA, false),
    function::<ISignalPoolFhe::getEncryptedResultCall>(GET_ENCRYPTED_RESULT, false),
    function::<ISignalPoolFhe::getContributorRevenueCall>(GET_CONTRIBUTOR_REVENUE, false),
    function::<ISignalPoolFhe::signalCounterCall>(SIGNAL_COUNTER, false),
    function::<ISignalPoolFhe::aggregationCounterCall>(AGGREGATION_COUNTER, false),
    function::<ISignalPoolFhe::aggregationsCall>(AGGREGATIONS, false),
];

static PLAINTEXT_EVENTS: &[EventInfo] = &[
    event::<ISignalPoolPlain::SignalContributed>(SIGNAL_CONTRIBUTED),
    event::<ISignalPoolPlain::AggregationRequested>(AGGREGATION_REQUESTED),
    event::<ISignalPoolPlain::AggregationCompleted>(AGGREGATION_COMPLETED),
    event::<ISignalPoolPlain::RevenueDistributed>(REVENUE_DISTRIBUTED),
];

static ENCRYPTED_EVENTS: &[EventInfo] = &[
    event::<ISignalPoolFhe::SignalContributed>(SIGNAL_CONTRIBUTED),
    event::<ISignalPoolFhe::AggregationRequested>(AGGREGATION_REQUESTED),
    event::<ISignalPoolFhe::AggregationCompleted>(AGGREGATION_COMPLETED),
    event::<ISignalPoolFhe::RevenueDistributed>(REVENUE_DISTRIBUTED),
];

/// How a contribution carries its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContributionPayload {
    /// Value transferred out-of-band as `value * VALUE_SCALE` wei.
    Plain { value: u64 },
    /// Ciphertext handle plus input proof from the encryption adapter.
    Encrypted {
        handle: CiphertextHandle,
        proof: Vec<u8>,
    },
}

/// A state-changing ledger operation with its logical arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    Contribute {
        signal_type: SignalType,
        payload: ContributionPayload,
        weight: u64,
    },
    Aggregate {
        agg_type: AggType,
        signal_ids: Vec<u64>,
        /// Wei sent along as revenue, never as an argument.
        revenue: U256,
    },
    DistributeRevenue {
        aggregation_id: u64,
    },
}

impl LedgerCall {
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::Contribute { .. } => CONTRIBUTE,
            Self::Aggregate { .. } => AGGREGATE,
            Self::DistributeRevenue { .. } => DISTRIBUTE_REVENUE,
        }
    }
}

/// Wire-ready payload: calldata plus the transfer amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedCall {
    pub signature: String,
    pub data: Vec<u8>,
    /// Wei.
    pub value: U256,
}

/// Read-only ledger accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerQuery {
    SignalMetadata(u64),
    AggregationResult(u64),
    EncryptedResult(u64),
    Aggregation(u64),
    ContributorRevenue(Address),
    SignalCount,
    AggregationCount,
}

impl LedgerQuery {
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::SignalMetadata(_) => GET_SIGNAL_METADATA,
            Self::AggregationResult(_) => GET_AGGREGATION_RESULT,
            Self::EncryptedResult(_) => GET_ENCRYPTED_RESULT,
            Self::Aggregation(_) => AGGREGATIONS,
            Self::ContributorRevenue(_) => GET_CONTRIBUTOR_REVENUE,
            Self::SignalCount => SIGNAL_COUNTER,
            Self::AggregationCount => AGGREGATION_COUNTER,
        }
    }
}

/// Protocol descriptor chosen once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerInterface {
    Plaintext,
    Encrypted,
}

impl LedgerInterface {
    pub fn for_mode(mode: OperatingMode) -> Self {
        match mode {
            OperatingMode::Plaintext => Self::Plaintext,
            OperatingMode::Encrypted => Self::Encrypted,
        }
    }

    pub fn mode(&self) -> OperatingMode {
        match self {
            Self::Plaintext => OperatingMode::Plaintext,
            Self::Encrypted => OperatingMode::Encrypted,
        }
    }

    pub fn functions(&self) -> &'static [FunctionInfo] {
        match self {
            Self::Plaintext => PLAINTEXT_FUNCTIONS,
            Self::Encrypted => ENCRYPTED_FUNCTIONS,
        }
    }

    pub fn events(&self) -> &'static [EventInfo] {
        match self {
            Self::Plaintext => PLAINTEXT_EVENTS,
            Self::Encrypted => ENCRYPTED_EVENTS,
        }
    }

    /// Look up a function by name in this variant.
    pub fn function(&self, name: &str) -> Result<&'static FunctionInfo, EncodeError> {
        self.functions()
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| EncodeError::UnsupportedOperation {
                name: name.to_string(),
                mode: self.mode(),
            })
    }

    pub fn event(&self, name: &str) -> Option<&'static EventInfo> {
        self.events().iter().find(|e| e.name == name)
    }

    /// Select the wire signature for `call` and encode its arguments.
    pub fn encode(&self, call: &LedgerCall) -> Result<EncodedCall, EncodeError> {
        let function = self.function(call.function_name())?;

        let (data, value) = match call {
            LedgerCall::Contribute {
                signal_type,
                payload,
                weight,
            } => {
                if *weight == 0 {
                    return Err(EncodeError::InvalidArgument(
                        "weight must be positive".to_string(),
                    ));
                }
                let kind = *signal_type as u8;
                let weight = U256::from(*weight);
                match (self, payload) {
                    (Self::Plaintext, ContributionPayload::Plain { value }) => {
                        if *value > MAX_SIGNAL_VALUE {
                            return Err(EncodeError::InvalidArgument(format!(
                                "signal value {value} exceeds uint32"
                            )));
                        }
                        let data = ISignalPoolPlain::contributeSignalCall {
                            signalType: kind,
                            weight,
                        }
                        .abi_encode();
                        (data, U256::from(*value) * U256::from(VALUE_SCALE))
                    }
                    (Self::Encrypted, ContributionPayload::Encrypted { handle, proof }) => {
                        let data = ISignalPoolFhe::contributeSignalCall {
                            signalType: kind,
                            encryptedValue: *handle,
                            inputProof: proof.clone().into(),
                            weight,
                        }
                        .abi_encode();
                        (data, U256::ZERO)
                    }
                    (Self::Plaintext, ContributionPayload::Encrypted { .. }) => {
                        return Err(EncodeError::ModeMismatch {
                            mode: self.mode(),
                            detail: "an encrypted contribution",
                        })
                    }
                    (Self::Encrypted, ContributionPayload::Plain { .. }) => {
                        return Err(EncodeError::ModeMismatch {
                            mode: self.mode(),
                            detail: "a plaintext contribution",
                        })
                    }
                }
            }
            LedgerCall::Aggregate {
                agg_type,
                signal_ids,
                revenue,
            } => {
                if signal_ids.is_empty() {
                    return Err(EncodeError::InvalidArgument(
                        "aggregation needs at least one signal id".to_string(),
                    ));
                }
                if signal_ids.contains(&0) {
                    return Err(EncodeError::InvalidArgument(
                        "signal ids start at 1".to_string(),
                    ));
                }
                let kind = *agg_type as u8;
                let ids: Vec<U256> = signal_ids.iter().map(|id| U256::from(*id)).collect();
                let data = per_mode!(self, m => m::aggregateSignalsCall {
                    aggType: kind,
                    signalIds: ids,
                }
                .abi_encode());
                (data, *revenue)
            }
            LedgerCall::DistributeRevenue { aggregation_id } => {
                let id = U256::from(*aggregation_id);
                let data = per_mode!(self, m => m::distributeRevenueCall { aggregationId: id }
                    .abi_encode());
                (data, U256::ZERO)
            }
        };

        Ok(EncodedCall {
            signature: function.signature.to_string(),
            data,
            value,
        })
    }

    /// Recover the logical call from an encoded payload.
    pub fn decode_call(&self, call: &EncodedCall) -> Result<LedgerCall, EncodeError> {
        let selector: [u8; 4] = call
            .data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| {
                EncodeError::InvalidArgument("calldata shorter than a selector".to_string())
            })?;
        let function = self
            .functions()
            .iter()
            .find(|f| f.selector == selector)
            .ok_or_else(|| EncodeError::UnsupportedOperation {
                name: format!("selector {}", encode_hex(&selector)),
                mode: self.mode(),
            })?;

        match function.name {
            CONTRIBUTE => {
                let (kind, payload, weight) = match self {
                    Self::Plaintext => {
                        let decoded =
                            ISignalPoolPlain::contributeSignalCall::abi_decode(&call.data, true)?;
                        let scale = U256::from(VALUE_SCALE);
                        if call.value % scale != U256::ZERO {
                            return Err(EncodeError::InvalidArgument(format!(
                                "transfer {} is not a whole signal value",
                                call.value
                            )));
                        }
                        let value = uint_to_u64("value", call.value / scale)?;
                        (
                            decoded.signalType,
                            ContributionPayload::Plain { value },
                            decoded.weight,
                        )
                    }
                    Self::Encrypted => {
                        let decoded =
                            ISignalPoolFhe::contributeSignalCall::abi_decode(&call.data, true)?;
                        (
                            decoded.signalType,
                            ContributionPayload::Encrypted {
                                handle: decoded.encryptedValue,
                                proof: decoded.inputProof.to_vec(),
                            },
                            decoded.weight,
                        )
                    }
                };
                Ok(LedgerCall::Contribute {
                    signal_type: signal_type_of(kind)?,
                    payload,
                    weight: uint_to_u64("weight", weight)?,
                })
            }
            AGGREGATE => per_mode!(self, m => {
                let decoded = m::aggregateSignalsCall::abi_decode(&call.data, true)?;
                let signal_ids = decoded
                    .signalIds
                    .into_iter()
                    .map(|id| uint_to_u64("signalIds", id))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(LedgerCall::Aggregate {
                    agg_type: agg_type_of(decoded.aggType)?,
                    signal_ids,
                    revenue: call.value,
                })
            }),
            DISTRIBUTE_REVENUE => per_mode!(self, m => {
                let decoded = m::distributeRevenueCall::abi_decode(&call.data, true)?;
                Ok(LedgerCall::DistributeRevenue {
                    aggregation_id: uint_to_u64("aggregationId", decoded.aggregationId)?,
                })
            }),
            other => Err(EncodeError::UnsupportedOperation {
                name: other.to_string(),
                mode: self.mode(),
            }),
        }
    }

    /// Encode calldata for a read-only accessor.
    pub fn encode_query(&self, query: &LedgerQuery) -> Result<Vec<u8>, EncodeError> {
        self.function(query.function_name())?;
        Ok(match *query {
            LedgerQuery::SignalMetadata(id) => per_mode!(self, m => m::getSignalMetadataCall {
                signalId: U256::from(id),
            }
            .abi_encode()),
            LedgerQuery::AggregationResult(id) => ISignalPoolPlain::getAggregationResultCall {
                aggregationId: U256::from(id),
            }
            .abi_encode(),
            LedgerQuery::EncryptedResult(id) => ISignalPoolFhe::getEncryptedResultCall {
                aggregationId: U256::from(id),
            }
            .abi_encode(),
            LedgerQuery::Aggregation(id) => per_mode!(self, m => m::aggregationsCall {
                aggregationId: U256::from(id),
            }
            .abi_encode()),
            LedgerQuery::ContributorRevenue(contributor) => {
                per_mode!(self, m => m::getContributorRevenueCall { contributor }.abi_encode())
            }
            LedgerQuery::SignalCount => per_mode!(self, m => m::signalCounterCall {}.abi_encode()),
            LedgerQuery::AggregationCount => {
                per_mode!(self, m => m::aggregationCounterCall {}.abi_encode())
            }
        })
    }
}

/// Narrow a `uint256` the client stores as `u64` (ids, weights, timestamps).
pub fn uint_to_u64(field: &'static str, value: U256) -> Result<u64, EncodeError> {
    u64::try_from(value).map_err(|_| EncodeError::InvalidField {
        field,
        value: value.to_string(),
    })
}

pub(crate) fn signal_type_of(raw: u8) -> Result<SignalType, EncodeError> {
    SignalType::from_u8(raw).ok_or(EncodeError::InvalidField {
        field: "signalType",
        value: raw.to_string(),
    })
}

pub(crate) fn agg_type_of(raw: u8) -> Result<AggType, EncodeError> {
    AggType::from_u8(raw).ok_or(EncodeError::InvalidField {
        field: "aggType",
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contribute_plain(value: u64) -> LedgerCall {
        LedgerCall::Contribute {
            signal_type: SignalType::PricePrediction,
            payload: ContributionPayload::Plain { value },
            weight: 1,
        }
    }

    fn contribute_encrypted() -> LedgerCall {
        LedgerCall::Contribute {
            signal_type: SignalType::BuySellVote,
            payload: ContributionPayload::Encrypted {
                handle: CiphertextHandle::repeat_byte(0x11),
                proof: vec![0xde, 0xad, 0xbe, 0xef],
            },
            weight: 3,
        }
    }

    #[test]
    fn test_contribute_signatures_differ_by_mode() {
        let plain = LedgerInterface::Plaintext.function(CONTRIBUTE).unwrap();
        let enc = LedgerInterface::Encrypted.function(CONTRIBUTE).unwrap();
        assert_eq!(plain.signature, "contributeSignal(uint8,uint256)");
        assert_eq!(enc.signature, "contributeSignal(uint8,bytes32,bytes,uint256)");
        assert_ne!(plain.selector, enc.selector);
        assert!(plain.payable);
    }

    #[test]
    fn test_plaintext_contribute_value_out_of_band() {
        let encoded = LedgerInterface::Plaintext.encode(&contribute_plain(42)).unwrap();
        assert_eq!(encoded.value, U256::from(42u64 * VALUE_SCALE));
        // selector + two words; the value is not an argument
        assert_eq!(encoded.data.len(), 4 + 64);
    }

    #[test]
    fn test_encrypted_contribute_transfers_nothing() {
        let encoded = LedgerInterface::Encrypted.encode(&contribute_encrypted()).unwrap();
        assert_eq!(encoded.value, U256::ZERO);
        assert_eq!(encoded.signature, "contributeSignal(uint8,bytes32,bytes,uint256)");
    }

    #[test]
    fn test_roundtrip_each_operation() {
        let cases = [
            (LedgerInterface::Plaintext, contribute_plain(42)),
            (LedgerInterface::Encrypted, contribute_encrypted()),
            (
                LedgerInterface::Plaintext,
                LedgerCall::Aggregate {
                    agg_type: AggType::WeightedMean,
                    signal_ids: vec![3, 5, 9],
                    revenue: U256::from(10_000_000_000_000_000u64),
                },
            ),
            (
                LedgerInterface::Encrypted,
                LedgerCall::DistributeRevenue { aggregation_id: 2 },
            ),
        ];
        for (iface, call) in cases {
            let encoded = iface.encode(&call).unwrap();
            assert_eq!(iface.decode_call(&encoded).unwrap(), call);
        }
    }

    #[test]
    fn test_aggregate_identical_across_modes() {
        let call = LedgerCall::Aggregate {
            agg_type: AggType::Mean,
            signal_ids: vec![1, 2],
            revenue: U256::ZERO,
        };
        let a = LedgerInterface::Plaintext.encode(&call).unwrap();
        let b = LedgerInterface::Encrypted.encode(&call).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_revenue_beyond_u128() {
        let revenue = U256::from(u128::MAX) + U256::from(1u8);
        let call = LedgerCall::Aggregate {
            agg_type: AggType::Mean,
            signal_ids: vec![1],
            revenue,
        };
        let encoded = LedgerInterface::Plaintext.encode(&call).unwrap();
        assert_eq!(encoded.value, revenue);
        assert_eq!(LedgerInterface::Plaintext.decode_call(&encoded).unwrap(), call);
    }

    #[test]
    fn test_mode_mismatch_is_rejected() {
        let err = LedgerInterface::Encrypted
            .encode(&contribute_plain(1))
            .unwrap_err();
        assert!(matches!(err, EncodeError::ModeMismatch { .. }));

        let err = LedgerInterface::Plaintext
            .encode(&contribute_encrypted())
            .unwrap_err();
        assert!(matches!(err, EncodeError::ModeMismatch { .. }));
    }

    #[test]
    fn test_cross_mode_decode_fails() {
        let encoded = LedgerInterface::Encrypted.encode(&contribute_encrypted()).unwrap();
        let err = LedgerInterface::Plaintext.decode_call(&encoded).unwrap_err();
        assert!(matches!(err, EncodeError::UnsupportedOperation { .. }));
    }

    #[test]
    fn test_decode_rejects_unknown_signal_type() {
        let data = ISignalPoolPlain::contributeSignalCall {
            signalType: 7,
            weight: U256::from(1u8),
        }
        .abi_encode();
        let call = EncodedCall {
            signature: String::new(),
            data,
            value: U256::ZERO,
        };
        assert!(matches!(
            LedgerInterface::Plaintext.decode_call(&call),
            Err(EncodeError::InvalidField { field: "signalType", .. })
        ));
    }

    #[test]
    fn test_invalid_arguments() {
        let empty = LedgerCall::Aggregate {
            agg_type: AggType::Mean,
            signal_ids: vec![],
            revenue: U256::ZERO,
        };
        assert!(matches!(
            LedgerInterface::Plaintext.encode(&empty),
            Err(EncodeError::InvalidArgument(_))
        ));

        let zero_weight = LedgerCall::Contribute {
            signal_type: SignalType::PricePrediction,
            payload: ContributionPayload::Plain { value: 1 },
            weight: 0,
        };
        assert!(matches!(
            LedgerInterface::Plaintext.encode(&zero_weight),
            Err(EncodeError::InvalidArgument(_))
        ));

        assert!(matches!(
            LedgerInterface::Plaintext.encode(&contribute_plain(MAX_SIGNAL_VALUE + 1)),
            Err(EncodeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_unsupported_query_per_mode() {
        let err = LedgerInterface::Plaintext
            .encode_query(&LedgerQuery::EncryptedResult(1))
            .unwrap_err();
        assert!(matches!(err, EncodeError::UnsupportedOperation { .. }));

        let err = LedgerInterface::Encrypted
            .encode_query(&LedgerQuery::AggregationResult(1))
            .unwrap_err();
        assert!(matches!(err, EncodeError::UnsupportedOperation { .. }));

        assert!(LedgerInterface::Encrypted
            .encode_query(&LedgerQuery::SignalCount)
            .is_ok());
    }

    #[test]
    fn test_completed_event_differs_by_mode() {
        let plain = LedgerInterface::Plaintext.event(AGGREGATION_COMPLETED).unwrap();
        let enc = LedgerInterface::Encrypted.event(AGGREGATION_COMPLETED).unwrap();
        assert_eq!(plain.signature, "AggregationCompleted(uint256,uint32)");
        assert_eq!(enc.signature, "AggregationCompleted(uint256,bytes32)");
        assert_ne!(plain.topic, enc.topic);
    }

    #[test]
    fn test_uint_to_u64_overflow() {
        assert_eq!(uint_to_u64("id", U256::from(9u8)).unwrap(), 9);
        assert!(matches!(
            uint_to_u64("id", U256::from(u64::MAX) + U256::from(1u8)),
            Err(EncodeError::InvalidField { field: "id", .. })
        ));
    }
}
