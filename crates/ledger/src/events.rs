//! Event log decoding.
//!
//! Logs are matched by topic 0 against the events of the session's
//! [`LedgerInterface`] and decoded with the generated bindings.

use alloy_sol_types::SolEvent;
use serde::{Deserialize, Serialize};
use signalpool_core::{Address, AggType, CiphertextHandle, Log, SignalType, U256};

use crate::bindings::{per_mode, ISignalPoolFhe, ISignalPoolPlain};
use crate::interface::{
    agg_type_of, signal_type_of, uint_to_u64, EncodeError, LedgerInterface, AGGREGATION_COMPLETED,
    AGGREGATION_REQUESTED, REVENUE_DISTRIBUTED, SIGNAL_CONTRIBUTED,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalContributed {
    pub signal_id: u64,
    pub contributor: Address,
    pub signal_type: SignalType,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationRequested {
    pub aggregation_id: u64,
    pub agg_type: AggType,
    pub signal_count: u64,
}

/// Result carried by `AggregationCompleted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletedOutcome {
    Plain(u64),
    Encrypted(CiphertextHandle),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationCompleted {
    pub aggregation_id: u64,
    pub outcome: CompletedOutcome,
}

/// Amounts reported by `RevenueDistributed`, all in wei.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionDetails {
    pub aggregation_id: u64,
    pub total_amount: U256,
    pub platform_fee: U256,
    pub participant_share: U256,
}

/// A ledger log decoded under one interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodedEvent {
    SignalContributed(SignalContributed),
    AggregationRequested(AggregationRequested),
    AggregationCompleted(AggregationCompleted),
    RevenueDistributed(DistributionDetails),
}

impl DecodedEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SignalContributed(_) => SIGNAL_CONTRIBUTED,
            Self::AggregationRequested(_) => AGGREGATION_REQUESTED,
            Self::AggregationCompleted(_) => AGGREGATION_COMPLETED,
            Self::RevenueDistributed(_) => REVENUE_DISTRIBUTED,
        }
    }
}

impl LedgerInterface {
    /// Decode a log emitted by the ledger. Unknown topics are an error.
    pub fn decode_log(&self, log: &Log) -> Result<DecodedEvent, EncodeError> {
        let topic = *log
            .data
            .topics()
            .first()
            .ok_or_else(|| EncodeError::InvalidArgument("anonymous log".to_string()))?;

        per_mode!(self, m => {
            if topic == m::SignalContributed::SIGNATURE_HASH {
                let event = m::SignalContributed::decode_log(log, true)?.data;
                return Ok(DecodedEvent::SignalContributed(SignalContributed {
                    signal_id: uint_to_u64("signalId", event.signalId)?,
                    contributor: event.contributor,
                    signal_type: signal_type_of(event.signalType)?,
                    timestamp: uint_to_u64("timestamp", event.timestamp)?,
                }));
            }
            if topic == m::AggregationRequested::SIGNATURE_HASH {
                let event = m::AggregationRequested::decode_log(log, true)?.data;
                return Ok(DecodedEvent::AggregationRequested(AggregationRequested {
                    aggregation_id: uint_to_u64("aggregationId", event.aggregationId)?,
                    agg_type: agg_type_of(event.aggType)?,
                    signal_count: uint_to_u64("signalCount", event.signalCount)?,
                }));
            }
            if topic == m::RevenueDistributed::SIGNATURE_HASH {
                let event = m::RevenueDistributed::decode_log(log, true)?.data;
                return Ok(DecodedEvent::RevenueDistributed(DistributionDetails {
                    aggregation_id: uint_to_u64("aggregationId", event.aggregationId)?,
                    total_amount: event.totalAmount,
                    platform_fee: event.platformFee,
                    participant_share: event.participantShare,
                }));
            }
        });

        let completed = match self {
            Self::Plaintext if topic == ISignalPoolPlain::AggregationCompleted::SIGNATURE_HASH => {
                let event = ISignalPoolPlain::AggregationCompleted::decode_log(log, true)?.data;
                AggregationCompleted {
                    aggregation_id: uint_to_u64("aggregationId", event.aggregationId)?,
                    outcome: CompletedOutcome::Plain(u64::from(event.result)),
                }
            }
            Self::Encrypted if topic == ISignalPoolFhe::AggregationCompleted::SIGNATURE_HASH => {
                let event = ISignalPoolFhe::AggregationCompleted::decode_log(log, true)?.data;
                AggregationCompleted {
                    aggregation_id: uint_to_u64("aggregationId", event.aggregationId)?,
                    outcome: CompletedOutcome::Encrypted(event.resultHandle),
                }
            }
            _ => return Err(EncodeError::UnknownEvent(topic)),
        };
        Ok(DecodedEvent::AggregationCompleted(completed))
    }
}

/// Typed event view. Implementors name the event they decode from.
pub trait LedgerEvent: Sized {
    const NAME: &'static str;

    fn from_event(event: DecodedEvent) -> Option<Self>;

    /// First log in `logs` that decodes as this event under `interface`.
    fn find_in(interface: LedgerInterface, logs: &[Log]) -> Option<Self> {
        logs.iter()
            .filter_map(|log| interface.decode_log(log).ok())
            .find_map(Self::from_event)
    }
}

impl LedgerEvent for SignalContributed {
    const NAME: &'static str = SIGNAL_CONTRIBUTED;

    fn from_event(event: DecodedEvent) -> Option<Self> {
        match event {
            DecodedEvent::SignalContributed(e) => Some(e),
            _ => None,
        }
    }
}

impl LedgerEvent for AggregationRequested {
    const NAME: &'static str = AGGREGATION_REQUESTED;

    fn from_event(event: DecodedEvent) -> Option<Self> {
        match event {
            DecodedEvent::AggregationRequested(e) => Some(e),
            _ => None,
        }
    }
}

impl LedgerEvent for AggregationCompleted {
    const NAME: &'static str = AGGREGATION_COMPLETED;

    fn from_event(event: DecodedEvent) -> Option<Self> {
        match event {
            DecodedEvent::AggregationCompleted(e) => Some(e),
            _ => None,
        }
    }
}

impl LedgerEvent for DistributionDetails {
    const NAME: &'static str = REVENUE_DISTRIBUTED;

    fn from_event(event: DecodedEvent) -> Option<Self> {
        match event {
            DecodedEvent::RevenueDistributed(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signalpool_core::{Bytes, B256};

    fn contract() -> Address {
        Address::repeat_byte(0xaa)
    }

    fn log<E: SolEvent>(event: &E) -> Log {
        Log {
            address: contract(),
            data: event.encode_log_data(),
        }
    }

    #[test]
    fn test_signal_contributed() {
        let iface = LedgerInterface::Plaintext;
        let log = log(&ISignalPoolPlain::SignalContributed {
            signalId: U256::from(7u8),
            contributor: Address::repeat_byte(0x01),
            signalType: 2,
            timestamp: U256::from(1_700_000_000u64),
        });
        assert_eq!(log.data.topics().len(), 3);

        let event = SignalContributed::find_in(iface, &[log]).unwrap();
        assert_eq!(event.signal_id, 7);
        assert_eq!(event.contributor, Address::repeat_byte(0x01));
        assert_eq!(event.signal_type, SignalType::BuySellVote);
        assert_eq!(event.timestamp, 1_700_000_000);
    }

    #[test]
    fn test_find_skips_unrelated_logs() {
        let iface = LedgerInterface::Encrypted;
        let noise = Log::new_unchecked(contract(), vec![B256::repeat_byte(0x55)], Bytes::new());
        let requested = log(&ISignalPoolFhe::AggregationRequested {
            aggregationId: U256::from(2u8),
            aggType: 1,
            signalCount: U256::from(3u8),
        });
        let event = AggregationRequested::find_in(iface, &[noise, requested]).unwrap();
        assert_eq!(event.aggregation_id, 2);
        assert_eq!(event.agg_type, AggType::WeightedMean);
        assert_eq!(event.signal_count, 3);
        assert!(SignalContributed::find_in(iface, &[]).is_none());
    }

    #[test]
    fn test_completed_event_per_mode() {
        let plain = log(&ISignalPoolPlain::AggregationCompleted {
            aggregationId: U256::from(4u8),
            result: 1234,
        });
        let event =
            AggregationCompleted::find_in(LedgerInterface::Plaintext, &[plain.clone()]).unwrap();
        assert_eq!(event.outcome, CompletedOutcome::Plain(1234));
        // topic differs, so the other variant does not recognise it
        assert!(AggregationCompleted::find_in(LedgerInterface::Encrypted, &[plain]).is_none());

        let enc = log(&ISignalPoolFhe::AggregationCompleted {
            aggregationId: U256::from(4u8),
            resultHandle: B256::repeat_byte(0x42),
        });
        let event = AggregationCompleted::find_in(LedgerInterface::Encrypted, &[enc]).unwrap();
        assert_eq!(
            event.outcome,
            CompletedOutcome::Encrypted(B256::repeat_byte(0x42))
        );
    }

    #[test]
    fn test_revenue_distributed_full_width_amounts() {
        let iface = LedgerInterface::Plaintext;
        let total = U256::MAX;
        let log = log(&ISignalPoolPlain::RevenueDistributed {
            aggregationId: U256::from(2u8),
            totalAmount: total,
            platformFee: U256::ZERO,
            participantShare: U256::ZERO,
        });
        let details = DistributionDetails::find_in(iface, &[log]).unwrap();
        assert_eq!(
            details,
            DistributionDetails {
                aggregation_id: 2,
                total_amount: total,
                platform_fee: U256::ZERO,
                participant_share: U256::ZERO,
            }
        );
    }

    #[test]
    fn test_decode_log_errors() {
        let iface = LedgerInterface::Plaintext;
        let unknown = Log::new_unchecked(contract(), vec![B256::repeat_byte(0x01)], Bytes::new());
        assert_eq!(
            iface.decode_log(&unknown),
            Err(EncodeError::UnknownEvent(B256::repeat_byte(0x01)))
        );

        let full = log(&ISignalPoolPlain::RevenueDistributed {
            aggregationId: U256::from(1u8),
            totalAmount: U256::from(1u8),
            platformFee: U256::from(1u8),
            participantShare: U256::from(1u8),
        });
        let truncated = Log::new_unchecked(
            contract(),
            full.data.topics()[..1].to_vec(),
            full.data.data.clone(),
        );
        assert!(matches!(
            iface.decode_log(&truncated),
            Err(EncodeError::Abi(_))
        ));
    }

    #[test]
    fn test_event_id_overflow_is_rejected() {
        let log = log(&ISignalPoolPlain::AggregationRequested {
            aggregationId: U256::MAX,
            aggType: 0,
            signalCount: U256::from(1u8),
        });
        assert!(matches!(
            LedgerInterface::Plaintext.decode_log(&log),
            Err(EncodeError::InvalidField { field: "aggregationId", .. })
        ));
    }
}
