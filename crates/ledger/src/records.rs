//! Decoding of read-only accessor return data into core records.

use alloy_sol_types::SolCall;
use signalpool_core::{Aggregation, CiphertextHandle, Signal, U256};

use crate::bindings::{per_mode, ISignalPoolFhe, ISignalPoolPlain};
use crate::interface::{
    agg_type_of, signal_type_of, uint_to_u64, EncodeError, LedgerInterface, LedgerQuery,
    GET_AGGREGATION_RESULT, GET_ENCRYPTED_RESULT, GET_SIGNAL_METADATA,
};

/// `getSignalMetadata(id)` return data.
pub fn decode_signal(interface: LedgerInterface, data: &[u8]) -> Result<Signal, EncodeError> {
    interface.function(GET_SIGNAL_METADATA)?;
    per_mode!(interface, m => {
        let r = m::getSignalMetadataCall::abi_decode_returns(data, true)?;
        Ok(Signal {
            id: uint_to_u64("id", r.id)?,
            contributor: r.contributor,
            signal_type: signal_type_of(r.signalType)?,
            timestamp: uint_to_u64("timestamp", r.timestamp)?,
            weight: uint_to_u64("weight", r.weight)?,
            active: r.active,
        })
    })
}

/// `aggregations(id)` return data. The stored result word is only meaningful
/// in plaintext mode; encrypted aggregations always report `None`.
pub fn decode_aggregation(
    interface: LedgerInterface,
    data: &[u8],
) -> Result<Aggregation, EncodeError> {
    per_mode!(interface, m => {
        let r = m::aggregationsCall::abi_decode_returns(data, true)?;
        let result = match interface {
            LedgerInterface::Plaintext => Some(u64::from(r.result)),
            LedgerInterface::Encrypted => None,
        };
        Ok(Aggregation {
            id: uint_to_u64("id", r.id)?,
            agg_type: agg_type_of(r.aggType)?,
            result,
            timestamp: uint_to_u64("timestamp", r.timestamp)?,
            total_revenue: r.totalRevenue,
            revenue_distributed: r.revenueDistributed,
        })
    })
}

/// Single `uint256` return value: counters and contributor revenue.
pub fn decode_uint(
    interface: LedgerInterface,
    query: &LedgerQuery,
    data: &[u8],
) -> Result<U256, EncodeError> {
    interface.function(query.function_name())?;
    match query {
        LedgerQuery::SignalCount => {
            per_mode!(interface, m => Ok(m::signalCounterCall::abi_decode_returns(data, true)?._0))
        }
        LedgerQuery::AggregationCount => per_mode!(interface, m => Ok(
            m::aggregationCounterCall::abi_decode_returns(data, true)?._0
        )),
        LedgerQuery::ContributorRevenue(_) => per_mode!(interface, m => Ok(
            m::getContributorRevenueCall::abi_decode_returns(data, true)?._0
        )),
        other => Err(EncodeError::InvalidArgument(format!(
            "{} does not return a single uint256",
            other.function_name()
        ))),
    }
}

/// `getAggregationResult(id)` return data. Plaintext only.
pub fn decode_result(interface: LedgerInterface, data: &[u8]) -> Result<u64, EncodeError> {
    interface.function(GET_AGGREGATION_RESULT)?;
    let r = ISignalPoolPlain::getAggregationResultCall::abi_decode_returns(data, true)?;
    Ok(u64::from(r._0))
}

/// `getEncryptedResult(id)` return data. Encrypted only.
pub fn decode_handle(
    interface: LedgerInterface,
    data: &[u8],
) -> Result<CiphertextHandle, EncodeError> {
    interface.function(GET_ENCRYPTED_RESULT)?;
    let r = ISignalPoolFhe::getEncryptedResultCall::abi_decode_returns(data, true)?;
    Ok(r._0)
}
