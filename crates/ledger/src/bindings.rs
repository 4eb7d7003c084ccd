//! Solidity bindings for the two SignalPool deployments.
//!
//! Both declare the same entry points except for how a contribution carries
//! its value and how an aggregation reports its result.

use alloy_sol_types::sol;

sol! {
    /// Plaintext deployment. Contributions transfer their value as wei.
    #[derive(Debug, PartialEq, Eq)]
    interface ISignalPoolPlain {
        // Events
        event SignalContributed(
            uint256 indexed signalId,
            address indexed contributor,
            uint8 signalType,
            uint256 timestamp
        );
        event AggregationRequested(uint256 indexed aggregationId, uint8 aggType, uint256 signalCount);
        event AggregationCompleted(uint256 indexed aggregationId, uint32 result);
        event RevenueDistributed(
            uint256 indexed aggregationId,
            uint256 totalAmount,
            uint256 platformFee,
            uint256 participantShare
        );

        // State-changing functions
        function contributeSignal(uint8 signalType, uint256 weight) external payable returns (uint256);
        function aggregateSignals(uint8 aggType, uint256[] signalIds) external payable returns (uint256);
        function distributeRevenue(uint256 aggregationId) external;

        // View functions
        function getSignalMetadata(uint256 signalId) external view returns (
            uint256 id,
            address contributor,
            uint8 signalType,
            uint256 timestamp,
            uint256 weight,
            bool active
        );
        function getAggregationResult(uint256 aggregationId) external view returns (uint32);
        function getContributorRevenue(address contributor) external view returns (uint256);
        function signalCounter() external view returns (uint256);
        function aggregationCounter() external view returns (uint256);
        function aggregations(uint256 aggregationId) external view returns (
            uint256 id,
            uint8 aggType,
            uint32 result,
            uint256 timestamp,
            uint256 totalRevenue,
            bool revenueDistributed
        );
    }

    /// Encrypted deployment. Contributions carry a ciphertext handle and an
    /// input proof; results are handles until decrypted.
    #[derive(Debug, PartialEq, Eq)]
    interface ISignalPoolFhe {
        // Events
        event SignalContributed(
            uint256 indexed signalId,
            address indexed contributor,
            uint8 signalType,
            uint256 timestamp
        );
        event AggregationRequested(uint256 indexed aggregationId, uint8 aggType, uint256 signalCount);
        event AggregationCompleted(uint256 indexed aggregationId, bytes32 resultHandle);
        event RevenueDistributed(
            uint256 indexed aggregationId,
            uint256 totalAmount,
            uint256 platformFee,
            uint256 participantShare
        );

        // State-changing functions
        function contributeSignal(
            uint8 signalType,
            bytes32 encryptedValue,
            bytes inputProof,
            uint256 weight
        ) external payable returns (uint256);
        function aggregateSignals(uint8 aggType, uint256[] signalIds) external payable returns (uint256);
        function distributeRevenue(uint256 aggregationId) external;

        // View functions
        function getSignalMetadata(uint256 signalId) external view returns (
            uint256 id,
            address contributor,
            uint8 signalType,
            uint256 timestamp,
            uint256 weight,
            bool active
        );
        function getEncryptedResult(uint256 aggregationId) external view returns (bytes32);
        function getContributorRevenue(address contributor) external view returns (uint256);
        function signalCounter() external view returns (uint256);
        function aggregationCounter() external view returns (uint256);
        function aggregations(uint256 aggregationId) external view returns (
            uint256 id,
            uint8 aggType,
            uint32 result,
            uint256 timestamp,
            uint256 totalRevenue,
            bool revenueDistributed
        );
    }
}

/// Evaluates `$body` with `$m` naming the bindings module of `$iface`.
/// Only for items both deployments declare identically.
macro_rules! per_mode {
    ($iface:expr, $m:ident => $body:expr) => {
        match $iface {
            $crate::interface::LedgerInterface::Plaintext => {
                use $crate::bindings::ISignalPoolPlain as $m;
                $body
            }
            $crate::interface::LedgerInterface::Encrypted => {
                use $crate::bindings::ISignalPoolFhe as $m;
                $body
            }
        }
    };
}

pub(crate) use per_mode;

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::{SolCall, SolEvent};

    #[test]
    fn test_shared_selectors_match() {
        assert_eq!(
            ISignalPoolPlain::aggregateSignalsCall::SELECTOR,
            ISignalPoolFhe::aggregateSignalsCall::SELECTOR
        );
        assert_eq!(
            ISignalPoolPlain::SignalContributed::SIGNATURE_HASH,
            ISignalPoolFhe::SignalContributed::SIGNATURE_HASH
        );
        assert_ne!(
            ISignalPoolPlain::contributeSignalCall::SELECTOR,
            ISignalPoolFhe::contributeSignalCall::SELECTOR
        );
    }

    #[test]
    fn test_event_signatures() {
        assert_eq!(
            ISignalPoolPlain::AggregationCompleted::SIGNATURE,
            "AggregationCompleted(uint256,uint32)"
        );
        assert_eq!(
            ISignalPoolFhe::AggregationCompleted::SIGNATURE,
            "AggregationCompleted(uint256,bytes32)"
        );
    }
}
