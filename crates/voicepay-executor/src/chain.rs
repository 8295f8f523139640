//! On-chain `pullPayment` execution (spec §4.4, §6 "On-chain call").
//!
//! Mirrors the teacher's `tip20` module: a thin wrapper around a generated
//! `sol!` contract binding, with a send timeout and a receipt-status check
//! standing in for "wait for inclusion". `ChainExecutor` is a trait (rather
//! than a bare generic-over-`Provider` struct, as the teacher's
//! `TempoSchemeFacilitator<P>` does) so the HTTP handler can run against a
//! `MockChainExecutor` in tests without spinning up an RPC endpoint — the
//! pack has no `async_trait`, so the trait returns a manually boxed future
//! rather than using `async fn` in a trait.

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, FixedBytes, TxHash, U256};
use alloy::providers::{
    fillers::{
        BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller, WalletFiller,
    },
    Identity, Provider, ProviderBuilder, RootProvider,
};
use alloy::sol;
use rust_decimal::Decimal;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ExecutorError;

/// USDC uses 6 decimal places on-chain; amounts in the shard are stored as
/// human-readable `Decimal` and must be scaled before the contract call.
const USDC_DECIMALS: u32 = 6;

sol! {
    #[sol(rpc)]
    interface RecurringPayments {
        function pullPayment(address token, address from, address to, uint256 amount, bytes32 scheduleId) external;
    }
}

pub type WalletProvider = FillProvider<
    JoinFill<
        JoinFill<
            Identity,
            JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
        >,
        WalletFiller<EthereumWallet>,
    >,
    RootProvider,
>;

pub struct PullPaymentRequest {
    pub token: Address,
    pub from: Address,
    pub to: Address,
    pub amount: Decimal,
    pub schedule_id: Uuid,
}

/// Encode a schedule UUID as the left-padded `bytes32` the contract expects
/// (spec §6: "the `scheduleId` is the 32-byte encoding (left-padded) of the
/// schedule UUID").
pub fn schedule_id_bytes(id: Uuid) -> FixedBytes<32> {
    let mut bytes = [0u8; 32];
    bytes[16..].copy_from_slice(id.as_bytes());
    FixedBytes::from(bytes)
}

fn decimal_to_token_units(amount: Decimal, decimals: u32) -> Result<U256, ExecutorError> {
    let scaled = amount * Decimal::from(10u64.pow(decimals));
    let scaled = scaled.trunc();
    U256::from_str(&scaled.to_string())
        .map_err(|e| ExecutorError::Validation(format!("amount out of range: {e}")))
}

pub trait ChainExecutor: Send + Sync {
    fn pull_payment<'a>(
        &'a self,
        request: PullPaymentRequest,
    ) -> Pin<Box<dyn Future<Output = Result<TxHash, ExecutorError>> + Send + 'a>>;
}

pub struct AlloyChainExecutor {
    provider: WalletProvider,
    contract_address: Address,
}

impl AlloyChainExecutor {
    pub fn new(private_key: &str, rpc_url: &str, contract_address: Address) -> Result<Self, ExecutorError> {
        let signer: alloy::signers::local::PrivateKeySigner = private_key
            .parse()
            .map_err(|e| ExecutorError::Internal(format!("invalid EXECUTOR_PRIVATE_KEY: {e}")))?;
        let url = rpc_url
            .parse()
            .map_err(|e| ExecutorError::Internal(format!("invalid RPC_URL: {e}")))?;
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url);
        Ok(Self {
            provider,
            contract_address,
        })
    }
}

impl ChainExecutor for AlloyChainExecutor {
    fn pull_payment<'a>(
        &'a self,
        request: PullPaymentRequest,
    ) -> Pin<Box<dyn Future<Output = Result<TxHash, ExecutorError>> + Send + 'a>> {
        Box::pin(async move {
            let amount = decimal_to_token_units(request.amount, USDC_DECIMALS)?;
            let schedule_id = schedule_id_bytes(request.schedule_id);
            let contract = RecurringPayments::new(self.contract_address, &self.provider);

            let pending = tokio::time::timeout(
                std::time::Duration::from_secs(30),
                contract
                    .pullPayment(request.token, request.from, request.to, amount, schedule_id)
                    .send(),
            )
            .await
            .map_err(|_| ExecutorError::Timeout("pullPayment send timed out after 30s".to_string()))?
            .map_err(|e| ExecutorError::RpcUnavailable(format!("pullPayment send failed: {e}")))?;

            let receipt = tokio::time::timeout(std::time::Duration::from_secs(60), pending.get_receipt())
                .await
                .map_err(|_| ExecutorError::Timeout("pullPayment receipt timed out after 60s".to_string()))?
                .map_err(|e| ExecutorError::RpcUnavailable(format!("pullPayment receipt failed: {e}")))?;

            if !receipt.status() {
                return Err(ExecutorError::ChainRevert("pullPayment reverted".to_string()));
            }

            Ok(receipt.transaction_hash)
        })
    }
}

/// Deterministic stand-in used in tests: always succeeds with a fixed hash,
/// or always fails, depending on construction.
pub struct MockChainExecutor {
    result: Result<TxHash, String>,
}

impl MockChainExecutor {
    pub fn succeeding() -> Self {
        Self {
            result: Ok(TxHash::from_slice(&[0x11; 32])),
        }
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            result: Err(reason.into()),
        }
    }
}

impl ChainExecutor for MockChainExecutor {
    fn pull_payment<'a>(
        &'a self,
        _request: PullPaymentRequest,
    ) -> Pin<Box<dyn Future<Output = Result<TxHash, ExecutorError>> + Send + 'a>> {
        let result = match &self.result {
            Ok(hash) => Ok(*hash),
            Err(reason) => Err(ExecutorError::ChainRevert(reason.clone())),
        };
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_id_left_pads_the_uuid() {
        let id = Uuid::from_u128(1);
        let bytes = schedule_id_bytes(id);
        assert_eq!(&bytes[..16], &[0u8; 16]);
        assert_eq!(&bytes[16..], id.as_bytes());
    }

    #[test]
    fn decimal_scales_to_usdc_units() {
        let amount = Decimal::from_str("12.50").unwrap();
        let units = decimal_to_token_units(amount, USDC_DECIMALS).unwrap();
        assert_eq!(units, U256::from(12_500_000u64));
    }

    #[tokio::test]
    async fn mock_executor_succeeds() {
        let executor = MockChainExecutor::succeeding();
        let request = PullPaymentRequest {
            token: Address::ZERO,
            from: Address::ZERO,
            to: Address::ZERO,
            amount: Decimal::from(10),
            schedule_id: Uuid::new_v4(),
        };
        assert!(executor.pull_payment(request).await.is_ok());
    }

    #[tokio::test]
    async fn mock_executor_reports_chain_revert() {
        let executor = MockChainExecutor::failing("insufficient allowance");
        let request = PullPaymentRequest {
            token: Address::ZERO,
            from: Address::ZERO,
            to: Address::ZERO,
            amount: Decimal::from(10),
            schedule_id: Uuid::new_v4(),
        };
        let err = executor.pull_payment(request).await.unwrap_err();
        assert!(matches!(err, ExecutorError::ChainRevert(_)));
    }
}
