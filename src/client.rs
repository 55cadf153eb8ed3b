//! Client context and the operations the GUI can request.

use alloy_primitives::Address;
use std::sync::Arc;
use thiserror::Error;

use crate::amount::{AmountError, EtherAmount};
use crate::attestation::attestation_message;
use crate::contract::ContractHandle;
use crate::percent::{PercentRatio, ZeroDenominator};
use crate::ports::{PaymentReceipt, PaymentRequest, SignedAttestation};
use crate::rpc::RpcError;
use crate::validation::{self, Validity};
use crate::wallet::{TransactionRequest, WalletProvider};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no wallet provider available")]
    WalletUnavailable,
    #[error("wallet has no selected account")]
    NoAccount,
    #[error("invalid donee address `{0}`")]
    InvalidDonee(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),
    #[error("chain read failed: {0}")]
    ChainRead(#[source] RpcError),
    #[error("chain read returned undecodable data: {0}")]
    Decode(#[from] alloy_sol_types::Error),
    #[error(transparent)]
    ZeroDenominator(#[from] ZeroDenominator),
    #[error("transaction failed: {0}")]
    ChainWrite(#[source] RpcError),
    #[error("transaction {0} reverted")]
    Reverted(String),
    #[error("signature request failed: {0}")]
    Signature(#[source] RpcError),
}

/// Everything an operation needs, built once at startup.
pub struct ClientContext {
    wallet: Option<Arc<dyn WalletProvider>>,
    contract: ContractHandle,
    payee: Address,
    origin: Option<String>,
}

impl ClientContext {
    pub fn new(
        wallet: Option<Arc<dyn WalletProvider>>,
        contract: ContractHandle,
        payee: Address,
        origin: Option<String>,
    ) -> Self {
        Self {
            wallet,
            contract,
            payee,
            origin,
        }
    }

    pub fn payee(&self) -> Address {
        self.payee
    }

    pub fn contract(&self) -> &ContractHandle {
        &self.contract
    }

    pub fn wallet_available(&self) -> bool {
        self.wallet.is_some()
    }

    pub fn wallet_handle(&self) -> Option<Arc<dyn WalletProvider>> {
        self.wallet.clone()
    }

    fn wallet(&self) -> Result<&Arc<dyn WalletProvider>, ClientError> {
        self.wallet.as_ref().ok_or(ClientError::WalletUnavailable)
    }

    pub fn validate_address(&self, input: &str) -> Validity {
        validation::donee_validity(self.payee, input)
    }

    pub fn validate_amount(&self, input: &str) -> Validity {
        validation::amount_validity(input)
    }

    /// Reads the payee's ratio and renders it as a percentage, e.g. "7".
    pub async fn request_percent(&self) -> Result<String, ClientError> {
        let wallet = self.wallet()?;
        let to = self.contract.address;
        let (numerator, denominator) = tokio::try_join!(
            wallet.call(to, ContractHandle::numerator_call(self.payee)),
            wallet.call(to, ContractHandle::denominator_call(self.payee)),
        )
        .map_err(ClientError::ChainRead)?;

        let ratio = PercentRatio::new(
            ContractHandle::decode_uint(&numerator)?,
            ContractHandle::decode_uint(&denominator)?,
        )?;
        Ok(ratio.to_percent_string())
    }

    /// Pays the contract, splitting between payee and donee, then has the
    /// payer sign an attestation. `on_pending` runs once the transaction hash
    /// is known, before the receipt.
    pub async fn submit_payment<F>(
        &self,
        request: &PaymentRequest,
        on_pending: F,
    ) -> Result<PaymentReceipt, ClientError>
    where
        F: FnOnce() + Send,
    {
        let donee = validation::parse_address(&request.donee)
            .filter(|donee| *donee != self.payee)
            .ok_or_else(|| ClientError::InvalidDonee(request.donee.clone()))?;
        let amount = EtherAmount::parse(&request.amount)?;
        let wallet = self.wallet()?;

        // snapshot: an account switch mid-payment must not change the signer
        let payer = wallet
            .accounts()
            .await
            .map_err(ClientError::ChainRead)?
            .first()
            .copied()
            .ok_or(ClientError::NoAccount)?;

        let tx = TransactionRequest {
            from: payer,
            to: Some(self.contract.address),
            value: Some(amount.wei()),
            gas: None,
            data: ContractHandle::pay_and_donate_call(self.payee, donee),
        };
        let hash = wallet
            .send_transaction(&tx)
            .await
            .map_err(ClientError::ChainWrite)?;
        tracing::info!(tx = %hash, payer = %payer, donee = %donee, wei = %amount.wei(), "payment submitted");
        on_pending();

        let receipt = wallet
            .wait_for_receipt(hash)
            .await
            .map_err(ClientError::ChainWrite)?;
        if !receipt.succeeded() {
            return Err(ClientError::Reverted(receipt.transaction_hash.to_string()));
        }

        let message = attestation_message(self.origin.as_deref());
        let signature = wallet
            .sign_message(&message, payer)
            .await
            .map_err(ClientError::Signature)?;
        tracing::info!(tx = %receipt.transaction_hash, "payment confirmed and attested");

        Ok(PaymentReceipt {
            tx_hash: receipt.transaction_hash.to_string(),
            signature: SignedAttestation {
                signature: format!("0x{}", hex::encode(&signature)),
                message,
            },
        })
    }
}
