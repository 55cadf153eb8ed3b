//! In-memory wallet provider shared by the integration tests.
#![allow(dead_code)]

use alloy_primitives::{address, keccak256, Address, Bytes, B256, U256, U64};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use std::sync::Mutex;

use split_donate::attestation::personal_message_hash;
use split_donate::contract::ISplitDonation;
use split_donate::rpc::RpcError;
use split_donate::wallet::{TransactionReceipt, TransactionRequest, WalletProvider};

pub const PAYEE: Address = address!("15be789665c03105c81130d884d5fa223d6f1260");
pub const DONEE: Address = address!("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
pub const CONTRACT: Address = address!("e78a0f7e598cc8b0bb87894b0f60dd2a88d6a8ab");

pub fn secret() -> SecretKey {
    SecretKey::from_slice(&[0x42; 32]).unwrap()
}

pub fn address_of(secret: &SecretKey) -> Address {
    let pk = PublicKey::from_secret_key(&Secp256k1::new(), secret);
    let hash = keccak256(&pk.serialize_uncompressed()[1..]);
    Address::from_slice(&hash[12..])
}

pub fn word(value: u64) -> Bytes {
    Bytes::from(U256::from(value).to_be_bytes::<32>().to_vec())
}

fn selector(data: &[u8]) -> [u8; 4] {
    let mut sel = [0u8; 4];
    if data.len() >= 4 {
        sel.copy_from_slice(&data[..4]);
    }
    sel
}

fn rejected(message: &str) -> RpcError {
    RpcError::Rpc {
        code: -32000,
        message: message.to_string(),
    }
}

/// Scripted wallet. Every trait call is recorded in `log` by method name.
pub struct FakeWallet {
    pub numerator: u64,
    pub denominator: u64,
    pub accounts: Mutex<Vec<Address>>,
    pub log: Mutex<Vec<&'static str>>,
    pub sent: Mutex<Vec<TransactionRequest>>,
    pub gas_estimate: u64,
    pub fail_reads: bool,
    pub revert_payment: bool,
    pub revert_configure: bool,
    pub reject_configure: bool,
    pub refuse_signature: bool,
    pub deployed_at: Address,
}

impl Default for FakeWallet {
    fn default() -> Self {
        Self {
            numerator: 7,
            denominator: 100,
            accounts: Mutex::new(vec![address_of(&secret())]),
            log: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            gas_estimate: 1_000_000,
            fail_reads: false,
            revert_payment: false,
            revert_configure: false,
            reject_configure: false,
            refuse_signature: false,
            deployed_at: CONTRACT,
        }
    }
}

impl FakeWallet {
    pub fn log(&self) -> Vec<&'static str> {
        self.log.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn select(&self, accounts: Vec<Address>) {
        *self.accounts.lock().unwrap() = accounts;
    }

    fn record(&self, method: &'static str) {
        self.log.lock().unwrap().push(method);
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    async fn chain_id(&self) -> Result<u64, RpcError> {
        Ok(1337)
    }

    async fn accounts(&self) -> Result<Vec<Address>, RpcError> {
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError> {
        self.record("call");
        assert_eq!(to, self.deployed_at);
        if self.fail_reads {
            return Err(rejected("execution reverted"));
        }
        let sel = selector(&data);
        if sel == ISplitDonation::numeratorCall::SELECTOR {
            Ok(word(self.numerator))
        } else if sel == ISplitDonation::denominatorCall::SELECTOR {
            Ok(word(self.denominator))
        } else {
            panic!("unexpected eth_call selector {}", hex::encode(sel))
        }
    }

    async fn estimate_gas(&self, _tx: &TransactionRequest) -> Result<U256, RpcError> {
        self.record("estimate_gas");
        Ok(U256::from(self.gas_estimate))
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, RpcError> {
        self.record("send_transaction");
        if self.reject_configure
            && selector(&tx.data) == ISplitDonation::setNumeratorAndDenominatorCall::SELECTOR
        {
            return Err(rejected("sender account not recognized"));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(tx.clone());
        Ok(B256::with_last_byte(sent.len() as u8))
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt, RpcError> {
        self.record("wait_for_receipt");
        let index = hash[31] as usize - 1;
        let tx = self.sent.lock().unwrap()[index].clone();

        let sel = selector(&tx.data);
        let reverted = (self.revert_payment && sel == ISplitDonation::payAndDonateCall::SELECTOR)
            || (self.revert_configure
                && sel == ISplitDonation::setNumeratorAndDenominatorCall::SELECTOR);
        Ok(TransactionReceipt {
            transaction_hash: hash,
            contract_address: tx.to.is_none().then_some(self.deployed_at),
            status: Some(U64::from(if reverted { 0u64 } else { 1u64 })),
            gas_used: Some(U256::from(21_000u64)),
            block_number: Some(U64::from(index as u64 + 1)),
        })
    }

    async fn sign_message(&self, message: &str, signer: Address) -> Result<Bytes, RpcError> {
        self.record("sign_message");
        if self.refuse_signature {
            return Err(RpcError::Rpc {
                code: 4001,
                message: "User denied message signature.".to_string(),
            });
        }
        assert_eq!(signer, address_of(&secret()), "only the test key can sign");

        let secp = Secp256k1::new();
        let digest = personal_message_hash(message.as_bytes());
        let msg = Message::from_slice(digest.as_slice()).unwrap();
        let (rec_id, compact) = secp
            .sign_ecdsa_recoverable(&msg, &secret())
            .serialize_compact();
        let mut sig = compact.to_vec();
        sig.push(rec_id.to_i32() as u8 + 27);
        Ok(sig.into())
    }
}
