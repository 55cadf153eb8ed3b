//! Message ports between the GUI and the client.
//!
//! Every port is one variant; on the wire a message is
//! `{"port": "<name>", "payload": ...}` with the payload omitted for ports
//! that carry none.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Configuration handed to the GUI once, before anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupConfig {
    pub wallet_available: bool,
    pub payee_address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedAttestation {
    /// `0x`-prefixed 65-byte signature
    pub signature: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub tx_hash: String,
    pub signature: SignedAttestation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount: String,
    pub donee: String,
}

/// Inbound: GUI to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "port", content = "payload", rename_all = "kebab-case")]
pub enum GuiRequest {
    RequestPercent,
    ValidateAddress { input: String },
    ValidateAmount { input: String },
    SubmitPayment(PaymentRequest),
}

/// Outbound: client to GUI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "port", content = "payload", rename_all = "kebab-case")]
pub enum GuiEvent {
    Startup(StartupConfig),
    PortsReady,
    AccountChanged(Option<Address>),
    PercentResult(String),
    PercentQueryFailed { reason: String },
    AddressValidity { input: String, valid: bool },
    AmountValidity { input: String, valid: bool },
    PaymentPending,
    PaymentConfirmed(PaymentReceipt),
    PaymentFailed { reason: String },
}

impl GuiEvent {
    pub fn port(&self) -> &'static str {
        match self {
            GuiEvent::Startup(_) => "startup",
            GuiEvent::PortsReady => "ports-ready",
            GuiEvent::AccountChanged(_) => "account-changed",
            GuiEvent::PercentResult(_) => "percent-result",
            GuiEvent::PercentQueryFailed { .. } => "percent-query-failed",
            GuiEvent::AddressValidity { .. } => "address-validity",
            GuiEvent::AmountValidity { .. } => "amount-validity",
            GuiEvent::PaymentPending => "payment-pending",
            GuiEvent::PaymentConfirmed(_) => "payment-confirmed",
            GuiEvent::PaymentFailed { .. } => "payment-failed",
        }
    }
}

/// Sending half of the outbound ports. Sends never block; a GUI that has gone
/// away just stops receiving.
#[derive(Debug, Clone)]
pub struct PortSender {
    tx: mpsc::UnboundedSender<GuiEvent>,
}

impl PortSender {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<GuiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send(&self, event: GuiEvent) {
        let port = event.port();
        if self.tx.send(event).is_err() {
            tracing::debug!(port, "GUI gone, dropping event");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
