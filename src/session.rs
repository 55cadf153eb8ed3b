//! One GUI attached to the client: answers its requests and forwards account
//! changes to it.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use crate::bootstrap::{AccountState, ClientRuntime};
use crate::client::ClientContext;
use crate::ports::{GuiEvent, GuiRequest, PortSender};

pub struct Session {
    runtime: ClientRuntime,
    events: PortSender,
}

impl Session {
    pub fn new(runtime: ClientRuntime, events: PortSender) -> Self {
        Self { runtime, events }
    }

    /// Runs until the GUI closes its request channel.
    ///
    /// Sends `startup`, then `ports-ready` once `requests` is being read, then
    /// starts forwarding account changes. Each request gets its own task so a
    /// payment waiting on its receipt never delays other answers.
    pub async fn run(self, mut requests: mpsc::Receiver<GuiRequest>) {
        let Session { runtime, events } = self;

        events.send(GuiEvent::Startup(runtime.startup_config()));
        events.send(GuiEvent::PortsReady);

        let forwarder = runtime
            .accounts
            .clone()
            .map(|accounts| tokio::spawn(forward_accounts(accounts, events.clone())));

        while let Some(request) = requests.recv().await {
            let ctx = runtime.ctx.clone();
            let events = events.clone();
            tokio::spawn(async move { handle_request(&ctx, request, &events).await });
        }

        if let Some(forwarder) = forwarder {
            forwarder.abort();
        }
        tracing::debug!("GUI session ended");
    }
}

async fn forward_accounts(mut accounts: watch::Receiver<AccountState>, events: PortSender) {
    loop {
        let state = *accounts.borrow_and_update();
        if let AccountState::Selected(account) = state {
            events.send(GuiEvent::AccountChanged(account));
        }
        if accounts.changed().await.is_err() || events.is_closed() {
            break;
        }
    }
}

/// Answer one GUI request on the matching outbound port(s).
pub async fn handle_request(ctx: &Arc<ClientContext>, request: GuiRequest, events: &PortSender) {
    match request {
        GuiRequest::RequestPercent => match ctx.request_percent().await {
            Ok(percent) => events.send(GuiEvent::PercentResult(percent)),
            Err(e) => {
                tracing::warn!(error = %e, "percent query failed");
                events.send(GuiEvent::PercentQueryFailed {
                    reason: e.to_string(),
                });
            }
        },
        GuiRequest::ValidateAddress { input } => {
            let valid = ctx.validate_address(&input).is_valid();
            events.send(GuiEvent::AddressValidity { input, valid });
        }
        GuiRequest::ValidateAmount { input } => {
            let valid = ctx.validate_amount(&input).is_valid();
            events.send(GuiEvent::AmountValidity { input, valid });
        }
        GuiRequest::SubmitPayment(payment) => {
            let pending = events.clone();
            let outcome = ctx
                .submit_payment(&payment, move || pending.send(GuiEvent::PaymentPending))
                .await;
            match outcome {
                Ok(receipt) => events.send(GuiEvent::PaymentConfirmed(receipt)),
                Err(e) => {
                    tracing::warn!(error = %e, donee = %payment.donee, "payment failed");
                    events.send(GuiEvent::PaymentFailed {
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
}
