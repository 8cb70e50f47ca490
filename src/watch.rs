//! Update triggers.
//!
//! Triggers only say "something changed". They push [`UpdateSignal`]s onto a
//! bounded channel read by a single [`crate::monitor::ExposureMonitor`] loop,
//! which refetches and recomputes. A full channel already holds a pending
//! signal, so further signals are dropped rather than queued.

use crate::exposure::Address;
use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Why a recomputation was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSignal {
    /// Poll interval elapsed.
    Tick,
    /// A watched market contract emitted a log.
    MarketUpdated { market: Address },
}

/// Push a signal without waiting. Returns false once the receiver is gone.
fn offer(tx: &mpsc::Sender<UpdateSignal>, signal: UpdateSignal) -> bool {
    match tx.try_send(signal) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            debug!(?signal, "Update already pending, dropping signal");
            true
        }
        Err(TrySendError::Closed(_)) => false,
    }
}

/// Emit [`UpdateSignal::Tick`] every `interval`, starting one interval from now.
pub fn spawn_poll_trigger(interval: Duration, tx: mpsc::Sender<UpdateSignal>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if !offer(&tx, UpdateSignal::Tick) {
                debug!("Update receiver dropped, stopping poll trigger");
                return;
            }
        }
    })
}

/// `eth_subscribe` log subscription for the watched market contracts.
#[derive(Debug, Clone)]
pub struct LogSubscription {
    ws_url: String,
    markets: Vec<Address>,
    topic: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Notification {
    method: String,
    params: NotificationParams,
}

#[derive(Debug, Deserialize)]
struct NotificationParams {
    result: LogEntry,
}

#[derive(Debug, Deserialize)]
struct LogEntry {
    address: Address,
    #[serde(default)]
    removed: bool,
}

impl LogSubscription {
    pub fn new(ws_url: &str, markets: Vec<Address>) -> Self {
        Self {
            ws_url: ws_url.to_string(),
            markets,
            topic: None,
        }
    }

    /// Only react to logs whose first topic (the event signature hash) matches.
    pub fn with_topic(mut self, topic: &str) -> Self {
        self.topic = Some(topic.to_lowercase());
        self
    }

    fn subscribe_request(&self) -> serde_json::Value {
        let addresses: Vec<String> = self.markets.iter().map(Address::to_string).collect();
        let mut filter = serde_json::json!({ "address": addresses });
        if let Some(topic) = &self.topic {
            filter["topics"] = serde_json::json!([topic]);
        }

        serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_subscribe",
            "params": ["logs", filter],
        })
    }

    /// Connect, subscribe, and forward each log notification as
    /// [`UpdateSignal::MarketUpdated`].
    ///
    /// Connection failures are returned; once connected, the forwarding task
    /// ends when the socket closes or the receiver is dropped.
    pub async fn spawn(self, tx: mpsc::Sender<UpdateSignal>) -> Result<JoinHandle<()>> {
        info!(url = %self.ws_url, markets = self.markets.len(), "Subscribing to market logs");

        let (ws_stream, _) = connect_async(self.ws_url.as_str())
            .await
            .context("Failed to connect to WebSocket")?;
        let (mut write, mut read) = ws_stream.split();

        write
            .send(Message::Text(self.subscribe_request().to_string().into()))
            .await
            .context("Failed to send eth_subscribe")?;

        Ok(tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        let Some(signal) = parse_notification(&text) else {
                            debug!(text = text.as_str(), "Ignoring non-log message");
                            continue;
                        };
                        if !offer(&tx, signal) {
                            warn!("Update receiver dropped");
                            return;
                        }
                    }
                    Ok(Message::Close(_)) => {
                        info!("WebSocket closed by server");
                        return;
                    }
                    Err(e) => {
                        error!("WebSocket error: {}", e);
                        return;
                    }
                    _ => {}
                }
            }
        }))
    }
}

/// Extract a market update from a subscription notification.
///
/// Subscription confirmations, errors and reorg removals yield `None`.
fn parse_notification(text: &str) -> Option<UpdateSignal> {
    let notification: Notification = serde_json::from_str(text).ok()?;
    if notification.method != "eth_subscription" || notification.params.result.removed {
        return None;
    }

    Some(UpdateSignal::MarketUpdated {
        market: notification.params.result.address,
    })
}
