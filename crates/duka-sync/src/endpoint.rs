//! # Remote Endpoint
//!
//! The remote system of record that queued sales are pushed to.
//!
//! ## WebSocket Exchange
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  push_sale(sale)                                                        │
//! │     │                                                                   │
//! │     ├── no socket?  backing off? ──► Err(Disconnected)                  │
//! │     │               else connect (connect_timeout)                      │
//! │     │                  failure ──► schedule retry (exponential backoff) │
//! │     │                                                                   │
//! │     ├── send SalePush                                                   │
//! │     └── wait for SaleAck { sale_id }          (push_timeout)            │
//! │           Error { .. }  ──► Err(Rejected), socket kept                  │
//! │           timeout / close / garbage ──► socket dropped                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::{timeout, Instant};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use duka_core::Sale;

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::protocol::SyncMessage;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Where queued sales go.
///
/// `Ok` means the remote durably holds the sale; anything else leaves it
/// queued for the next drain.
#[async_trait]
pub trait RemoteEndpoint: Send + Sync {
    async fn push_sale(&self, sale: &Sale) -> SyncResult<()>;
}

// =============================================================================
// WebSocket Endpoint
// =============================================================================

struct Connection {
    stream: Option<WsStream>,
    backoff: ExponentialBackoff,
    retry_at: Option<Instant>,
}

/// [`RemoteEndpoint`] over one long-lived WebSocket.
///
/// Pushes are serialized on the socket; the coordinator pushes one sale at
/// a time anyway.
pub struct WsEndpoint {
    url: String,
    device_id: String,
    connect_timeout: Duration,
    push_timeout: Duration,
    max_backoff: Duration,
    conn: Mutex<Connection>,
}

impl WsEndpoint {
    pub fn new(config: &SyncConfig) -> SyncResult<Self> {
        let url = config.endpoint()?;
        Ok(WsEndpoint {
            url: url.to_string(),
            device_id: config.device_id.clone(),
            connect_timeout: config.connect_timeout(),
            push_timeout: config.push_timeout(),
            max_backoff: config.max_backoff(),
            conn: Mutex::new(Connection {
                stream: None,
                backoff: ExponentialBackoff {
                    current_interval: config.initial_backoff(),
                    initial_interval: config.initial_backoff(),
                    max_interval: config.max_backoff(),
                    multiplier: 2.0,
                    max_elapsed_time: None,
                    ..Default::default()
                },
                retry_at: None,
            }),
        })
    }

    /// Sends a close frame and forgets the socket.
    pub async fn close(&self) {
        let mut conn = self.conn.lock().await;
        if let Some(mut stream) = conn.stream.take() {
            let _ = stream.send(WsMessage::Close(None)).await;
            info!(url = %self.url, "Sync connection closed");
        }
    }

    async fn connect(&self) -> SyncResult<WsStream> {
        match timeout(self.connect_timeout, connect_async(self.url.as_str())).await {
            Ok(Ok((stream, response))) => {
                info!(url = %self.url, status = ?response.status(), "Sync endpoint connected");
                Ok(stream)
            }
            Ok(Err(e)) => Err(SyncError::from(e)),
            Err(_) => Err(SyncError::Timeout(self.connect_timeout.as_millis() as u64)),
        }
    }

    async fn ensure_connected<'a>(&self, conn: &'a mut Connection) -> SyncResult<&'a mut WsStream> {
        if conn.stream.is_none() {
            if let Some(at) = conn.retry_at {
                if Instant::now() < at {
                    return Err(SyncError::Disconnected);
                }
            }
            match self.connect().await {
                Ok(stream) => {
                    conn.backoff.reset();
                    conn.retry_at = None;
                    conn.stream = Some(stream);
                }
                Err(e) => {
                    let delay = conn.backoff.next_backoff().unwrap_or(self.max_backoff);
                    conn.retry_at = Some(Instant::now() + delay);
                    warn!(error = %e, retry_in = ?delay, "Sync endpoint unreachable");
                    return Err(e);
                }
            }
        }
        conn.stream.as_mut().ok_or(SyncError::Disconnected)
    }
}

#[async_trait]
impl RemoteEndpoint for WsEndpoint {
    async fn push_sale(&self, sale: &Sale) -> SyncResult<()> {
        let json = SyncMessage::sale_push(&self.device_id, sale.clone()).to_json()?;

        let mut conn = self.conn.lock().await;
        let stream = self.ensure_connected(&mut conn).await?;
        let outcome = timeout(self.push_timeout, exchange(stream, json, &sale.id)).await;

        match outcome {
            Ok(Ok(())) => {
                debug!(sale_id = %sale.id, "Sale acknowledged");
                Ok(())
            }
            Ok(Err(e @ SyncError::Rejected { .. })) => Err(e),
            Ok(Err(e)) => {
                conn.stream = None;
                Err(e)
            }
            Err(_) => {
                conn.stream = None;
                Err(SyncError::Timeout(self.push_timeout.as_millis() as u64))
            }
        }
    }
}

/// Sends one push and waits for its ack.
async fn exchange(stream: &mut WsStream, json: String, sale_id: &str) -> SyncResult<()> {
    stream.send(WsMessage::Text(json.into())).await?;

    while let Some(frame) = stream.next().await {
        match frame? {
            WsMessage::Text(text) => match SyncMessage::from_json(text.as_str())? {
                SyncMessage::SaleAck { sale_id: acked } if acked == sale_id => return Ok(()),
                SyncMessage::SaleAck { sale_id: acked } => {
                    warn!(expected = %sale_id, acked = %acked, "Ignoring ack for another sale");
                }
                SyncMessage::Error { code, message } => {
                    return Err(SyncError::Rejected { code, message });
                }
                other => {
                    return Err(SyncError::UnexpectedMessageType {
                        expected: "SaleAck".to_string(),
                        actual: other.type_name().to_string(),
                    });
                }
            },
            WsMessage::Ping(data) => stream.send(WsMessage::Pong(data)).await?,
            WsMessage::Close(frame) => {
                debug!(?frame, "Remote closed the sync connection");
                return Err(SyncError::Disconnected);
            }
            _ => {}
        }
    }
    Err(SyncError::Disconnected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tokio::net::TcpListener;

    fn sale(id: &str) -> Sale {
        Sale {
            id: id.to_string(),
            items: vec![],
            subtotal_cents: 10_000,
            discount_cents: 0,
            tax_cents: 1_600,
            total_cents: 11_600,
            payments: vec![],
            change_cents: 0,
            customer_id: "cust001".to_string(),
            cashier_id: "u1".to_string(),
            cashier_name: "Amina".to_string(),
            shift_id: "s1".to_string(),
            points_earned: 0,
            points_used: 0,
            points_value_cents: 0,
            points_balance_after: 0,
            quotation_id: None,
            date: Utc::now(),
            synced: false,
        }
    }

    /// Accepts one connection and answers every push with `reply(sale_id)`.
    async fn serve(reply: fn(&str) -> SyncMessage) -> SyncConfig {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            while let Some(Ok(frame)) = ws.next().await {
                if let WsMessage::Text(text) = frame {
                    if let Ok(SyncMessage::SalePush(push)) = SyncMessage::from_json(text.as_str()) {
                        let answer = reply(&push.sale.id).to_json().unwrap();
                        ws.send(WsMessage::Text(answer.into())).await.unwrap();
                    }
                }
            }
        });

        SyncConfig {
            endpoint_url: Some(format!("ws://{}/sync", addr)),
            push_timeout_secs: 2,
            connect_timeout_secs: 2,
            ..SyncConfig::default()
        }
    }

    #[tokio::test]
    async fn test_push_is_acknowledged() {
        let config = serve(|id| SyncMessage::SaleAck {
            sale_id: id.to_string(),
        })
        .await;
        let endpoint = WsEndpoint::new(&config).unwrap();

        endpoint.push_sale(&sale("INV-1")).await.unwrap();
        // Same socket is reused for the next push.
        endpoint.push_sale(&sale("INV-2")).await.unwrap();
        endpoint.close().await;
    }

    #[tokio::test]
    async fn test_remote_error_is_a_rejection() {
        let config = serve(|_| SyncMessage::Error {
            code: "BAD_TOTAL".to_string(),
            message: "total mismatch".to_string(),
        })
        .await;
        let endpoint = WsEndpoint::new(&config).unwrap();

        let err = endpoint.push_sale(&sale("INV-1")).await.unwrap_err();
        assert!(matches!(err, SyncError::Rejected { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_backs_off() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = SyncConfig {
            endpoint_url: Some(format!("ws://{}/sync", addr)),
            initial_backoff_ms: 60_000,
            ..SyncConfig::default()
        };
        let endpoint = WsEndpoint::new(&config).unwrap();

        let first = endpoint.push_sale(&sale("INV-1")).await.unwrap_err();
        assert!(first.is_retryable());

        // Within the backoff window no connect is attempted.
        let second = endpoint.push_sale(&sale("INV-1")).await.unwrap_err();
        assert!(matches!(second, SyncError::Disconnected));
    }
}
