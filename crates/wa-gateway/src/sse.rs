//! Server-Sent Events (SSE) client for receiving gateway events.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::Stream;
use reqwest_eventsource::{Event, EventSource, RequestBuilderExt};
use tracing::{debug, info, warn};

use crate::error::GatewayError;
use crate::types::{ConnectionClose, GatewayEvent, KeysRequest, MessageEvent};
use crate::WaClient;

/// Payload of the `qr` SSE event.
#[derive(serde::Deserialize)]
struct QrPayload {
    code: String,
}

/// Payload of the `connection` SSE event.
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionPayload {
    state: String,
    #[serde(default)]
    status_code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
}

/// A stream of [`GatewayEvent`]s from the daemon.
pub struct EventStream {
    event_source: EventSource,
}

impl EventStream {
    /// Create a new event stream from a WaClient.
    pub fn new(client: &WaClient) -> Self {
        let url = client.config().events_url();
        info!("Creating SSE connection to {}", url);

        // SSE connections are long-lived; build a client without the
        // request timeout used for RPC calls.
        let sse_client = reqwest::Client::builder()
            .build()
            .expect("Failed to build SSE client");

        let request = sse_client.get(&url);
        let event_source = request.eventsource().expect("request has no body");

        Self { event_source }
    }

    /// Decode one named SSE event into a GatewayEvent.
    fn decode(event: &str, data: &str) -> Result<Option<GatewayEvent>, serde_json::Error> {
        let decoded = match event {
            "qr" => {
                let payload: QrPayload = serde_json::from_str(data)?;
                Some(GatewayEvent::Qr { code: payload.code })
            }
            "connection" => {
                let payload: ConnectionPayload = serde_json::from_str(data)?;
                match payload.state.as_str() {
                    "open" => Some(GatewayEvent::Open),
                    "close" => Some(GatewayEvent::Closed(ConnectionClose {
                        status_code: payload.status_code,
                        message: payload.message,
                    })),
                    other => {
                        debug!("Ignoring connection state: {}", other);
                        None
                    }
                }
            }
            "creds.update" => {
                let creds = serde_json::from_str(data)?;
                Some(GatewayEvent::CredsUpdate(Box::new(creds)))
            }
            "keys.mutation" => {
                let mutations = serde_json::from_str(data)?;
                Some(GatewayEvent::KeysMutation(mutations))
            }
            "keys.request" => {
                let request: KeysRequest = serde_json::from_str(data)?;
                Some(GatewayEvent::KeysRequest(request))
            }
            "message" => {
                let message: MessageEvent = serde_json::from_str(data)?;
                Some(GatewayEvent::Message(Box::new(message)))
            }
            other => {
                // Receipts, typing notifications and the like.
                debug!("Ignoring SSE event type: {}", other);
                None
            }
        };
        Ok(decoded)
    }
}

impl Stream for EventStream {
    type Item = Result<GatewayEvent, GatewayError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.event_source).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => match event {
                    Event::Open => {
                        debug!("SSE connection opened");
                        continue;
                    }
                    Event::Message(msg) => match Self::decode(&msg.event, &msg.data) {
                        Ok(Some(event)) => return Poll::Ready(Some(Ok(event))),
                        Ok(None) => continue,
                        Err(e) => {
                            warn!("Failed to parse SSE event data: {}", e);
                            debug!("Raw data: {}", msg.data);
                            continue;
                        }
                    },
                },
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(GatewayError::Sse(e.to_string()))));
                }
                Poll::Ready(None) => {
                    info!("SSE stream ended");
                    return Poll::Ready(None);
                }
                Poll::Pending => {
                    return Poll::Pending;
                }
            }
        }
    }
}

/// Create an event stream from a WaClient.
pub fn subscribe(client: &WaClient) -> EventStream {
    EventStream::new(client)
}
