use crate::app_config::Events;
use crate::domain::DeviceEvent;
use crate::sse::server_sent_event::{EventBuffer, ServerSentEvent};
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use std::error::Error;
use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::error::SendError;
use tokio::time::timeout;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, PartialEq, Eq)]
enum StreamEnd {
    Closed,
    ReceiverDropped,
}

/// Feeds uplink events from the integration's SSE endpoint into `tx`, reconnecting until `tx` is closed.
#[instrument(skip_all, fields(url = config.url()))]
pub async fn listen(tx: Sender<DeviceEvent>, client: &Client, config: &Events) -> Result<(), Box<dyn Error>> {
    let strategy = ExponentialBackoff::from_millis(config.retry_ms())
        .factor(2)
        .max_delay(config.retry_max_delay())
        .map(jitter);

    info!("Connecting to event stream {}...", config.url());
    Retry::spawn(strategy, || async {
        if tx.is_closed() {
            info!("Event ingest is gone, stopping event stream");
            return Ok(());
        }

        match connect_event_stream(tx.clone(), client, config).await {
            Ok(StreamEnd::ReceiverDropped) => {
                info!("Event ingest is gone, stopping event stream");
                Ok(())
            }
            Ok(StreamEnd::Closed) => {
                info!("✅ Event stream ended gracefully. Restarting...");
                Err("Stream ended") // Triggers retry
            }
            Err(e) => {
                warn!("⚠️ Event stream error: {}. Retrying...", e);
                Err("Event stream failed") // Triggers retry
            }
        }
    })
    .await?;

    Ok(())
}

async fn connect_event_stream(tx: Sender<DeviceEvent>, client: &Client, config: &Events) -> Result<StreamEnd, Box<dyn Error>> {
    let response = client
        .get(config.url())
        .header("Accept", "text/event-stream")
        .send()
        .await?
        .error_for_status()?;

    if response.status() == StatusCode::OK {
        info!(status = %response.status(), "Connecting to event stream {}... OK", config.url());
    }

    let mut stream = response.bytes_stream();
    let mut buffer = EventBuffer::new();
    loop {
        let chunk = timeout(config.stale_connection_timeout(), stream.next()).await;
        match chunk {
            Ok(Some(Ok(bytes))) => {
                buffer.push(&bytes);
                for block in buffer.drain_blocks() {
                    if forward(&tx, &block).await.is_err() {
                        return Ok(StreamEnd::ReceiverDropped);
                    }
                }
            }
            Ok(Some(Err(e))) => {
                error!("❌ Event stream error: {}", e);
                return Err(Box::new(e));
            }
            Ok(None) => {
                warn!("🔴 Event stream ended");
                return Ok(StreamEnd::Closed);
            }
            Err(_) => {
                warn!("⏳ No data for {} seconds. Reconnecting...", config.stale_connection_timeout().as_secs());
                return Err("Timeout".into());
            }
        }
    }
}

/// Undecodable blocks are skipped, only a closed receiver is an error.
async fn forward(tx: &Sender<DeviceEvent>, block: &str) -> Result<(), SendError<DeviceEvent>> {
    match ServerSentEvent::<DeviceEvent>::from_str(block) {
        Ok(ServerSentEvent { data: Some(event), .. }) => {
            debug!(device_id = event.device_id, "🔸 Received event: {:?}", event);
            tx.send(event).await?;
        }
        Ok(_) => debug!(block, "🔸 Received event without data"),
        Err(e) => warn!(block, "⚠️ Skipping undecodable event: {}", e),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::AppConfigBuilder;
    use serde_json::json;
    use std::time::Duration;
    use test_log::test;
    use tokio::sync::mpsc;

    #[test(tokio::test)]
    async fn forwards_each_event_of_the_stream() -> Result<(), Box<dyn Error>> {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/stream")
            .match_header("accept", "text/event-stream")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(concat!(
                ": welcome\n\n",
                "id: 1\ndata: {\"deviceId\": \"dev-1\", \"payload\": {\"temperature\": 21.5}}\n\n",
                "data: not json\n\n",
                "id: 2\ndata: {\"deviceId\": \"dev-2\", \"payload\": {\"button\": true}}\n\n",
            ))
            .create_async()
            .await;

        let config = AppConfigBuilder::new().events_url(format!("{}/stream", server.url())).build();
        let (tx, mut rx) = mpsc::channel(8);

        let end = connect_event_stream(tx, &Client::new(), config.events()).await?;

        mock.assert_async().await;
        assert_eq!(end, StreamEnd::Closed);
        assert_eq!(rx.recv().await, Some(DeviceEvent::new("dev-1", json!({ "temperature": 21.5 }))));
        assert_eq!(rx.recv().await, Some(DeviceEvent::new("dev-2", json!({ "button": true }))));
        assert_eq!(rx.recv().await, None);
        Ok(())
    }

    #[test(tokio::test)]
    async fn stops_once_the_ingest_receiver_is_dropped() -> Result<(), Box<dyn Error>> {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("GET", "/stream")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body("data: {\"deviceId\": \"dev-1\", \"payload\": {}}\n\n")
            .create_async()
            .await;

        let config = AppConfigBuilder::new().events_url(format!("{}/stream", server.url())).build();
        let (tx, rx) = mpsc::channel(8);
        drop(rx);

        let end = connect_event_stream(tx.clone(), &Client::new(), config.events()).await?;
        assert_eq!(end, StreamEnd::ReceiverDropped);

        let result = tokio::time::timeout(Duration::from_secs(5), listen(tx, &Client::new(), config.events())).await;
        assert!(matches!(result, Ok(Ok(()))), "Expected the listener to stop instead of reconnecting");
        Ok(())
    }

    #[test(tokio::test)]
    async fn fails_on_an_error_status() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server.mock("GET", "/stream").with_status(401).create_async().await;

        let config = AppConfigBuilder::new().events_url(format!("{}/stream", server.url())).build();
        let (tx, _rx) = mpsc::channel(8);

        let result = connect_event_stream(tx, &Client::new(), config.events()).await;

        assert!(result.is_err());
    }
}
