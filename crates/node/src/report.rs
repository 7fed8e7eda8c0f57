//! Forecast report published to the dashboard over MQTT.

use anyhow::{anyhow, Context, Result};
use irrigation_forecast::{CycleResult, Decision, Trend};
use rumqttc::{AsyncClient, Event, MqttOptions, Outgoing, Packet, QoS};
use serde::Serialize;
use std::time::Duration;

use crate::config::MqttConfig;
use crate::sensor::RawReading;

const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct Report {
    pub ts: i64,
    pub node_id: String,
    /// Raw station temperature, passed through.
    pub temperature_c: f64,
    /// Smoothed sea-level pressure, two decimals.
    pub pressure_hpa: f64,
    /// 0 stable, 1 unsettled, 2 rain likely.
    pub trend: Trend,
    /// 0 forbid, 1 allow.
    pub irrigate: Decision,
    pub month: u8,
    /// True until the 3 hour window holds real data.
    pub warming_up: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_v: Option<f32>,
}

impl Report {
    pub fn new(node_id: &str, ts: i64, reading: &RawReading, result: &CycleResult) -> Self {
        Self {
            ts,
            node_id: node_id.to_string(),
            temperature_c: reading.temperature_c,
            pressure_hpa: round2(result.sea_level_hpa),
            trend: result.trend,
            irrigate: result.decision,
            month: result.month,
            warming_up: result.reference_fallback,
            battery_v: reading.battery_v,
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Topic for a node's forecast: `tele/<node_id>/forecast`.
pub fn topic(node_id: &str) -> String {
    format!("tele/{node_id}/forecast")
}

// ---------------------------------------------------------------------------
// Publish
// ---------------------------------------------------------------------------

/// Publish `report` at QoS 1 and wait for the broker's PubAck.
pub async fn publish(mqtt: &MqttConfig, report: &Report) -> Result<()> {
    let client_id = format!("irrigation-node-{}", report.node_id);
    let mut mqttoptions = MqttOptions::new(client_id, mqtt.host.clone(), mqtt.port);
    mqttoptions.set_keep_alive(Duration::from_secs(30));

    let (client, mut eventloop) = AsyncClient::new(mqttoptions, 10);

    let topic = topic(&report.node_id);
    let payload = serde_json::to_vec(report).context("failed to encode report")?;
    client
        .publish(&topic, QoS::AtLeastOnce, false, payload)
        .await
        .context("failed to queue report")?;

    let wait = async {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    tracing::debug!(host = %mqtt.host, port = mqtt.port, "mqtt connected");
                }
                Ok(Event::Incoming(Packet::PubAck(_))) => return Ok(()),
                Ok(_) => {}
                Err(e) => return Err(anyhow!("mqtt error: {e}")),
            }
        }
    };

    tokio::time::timeout(Duration::from_secs(mqtt.publish_timeout_s), wait)
        .await
        .with_context(|| format!("no PubAck within {}s", mqtt.publish_timeout_s))??;

    tracing::info!(%topic, ts = report.ts, "report published");

    // The request only reaches the broker once the event loop runs again.
    if let Err(e) = client.disconnect().await {
        tracing::debug!("mqtt disconnect failed: {e}");
        return Ok(());
    }
    let flush = async {
        loop {
            match eventloop.poll().await {
                Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    };
    if tokio::time::timeout(DISCONNECT_TIMEOUT, flush).await.is_err() {
        tracing::debug!("mqtt disconnect not flushed");
    }
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================
