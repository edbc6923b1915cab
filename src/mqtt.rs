// src/mqtt.rs - Message bus session: snapshot publishing and remote siren commands
use crate::{
    config::MqttConfig,
    error::{ConnectivityError, HabitatError, Result},
    io::{ControlEvent, Publisher, RESET_PAYLOAD},
};
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Exact payload on the siren topic that forces the siren on.
pub const SIREN_ON_PAYLOAD: &str = "siren on";

/// Decode a message received on the siren topic. Anything but the exact
/// command is ignored.
pub fn parse_siren_command(payload: &[u8]) -> Option<ControlEvent> {
    (payload == SIREN_ON_PAYLOAD.as_bytes()).then_some(ControlEvent::SirenOn)
}

/// Owns the bus event loop. Forwards remote commands to the control loop and
/// re-subscribes after every reconnect.
///
/// The client identity is the configured prefix plus the creation time in
/// milliseconds. It is fixed for the handler's lifetime, so reconnects resume
/// under the same identity.
pub struct MqttHandler {
    client: AsyncClient,
    client_id: String,
    eventloop: EventLoop,
    config: MqttConfig,
    events: mpsc::Sender<ControlEvent>,
    announced_reset: bool,
}

impl MqttHandler {
    pub fn new(config: MqttConfig, events: mpsc::Sender<ControlEvent>) -> Self {
        let client_id = format!("{}{}", config.client_id, chrono::Utc::now().timestamp_millis());
        let mut options = MqttOptions::new(&client_id, &config.broker_host, config.broker_port);
        options.set_keep_alive(Duration::from_secs(config.keepalive_secs));
        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            options.set_credentials(user, pass);
        }

        let (client, eventloop) = AsyncClient::new(options, 100);
        info!(
            "MQTT client '{}' targeting {}:{}",
            client_id, config.broker_host, config.broker_port
        );

        Self {
            client,
            client_id,
            eventloop,
            config,
            events,
            announced_reset: false,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Publishing handle for the control loop.
    pub fn publisher(&self) -> MqttPublisher {
        MqttPublisher { client: self.client.clone() }
    }

    /// Drive the session until the control loop goes away.
    pub async fn run(mut self) {
        let reconnect_delay = Duration::from_millis(self.config.reconnect_delay_ms);

        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    if let Err(e) = self.on_connected() {
                        warn!("MQTT session setup incomplete: {}", e);
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    if publish.topic != self.config.topics.siren {
                        continue;
                    }
                    match parse_siren_command(&publish.payload) {
                        Some(event) => {
                            info!("Remote siren command received");
                            if self.events.send(event).await.is_err() {
                                debug!("Control loop gone, stopping MQTT handler");
                                return;
                            }
                        }
                        None => debug!(
                            "Ignoring siren message {:?}",
                            String::from_utf8_lossy(&publish.payload)
                        ),
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!("MQTT connection error: {}", e);
                    tokio::time::sleep(reconnect_delay).await;
                }
            }
        }
    }

    fn on_connected(&mut self) -> Result<()> {
        info!("MQTT connected to {}:{}", self.config.broker_host, self.config.broker_port);

        self.client
            .try_subscribe(self.config.topics.siren.as_str(), QoS::AtLeastOnce)
            .map_err(|e| HabitatError::from(ConnectivityError::Bus(e.to_string())))?;

        if !self.announced_reset {
            self.client
                .try_publish(
                    self.config.topics.siren_off.as_str(),
                    QoS::AtLeastOnce,
                    false,
                    RESET_PAYLOAD,
                )
                .map_err(|e| HabitatError::from(ConnectivityError::Publish(e.to_string())))?;
            self.announced_reset = true;
        }
        Ok(())
    }
}

/// Non-blocking publisher. A full request queue is reported as a failure
/// rather than stalling the control loop.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
}

#[async_trait]
impl Publisher for MqttPublisher {
    async fn publish(&self, topic: &str, payload: String) -> std::result::Result<(), ConnectivityError> {
        self.client
            .try_publish(topic, QoS::AtLeastOnce, false, payload)
            .map_err(|e| ConnectivityError::Publish(e.to_string()))
    }
}
