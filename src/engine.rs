// src/engine.rs - Cooperative control loop
//
// Three interval gates share one task: the sampling cycle, housekeeping (bus
// events and buttons) and the configuration gate that loads limits or keeps
// the provisioning portal open while none exist.

use crate::{
    alarm::{enclosure_state, AlarmPolicy, Indicators, SirenChange},
    classifier::{classify, Classification},
    config::{Config, EngineConfig, TopicConfig},
    credentials::CredentialStore,
    enclosure::{CycleReadings, Enclosure, Measurement, FOLD_ORDER},
    error::{HabitatError, Result},
    io::{Actuator, Button, ControlEvent, ControlPanel, ProvisioningPortal, Publisher, RESET_PAYLOAD},
    limits::{Limits, SharedLimits},
    sensor::{ReadingSupplier, RetryingSupplier},
    severity::{Report, Severity, SeverityRatchet, Status},
    snapshot::CycleSnapshot,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::{interval, interval_at, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Classification of all four readings plus the folded decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleEvaluation {
    /// One report per pair, in [`FOLD_ORDER`]
    pub reports: [Report; 4],
    pub status: Status,
}

impl CycleEvaluation {
    pub fn classification(&self, enclosure: Enclosure, measurement: Measurement) -> Classification {
        self.reports
            .iter()
            .find(|r| r.enclosure == enclosure && r.measurement == measurement)
            .map(|r| r.classification)
            .unwrap_or_default()
    }

    pub fn indicators(&self) -> Indicators {
        let state = |enclosure: Enclosure| {
            enclosure_state(
                self.classification(enclosure, Measurement::Temperature),
                self.classification(enclosure, Measurement::Humidity),
            )
        };
        Indicators::new(state(Enclosure::Avian), state(Enclosure::Reptilian))
    }
}

/// Classify every reading and fold the results. No side effects.
pub fn evaluate(limits: &Limits, readings: &CycleReadings) -> CycleEvaluation {
    let reports = FOLD_ORDER.map(|(enclosure, measurement)| {
        Report::new(
            enclosure,
            measurement,
            classify(readings.value(enclosure, measurement), limits.band(enclosure, measurement)),
        )
    });

    let mut ratchet = SeverityRatchet::new();
    for report in &reports {
        ratchet.fold(report);
    }

    CycleEvaluation {
        reports,
        status: ratchet.status(),
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct EngineStats {
    pub running: bool,
    pub cycles: u64,
    pub cycle_errors: u64,
    pub sensor_failures: u64,
    pub publish_failures: u64,
    pub siren_on: bool,
    pub last_decision: Option<Severity>,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub uptime_secs: u64,
}

/// Collaborators handed to [`Engine::new`].
pub struct EngineParts {
    pub limits: SharedLimits,
    pub credentials: CredentialStore,
    pub supplier: Box<dyn ReadingSupplier>,
    pub publisher: Arc<dyn Publisher>,
    pub actuator: Box<dyn Actuator>,
    pub panel: Box<dyn ControlPanel>,
    pub portal: Box<dyn ProvisioningPortal>,
    pub events: mpsc::Receiver<ControlEvent>,
}

pub struct Engine {
    timing: EngineConfig,
    topics: TopicConfig,

    limits: SharedLimits,
    credentials: CredentialStore,
    supplier: RetryingSupplier,
    publisher: Arc<dyn Publisher>,
    actuator: Box<dyn Actuator>,
    panel: Box<dyn ControlPanel>,
    portal: Box<dyn ProvisioningPortal>,
    events: mpsc::Receiver<ControlEvent>,

    snapshot: CycleSnapshot,
    policy: AlarmPolicy,

    running: Arc<AtomicBool>,
    start_time: Instant,
    cycles: u64,
    cycle_errors: u64,
    sensor_failures: u64,
    publish_failures: u64,
    last_decision: Option<Severity>,
    last_cycle_at: Option<DateTime<Utc>>,
}

impl Engine {
    /// Fails with [`HabitatError::Config`] when `config` does not validate.
    pub fn new(config: &Config, parts: EngineParts) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            timing: config.engine.clone(),
            topics: config.mqtt.topics.clone(),
            limits: parts.limits,
            credentials: parts.credentials,
            supplier: RetryingSupplier::from_config(parts.supplier, &config.sensor),
            publisher: parts.publisher,
            actuator: parts.actuator,
            panel: parts.panel,
            portal: parts.portal,
            events: parts.events,
            snapshot: CycleSnapshot::new(config.payload.max_field_len),
            policy: AlarmPolicy::new(),
            running: Arc::new(AtomicBool::new(false)),
            start_time: Instant::now(),
            cycles: 0,
            cycle_errors: 0,
            sensor_failures: 0,
            publish_failures: 0,
            last_decision: None,
            last_cycle_at: None,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        if self.running.load(Ordering::Relaxed) {
            return Err(HabitatError::Config("Engine is already running".into()));
        }
        self.running.store(true, Ordering::Relaxed);
        info!(
            "Starting HABITAT engine: sampling every {}ms",
            self.timing.sample_interval_ms
        );

        let gate = |mut i: tokio::time::Interval| {
            i.set_missed_tick_behavior(MissedTickBehavior::Delay);
            i
        };
        // The first cycle runs one full period after start.
        let period = Duration::from_millis(self.timing.sample_interval_ms);
        let mut sample = gate(interval_at(tokio::time::Instant::now() + period, period));
        let mut housekeeping = gate(interval(Duration::from_millis(self.timing.housekeeping_interval_ms)));
        let mut config_gate = gate(interval(Duration::from_millis(self.timing.unconfigured_poll_ms)));

        while self.running.load(Ordering::Relaxed) {
            tokio::select! {
                biased;

                _ = config_gate.tick() => {
                    self.ensure_configured().await;
                }
                _ = housekeeping.tick() => {
                    self.housekeeping().await;
                }
                _ = sample.tick() => {
                    match self.run_cycle().await {
                        Ok(_) => {}
                        Err(HabitatError::NotConfigured) => {
                            debug!("Sampling skipped: waiting for limits");
                        }
                        Err(e) => {
                            self.cycle_errors += 1;
                            error!("Cycle error #{}: {}", self.cycle_errors, e);
                        }
                    }
                }
            }
        }

        info!("HABITAT engine stopped");
        Ok(())
    }

    /// One sampling cycle: sample, classify, drive outputs, publish, reset.
    pub async fn run_cycle(&mut self) -> Result<CycleEvaluation> {
        let limits = {
            let store = self.limits.read().await;
            *store.limits().ok_or(HabitatError::NotConfigured)?
        };

        let readings = match self.supplier.supply().await {
            Ok(readings) => readings,
            Err(e) => {
                self.sensor_failures += 1;
                return Err(e.into());
            }
        };

        let evaluation = evaluate(&limits, &readings);
        self.snapshot.set_readings(readings.avian, readings.reptilian);
        self.snapshot.set_status(evaluation.status);

        let indicators = evaluation.indicators();
        self.actuator.show_indicators(&indicators);
        let change = self.policy.evaluate(indicators);
        self.apply_siren(change).await;

        match self.snapshot.serialize() {
            Ok(payload) => {
                let topic = self.topics.readings.clone();
                self.publish(&topic, payload).await;
            }
            Err(e) => error!("Snapshot could not be encoded: {}", e),
        }
        self.snapshot.reset();

        self.cycles += 1;
        self.last_decision = Some(evaluation.status.decision);
        self.last_cycle_at = Some(Utc::now());
        match evaluation.status.trigger {
            Some(trigger) => info!(
                "Cycle {}: {} ({} {})",
                self.cycles, evaluation.status.decision, trigger.enclosure, trigger.measurement
            ),
            None => debug!("Cycle {}: ideal", self.cycles),
        }

        Ok(evaluation)
    }

    /// Service queued bus events, then buttons.
    pub async fn housekeeping(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event).await;
        }
        let pressed = self.panel.pressed();
        for button in pressed {
            self.handle_event(ControlEvent::Button(button)).await;
        }
    }

    /// Load a persisted limits record if still unconfigured, then open or
    /// close the portal to match. Returns whether limits are active.
    pub async fn ensure_configured(&mut self) -> bool {
        let configured = {
            let mut store = self.limits.write().await;
            if !store.is_configured() && store.exists() {
                match store.load_or_zeroed() {
                    Ok(limits) => {
                        store.apply(limits);
                        info!("Limits loaded, monitoring active");
                    }
                    Err(e) => warn!("Limits record unavailable: {}", e),
                }
            }
            store.is_configured()
        };

        if configured {
            if self.portal.is_open() {
                self.portal.close();
            }
        } else if !self.portal.is_open() {
            match self.portal.open() {
                Ok(()) => info!("No limits configured, provisioning portal open"),
                Err(e) => error!("Provisioning portal failed to open: {}", e),
            }
        }
        configured
    }

    pub async fn handle_event(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::SirenOn => {
                let change = self.policy.force_on();
                self.apply_siren(change).await;
            }
            ControlEvent::Button(Button::StopSiren) => {
                let change = self.policy.request_silence();
                self.apply_siren(change).await;
            }
            ControlEvent::Button(Button::ReconfigureLimits) => {
                info!("Limits reconfiguration requested");
                self.darken().await;
                {
                    let mut store = self.limits.write().await;
                    if let Err(e) = store.clear() {
                        error!("Failed to clear limits record: {}", e);
                    }
                    store.invalidate();
                }
                self.ensure_configured().await;
            }
            ControlEvent::Button(Button::ResetNetwork) => {
                info!("Network credentials reset requested");
                self.darken().await;
                if let Err(e) = self.credentials.clear() {
                    error!("Failed to clear network credentials: {}", e);
                }
            }
        }
    }

    async fn darken(&mut self) {
        let change = self.policy.darken();
        self.actuator.darken();
        if change == SirenChange::Silenced {
            self.announce_silence().await;
        }
    }

    async fn apply_siren(&mut self, change: SirenChange) {
        match change {
            SirenChange::Activated => self.actuator.set_siren(true),
            SirenChange::Silenced => {
                self.actuator.set_siren(false);
                self.announce_silence().await;
            }
            SirenChange::Unchanged => {}
        }
    }

    async fn announce_silence(&mut self) {
        let topic = self.topics.siren_off.clone();
        self.publish(&topic, RESET_PAYLOAD.to_string()).await;
    }

    /// Failures are counted and logged; the caller carries on regardless.
    async fn publish(&mut self, topic: &str, payload: String) {
        if let Err(e) = self.publisher.publish(topic, payload).await {
            self.publish_failures += 1;
            warn!("Publish to '{}' failed: {}", topic, e);
        }
    }

    pub fn stop(&self) {
        info!("Stopping HABITAT engine");
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn siren_on(&self) -> bool {
        self.policy.siren_on()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            running: self.is_running(),
            cycles: self.cycles,
            cycle_errors: self.cycle_errors,
            sensor_failures: self.sensor_failures,
            publish_failures: self.publish_failures,
            siren_on: self.policy.siren_on(),
            last_decision: self.last_decision,
            last_cycle_at: self.last_cycle_at,
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }
}
