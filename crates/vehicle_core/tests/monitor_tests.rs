//! Testes de integração do monitor com portas simuladas.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use vehicle_core::config::MonitorConfig;
use vehicle_core::distance::DistanceStore;
use vehicle_core::sound::SoundLoop;
use vehicle_core::state::SharedState;
use vehicle_core::types::*;
use vehicle_core::{Message, MetricSource, Publisher, SoundPlayer, SourceError, VehicleMonitor};

// ──────────────────────────────────────────────
// Mocks
// ──────────────────────────────────────────────

#[derive(Default)]
struct FakeBus {
    values: HashMap<Channel, Reading>,
    fail_on: Option<Channel>,
    origin_misses: u32,
    queries: usize,
}

impl FakeBus {
    fn set(&mut self, channel: Channel, magnitude: f64) {
        self.values.insert(channel, Reading::number(magnitude, ""));
    }

    fn clear(&mut self, channel: Channel) {
        self.values.remove(&channel);
    }
}

impl MetricSource for FakeBus {
    fn query(&mut self, channel: Channel) -> Result<Option<Reading>, SourceError> {
        self.queries += 1;
        if self.fail_on == Some(channel) {
            return Err(SourceError::Disconnected);
        }
        if channel == Channel::SessionDistance && self.origin_misses > 0 {
            self.origin_misses -= 1;
            return Ok(None);
        }
        Ok(self.values.get(&channel).cloned())
    }
}

#[derive(Default)]
struct Recorder {
    sent: Mutex<Vec<Message>>,
}

impl Publisher for Recorder {
    fn publish(&self, channel: &str, value: Value) {
        self.sent.lock().unwrap().push(Message::new(channel, value));
    }
}

impl Recorder {
    fn take(&self) -> Vec<Message> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    fn values_on(sent: &[Message], channel: &str) -> Vec<Value> {
        sent.iter()
            .filter(|m| m.channel == channel)
            .map(|m| m.value.clone())
            .collect()
    }
}

#[derive(Default)]
struct CountingPlayer {
    plays: AtomicUsize,
}

impl SoundPlayer for CountingPlayer {
    fn play(&self) {
        self.plays.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    monitor: VehicleMonitor<FakeBus, Recorder>,
    player: Arc<CountingPlayer>,
    _dir: tempfile::TempDir,
    store_path: std::path::PathBuf,
}

fn harness_in(dir: tempfile::TempDir, speed_limit: i64, fuel_limit: i64) -> Harness {
    let store_path = dir.path().join("distance.csv");
    harness_with_store(dir, store_path, speed_limit, fuel_limit)
}

fn harness_with_store(
    dir: tempfile::TempDir,
    store_path: std::path::PathBuf,
    speed_limit: i64,
    fuel_limit: i64,
) -> Harness {
    let state = Arc::new(SharedState::new(speed_limit, fuel_limit));
    let player = Arc::new(CountingPlayer::default());
    let sound = SoundLoop::new(player.clone(), state.clone(), Duration::from_secs(10));
    let monitor = VehicleMonitor::new(
        FakeBus::default(),
        Recorder::default(),
        DistanceStore::new(&store_path),
        state,
        sound,
        &MonitorConfig::default(),
    );
    Harness {
        monitor,
        player,
        _dir: dir,
        store_path,
    }
}

fn harness(speed_limit: i64, fuel_limit: i64) -> Harness {
    harness_in(tempfile::tempdir().unwrap(), speed_limit, fuel_limit)
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[test]
fn speed_alert_lifecycle_through_monitor() {
    let mut h = harness(80, 0);
    let mut alert_values = Vec::new();
    let mut events = 0;

    for (i, speed) in [70.0, 90.0, 95.0, 70.0].into_iter().enumerate() {
        h.monitor.source_mut().set(Channel::Speed, speed);
        h.monitor.tick();
        let sent = h.monitor.publisher().take();
        alert_values.extend(Recorder::values_on(&sent, SPEED_ALERT_CHANNEL));
        events += Recorder::values_on(&sent, SPEED_EVENT_CHANNEL).len();

        match i {
            1 | 2 => assert!(h.monitor.sound_running()),
            _ => assert!(!h.monitor.sound_running()),
        }
        if i == 1 {
            // O som toca logo que o alerta começa
            let deadline = Instant::now() + Duration::from_secs(2);
            while h.player.plays.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(5));
            }
            assert_eq!(h.player.plays.load(Ordering::SeqCst), 1);
        }
    }

    assert_eq!(
        alert_values,
        vec![Value::Int(0), Value::Int(1), Value::Int(1), Value::Int(0)]
    );
    assert_eq!(events, 1);
}

#[test]
fn low_fuel_event_is_one_shot() {
    let mut h = harness(0, 15);
    let mut alert_values = Vec::new();
    let mut events = 0;

    for level in [20.0, 10.0, 10.0, 20.0] {
        h.monitor.source_mut().set(Channel::FuelLevel, level);
        h.monitor.tick();
        let sent = h.monitor.publisher().take();
        alert_values.push(Recorder::values_on(&sent, FUEL_ALERT_CHANNEL));
        events += Recorder::values_on(&sent, FUEL_EVENT_CHANNEL).len();
    }

    assert_eq!(
        alert_values,
        vec![
            vec![],
            vec![Value::Int(1)],
            vec![Value::Int(1)],
            vec![Value::Int(0)]
        ]
    );
    assert_eq!(events, 1);
    assert!(!h.monitor.state().fuel_event_logged());
}

#[test]
fn fuel_level_publishes_estimated_range() {
    let mut h = harness(0, 0);
    h.monitor.source_mut().set(Channel::FuelLevel, 50.0);
    h.monitor.tick();
    let sent = h.monitor.publisher().take();
    assert_eq!(
        Recorder::values_on(&sent, "ds/Fuel Level"),
        vec![Value::Float(50.0)]
    );
    assert_eq!(
        Recorder::values_on(&sent, FUEL_RANGE_CHANNEL),
        vec![Value::Float(279.0)]
    );
}

#[test]
fn distance_accumulates_and_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("distance.csv"), "100\n").unwrap();
    let mut h = harness_in(dir, 0, 0);
    assert_eq!(h.monitor.total_distance(), 100.0);

    let never = AtomicBool::new(false);
    h.monitor.source_mut().set(Channel::SessionDistance, 2000.0);
    assert!(h.monitor.capture_origin(Duration::from_millis(1), &never));

    for raw in [2000.0, 2000.5, 2003.0, 2003.0, 2010.0] {
        h.monitor.source_mut().set(Channel::SessionDistance, raw);
        h.monitor.tick();
    }
    assert_eq!(h.monitor.total_distance(), 110.0);

    let sent = h.monitor.publisher().take();
    assert_eq!(
        Recorder::values_on(&sent, CURRENT_DISTANCE_CHANNEL).last(),
        Some(&Value::Float(10.0))
    );
    assert_eq!(
        Recorder::values_on(&sent, TOTAL_DISTANCE_CHANNEL).last(),
        Some(&Value::Float(110.0))
    );

    // "Reinício": novo store no mesmo arquivo
    let reopened = DistanceStore::new(&h.store_path);
    assert_eq!(reopened.load().unwrap(), 110.0);
}

#[test]
fn bus_counter_reset_does_not_reduce_total() {
    let mut h = harness(0, 0);
    let never = AtomicBool::new(false);
    h.monitor.source_mut().set(Channel::SessionDistance, 500.0);
    h.monitor.capture_origin(Duration::from_millis(1), &never);

    let mut session = Vec::new();
    for raw in [505.0, 0.0, 4.0] {
        h.monitor.source_mut().set(Channel::SessionDistance, raw);
        h.monitor.tick();
        let sent = h.monitor.publisher().take();
        session.extend(Recorder::values_on(&sent, CURRENT_DISTANCE_CHANNEL));
    }
    assert_eq!(h.monitor.total_distance(), 9.0);
    assert_eq!(
        session,
        vec![Value::Float(5.0), Value::Float(5.0), Value::Float(9.0)]
    );
}

#[test]
fn failed_distance_save_keeps_cycle_going() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("missing").join("distance.csv");
    let mut h = harness_with_store(dir, store_path.clone(), 80, 0);
    h.monitor.source_mut().set(Channel::SessionDistance, 100.0);
    h.monitor.source_mut().set(Channel::Speed, 120.0);

    h.monitor.tick();
    h.monitor.source_mut().set(Channel::SessionDistance, 103.0);
    h.monitor.tick();

    let sent = h.monitor.publisher().take();
    assert_eq!(
        Recorder::values_on(&sent, TOTAL_DISTANCE_CHANNEL).last(),
        Some(&Value::Float(3.0))
    );
    assert_eq!(
        Recorder::values_on(&sent, SPEED_ALERT_CHANNEL),
        vec![Value::Int(1), Value::Int(1)]
    );
    assert!(h.monitor.state().speed_alert_active());
    assert!(!store_path.exists());
    h.monitor.shutdown();
}

#[test]
fn origin_capture_retries_until_bus_answers() {
    let mut h = harness(0, 0);
    let never = AtomicBool::new(false);
    h.monitor.source_mut().origin_misses = 3;
    h.monitor.source_mut().set(Channel::SessionDistance, 42.0);
    assert!(h.monitor.capture_origin(Duration::from_millis(1), &never));
    assert_eq!(h.monitor.origin_distance(), Some(42.0));
    assert_eq!(h.monitor.source_mut().queries, 4);
}

#[test]
fn origin_capture_gives_up_on_shutdown() {
    let mut h = harness(0, 0);
    let stop = AtomicBool::new(true);
    assert!(!h.monitor.capture_origin(Duration::from_millis(1), &stop));
    assert_eq!(h.monitor.origin_distance(), None);
}

#[test]
fn absent_channels_are_skipped() {
    let mut h = harness(80, 15);
    h.monitor.source_mut().set(Channel::EngineSpeed, 2100.0);
    h.monitor.source_mut().set(Channel::CoolantTemp, 88.0);
    h.monitor.tick();

    let sent = h.monitor.publisher().take();
    let channels: Vec<_> = sent.iter().map(|m| m.channel.as_str()).collect();
    assert_eq!(channels, vec!["ds/Engine Speed", "ds/Coolant Temp"]);
    assert_eq!(h.monitor.snapshot().rpm, Some(2100.0));
    assert!(h.monitor.snapshot().speed.is_none());
}

#[test]
fn absent_speed_keeps_alert_state() {
    let mut h = harness(80, 0);
    h.monitor.source_mut().set(Channel::Speed, 120.0);
    h.monitor.tick();
    assert!(h.monitor.state().speed_alert_active());
    h.monitor.publisher().take();

    h.monitor.source_mut().clear(Channel::Speed);
    h.monitor.tick();
    let sent = h.monitor.publisher().take();
    assert!(sent.is_empty());
    assert!(h.monitor.state().speed_alert_active());
    assert!(h.monitor.sound_running());
    h.monitor.shutdown();
}

#[test]
fn bus_failure_aborts_cycle_but_keeps_earlier_publishes() {
    let mut h = harness(80, 0);
    h.monitor.source_mut().set(Channel::EngineSpeed, 900.0);
    h.monitor.source_mut().set(Channel::Speed, 120.0);
    h.monitor.source_mut().fail_on = Some(Channel::Speed);
    h.monitor.tick();

    let sent = h.monitor.publisher().take();
    assert_eq!(
        Recorder::values_on(&sent, "ds/Engine Speed"),
        vec![Value::Float(900.0)]
    );
    assert!(Recorder::values_on(&sent, SPEED_ALERT_CHANNEL).is_empty());
    assert!(!h.monitor.state().speed_alert_active());

    // Próximo ciclo se recupera sozinho
    h.monitor.source_mut().fail_on = None;
    h.monitor.tick();
    assert!(h.monitor.state().speed_alert_active());
    h.monitor.shutdown();
}

#[test]
fn fuel_type_is_published_as_text() {
    let mut h = harness(0, 0);
    h.monitor
        .source_mut()
        .values
        .insert(Channel::FuelType, Reading::text("Diesel"));
    h.monitor.tick();
    let sent = h.monitor.publisher().take();
    assert_eq!(
        Recorder::values_on(&sent, "ds/Fuel Type"),
        vec![Value::Text("Diesel".into())]
    );
}

#[test]
fn connected_requests_stored_settings() {
    let h = harness(0, 0);
    h.monitor.connected();
    let sent = h.monitor.publisher().take();
    assert_eq!(sent[0].channel, SETTINGS_REQUEST_CHANNEL);
    assert_eq!(sent[0].value, Value::Text(SETTINGS_REQUEST_PAYLOAD.into()));
    assert!(sent[1..].iter().all(|m| m.channel == TERMINAL_CHANNEL));
}

#[test]
fn inbound_messages_update_thresholds() {
    let mut h = harness(0, 0);
    h.monitor
        .handle_message(&Message::new(SPEED_LIMIT_DOWNLINK, "80"))
        .unwrap();
    assert!(
        h.monitor
            .handle_message(&Message::new(FUEL_LIMIT_DOWNLINK, "lots"))
            .is_err()
    );
    assert_eq!(h.monitor.state().speed_limit(), 80);
    assert_eq!(h.monitor.state().fuel_limit(), 0);

    h.monitor.source_mut().set(Channel::Speed, 100.0);
    h.monitor.tick();
    assert!(h.monitor.state().speed_alert_active());
    h.monitor.shutdown();
}

#[test]
fn shutdown_stops_sound_and_persists_total() {
    let mut h = harness(50, 0);
    h.monitor.source_mut().set(Channel::Speed, 120.0);
    h.monitor.source_mut().set(Channel::SessionDistance, 10.0);
    h.monitor.tick();
    h.monitor.source_mut().set(Channel::SessionDistance, 12.5);
    h.monitor.tick();
    assert!(h.monitor.sound_running());

    h.monitor.shutdown();
    assert!(!h.monitor.sound_running());
    assert!(!h.monitor.state().speed_alert_active());
    assert_eq!(DistanceStore::new(&h.store_path).load().unwrap(), 2.5);
}
