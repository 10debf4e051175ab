//! Estado compartilhado entre o polling, os comandos e o loop de som.
//!
//! Tudo atômico: leituras de limite são eventualmente consistentes e
//! as flags de alerta nunca sofrem data race.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

#[derive(Debug)]
pub struct SharedState {
    speed_limit: AtomicI64,
    fuel_limit: AtomicI64,
    speed_alert_active: AtomicBool,
    fuel_event_logged: AtomicBool,
    sound_enabled: AtomicBool,
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl SharedState {
    /// Limites em 0 significam "sem limite configurado".
    pub fn new(speed_limit: i64, fuel_limit: i64) -> Self {
        Self {
            speed_limit: AtomicI64::new(speed_limit.max(0)),
            fuel_limit: AtomicI64::new(fuel_limit.max(0)),
            speed_alert_active: AtomicBool::new(false),
            fuel_event_logged: AtomicBool::new(false),
            sound_enabled: AtomicBool::new(true),
        }
    }

    pub fn speed_limit(&self) -> i64 {
        self.speed_limit.load(Ordering::Relaxed)
    }

    pub fn set_speed_limit(&self, limit: i64) {
        self.speed_limit.store(limit.max(0), Ordering::Relaxed);
    }

    pub fn fuel_limit(&self) -> i64 {
        self.fuel_limit.load(Ordering::Relaxed)
    }

    pub fn set_fuel_limit(&self, limit: i64) {
        self.fuel_limit.store(limit.max(0), Ordering::Relaxed);
    }

    pub fn speed_alert_active(&self) -> bool {
        self.speed_alert_active.load(Ordering::Acquire)
    }

    pub fn set_speed_alert_active(&self, active: bool) {
        self.speed_alert_active.store(active, Ordering::Release);
    }

    pub fn fuel_event_logged(&self) -> bool {
        self.fuel_event_logged.load(Ordering::Acquire)
    }

    pub fn set_fuel_event_logged(&self, logged: bool) {
        self.fuel_event_logged.store(logged, Ordering::Release);
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled.load(Ordering::Relaxed)
    }

    pub fn set_sound_enabled(&self, enabled: bool) {
        self.sound_enabled.store(enabled, Ordering::Relaxed);
    }
}
