//! Fonte OBD simulada – usada quando não há adaptador conectado.
//!
//! Percorre o perfil de velocidades da configuração, um passo por ciclo.
//! O passo avança na consulta de `EngineSpeed`, o primeiro canal de cada
//! ciclo.

use vehicle_core::config::SimulationConfig;
use vehicle_core::{Channel, MetricSource, Reading, SourceError};

pub struct SimulatedBus {
    profile: Vec<f64>,
    step_hours: f64,
    step: usize,
    speed: f64,
    distance_km: f64,
    fuel_level: f64,
    fuel_per_km: f64,
    run_time_secs: f64,
    coolant_temp: f64,
}

impl SimulatedBus {
    pub fn new(config: &SimulationConfig, poll_interval_secs: f64) -> Self {
        Self {
            profile: config.speed_profile.clone(),
            step_hours: poll_interval_secs / 3600.0,
            step: 0,
            speed: 0.0,
            distance_km: config.initial_distance_km,
            fuel_level: config.initial_fuel_level.clamp(0.0, 100.0),
            fuel_per_km: config.fuel_per_km,
            run_time_secs: 0.0,
            coolant_temp: 20.0,
        }
    }

    fn advance(&mut self) {
        self.speed = if self.profile.is_empty() {
            0.0
        } else {
            self.profile[self.step % self.profile.len()]
        };
        self.step += 1;

        let km = self.speed * self.step_hours;
        self.distance_km += km;
        self.fuel_level = (self.fuel_level - km * self.fuel_per_km).max(0.0);
        self.run_time_secs += self.step_hours * 3600.0;
        // Aquece até a temperatura de trabalho
        self.coolant_temp += (90.0 - self.coolant_temp) * 0.05;
    }
}

impl MetricSource for SimulatedBus {
    fn query(&mut self, channel: Channel) -> Result<Option<Reading>, SourceError> {
        let reading = match channel {
            Channel::EngineSpeed => {
                self.advance();
                Reading::number(800.0 + self.speed * 32.0, "revolutions_per_minute")
            }
            Channel::SessionDistance => Reading::number(self.distance_km, "kilometer"),
            Channel::Speed => Reading::number(self.speed, "kilometer_per_hour"),
            Channel::FuelLevel => Reading::number(self.fuel_level, "percent"),
            Channel::ModuleVoltage => Reading::number(14.1, "volt"),
            Channel::RunTime => Reading::number(self.run_time_secs.round(), "second"),
            // Muitos veículos não expõem temperatura ambiente
            Channel::AmbientTemp => return Ok(None),
            Channel::CoolantTemp => Reading::number(self.coolant_temp.round(), "degC"),
            Channel::FuelType => Reading::text("Gasoline"),
        };
        Ok(Some(reading))
    }
}
