//! Sistema de alertas – máquinas de estado de velocidade e combustível.
//!
//! Sinais de status (`Speed Alert`, `Fuel Alert`) são republicados a cada
//! ciclo para manter o dashboard atualizado; eventos são one-shot por
//! episódio.

use crate::state::SharedState;
use crate::types::{
    FUEL_ALERT_CHANNEL, FUEL_EVENT_CHANNEL, SPEED_ALERT_CHANNEL, SPEED_EVENT_CHANNEL, Snapshot,
    Value,
};
use tracing::info;

/// Estado do alerta de velocidade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeedState {
    #[default]
    Quiet,
    Alerting,
}

/// Estado do alerta de combustível.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FuelState {
    #[default]
    Normal,
    Low,
}

/// Sinal a publicar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertSignal {
    SpeedAlert(bool),
    SpeedLimitExceeded,
    FuelAlert(bool),
    LowFuel,
}

impl AlertSignal {
    pub fn channel(self) -> &'static str {
        match self {
            AlertSignal::SpeedAlert(_) => SPEED_ALERT_CHANNEL,
            AlertSignal::SpeedLimitExceeded => SPEED_EVENT_CHANNEL,
            AlertSignal::FuelAlert(_) => FUEL_ALERT_CHANNEL,
            AlertSignal::LowFuel => FUEL_EVENT_CHANNEL,
        }
    }

    pub fn value(self) -> Value {
        match self {
            AlertSignal::SpeedAlert(on) | AlertSignal::FuelAlert(on) => Value::Int(on.into()),
            AlertSignal::SpeedLimitExceeded | AlertSignal::LowFuel => Value::Empty,
        }
    }
}

/// O que o som de alerta deve fazer após a avaliação.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SoundCommand {
    #[default]
    Keep,
    Start,
    Stop,
}

/// Resultado de um ciclo de avaliação.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertOutcome {
    pub signals: Vec<AlertSignal>,
    pub sound: SoundCommand,
}

/// Motor de alertas de velocidade e combustível.
#[derive(Debug, Default)]
pub struct AlertEngine {
    speed: SpeedState,
    fuel: FuelState,
}

impl AlertEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn speed_state(&self) -> SpeedState {
        self.speed
    }

    pub fn fuel_state(&self) -> FuelState {
        self.fuel
    }

    /// Avalia o snapshot contra os limites atuais.
    ///
    /// Canal ausente não muda estado nem publica nada.
    pub fn evaluate(&mut self, snapshot: &Snapshot, state: &SharedState) -> AlertOutcome {
        let mut outcome = AlertOutcome::default();
        if let Some(speed) = snapshot.speed {
            self.check_speed(speed, state, &mut outcome);
        }
        if let Some(level) = snapshot.fuel_level {
            self.check_fuel(level, state, &mut outcome);
        }
        outcome
    }

    fn check_speed(&mut self, speed: f64, state: &SharedState, outcome: &mut AlertOutcome) {
        let limit = state.speed_limit();
        let exceeded = limit > 0 && speed > limit as f64;

        match (self.speed, exceeded) {
            (SpeedState::Quiet, true) => {
                info!("Limite de velocidade excedido: {speed:.0} km/h (limite {limit})");
                self.speed = SpeedState::Alerting;
                state.set_speed_alert_active(true);
                outcome.sound = SoundCommand::Start;
                outcome.signals.push(AlertSignal::SpeedAlert(true));
                outcome.signals.push(AlertSignal::SpeedLimitExceeded);
            }
            (SpeedState::Alerting, true) => {
                outcome.signals.push(AlertSignal::SpeedAlert(true));
            }
            (SpeedState::Alerting, false) => {
                info!("Velocidade normalizada: {speed:.0} km/h");
                self.speed = SpeedState::Quiet;
                state.set_speed_alert_active(false);
                outcome.sound = SoundCommand::Stop;
                outcome.signals.push(AlertSignal::SpeedAlert(false));
            }
            (SpeedState::Quiet, false) => {
                outcome.signals.push(AlertSignal::SpeedAlert(false));
            }
        }
    }

    fn check_fuel(&mut self, level: f64, state: &SharedState, outcome: &mut AlertOutcome) {
        let limit = state.fuel_limit();
        let low = limit > 0 && level < limit as f64;

        if low {
            self.fuel = FuelState::Low;
            outcome.signals.push(AlertSignal::FuelAlert(true));
            if !state.fuel_event_logged() {
                info!("Combustível baixo: {level:.0}% (limite {limit}%)");
                outcome.signals.push(AlertSignal::LowFuel);
                state.set_fuel_event_logged(true);
            }
        } else if self.fuel == FuelState::Low {
            info!("Nível de combustível normalizado: {level:.0}%");
            self.fuel = FuelState::Normal;
            outcome.signals.push(AlertSignal::FuelAlert(false));
            state.set_fuel_event_logged(false);
        }
    }
}
