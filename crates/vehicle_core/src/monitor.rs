//! Monitor veicular – ciclo de polling, distância e alertas.
//!
//! A cada ciclo:
//! 1. consulta os nove canais OBD e publica o que estiver disponível;
//! 2. acumula a distância e persiste o total;
//! 3. avalia os alertas e liga/desliga o som de velocidade.
//!
//! Falha do barramento aborta o ciclo (publicações já feitas ficam) e o
//! próximo ciclo tenta de novo.

use crate::alerts::{AlertEngine, SoundCommand};
use crate::commands::{self, CommandError, LOGO};
use crate::config::MonitorConfig;
use crate::distance::{DistanceStore, DistanceTracker};
use crate::ports::{MetricSource, Publisher, SourceError};
use crate::protocol::Message;
use crate::sound::SoundLoop;
use crate::state::SharedState;
use crate::types::{
    Channel, FUEL_RANGE_CHANNEL, SETTINGS_REQUEST_CHANNEL, SETTINGS_REQUEST_PAYLOAD, Snapshot,
    TOTAL_DISTANCE_CHANNEL, Value,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub struct VehicleMonitor<S: MetricSource, P: Publisher> {
    source: S,
    publisher: P,
    store: DistanceStore,
    distance: DistanceTracker,
    alerts: AlertEngine,
    sound: SoundLoop,
    state: Arc<SharedState>,
    range_constant_km: f64,
    snapshot: Snapshot,
}

impl<S: MetricSource, P: Publisher> VehicleMonitor<S, P> {
    /// Cria o monitor e recupera a distância total do disco.
    pub fn new(
        source: S,
        publisher: P,
        store: DistanceStore,
        state: Arc<SharedState>,
        sound: SoundLoop,
        config: &MonitorConfig,
    ) -> Self {
        let total = store.load_or_default();
        info!("Distância total recuperada: {total:.3} km");

        Self {
            source,
            publisher,
            store,
            distance: DistanceTracker::new(total),
            alerts: AlertEngine::new(),
            sound,
            state,
            range_constant_km: config.range_constant_km,
            snapshot: Snapshot::default(),
        }
    }

    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Último snapshot completo (ciclos abortados não o substituem).
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn total_distance(&self) -> f64 {
        self.distance.total()
    }

    pub fn origin_distance(&self) -> Option<f64> {
        self.distance.origin()
    }

    pub fn sound_running(&self) -> bool {
        self.sound.is_running()
    }

    /// Handshake com o dashboard: pede limites salvos e mostra o logo.
    pub fn connected(&self) {
        self.publisher
            .publish(SETTINGS_REQUEST_CHANNEL, Value::from(SETTINGS_REQUEST_PAYLOAD));
        commands::terminal_print(&self.publisher, LOGO);
        commands::terminal_print(
            &self.publisher,
            "Type \"help\" for the list of available commands",
        );
    }

    /// Captura a distância de origem, tentando até o barramento responder.
    ///
    /// Retorna `false` se `shutdown` for sinalizado antes; nesse caso a
    /// primeira leitura de distância posterior vira a origem.
    pub fn capture_origin(&mut self, retry: Duration, shutdown: &AtomicBool) -> bool {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match self.source.query(Channel::SessionDistance) {
                Ok(Some(reading)) => {
                    if let Some(origin) = reading.magnitude() {
                        self.distance.set_origin(origin);
                        info!("Distância de origem: {origin:.3} km ({attempts} tentativa(s))");
                        return true;
                    }
                    warn!("Distância de origem não numérica: {:?}", reading.value);
                }
                Ok(None) => debug!("Distância de origem ainda indisponível"),
                Err(e) => warn!("Erro ao capturar distância de origem: {e}"),
            }

            if shutdown.load(Ordering::Relaxed) {
                return false;
            }
            std::thread::sleep(retry);
        }
    }

    /// Executa um ciclo completo. Nunca propaga erro: loga e segue.
    pub fn tick(&mut self) {
        match self.poll() {
            Ok(snapshot) => {
                let outcome = self.alerts.evaluate(&snapshot, &self.state);
                for signal in &outcome.signals {
                    self.publisher.publish(signal.channel(), signal.value());
                }
                match outcome.sound {
                    SoundCommand::Start => {
                        self.sound.start();
                    }
                    SoundCommand::Stop => self.sound.stop(),
                    SoundCommand::Keep => {}
                }
                log_tick(&snapshot, self.distance.total());
                self.snapshot = snapshot;
            }
            Err(e) => error!("Ciclo abortado: {e}"),
        }
    }

    /// Consulta todos os canais e publica os valores presentes.
    fn poll(&mut self) -> Result<Snapshot, SourceError> {
        let mut snapshot = Snapshot::default();

        for channel in Channel::ALL {
            let Some(reading) = self.source.query(channel)? else {
                debug!("{channel:?}: sem valor neste ciclo");
                continue;
            };
            snapshot.record(channel, &reading);

            match channel {
                Channel::SessionDistance => {
                    if let Some(raw) = reading.magnitude() {
                        self.record_distance(raw, &mut snapshot);
                    }
                }
                Channel::FuelLevel => {
                    if let Some(level) = reading.magnitude() {
                        self.publisher.publish(channel.datastream(), level.into());
                        self.publisher
                            .publish(FUEL_RANGE_CHANNEL, self.estimated_range(level).into());
                    }
                }
                _ => self.publisher.publish(channel.datastream(), reading.value.into()),
            }
        }

        Ok(snapshot)
    }

    fn record_distance(&mut self, raw: f64, snapshot: &mut Snapshot) {
        let Some(update) = self.distance.record(raw) else {
            snapshot.session_distance = None;
            return;
        };
        snapshot.session_distance = Some(update.session);

        self.publisher
            .publish(Channel::SessionDistance.datastream(), update.session.into());
        self.publisher
            .publish(TOTAL_DISTANCE_CHANNEL, update.total.into());

        if let Err(e) = self.store.save(update.total) {
            warn!("Falha ao salvar distância total: {e}");
        }
    }

    /// Autonomia estimada (km) para o nível de combustível (%).
    pub fn estimated_range(&self, fuel_level: f64) -> f64 {
        fuel_level * self.range_constant_km / 100.0
    }

    /// Trata uma mensagem vinda do dashboard.
    pub fn handle_message(&self, message: &Message) -> Result<(), CommandError> {
        commands::handle(
            &message.channel,
            &message.payload_text(),
            &self.state,
            &self.publisher,
        )
    }

    /// Para o som e grava a distância final.
    pub fn shutdown(&mut self) {
        self.state.set_speed_alert_active(false);
        self.sound.stop();
        match self.store.save(self.distance.total()) {
            Ok(()) => info!(
                "Distância total {:.3} km salva em {}",
                self.distance.total(),
                self.store.path().display()
            ),
            Err(e) => error!("Falha ao salvar distância no encerramento: {e}"),
        }
    }
}

fn log_tick(s: &Snapshot, total: f64) {
    info!(
        "Vel {} km/h | RPM {} | Comb {}% | Arref {}°C | Bat {}V | Total {:.1} km",
        fmt_opt(s.speed, 0),
        fmt_opt(s.rpm, 0),
        fmt_opt(s.fuel_level, 0),
        fmt_opt(s.coolant_temp, 0),
        fmt_opt(s.module_voltage, 1),
        total,
    );
}

fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    v.map_or_else(|| "--".into(), |v| format!("{v:.decimals$}"))
}
