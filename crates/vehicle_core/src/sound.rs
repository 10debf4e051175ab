//! Loop do som de alerta de velocidade.
//!
//! Uma thread dedicada toca o som a cada intervalo enquanto
//! `speed_alert_active` estiver ligado. O handle fica no [`SoundLoop`]:
//! no máximo uma thread por vez, e [`SoundLoop::stop`] faz join.

use crate::ports::SoundPlayer;
use crate::state::SharedState;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};

struct Running {
    handle: JoinHandle<()>,
    stop_tx: Sender<()>,
}

/// Handle supervisionado do loop de som.
pub struct SoundLoop {
    player: Arc<dyn SoundPlayer>,
    state: Arc<SharedState>,
    interval: Duration,
    running: Option<Running>,
}

impl SoundLoop {
    pub fn new(player: Arc<dyn SoundPlayer>, state: Arc<SharedState>, interval: Duration) -> Self {
        Self {
            player,
            state,
            interval,
            running: None,
        }
    }

    /// `true` enquanto a thread de som estiver viva.
    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }

    /// Inicia o loop. Não cria uma segunda thread se já houver uma ativa.
    ///
    /// Retorna `true` se uma nova thread foi criada.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            debug!("Loop de som já ativo");
            return false;
        }
        // Thread anterior terminou sozinha (flag desligada): recolhe
        self.reap();

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let player = Arc::clone(&self.player);
        let state = Arc::clone(&self.state);
        let interval = self.interval;

        let spawned = std::thread::Builder::new()
            .name("speed-alert-sound".into())
            .spawn(move || sound_loop(player.as_ref(), &state, interval, &stop_rx));

        match spawned {
            Ok(handle) => {
                info!("Som de alerta de velocidade iniciado");
                self.running = Some(Running { handle, stop_tx });
                true
            }
            Err(e) => {
                error!("Falha ao criar thread de som: {e}");
                false
            }
        }
    }

    /// Para o loop e espera a thread terminar.
    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            // Canal cheio = stop já pedido; desconectado = thread já saiu
            let _ = running.stop_tx.try_send(());
            drop(running.stop_tx);
            if running.handle.join().is_err() {
                warn!("Thread de som terminou com panic");
            }
            info!("Som de alerta de velocidade parado");
        }
    }

    fn reap(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.handle.join();
        }
    }
}

impl Drop for SoundLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn sound_loop(
    player: &dyn SoundPlayer,
    state: &SharedState,
    interval: Duration,
    stop_rx: &Receiver<()>,
) {
    while state.speed_alert_active() {
        if state.sound_enabled() {
            player.play();
        }
        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            // Stop pedido ou handle descartado
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!("Loop de som encerrado");
}
