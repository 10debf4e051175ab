//! Reprodução do som de alerta.
//!
//! Com `sound.player` configurado, dispara o programa externo com o
//! arquivo de som (sem esperar terminar). Sem player, toca o bell do
//! terminal.

use std::io::Write;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use vehicle_core::SoundPlayer;
use vehicle_core::config::SoundConfig;

/// Monta o player a partir da configuração.
pub fn from_config(config: &SoundConfig) -> Arc<dyn SoundPlayer> {
    if !config.enabled {
        info!("Som de alerta desativado na configuração");
        return Arc::new(SilentPlayer);
    }
    if config.player.is_empty() {
        Arc::new(TerminalBell)
    } else {
        info!("Som de alerta: {} {}", config.player, config.speed_alert_sound);
        Arc::new(CommandPlayer::new(&config.player, &config.speed_alert_sound))
    }
}

/// Executa um programa externo (ex: `aplay`, `afplay`, `mpg123`).
pub struct CommandPlayer {
    program: String,
    file: String,
    last: Mutex<Option<Child>>,
}

impl CommandPlayer {
    pub fn new(program: &str, file: &str) -> Self {
        Self {
            program: program.into(),
            file: file.into(),
            last: Mutex::new(None),
        }
    }
}

impl SoundPlayer for CommandPlayer {
    fn play(&self) {
        let Ok(mut last) = self.last.lock() else {
            return;
        };

        // Recolhe a execução anterior; se ainda estiver tocando, não empilha
        if let Some(child) = last.as_mut() {
            match child.try_wait() {
                Ok(None) => {
                    debug!("Som anterior ainda tocando");
                    return;
                }
                Ok(Some(_)) | Err(_) => *last = None,
            }
        }

        match Command::new(&self.program)
            .arg(&self.file)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => *last = Some(child),
            Err(e) => warn!("Falha ao executar {}: {e}", self.program),
        }
    }
}

/// Bell ASCII no terminal.
pub struct TerminalBell;

impl SoundPlayer for TerminalBell {
    fn play(&self) {
        let mut out = std::io::stdout();
        let _ = out.write_all(b"\x07");
        let _ = out.flush();
        info!("🔔 Alerta de velocidade");
    }
}

pub struct SilentPlayer;

impl SoundPlayer for SilentPlayer {
    fn play(&self) {}
}
