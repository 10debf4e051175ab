//! # Vehicle Monitor
//!
//! Lê telemetria OBD em intervalo fixo, publica métricas e alertas via
//! UDP e mantém a distância total acumulada entre reinícios.
//!
//! ## Uso
//! ```bash
//! vehicle_monitor                       # config.toml ao lado do executável
//! vehicle_monitor --config carro.toml   # config alternativa
//! ```

mod net_thread;
mod player;
mod sim;
mod udp_publisher;

use crossbeam_channel::RecvTimeoutError;
use sim::SimulatedBus;
use std::net::UdpSocket;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use udp_publisher::UdpPublisher;
use vehicle_core::config::{AppConfig, TransportConfig};
use vehicle_core::distance::DistanceStore;
use vehicle_core::sound::SoundLoop;
use vehicle_core::state::SharedState;
use vehicle_core::VehicleMonitor;

fn main() {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── Config ──
    let config_path = config_path_from_args().unwrap_or_else(AppConfig::default_path);
    let config = AppConfig::load(&config_path);

    // Primeira execução: deixa o arquivo pronto para edição
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("Config inválida: {e}");
        }
        std::process::exit(1);
    }

    let transport = &config.transport;
    let interval = Duration::from_secs_f64(config.monitor.poll_interval_secs);

    // ── Encerramento (Ctrl-C) ──
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        if let Err(e) = ctrlc::set_handler(move || {
            info!("Encerramento solicitado...");
            shutdown.store(true, Ordering::Relaxed);
        }) {
            warn!("Falha ao registrar handler de Ctrl-C: {e}");
        }
    }

    // ── Publicação ──
    let publisher = match open_publisher(transport) {
        Ok(publisher) => publisher,
        Err(e) => {
            error!("Socket de publicação indisponível: {e}");
            std::process::exit(1);
        }
    };

    // ── Comandos do dashboard ──
    let commands = net_thread::spawn_command_listener(
        transport.listen_port,
        transport.command_source_ip.clone(),
        Arc::clone(&shutdown),
    )
    .unwrap_or_else(|e| {
        error!("Thread de comandos não iniciou: {e}");
        std::process::exit(1);
    });

    // ── Monitor ──
    let state = Arc::new(SharedState::new(
        config.monitor.initial_speed_limit,
        config.monitor.initial_fuel_limit,
    ));
    let sound = SoundLoop::new(
        player::from_config(&config.sound),
        Arc::clone(&state),
        Duration::from_secs_f64(config.sound.interval_secs),
    );
    let source = SimulatedBus::new(&config.simulation, config.monitor.poll_interval_secs);
    let store = DistanceStore::new(&config.monitor.distance_file);

    let mut monitor = VehicleMonitor::new(source, publisher, store, state, sound, &config.monitor);
    monitor.connected();

    let retry = Duration::from_secs_f64(config.monitor.origin_retry_secs);
    if !monitor.capture_origin(retry, &shutdown) {
        warn!("Origem não capturada antes do encerramento");
    }

    // ── Banner ──
    println!();
    println!("══════════════════════════════════════════════");
    println!("   🚗 VEHICLE MONITOR – ATIVO (Rust)");
    println!("══════════════════════════════════════════════");
    println!("  Destino:    {}", monitor.publisher().dest_addr());
    println!("  Comandos:   UDP {}", transport.listen_port);
    println!("  Intervalo:  {:.1}s", config.monitor.poll_interval_secs);
    println!("  Distância:  {:.1} km", monitor.total_distance());
    println!("  Protocolo:  bincode v{}", vehicle_core::PROTOCOL_VERSION);
    println!("══════════════════════════════════════════════");
    println!();

    // ── Loop principal ──
    while !shutdown.load(Ordering::Relaxed) {
        let cycle_start = Instant::now();

        monitor.tick();

        // Espera o restante do intervalo atendendo comandos
        loop {
            let elapsed = cycle_start.elapsed();
            if elapsed >= interval || shutdown.load(Ordering::Relaxed) {
                break;
            }
            match commands.recv_timeout(interval - elapsed) {
                Ok(msg) => {
                    let _ = monitor.handle_message(&msg);
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("Thread de comandos encerrada");
                    std::thread::sleep(interval - elapsed);
                    break;
                }
            }
        }
    }

    monitor.shutdown();
    info!("Monitor encerrado");
}

/// Socket de saída: broadcast ou unicast conforme `[transport]`.
fn open_publisher(transport: &TransportConfig) -> std::io::Result<UdpPublisher> {
    let bind_ip = match transport.bind_ip.as_str() {
        "" => "0.0.0.0",
        ip => ip,
    };
    let sock = UdpSocket::bind((bind_ip, 0))?;

    let dest_ip = &transport.dest_ip;
    if transport.mode == "broadcast" || dest_ip == "255.255.255.255" {
        sock.set_broadcast(true)?;
        info!("Publicando em broadcast");
    } else {
        info!("Publicando em unicast para {dest_ip}");
    }
    Ok(UdpPublisher::new(sock, format!("{dest_ip}:{}", transport.port)))
}

/// `--config <arquivo>`
fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}
