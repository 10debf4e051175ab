//! Escuta de comandos do dashboard.
//!
//! Uma thread dedicada recebe frames UDP, descarta origens não autorizadas
//! e repassa as mensagens ao loop principal por um channel limitado.

use crossbeam_channel::{Receiver, Sender, bounded};
use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use vehicle_core::protocol::{Message, decode_message};

/// Mensagens pendentes antes de o listener bloquear.
const QUEUE_DEPTH: usize = 64;
const POLL_TIMEOUT: Duration = Duration::from_secs(1);
const REBIND_DELAY: Duration = Duration::from_secs(2);

/// Origem aceita para comandos. Vazio aceita qualquer IP.
#[derive(Debug, Clone, Copy)]
enum SourceFilter {
    Any,
    Only(IpAddr),
}

impl SourceFilter {
    fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" => Self::Any,
            ip => match ip.parse() {
                Ok(addr) => Self::Only(addr),
                Err(_) => {
                    warn!("command_source_ip inválido ({ip}); aceitando qualquer origem");
                    Self::Any
                }
            },
        }
    }

    fn accepts(self, from: &SocketAddr) -> bool {
        match self {
            Self::Any => true,
            Self::Only(ip) => from.ip() == ip,
        }
    }
}

/// Sobe a thread de escuta e devolve a ponta receptora do channel.
pub fn spawn_command_listener(
    port: u16,
    source_ip: String,
    shutdown: Arc<AtomicBool>,
) -> std::io::Result<Receiver<Message>> {
    let (tx, rx) = bounded(QUEUE_DEPTH);
    let filter = SourceFilter::parse(&source_ip);

    std::thread::Builder::new()
        .name("udp-commands".into())
        .spawn(move || run(&tx, port, filter, &shutdown))?;

    Ok(rx)
}

fn run(tx: &Sender<Message>, port: u16, filter: SourceFilter, shutdown: &AtomicBool) {
    while !shutdown.load(Ordering::Relaxed) {
        let sock = match UdpSocket::bind(("0.0.0.0", port)) {
            Ok(sock) => sock,
            Err(e) => {
                error!("Porta de comandos {port} indisponível: {e}");
                std::thread::sleep(REBIND_DELAY);
                continue;
            }
        };
        if let Err(e) = sock.set_read_timeout(Some(POLL_TIMEOUT)) {
            warn!("Sem timeout de leitura na porta {port}: {e}");
        }
        info!("Aguardando comandos em UDP {port} ({filter:?})");

        if !serve(&sock, tx, filter, shutdown) {
            return;
        }
    }
}

/// Atende o socket até o encerramento. `false` quando o loop principal
/// já descartou o channel.
fn serve(sock: &UdpSocket, tx: &Sender<Message>, filter: SourceFilter, shutdown: &AtomicBool) -> bool {
    let mut buf = vec![0u8; u16::MAX as usize];

    while !shutdown.load(Ordering::Relaxed) {
        let (len, from) = match sock.recv_from(&mut buf) {
            Ok(received) => received,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => continue,
            Err(e) => {
                warn!("Falha na leitura de comandos: {e}");
                continue;
            }
        };

        if !filter.accepts(&from) {
            debug!("Comando de {from} recusado pelo filtro");
            continue;
        }

        match decode_message(&buf[..len]) {
            Ok(message) => {
                debug!("← {} ({from})", message.channel);
                if tx.send(message).is_err() {
                    return false;
                }
            }
            Err(e) => debug!("Frame descartado de {from}: {e}"),
        }
    }
    true
}
