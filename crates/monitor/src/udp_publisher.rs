//! Publicador UDP: cada `(canal, valor)` vira um datagrama.

use std::net::UdpSocket;
use tracing::{debug, warn};
use vehicle_core::protocol::{Message, encode_message};
use vehicle_core::{Publisher, Value};

pub struct UdpPublisher {
    sock: UdpSocket,
    dest_addr: String,
}

impl UdpPublisher {
    pub fn new(sock: UdpSocket, dest_addr: String) -> Self {
        Self { sock, dest_addr }
    }

    pub fn dest_addr(&self) -> &str {
        &self.dest_addr
    }
}

impl Publisher for UdpPublisher {
    fn publish(&self, channel: &str, value: Value) {
        let message = Message::new(channel, value);
        match encode_message(&message) {
            Ok(frame) => match self.sock.send_to(&frame, &self.dest_addr) {
                Ok(sent) => debug!("→ {} ({sent} bytes) = {}", message.channel, message.value),
                Err(e) => warn!("Erro ao enviar {}: {e}", message.channel),
            },
            Err(e) => warn!("Erro ao serializar {}: {e}", message.channel),
        }
    }
}
