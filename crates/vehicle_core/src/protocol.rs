//! Frames binários trocados com o dashboard.
//!
//! Um datagrama UDP por publicação `(canal, valor)`:
//!
//! ```text
//! ┌──────┬────────┬──────────────────────────┐
//! │ 0x56 │ versão │ Message (bincode)        │
//! └──────┴────────┴──────────────────────────┘
//! ```

use crate::types::Value;
use serde::{Deserialize, Serialize};

/// Primeiro byte de todo frame ('V').
pub const MAGIC_BYTE: u8 = 0x56;

pub const PROTOCOL_VERSION: u8 = 1;

/// Magic + versão.
const HEADER_SIZE: usize = 2;

/// Maior payload que cabe num datagrama IPv4.
pub const MAX_UDP_PAYLOAD: usize = 65507;

/// Uma mensagem no barramento pub/sub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub channel: String,
    pub value: Value,
}

impl Message {
    pub fn new(channel: &str, value: impl Into<Value>) -> Self {
        Self {
            channel: channel.into(),
            value: value.into(),
        }
    }

    /// Payload como texto, do jeito que o interpretador de comandos espera.
    pub fn payload_text(&self) -> String {
        self.value.to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Frame com {0} bytes não tem cabeçalho completo")]
    TooShort(usize),

    #[error("Frame de outro protocolo (byte inicial 0x{0:02X})")]
    InvalidMagic(u8),

    #[error("Frame na versão {0}, este monitor fala a {PROTOCOL_VERSION}")]
    VersionMismatch(u8),

    #[error("Frame de {0} bytes excede o datagrama ({MAX_UDP_PAYLOAD})")]
    TooLarge(usize),

    #[error("Falha ao codificar mensagem: {0}")]
    Serialize(String),

    #[error("Corpo do frame ilegível: {0}")]
    Deserialize(String),
}

/// Monta o frame `[MAGIC][VERSION][message]`.
pub fn encode_message(message: &Message) -> Result<Vec<u8>, ProtocolError> {
    let mut frame = vec![MAGIC_BYTE, PROTOCOL_VERSION];
    bincode::serialize_into(&mut frame, message)
        .map_err(|e| ProtocolError::Serialize(e.to_string()))?;

    match frame.len() {
        len if len > MAX_UDP_PAYLOAD => Err(ProtocolError::TooLarge(len)),
        _ => Ok(frame),
    }
}

/// Abre um frame recebido. O cabeçalho é conferido antes do bincode.
pub fn decode_message(data: &[u8]) -> Result<Message, ProtocolError> {
    let body = match data {
        [MAGIC_BYTE, PROTOCOL_VERSION, body @ ..] => body,
        [MAGIC_BYTE, version, ..] => return Err(ProtocolError::VersionMismatch(*version)),
        [magic, _, ..] => return Err(ProtocolError::InvalidMagic(*magic)),
        _ => return Err(ProtocolError::TooShort(data.len())),
    };

    bincode::deserialize(body).map_err(|e| ProtocolError::Deserialize(e.to_string()))
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
