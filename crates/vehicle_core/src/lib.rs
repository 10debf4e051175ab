//! # Vehicle Core
//!
//! Crate compartilhada com os tipos, o protocolo binário (bincode), a
//! configuração TOML e a lógica do monitor de telemetria veicular.
//!
//! ## Módulos
//! - [`types`] – Canais OBD, leituras, snapshot e nomes de datastreams
//! - [`protocol`] – Encode/decode binário com magic byte
//! - [`config`] – Configuração unificada via TOML
//! - [`ports`] – Traits da fonte OBD, do publicador e do som
//! - [`distance`] – Distância incremental e persistência do total
//! - [`state`] – Limites e flags compartilhados entre threads
//! - [`alerts`] – Máquinas de estado de velocidade e combustível
//! - [`sound`] – Loop supervisionado do som de alerta
//! - [`commands`] – Interpretador de comandos do dashboard
//! - [`monitor`] – Ciclo de polling que junta tudo

pub mod types;
pub mod protocol;
pub mod config;
pub mod ports;
pub mod distance;
pub mod state;
pub mod alerts;
pub mod sound;
pub mod commands;
pub mod monitor;

// Re-exports convenientes
pub use types::{Channel, Reading, Snapshot, Value};
pub use protocol::{Message, decode_message, encode_message, PROTOCOL_VERSION};
pub use config::AppConfig;
pub use ports::{MetricSource, Publisher, SoundPlayer, SourceError};
pub use monitor::VehicleMonitor;
