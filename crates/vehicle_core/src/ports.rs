//! Fronteira com o mundo externo: barramento OBD, pub/sub e áudio.
//!
//! O monitor só conhece estes traits; adaptadores concretos ficam no
//! binário (ou nos testes, como mocks).

use crate::types::{Channel, Reading, Value};

/// Falha real do barramento. "Sem valor ainda" não é erro: é `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Adaptador OBD desconectado")]
    Disconnected,

    #[error("Erro de I/O no barramento: {0}")]
    Io(#[from] std::io::Error),

    #[error("Resposta inválida para {channel:?}: {detail}")]
    Malformed { channel: Channel, detail: String },
}

/// Fonte de métricas (adaptador OBD).
///
/// Implementações devem ter espera limitada: timeout de consulta vira
/// `Ok(None)`, nunca bloqueia o ciclo de polling indefinidamente.
pub trait MetricSource {
    fn query(&mut self, channel: Channel) -> Result<Option<Reading>, SourceError>;
}

/// Publicador pub/sub. Fire-and-forget: falhas de entrega são do adaptador.
pub trait Publisher {
    fn publish(&self, channel: &str, value: Value);
}

/// Som de alerta. `play` não pode bloquear.
pub trait SoundPlayer: Send + Sync {
    fn play(&self);
}
