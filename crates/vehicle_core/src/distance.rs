//! Distância acumulada: cálculo incremental e persistência.
//!
//! O barramento só informa "distância desde o último clear de DTC".
//! O [`DistanceTracker`] converte essas leituras em incrementos e os soma
//! ao total de vida do veículo; o [`DistanceStore`] grava esse total em
//! disco para sobreviver a reinícios.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

// ──────────────────────────────────────────────
// Persistência
// ──────────────────────────────────────────────

/// Erros de persistência da distância.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Erro de I/O em {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Conteúdo inválido em {}: {content:?}", path.display())]
    Invalid { path: PathBuf, content: String },
}

/// Arquivo com um único registro: a distância total (km).
///
/// Escrita atômica: grava em `<arquivo>.tmp` e renomeia por cima.
#[derive(Debug, Clone)]
pub struct DistanceStore {
    path: PathBuf,
}

impl DistanceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lê o total gravado. Arquivo ausente não é erro: retorna 0.
    pub fn load(&self) -> Result<f64, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0.0),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let Some(row) = content.lines().map(str::trim).find(|l| !l.is_empty()) else {
            return Ok(0.0);
        };
        let field = row.split(',').next().unwrap_or(row).trim();

        match field.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
            _ => Err(StoreError::Invalid {
                path: self.path.clone(),
                content: row.to_string(),
            }),
        }
    }

    /// Como [`load`](Self::load), mas registra o erro e começa do zero.
    pub fn load_or_default(&self) -> f64 {
        match self.load() {
            Ok(v) => v,
            Err(e) => {
                warn!("Distância total não recuperada, iniciando em 0: {e}");
                0.0
            }
        }
    }

    /// Sobrescreve o total gravado.
    pub fn save(&self, total: f64) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut file = fs::File::create(&tmp).map_err(io_err)?;
        writeln!(file, "{total}").map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);

        fs::rename(&tmp, &self.path).map_err(io_err)?;
        debug!("Distância total {total:.3} km salva em {}", self.path.display());
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Cálculo incremental
// ──────────────────────────────────────────────

/// Resultado de uma leitura de distância.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceUpdate {
    /// Distância da sessão (leitura − origem)
    pub session: f64,
    /// Quanto foi somado ao total neste ciclo (nunca negativo)
    pub incremental: f64,
    /// Total acumulado após o ciclo
    pub total: f64,
}

/// Estado da distância: origem, última leitura e total.
#[derive(Debug, Clone)]
pub struct DistanceTracker {
    origin: Option<f64>,
    /// Soma aplicada após resets do contador; mantém a sessão contínua.
    offset: f64,
    last_recorded: f64,
    total: f64,
}

impl DistanceTracker {
    /// Começa a partir do total persistido.
    pub fn new(initial_total: f64) -> Self {
        Self {
            origin: None,
            offset: 0.0,
            last_recorded: 0.0,
            total: initial_total,
        }
    }

    /// Fixa a origem. Só tem efeito na primeira chamada.
    pub fn set_origin(&mut self, origin: f64) {
        if self.origin.is_none() {
            self.origin = Some(origin);
        }
    }

    pub fn origin(&self) -> Option<f64> {
        self.origin
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn last_recorded(&self) -> f64 {
        self.last_recorded
    }

    /// Processa uma leitura bruta do barramento.
    ///
    /// Sem origem capturada, a primeira leitura vira a origem. Se o contador
    /// do barramento voltar (clear de DTC), o incremento é zero e a distância
    /// da sessão continua de onde estava. Leituras não finitas são ignoradas.
    pub fn record(&mut self, raw: f64) -> Option<DistanceUpdate> {
        if !raw.is_finite() {
            warn!("Leitura de distância inválida ignorada: {raw}");
            return None;
        }

        let origin = *self.origin.get_or_insert(raw);
        let mut session = raw - origin + self.offset;
        let delta = session - self.last_recorded;

        let incremental = if delta < 0.0 {
            warn!(
                "Contador de distância do barramento voltou ({:.3} → {:.3} km); incremento descartado",
                self.last_recorded, session
            );
            self.offset -= delta;
            session = self.last_recorded;
            0.0
        } else {
            delta
        };

        self.total += incremental;
        self.last_recorded = session;

        Some(DistanceUpdate {
            session,
            incremental,
            total: self.total,
        })
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
