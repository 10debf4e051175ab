//! Configuração unificada via TOML.
//!
//! Um único `config.toml` ao lado do executável, com seções para o
//! monitor, o transporte UDP, o som de alerta e a fonte simulada.

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Sem acesso a {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML inválido em {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Config não serializável: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Configuração do ciclo de polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Intervalo entre ciclos de polling (segundos)
    pub poll_interval_secs: f64,
    /// Autonomia com tanque cheio (km) – calibração por veículo
    pub range_constant_km: f64,
    /// Arquivo com a distância total acumulada
    pub distance_file: String,
    /// Espera entre tentativas de capturar a distância de origem (segundos)
    pub origin_retry_secs: f64,
    /// Limite de velocidade inicial (0 = desativado até o dashboard responder)
    pub initial_speed_limit: i64,
    /// Limite de combustível inicial (0 = desativado)
    pub initial_fuel_limit: i64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 1.0,
            range_constant_km: 558.0,
            distance_file: "distance.csv".into(),
            origin_retry_secs: 1.0,
            initial_speed_limit: 0,
            initial_fuel_limit: 0,
        }
    }
}

/// Configuração do transporte pub/sub (UDP).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Modo de envio: "broadcast" ou "unicast"
    pub mode: String,
    /// IP de destino (255.255.255.255 para broadcast)
    pub dest_ip: String,
    /// Porta UDP de destino
    pub port: u16,
    /// IP local para bind (vazio = auto)
    pub bind_ip: String,
    /// Porta UDP onde chegam comandos do dashboard
    pub listen_port: u16,
    /// Aceita comandos só deste IP (vazio = qualquer)
    pub command_source_ip: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            mode: "broadcast".into(),
            dest_ip: "255.255.255.255".into(),
            port: 5005,
            bind_ip: String::new(),
            listen_port: 5006,
            command_source_ip: String::new(),
        }
    }
}

/// Configuração do som de alerta de velocidade.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    pub enabled: bool,
    /// Intervalo entre repetições do som (segundos)
    pub interval_secs: f64,
    /// Programa externo que toca o arquivo (vazio = bell do terminal)
    pub player: String,
    pub speed_alert_sound: String,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 10.0,
            player: String::new(),
            speed_alert_sound: "alert_sounds/speed_alert.mp3".into(),
        }
    }
}

/// Perfil da fonte simulada (sem adaptador OBD conectado).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Velocidades (km/h) percorridas em loop, uma por ciclo
    pub speed_profile: Vec<f64>,
    /// Nível de combustível inicial (%)
    pub initial_fuel_level: f64,
    /// Consumo por km (% do tanque)
    pub fuel_per_km: f64,
    /// Odômetro "desde clear de DTC" no início (km)
    pub initial_distance_km: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            speed_profile: vec![0.0, 30.0, 60.0, 85.0, 110.0, 95.0, 70.0, 40.0],
            initial_fuel_level: 60.0,
            fuel_per_km: 0.18,
            initial_distance_km: 1250.0,
        }
    }
}

/// Configuração raiz do aplicativo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub monitor: MonitorConfig,
    pub transport: TransportConfig,
    pub sound: SoundConfig,
    pub simulation: SimulationConfig,
}

impl AppConfig {
    /// Lê o arquivo; ausente ou inválido cai nos padrões.
    pub fn load(path: &Path) -> Self {
        match Self::read(path) {
            Ok(Some(config)) => {
                info!("Config lida de {}", path.display());
                config
            }
            Ok(None) => {
                info!("{} não existe; config padrão", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("{e}; config padrão");
                Self::default()
            }
        }
    }

    /// `Ok(None)` quando o arquivo não existe.
    pub fn read(path: &Path) -> Result<Option<Self>, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&text)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Config gravada em {}", path.display());
        Ok(())
    }

    /// `config.toml` no diretório do executável (ou no diretório atual).
    pub fn default_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.transport.port == 0 {
            errors.push("Porta de destino não pode ser 0".into());
        }
        if self.transport.listen_port == 0 {
            errors.push("Porta de comandos não pode ser 0".into());
        }
        if !in_secs_range(self.monitor.poll_interval_secs, 0.1, 60.0) {
            errors.push(format!(
                "Intervalo de polling inválido: {} (0.1–60.0)",
                self.monitor.poll_interval_secs
            ));
        }
        if !(self.monitor.range_constant_km.is_finite() && self.monitor.range_constant_km > 0.0) {
            errors.push(format!(
                "Autonomia inválida: {} km",
                self.monitor.range_constant_km
            ));
        }
        if !in_secs_range(self.monitor.origin_retry_secs, 0.01, MAX_WAIT_SECS) {
            errors.push(format!(
                "Intervalo de retry da origem inválido: {}",
                self.monitor.origin_retry_secs
            ));
        }
        if self.monitor.initial_speed_limit < 0 || self.monitor.initial_fuel_limit < 0 {
            errors.push("Limites iniciais não podem ser negativos".into());
        }
        if !in_secs_range(self.sound.interval_secs, 0.01, MAX_WAIT_SECS) {
            errors.push(format!(
                "Intervalo do som inválido: {}",
                self.sound.interval_secs
            ));
        }

        errors
    }
}

/// Teto para intervalos de espera (1 hora).
const MAX_WAIT_SECS: f64 = 3600.0;

/// `false` para NaN, infinito ou fora de `min..=max`.
fn in_secs_range(value: f64, min: f64, max: f64) -> bool {
    (min..=max).contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        let errors = config.validate();
        assert!(errors.is_empty(), "Erros: {:?}", errors);
    }

    #[test]
    fn roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.transport.port, parsed.transport.port);
        assert_eq!(config.monitor.distance_file, parsed.monitor.distance_file);
        assert_eq!(config.simulation.speed_profile, parsed.simulation.speed_profile);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let partial = r#"
[monitor]
range_constant_km = 720.0
"#;
        let config: AppConfig = toml::from_str(partial).unwrap();
        assert_eq!(config.monitor.range_constant_km, 720.0);
        // Outros campos devem ter valor padrão
        assert_eq!(config.monitor.poll_interval_secs, 1.0);
        assert_eq!(config.sound.interval_secs, 10.0);
        assert_eq!(config.transport.listen_port, 5006);
    }

    #[test]
    fn rejects_bad_intervals() {
        let mut config = AppConfig::default();
        config.monitor.poll_interval_secs = 0.0;
        config.sound.interval_secs = -1.0;
        config.monitor.range_constant_km = 0.0;
        assert_eq!(config.validate().len(), 3);
    }

    #[test]
    fn rejects_non_finite_intervals() {
        let toml_str = r#"
[monitor]
poll_interval_secs = nan
origin_retry_secs = inf
range_constant_km = nan

[sound]
interval_secs = inf
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.validate().len(), 4);
    }

    #[test]
    fn rejects_overlong_waits() {
        let mut config = AppConfig::default();
        config.sound.interval_secs = 1e300;
        config.monitor.origin_retry_secs = 7200.0;
        assert_eq!(config.validate().len(), 2);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = AppConfig::default();
        config.monitor.initial_speed_limit = 90;
        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path);
        assert_eq!(loaded.monitor.initial_speed_limit, 90);
    }

    #[test]
    fn broken_toml_is_reported_then_defaulted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[monitor\npoll_interval_secs = ").unwrap();
        assert!(matches!(AppConfig::read(&path), Err(ConfigError::Parse { .. })));
        assert_eq!(AppConfig::load(&path).monitor.poll_interval_secs, 1.0);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = AppConfig::load(&dir.path().join("nope.toml"));
        assert_eq!(loaded.transport.port, 5005);
    }
}
