//! Definição de tipos para telemetria veicular.
//!
//! Canais OBD consultados a cada ciclo, leituras, valores publicáveis
//! e o snapshot com os últimos valores de cada canal.

use serde::{Deserialize, Serialize};

// ──────────────────────────────────────────────
// Nomes de canais do dashboard
// ──────────────────────────────────────────────

/// Canal de status do alerta de velocidade.
pub const SPEED_ALERT_CHANNEL: &str = "ds/Speed Alert";

/// Canal de status do alerta de combustível.
pub const FUEL_ALERT_CHANNEL: &str = "ds/Fuel Alert";

/// Evento one-shot: limite de velocidade excedido.
pub const SPEED_EVENT_CHANNEL: &str = "event/speed_limit_exceeded";

/// Evento one-shot: combustível baixo.
pub const FUEL_EVENT_CHANNEL: &str = "event/low_fuel";

/// Estimativa de autonomia derivada do nível de combustível.
pub const FUEL_RANGE_CHANNEL: &str = "ds/Fuel Estimated Distance";

/// Distância da sessão (relativa à origem).
pub const CURRENT_DISTANCE_CHANNEL: &str = "ds/Current Distance";

/// Distância acumulada persistida.
pub const TOTAL_DISTANCE_CHANNEL: &str = "ds/Total Distance";

/// Terminal do dashboard (saída).
pub const TERMINAL_CHANNEL: &str = "ds/Terminal";

/// Limite de velocidade refletido de volta ao dashboard.
pub const SPEED_LIMIT_CHANNEL: &str = "ds/Speed Limit";

/// Estado do som de alerta (1 = ligado, 0 = mudo).
pub const ALERT_SOUND_CHANNEL: &str = "ds/Alert Sound";

/// Pedido de configurações armazenadas no dashboard.
pub const SETTINGS_REQUEST_CHANNEL: &str = "get/ds";

/// Payload do pedido de configurações.
pub const SETTINGS_REQUEST_PAYLOAD: &str = "Speed Limit,Fuel Alert Limit";

/// Atualização do limite de velocidade (entrada).
pub const SPEED_LIMIT_DOWNLINK: &str = "downlink/ds/Speed Limit";

/// Atualização do limite de combustível (entrada).
pub const FUEL_LIMIT_DOWNLINK: &str = "downlink/ds/Fuel Alert Limit";

/// Terminal do dashboard (entrada).
pub const TERMINAL_DOWNLINK: &str = "downlink/ds/Terminal";

// ──────────────────────────────────────────────
// Canais OBD
// ──────────────────────────────────────────────

/// Canais consultados no barramento a cada ciclo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    EngineSpeed,
    SessionDistance,
    Speed,
    FuelLevel,
    ModuleVoltage,
    RunTime,
    AmbientTemp,
    CoolantTemp,
    FuelType,
}

impl Channel {
    /// Todos os canais, na ordem de consulta.
    pub const ALL: [Channel; 9] = [
        Channel::EngineSpeed,
        Channel::SessionDistance,
        Channel::Speed,
        Channel::FuelLevel,
        Channel::ModuleVoltage,
        Channel::RunTime,
        Channel::AmbientTemp,
        Channel::CoolantTemp,
        Channel::FuelType,
    ];

    /// Nome do datastream publicado para este canal.
    ///
    /// `SessionDistance` não é publicado diretamente: vira
    /// [`CURRENT_DISTANCE_CHANNEL`] e [`TOTAL_DISTANCE_CHANNEL`].
    pub fn datastream(self) -> &'static str {
        match self {
            Channel::EngineSpeed => "ds/Engine Speed",
            Channel::SessionDistance => CURRENT_DISTANCE_CHANNEL,
            Channel::Speed => "ds/Speed",
            Channel::FuelLevel => "ds/Fuel Level",
            Channel::ModuleVoltage => "ds/Battery Voltage",
            Channel::RunTime => "ds/Engine Run Time",
            Channel::AmbientTemp => "ds/Ambient Air Temp",
            Channel::CoolantTemp => "ds/Coolant Temp",
            Channel::FuelType => "ds/Fuel Type",
        }
    }
}

// ──────────────────────────────────────────────
// Leituras e valores
// ──────────────────────────────────────────────

/// Valor bruto de uma leitura OBD.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

/// Leitura de um canal: magnitude + unidade.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub value: MetricValue,
    pub unit: String,
}

impl Reading {
    pub fn number(magnitude: f64, unit: &str) -> Self {
        Self {
            value: MetricValue::Number(magnitude),
            unit: unit.into(),
        }
    }

    pub fn text(value: &str) -> Self {
        Self {
            value: MetricValue::Text(value.into()),
            unit: String::new(),
        }
    }

    /// Magnitude numérica, se houver.
    pub fn magnitude(&self) -> Option<f64> {
        match self.value {
            MetricValue::Number(v) => Some(v),
            MetricValue::Text(_) => None,
        }
    }
}

/// Valor publicado no dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Float(f64),
    Int(i64),
    Text(String),
    /// Eventos não carregam payload.
    Empty,
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<MetricValue> for Value {
    fn from(v: MetricValue) -> Self {
        match v {
            MetricValue::Number(n) => Value::Float(n),
            MetricValue::Text(t) => Value::Text(t),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Float(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
            Value::Empty => Ok(()),
        }
    }
}

// ──────────────────────────────────────────────
// Snapshot
// ──────────────────────────────────────────────

/// Últimos valores lidos. Cada campo é `None` se o barramento não respondeu.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Rotação do motor (rpm)
    pub rpm: Option<f64>,
    /// Distância desde o último clear de DTC, relativa à origem (km)
    pub session_distance: Option<f64>,
    /// Velocidade (km/h)
    pub speed: Option<f64>,
    /// Nível de combustível (0–100%)
    pub fuel_level: Option<f64>,
    /// Tensão do módulo de controle (V)
    pub module_voltage: Option<f64>,
    /// Tempo de motor ligado (s)
    pub run_time: Option<f64>,
    /// Temperatura ambiente (°C)
    pub ambient_temp: Option<f64>,
    /// Temperatura do líquido de arrefecimento (°C)
    pub coolant_temp: Option<f64>,
    /// Tipo de combustível
    pub fuel_type: Option<String>,
}

impl Snapshot {
    /// Registra uma leitura no campo correspondente.
    pub fn record(&mut self, channel: Channel, reading: &Reading) {
        let slot = match channel {
            Channel::FuelType => {
                self.fuel_type = Some(match &reading.value {
                    MetricValue::Text(t) => t.clone(),
                    MetricValue::Number(n) => n.to_string(),
                });
                return;
            }
            Channel::EngineSpeed => &mut self.rpm,
            Channel::SessionDistance => &mut self.session_distance,
            Channel::Speed => &mut self.speed,
            Channel::FuelLevel => &mut self.fuel_level,
            Channel::ModuleVoltage => &mut self.module_voltage,
            Channel::RunTime => &mut self.run_time,
            Channel::AmbientTemp => &mut self.ambient_temp,
            Channel::CoolantTemp => &mut self.coolant_temp,
        };
        if let Some(v) = reading.magnitude() {
            *slot = Some(v);
        }
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
