//! Interpretador de comandos vindos do dashboard.
//!
//! Dois tipos de entrada: atualização de limites (`downlink/ds/Speed Limit`,
//! `downlink/ds/Fuel Alert Limit`) e texto livre do terminal.

use crate::ports::Publisher;
use crate::state::SharedState;
use crate::types::{
    ALERT_SOUND_CHANNEL, FUEL_LIMIT_DOWNLINK, SPEED_LIMIT_CHANNEL, SPEED_LIMIT_DOWNLINK,
    TERMINAL_CHANNEL, TERMINAL_DOWNLINK, Value,
};
use tracing::{info, warn};

/// Logo exibido no terminal do dashboard ao conectar.
pub const LOGO: &str = r"
 __   __   _    _     __  __          _ _
 \ \ / /__| |_ (_)__ |  \/  |___ _ _ (_) |_ ___ _ _
  \ V / -_) ' \| / _|| |\/| / _ \ ' \| |  _/ _ \ '_|
   \_/\___|_||_|_\__||_|  |_\___/_||_|_|\__\___/_|
";

/// Erros ao interpretar uma mensagem de entrada.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Valor inválido para {channel}: {payload:?}")]
    InvalidThreshold { channel: String, payload: String },

    #[error("Canal desconhecido: {0}")]
    UnknownChannel(String),
}

impl CommandError {
    /// Texto ecoado no terminal do dashboard.
    fn echo_text(&self) -> String {
        match self {
            Self::InvalidThreshold { channel, payload } => {
                let name = channel.rsplit('/').next().unwrap_or(channel);
                format!("Invalid value for {name}: {payload:?}")
            }
            Self::UnknownChannel(channel) => format!("Unknown channel: {channel}"),
        }
    }
}

/// Comando do terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCommand {
    /// `set N` – define o limite de velocidade
    Set(i64),
    /// `set` sem número válido
    SetUsage,
    /// `on` – liga o som de alerta
    On,
    /// `off` – silencia o som de alerta
    Off,
    /// `help` ou `?`
    Help,
    /// Qualquer outra coisa (inclusive payload vazio)
    Unknown(String),
}

/// Mensagem de entrada já interpretada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetSpeedLimit(i64),
    SetFuelLimit(i64),
    Terminal(TerminalCommand),
}

/// Interpreta `(canal, payload)`.
pub fn parse_message(channel: &str, payload: &str) -> Result<Command, CommandError> {
    match channel {
        SPEED_LIMIT_DOWNLINK => parse_limit(channel, payload).map(Command::SetSpeedLimit),
        FUEL_LIMIT_DOWNLINK => parse_limit(channel, payload).map(Command::SetFuelLimit),
        TERMINAL_DOWNLINK => Ok(Command::Terminal(parse_terminal(payload))),
        other => Err(CommandError::UnknownChannel(other.into())),
    }
}

fn parse_limit(channel: &str, payload: &str) -> Result<i64, CommandError> {
    match payload.trim().parse::<i64>() {
        Ok(v) if v >= 0 => Ok(v),
        _ => Err(CommandError::InvalidThreshold {
            channel: channel.into(),
            payload: payload.into(),
        }),
    }
}

/// Tokeniza por espaços e despacha pelo primeiro token.
pub fn parse_terminal(payload: &str) -> TerminalCommand {
    let mut tokens = payload.split_whitespace();
    let Some(first) = tokens.next() else {
        return TerminalCommand::Unknown(String::new());
    };

    match first {
        "set" => match tokens.next().map(str::parse::<i64>) {
            Some(Ok(n)) if n >= 0 => TerminalCommand::Set(n),
            _ => TerminalCommand::SetUsage,
        },
        "on" => TerminalCommand::On,
        "off" => TerminalCommand::Off,
        "help" | "?" => TerminalCommand::Help,
        other => TerminalCommand::Unknown(other.into()),
    }
}

/// Escreve uma linha no terminal do dashboard.
pub fn terminal_print<P: Publisher + ?Sized>(publisher: &P, text: &str) {
    publisher.publish(TERMINAL_CHANNEL, Value::Text(format!("{text}\n")));
}

/// Aplica um comando ao estado compartilhado.
pub fn execute<P: Publisher + ?Sized>(command: &Command, state: &SharedState, publisher: &P) {
    match command {
        Command::SetSpeedLimit(v) => {
            state.set_speed_limit(*v);
            info!("Limite de velocidade: {v} km/h");
        }
        Command::SetFuelLimit(v) => {
            state.set_fuel_limit(*v);
            info!("Limite de combustível: {v}%");
        }
        Command::Terminal(cmd) => run_terminal(cmd, state, publisher),
    }
}

fn run_terminal<P: Publisher + ?Sized>(cmd: &TerminalCommand, state: &SharedState, publisher: &P) {
    match cmd {
        TerminalCommand::Set(n) => {
            state.set_speed_limit(*n);
            publisher.publish(SPEED_LIMIT_CHANNEL, Value::Int(*n));
            terminal_print(publisher, &format!("Speed limit set to {n}"));
            info!("Limite de velocidade via terminal: {n} km/h");
        }
        TerminalCommand::SetUsage => terminal_print(publisher, "Usage: set N"),
        TerminalCommand::On => {
            state.set_sound_enabled(true);
            publisher.publish(ALERT_SOUND_CHANNEL, Value::Int(1));
            terminal_print(publisher, "Alert sound ON");
        }
        TerminalCommand::Off => {
            state.set_sound_enabled(false);
            publisher.publish(ALERT_SOUND_CHANNEL, Value::Int(0));
            terminal_print(publisher, "Alert sound OFF");
        }
        TerminalCommand::Help => {
            terminal_print(publisher, "Available commands:");
            terminal_print(publisher, "  set N    - set speed limit (0 disables)");
            terminal_print(publisher, "  on       - enable speed alert sound");
            terminal_print(publisher, "  off      - mute speed alert sound");
        }
        TerminalCommand::Unknown(tok) => {
            terminal_print(publisher, &format!("Unknown command: {tok}"));
        }
    }
}

/// Interpreta e aplica uma mensagem. Payload inválido não altera nada.
pub fn handle<P: Publisher + ?Sized>(
    channel: &str,
    payload: &str,
    state: &SharedState,
    publisher: &P,
) -> Result<(), CommandError> {
    match parse_message(channel, payload) {
        Ok(command) => {
            execute(&command, state, publisher);
            Ok(())
        }
        Err(e) => {
            warn!("Mensagem ignorada: {e}");
            terminal_print(publisher, &e.echo_text());
            Err(e)
        }
    }
}
