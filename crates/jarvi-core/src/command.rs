//! Free-text command parsing.
//!
//! Input is decided once into a [`Command`]; dispatch never looks at the raw
//! string again.

use crate::code_runner::Language;

/// Whole-input replies that need no bridge call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Canned {
    Hola,
    HolaJarvi,
    Status,
    Help,
}

impl Canned {
    fn parse(input: &str) -> Option<Self> {
        match input.to_uppercase().as_str() {
            "HOLA" => Some(Canned::Hola),
            "HOLA JARVI" => Some(Canned::HolaJarvi),
            "STATUS" => Some(Canned::Status),
            "HELP" => Some(Canned::Help),
            _ => None,
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            Canned::Hola => "Hola, Comandante. Sistema JARVI con bridge a Claude activo.",
            Canned::HolaJarvi => "Hola. Sistema de control remoto listo. Use AUTH para autenticarse.",
            Canned::Status => "Sistema operativo. Bridge con Claude: ACTIVO. Modo: Control Remoto.",
            Canned::Help => HELP_TEXT,
        }
    }
}

pub const HELP_TEXT: &str = "Comandos disponibles:
  - AUTH [contraseña] - Autenticarse en el sistema
  - CLAUDE [comando] - Enviar comando a Claude
  - EXEC [comando] - Ejecutar comando del sistema
  - CODE [python|javascript] [código] - Ejecutar código
  - HISTORY - Ver historial
  - CLEAR - Limpiar historial
  - @[mensaje] - Mensaje directo para Claude";

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Canned(Canned),
    Auth(String),
    Claude { action: String, params: String },
    Exec(String),
    Code { language: Language, source: String },
    History,
    Clear,
    /// `@message`: text for Claude, relayed back to the user.
    Direct(String),
    Unknown(String),
}

impl Command {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();

        if let Some(canned) = Canned::parse(input) {
            return Command::Canned(canned);
        }

        let (head, args) = match input.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (input, ""),
        };

        match head.to_uppercase().as_str() {
            "AUTH" => Command::Auth(args.to_string()),
            "CLAUDE" => {
                let (action, params) = match args.split_once(char::is_whitespace) {
                    Some((action, params)) => (action, params.trim()),
                    None => (args, ""),
                };
                Command::Claude {
                    action: action.to_string(),
                    params: params.to_string(),
                }
            }
            "EXEC" => Command::Exec(args.to_string()),
            "CODE" => {
                let (language, source) = Language::split_leading(args);
                Command::Code {
                    language,
                    source: source.to_string(),
                }
            }
            "HISTORY" => Command::History,
            "CLEAR" => Command::Clear,
            _ => match input.strip_prefix('@') {
                Some(message) => Command::Direct(message.trim().to_string()),
                None => Command::Unknown(input.to_string()),
            },
        }
    }

    /// Commands that touch the bridge's execution surface.
    pub fn requires_auth(&self) -> bool {
        matches!(self, Command::Claude { .. } | Command::Exec(_) | Command::Code { .. })
    }

    /// Command text safe to echo to other clients and logs.
    pub fn redacted(&self, raw: &str) -> String {
        match self {
            Command::Auth(_) => "AUTH ********".to_string(),
            _ => raw.trim().to_string(),
        }
    }
}
