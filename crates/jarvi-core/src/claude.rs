//! `CLAUDE_*` sub-commands.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Catalogue of Claude sub-commands and their descriptions.
pub const CLAUDE_COMMANDS: &[(&str, &str)] = &[
    ("CLAUDE_STATUS", "Verificar estado de Claude"),
    ("CLAUDE_HELP", "Mostrar ayuda de comandos"),
    ("CLAUDE_EXECUTE", "Ejecutar comando en Claude"),
    ("CLAUDE_CODE", "Escribir código"),
    ("CLAUDE_ANALYZE", "Analizar código"),
    ("CLAUDE_EXPLAIN", "Explicar algo"),
];

/// A Claude sub-command, matched case-insensitively with or without the `CLAUDE_` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaudeCommand {
    Status,
    Help,
    Execute,
    Analyze,
    /// Everything else is forwarded as-is (normalized to `CLAUDE_<NAME>`).
    Forward(String),
}

impl ClaudeCommand {
    pub fn parse(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase();
        let name = upper.strip_prefix("CLAUDE_").unwrap_or(upper.as_str());
        match name {
            "" | "STATUS" => ClaudeCommand::Status,
            "HELP" => ClaudeCommand::Help,
            "EXECUTE" => ClaudeCommand::Execute,
            "ANALYZE" => ClaudeCommand::Analyze,
            other => ClaudeCommand::Forward(format!("CLAUDE_{}", other)),
        }
    }
}

/// Reply to a Claude sub-command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeReply {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_command: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub params: String,
}

impl ClaudeReply {
    fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
            action: None,
            original_command: None,
            params: String::new(),
        }
    }

    pub fn status() -> Self {
        let capabilities: Vec<&str> = CLAUDE_COMMANDS.iter().map(|(name, _)| *name).collect();
        Self {
            data: Some(json!({
                "status": "online",
                "mode": "interactive",
                "capabilities": capabilities,
            })),
            ..Self::message("🤖 Claude está activo y listo para recibir comandos")
        }
    }

    pub fn help() -> Self {
        let catalogue: serde_json::Map<String, Value> = CLAUDE_COMMANDS
            .iter()
            .map(|(name, desc)| (name.to_string(), Value::String(desc.to_string())))
            .collect();
        Self {
            data: Some(Value::Object(catalogue)),
            ..Self::message("📚 Comandos disponibles para Claude:")
        }
    }

    pub fn analyze(params: &str) -> Self {
        Self {
            action: Some("analyze".to_string()),
            params: params.to_string(),
            ..Self::message("🔍 Análisis solicitado. Claude procesará tu solicitud.")
        }
    }

    pub fn forward(name: &str, original: &str, params: &str) -> Self {
        Self {
            action: Some("forward_to_claude".to_string()),
            original_command: Some(original.to_string()),
            params: params.to_string(),
            ..Self::message(format!("🤖 Comando Claude: {}", name))
        }
    }

    pub fn executed(output: String, language: &str) -> Self {
        Self {
            data: Some(json!({ "output": output, "language": language })),
            action: Some("execute".to_string()),
            ..Self::message("✅ Código ejecutado")
        }
    }

    /// Message followed by the pretty-printed data, if any.
    pub fn render(&self) -> String {
        match &self.data {
            Some(Value::String(s)) => format!("{}\n\n{}", self.message, s),
            Some(data) => format!(
                "{}\n\n{}",
                self.message,
                serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string())
            ),
            None => self.message.clone(),
        }
    }
}
