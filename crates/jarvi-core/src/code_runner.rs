//! Ad hoc code execution through an interpreter.
//!
//! Source is written to a uniquely named temp file inside the working
//! directory, run, and the file is removed on every path out.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::BridgeResult;
use crate::executor::ProcessRunner;

/// Languages the runner can execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    JavaScript,
    Python,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::Python => "python",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Language::JavaScript => ".js",
            Language::Python => ".py",
        }
    }

    /// Split an optional leading language token off `input`.
    /// `"python print(1)"` → `(Python, "print(1)")`; anything else is JavaScript.
    pub fn split_leading(input: &str) -> (Language, &str) {
        let trimmed = input.trim_start();
        let (first, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((first, rest)) => (first, rest.trim_start()),
            None => (trimmed, ""),
        };
        match first.parse::<Language>() {
            Ok(lang) => (lang, rest),
            Err(_) => (Language::JavaScript, trimmed),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "javascript" | "js" | "node" => Ok(Language::JavaScript),
            "python" | "py" | "python3" => Ok(Language::Python),
            other => Err(format!("unsupported language: {}", other)),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of a code run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeOutput {
    pub output: String,
    pub language: Language,
}

/// Writes code to a temp file and runs it with the configured interpreter.
#[derive(Debug, Clone)]
pub struct CodeRunner {
    runner: ProcessRunner,
    node_binary: String,
    python_binary: String,
}

impl CodeRunner {
    pub fn new(runner: ProcessRunner, node_binary: impl Into<String>, python_binary: impl Into<String>) -> Self {
        Self {
            runner,
            node_binary: node_binary.into(),
            python_binary: python_binary.into(),
        }
    }

    fn interpreter(&self, language: Language) -> &str {
        match language {
            Language::JavaScript => &self.node_binary,
            Language::Python => &self.python_binary,
        }
    }

    pub async fn run(&self, code: &str, language: Language) -> BridgeResult<CodeOutput> {
        let temp = tempfile::Builder::new()
            .prefix("temp_")
            .suffix(language.extension())
            .tempfile_in(self.runner.working_dir())?;
        let path = temp.path().to_path_buf();

        let result = match tokio::fs::write(&path, code).await {
            Ok(()) => {
                let interpreter = self.interpreter(language);
                let display = format!("{} {}", interpreter, path.display());
                self.runner
                    .run_program(interpreter, &[path.as_os_str()], &display)
                    .await
            }
            Err(e) => Err(e.into()),
        };

        if let Err(e) = temp.close() {
            warn!(path = %path.display(), error = %e, "Failed to remove temp code file");
        }

        result.map(|out| CodeOutput {
            output: out.output,
            language,
        })
    }
}
