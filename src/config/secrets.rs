//! Secrets sourced from the process environment.
//!
//! Each secret has an ordered list of recognized variable names; the first
//! one that is set to a non-empty value wins.

use crate::error::SkrivError;
use tracing::error;

/// A secret and the environment variables it may be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Secret {
    /// Human-readable name used in messages.
    pub name: &'static str,
    /// Candidate variable names, in priority order.
    pub candidates: &'static [&'static str],
}

pub const ASSEMBLYAI_API_KEY: Secret = Secret {
    name: "AssemblyAI API key",
    candidates: &["ASSEMBLY_KEY", "ASSEMBLYAI_API_KEY"],
};

pub const HUGGINGFACE_TOKEN: Secret = Secret {
    name: "Hugging Face token",
    candidates: &["HUGGINGFACEHUB_API_TOKEN", "HUGGINGFACE_TOKEN"],
};

pub const OPENAI_API_KEY: Secret = Secret {
    name: "OpenAI API key",
    candidates: &["OPENAI_API_KEY"],
};

impl Secret {
    /// Read the secret from the process environment.
    pub fn lookup(&self) -> Option<String> {
        self.lookup_with(|key| std::env::var(key).ok())
    }

    /// Read the secret through an arbitrary variable source.
    pub fn lookup_with<F>(&self, mut source: F) -> Option<String>
    where
        F: FnMut(&str) -> Option<String>,
    {
        self.candidates
            .iter()
            .filter_map(|key| source(key))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
    }

    /// The configuration error for this secret being absent.
    ///
    /// Logged at error level every time it is produced.
    pub fn missing(&self) -> SkrivError {
        let candidates = self.candidates.join(", ");
        error!(secret = self.name, "Configuration error: no value found in {}", candidates);
        SkrivError::MissingSecret {
            name: self.name.to_string(),
            candidates,
        }
    }

    /// Read the secret, failing with a configuration error when absent.
    pub fn require(&self) -> crate::error::Result<String> {
        self.lookup().ok_or_else(|| self.missing())
    }
}
