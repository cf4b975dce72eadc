//! CLI module for Skriv.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::config::{AcquisitionStrategy, HostedProvider, Settings, TitleProvider};
use clap::{Args, Parser, Subcommand};

/// Skriv - video to article
///
/// Turns a video link into a written article: title lookup, transcription,
/// and summarization by a language model, stored per user.
#[derive(Parser, Debug)]
#[command(name = "skriv")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate an article from a video link
    Generate {
        /// Video URL
        link: String,

        /// User the article is saved for
        #[arg(short, long)]
        user: String,

        #[command(flatten)]
        overrides: ProviderOverrides,
    },

    /// List a user's articles
    List {
        /// Owner of the articles
        #[arg(short, long)]
        user: String,
    },

    /// Print one article
    Show {
        /// Article ID
        id: String,

        /// Owner of the article
        #[arg(short, long)]
        user: String,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Per-run replacements for the configured providers.
#[derive(Args, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderOverrides {
    /// Transcript acquisition (download, direct_url)
    #[arg(long)]
    pub strategy: Option<AcquisitionStrategy>,

    /// Title lookup (yt-dlp, oembed)
    #[arg(long)]
    pub title_provider: Option<TitleProvider>,

    /// Hosted summarization model (huggingface, openai)
    #[arg(long)]
    pub hosted_provider: Option<HostedProvider>,
}

impl ProviderOverrides {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(strategy) = self.strategy {
            settings.transcription.strategy = strategy;
        }
        if let Some(provider) = self.title_provider {
            settings.title.provider = provider;
        }
        if let Some(provider) = self.hosted_provider {
            settings.summarizer.provider = provider;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate() {
        let cli = Cli::parse_from(["skriv", "-vv", "generate", "https://example.com/v/abc", "--user", "alice"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Generate { link, user, overrides } => {
                assert_eq!(link, "https://example.com/v/abc");
                assert_eq!(user, "alice");
                assert_eq!(overrides, ProviderOverrides::default());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_generate_overrides_replace_settings() {
        let cli = Cli::parse_from([
            "skriv",
            "generate",
            "https://example.com/v/abc",
            "--user",
            "alice",
            "--strategy",
            "direct-url",
            "--title-provider",
            "OEmbed",
            "--hosted-provider",
            "hf",
        ]);
        let Commands::Generate { overrides, .. } = cli.command else {
            panic!("expected generate");
        };

        let mut settings = Settings::default();
        settings.summarizer.provider = HostedProvider::OpenAI;
        overrides.apply(&mut settings);

        assert_eq!(settings.transcription.strategy, AcquisitionStrategy::DirectUrl);
        assert_eq!(settings.title.provider, TitleProvider::OEmbed);
        assert_eq!(settings.summarizer.provider, HostedProvider::HuggingFace);
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let result = Cli::try_parse_from([
            "skriv",
            "generate",
            "https://example.com/v/abc",
            "--user",
            "alice",
            "--hosted-provider",
            "whisper",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_config_init() {
        let cli = Cli::parse_from(["skriv", "--config", "/tmp/skriv.toml", "config", "init", "--force"]);
        assert_eq!(cli.config.as_deref(), Some("/tmp/skriv.toml"));
        assert!(matches!(
            cli.command,
            Commands::Config { action: ConfigAction::Init { force: true } }
        ));
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
