//! Doctor command - verify system requirements and configuration.

use crate::cli::{preflight, Output};
use crate::config::secrets::{Secret, ASSEMBLYAI_API_KEY};
use crate::config::Settings;
use console::style;
use std::path::Path;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Skriv Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    // External tools
    println!("{}", style("External Tools").bold());
    let tools = preflight::required_tools(settings);
    if tools.is_empty() {
        println!("  {} none needed for the configured providers", style("-").dim());
    }
    for tool in tools {
        let hint = match tool {
            "ffmpeg" => install_hint_ffmpeg(),
            _ => install_hint_ytdlp(),
        };
        let check = check_tool(tool, hint);
        check.print();
        checks.push(check);
    }

    println!();

    // Secrets
    println!("{}", style("API Configuration").bold());
    for secret in preflight::required_secrets(settings) {
        let optional = settings.summarizer.fallback_enabled && secret != ASSEMBLYAI_API_KEY;
        let check = check_secret(&secret, secret.lookup(), optional);
        check.print();
        checks.push(check);
    }
    if settings.server.tokens.is_empty() {
        let check = CheckResult::warning(
            "API tokens",
            "none configured",
            "Add token = \"user-id\" pairs under [server.tokens] to accept requests",
        );
        check.print();
        checks.push(check);
    } else {
        let check = CheckResult::ok(
            "API tokens",
            &format!("{} configured", settings.server.tokens.len()),
        );
        check.print();
        checks.push(check);
    }

    println!();

    // Directories
    println!("{}", style("Directories").bold());
    let dir_checks = check_directories(settings);
    for check in &dir_checks {
        check.print();
    }
    checks.extend(dir_checks);

    println!();

    // Configuration
    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(config_path);
    config_check.print();
    checks.push(config_check);

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Skriv.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!(
            "All checks passed with {} warning(s).",
            warnings
        ));
    } else {
        Output::success("All checks passed! Skriv is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str, hint: &str) -> CheckResult {
    let version_arg = if name == "ffmpeg" { "-version" } else { "--version" };

    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();

            // Truncate long version strings
            let version_display = if version.chars().count() > 50 {
                format!("{}...", version.chars().take(50).collect::<String>())
            } else {
                version
            };

            CheckResult::ok(name, &version_display)
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error(name, "not found", hint)
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

/// Check a secret; `optional` secrets only warn when absent.
fn check_secret(secret: &Secret, value: Option<String>, optional: bool) -> CheckResult {
    let hint = format!("Set one of: {}", secret.candidates.join(", "));
    match value {
        Some(value) => CheckResult::ok(secret.name, &format!("configured ({})", mask(&value))),
        None if optional => CheckResult::warning(
            secret.name,
            "not set (the local fallback will be used)",
            &hint,
        ),
        None => CheckResult::error(secret.name, "not set", &hint),
    }
}

/// Mask all but the edges of a secret.
fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check data directories.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let data_dir = settings.data_dir();
    if data_dir.exists() {
        results.push(CheckResult::ok(
            "Data directory",
            &format!("{}", data_dir.display()),
        ));
    } else {
        results.push(CheckResult::warning(
            "Data directory",
            &format!("{} (will be created)", data_dir.display()),
            "Directory will be created on first use",
        ));
    }

    let scratch_dir = settings.scratch_dir();
    if scratch_dir.exists() {
        results.push(CheckResult::ok(
            "Scratch directory",
            &format!("{}", scratch_dir.display()),
        ));
    } else {
        results.push(CheckResult::warning(
            "Scratch directory",
            &format!("{} (will be created)", scratch_dir.display()),
            "Directory will be created on first download",
        ));
    }

    let db_path = settings.sqlite_path();
    if db_path.exists() {
        let size = std::fs::metadata(&db_path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "unknown size".to_string());
        results.push(CheckResult::ok(
            "Database",
            &format!("{} ({})", db_path.display(), size),
        ));
    } else {
        results.push(CheckResult::warning(
            "Database",
            &format!("{} (not created yet)", db_path.display()),
            "Database will be created on first use",
        ));
    }

    results
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: skriv config init",
        )
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

/// Platform-specific install hint for ffmpeg.
fn install_hint_ffmpeg() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (or your package manager)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_secret_checks() {
        let ok = check_secret(&ASSEMBLYAI_API_KEY, Some("abcd1234efgh5678".into()), false);
        assert_eq!(ok.status, CheckStatus::Ok);
        assert!(ok.message.contains("abcd...5678"));

        let missing = check_secret(&ASSEMBLYAI_API_KEY, None, false);
        assert_eq!(missing.status, CheckStatus::Error);
        assert!(missing.hint.unwrap().contains("ASSEMBLY_KEY"));

        let optional = check_secret(&crate::config::secrets::HUGGINGFACE_TOKEN, None, true);
        assert_eq!(optional.status, CheckStatus::Warning);
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("short"), "*****");
        assert_eq!(mask("hf_abcdefghijkl"), "hf_a...ijkl");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.0 GB");
    }
}
