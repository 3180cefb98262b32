//! CLI Output Formatting Module
//! Provides consistent, colorized output for terminal UX

use colored::Colorize;

use crate::engine::events::UpdateEvent;
use crate::engine::updater::UpdateCompletionStatus;

pub struct CliFormatter;

impl CliFormatter {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".green().bold(), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow().bold(), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        println!("{} {}", "ℹ".blue().bold(), message);
    }

    /// Print a section header
    pub fn header(title: &str) {
        println!("\n{}", title.bright_cyan().bold());
        println!("{}", "─".repeat(title.chars().count()).bright_black());
    }

    /// Print a key-value pair
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", key.bright_white().bold(), value);
    }

    /// Print a list item
    pub fn item(text: &str) {
        println!("  {} {}", "•".bright_black(), text);
    }

    /// Print a download progress bar
    pub fn progress(current: usize, total: usize, message: &str) {
        let percentage = if total == 0 {
            100
        } else {
            (current as f32 / total as f32 * 100.0) as u32
        };
        let filled = (percentage / 5) as usize;
        println!(
            "  {} [{}/{}] [{}{}] {}% {}",
            "▶".bright_blue(),
            current.to_string().bright_white().bold(),
            total,
            "█".repeat(filled).bright_green(),
            "░".repeat(20 - filled.min(20)).bright_black(),
            percentage,
            message
        );
    }

    /// Print one update event
    pub fn event(event: &UpdateEvent) {
        match event {
            UpdateEvent::StateChanged { state } => Self::item(&format!("state → {:?}", state)),
            UpdateEvent::HotfixProgress {
                files_downloaded,
                total_files,
                bytes_downloaded,
                total_bytes,
            } => Self::progress(
                *files_downloaded,
                *total_files,
                &format!("{} / {} bytes", bytes_downloaded, total_bytes),
            ),
            UpdateEvent::HotfixFileProcessed {
                friendly_name,
                cache_name,
            } => Self::kv(friendly_name, cache_name),
            UpdateEvent::HotfixComplete { result } => Self::info(&format!("hotfix finished: {:?}", result)),
            UpdateEvent::CheckComplete { status } => Self::status(*status),
        }
    }

    /// Print a completion status with a color matching its outcome
    pub fn status(status: UpdateCompletionStatus) {
        let text = format!("update check complete: {:?}", status);
        match status {
            UpdateCompletionStatus::Success
            | UpdateCompletionStatus::SuccessNoChange
            | UpdateCompletionStatus::SuccessNeedsReload
            | UpdateCompletionStatus::SuccessNeedsRelaunch => Self::success(&text),
            UpdateCompletionStatus::SuccessNeedsPatch | UpdateCompletionStatus::Unknown => Self::warning(&text),
            UpdateCompletionStatus::FailurePatchCheck
            | UpdateCompletionStatus::FailureHotfixCheck
            | UpdateCompletionStatus::FailureNotLoggedIn => Self::error(&text),
        }
    }
}
