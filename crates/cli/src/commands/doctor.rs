//! Doctor command - validate configuration and show status

use anyhow::Result;
use feed_relay_adapters::ledger::SqliteLedger;
use feed_relay_adapters::shortener::KNOWN_SHORTENERS;
use feed_relay_domain::Ledger;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::args::DoctorArgs;
use crate::config::AppConfig;
use crate::registry::{DestinationRegistry, secret_env_var};

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    options: CheckResult,
    feeds: CheckResult,
    destinations: CheckResult,
    ledger: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        options: CheckResult::error("Not checked"),
        feeds: CheckResult::error("Not checked"),
        destinations: CheckResult::error("Not checked"),
        ledger: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.options = check_options(config);
        report.feeds = check_feeds(config);
        report.destinations = check_destinations(config);
        report.ledger = check_ledger(&config.general.ledger_path).await;
    }

    let checks = [
        &report.config,
        &report.options,
        &report.feeds,
        &report.destinations,
        &report.ledger,
    ];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

fn check_options(config: &AppConfig) -> CheckResult {
    if let Err(e) = config.validate() {
        return CheckResult::error(format!("{:#}", e));
    }

    let unknown: Vec<&str> = config
        .feeds
        .iter()
        .map(|f| &f.options)
        .chain(config.destinations.iter().map(|d| &d.options))
        .filter_map(|o| o.url_shortener.as_deref())
        .filter(|name| {
            let name = name.trim().to_lowercase();
            !name.is_empty() && name != "none" && !KNOWN_SHORTENERS.contains(&name.as_str())
        })
        .collect();

    if unknown.is_empty() {
        CheckResult::ok("Posting options are valid")
    } else {
        CheckResult::warn(format!(
            "Unknown URL shorteners, links will not be shortened: {}",
            unknown.join(", ")
        ))
    }
}

fn check_feeds(config: &AppConfig) -> CheckResult {
    if config.feeds.is_empty() {
        return CheckResult::warn("No feeds configured");
    }

    let missing: Vec<&str> = config
        .feeds
        .iter()
        .map(|f| f.url.as_str())
        .filter(|url| !url.starts_with("http://") && !url.starts_with("https://"))
        .filter(|path| !Path::new(path).is_file())
        .collect();

    let details = serde_json::json!({
        "feeds": config.feeds.iter().map(|f| f.display_name()).collect::<Vec<_>>()
    });

    if missing.is_empty() {
        CheckResult::ok(format!("{} feeds configured", config.feeds.len())).with_details(details)
    } else {
        CheckResult::warn(format!(
            "Neither a file nor an HTTP URL: {}",
            missing.join(", ")
        ))
        .with_details(details)
    }
}

fn check_destinations(config: &AppConfig) -> CheckResult {
    let enabled: Vec<_> = config.enabled_destinations().collect();
    if enabled.is_empty() {
        return CheckResult::error("No enabled destinations configured");
    }

    let registry = DestinationRegistry::default();
    if let Err(e) = registry.check_kinds(enabled.iter().copied()) {
        return CheckResult::error(format!("{:#}", e));
    }

    let mut unset = Vec::new();
    for destination in &enabled {
        if destination.kind.trim().eq_ignore_ascii_case("mastodon")
            && destination.instance_url.is_none()
        {
            return CheckResult::error(format!(
                "Destination {} has no instance_url",
                destination.name
            ));
        }

        if let Some(env_var) = secret_env_var(destination) {
            let set = std::env::var(env_var).is_ok_and(|v| !v.trim().is_empty());
            if !set {
                unset.push(format!("{} ({})", destination.name, env_var));
            }
        }
    }

    let details = serde_json::json!({
        "destinations": enabled
            .iter()
            .map(|d| serde_json::json!({ "name": d.name, "type": d.kind }))
            .collect::<Vec<_>>()
    });

    if unset.is_empty() {
        CheckResult::ok(format!("{} destinations enabled", enabled.len())).with_details(details)
    } else {
        CheckResult::warn(format!("Credentials not set: {}", unset.join(", ")))
            .with_details(details)
    }
}

async fn check_ledger(path: &Path) -> CheckResult {
    let ledger = match SqliteLedger::new(path).await {
        Ok(ledger) => ledger,
        Err(e) => return CheckResult::error(format!("Failed to open ledger: {}", e)),
    };

    match ledger.counts_by_destination().await {
        Ok(counts) => {
            let total: u64 = counts.iter().map(|(_, n)| n).sum();
            CheckResult::ok(format!("{}: {} records", path.display(), total))
        }
        Err(e) => CheckResult::error(format!("Failed to read ledger: {}", e)),
    }
}

fn print_report(report: &DoctorReport) {
    println!("feed-relay Doctor Report");
    println!("========================");
    println!();

    print_check("Config", &report.config);
    print_check("Options", &report.options);
    print_check("Feeds", &report.feeds);
    print_check("Destinations", &report.destinations);
    print_check("Ledger", &report.ledger);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall == "ok" {
        println!();
        println!("Ready to run! Try: feed-relay run --dry-run");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
