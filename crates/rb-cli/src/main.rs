//! ResultBlocker CLI
//!
//! Checks URLs against rule files, scans saved result pages, and lints
//! rule files the way the options surface does.

use std::fs;

use clap::{Parser, Subcommand};
use serde::Serialize;

use rb_core::rules::{add_rule, parse_rules_from_text, rules_to_text, should_block, REGEX_PREFIX};
use rb_core::settings::{DisplayMode, Settings};
use rb_core::validate::validate_regex_pattern;
use rb_page::Page;

#[derive(Parser)]
#[command(name = "rb-cli")]
#[command(about = "ResultBlocker rule matching and page scanning tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check URLs against a rule file
    Check {
        /// Rule file, one rule per line
        #[arg(short, long)]
        rules: String,

        /// URLs to evaluate
        #[arg(required = true)]
        urls: Vec<String>,

        /// Emit JSON instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// Scan a saved results page and report blocked containers
    Scan {
        /// Rule file, one rule per line
        #[arg(short, long)]
        rules: String,

        /// Saved HTML page to scan
        #[arg(short, long)]
        page: String,

        /// Page URL, used for the active-domain query
        #[arg(long, default_value = "https://www.google.com/search")]
        url: String,

        /// Evaluate every link inside a container, not just the primary one
        #[arg(long)]
        strict: bool,

        /// Display policy: hide or blur
        #[arg(long, default_value = "hide")]
        mode: String,

        /// Emit JSON instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// Validate a rule file and report regex issues
    Lint {
        /// Rule file, one rule per line
        #[arg(short, long)]
        rules: String,
    },

    /// Append a rule to a rule file unless it is already present
    Add {
        /// Rule file, one rule per line
        #[arg(short, long)]
        rules: String,

        /// Rule to append (host, wildcard host, contains:, or regex:)
        rule: String,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { rules, urls, json } => cmd_check(&rules, &urls, json),
        Commands::Scan {
            rules,
            page,
            url,
            strict,
            mode,
            json,
        } => cmd_scan(&rules, &page, &url, strict, &mode, json),
        Commands::Lint { rules } => cmd_lint(&rules),
        Commands::Add { rules, rule } => cmd_add(&rules, &rule),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_rules(path: &str) -> Result<Vec<String>, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    Ok(parse_rules_from_text(&text))
}

fn parse_display_mode(mode: &str) -> Result<DisplayMode, String> {
    match mode {
        "hide" => Ok(DisplayMode::Hide),
        "blur" => Ok(DisplayMode::Blur),
        other => Err(format!("Unknown display mode '{}', expected hide or blur", other)),
    }
}

#[derive(Serialize)]
struct CheckOutcome<'a> {
    url: &'a str,
    blocked: bool,
    rule: Option<&'a str>,
}

fn cmd_check(rules_path: &str, urls: &[String], json: bool) -> Result<(), String> {
    let rules = load_rules(rules_path)?;

    let outcomes: Vec<CheckOutcome<'_>> = urls
        .iter()
        .map(|url| {
            let rule = should_block(url, &rules);
            CheckOutcome {
                url,
                blocked: rule.is_some(),
                rule,
            }
        })
        .collect();

    if json {
        let text = serde_json::to_string_pretty(&outcomes).map_err(|e| e.to_string())?;
        println!("{text}");
        return Ok(());
    }

    for outcome in &outcomes {
        match outcome.rule {
            Some(rule) => println!("{}  blocked by {}", outcome.url, rule),
            None => println!("{}  -", outcome.url),
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct ScanReport {
    domain: String,
    blocked: usize,
    results: Vec<rb_page::BlockedResult>,
}

fn cmd_scan(
    rules_path: &str,
    page_path: &str,
    page_url: &str,
    strict: bool,
    mode: &str,
    json: bool,
) -> Result<(), String> {
    let rules = load_rules(rules_path)?;
    let document = fs::read_to_string(page_path)
        .map_err(|e| format!("Failed to read '{}': {}", page_path, e))?;

    let settings = Settings {
        strict_mode: strict,
        display_mode: parse_display_mode(mode)?,
        ..Settings::default()
    };

    let mut page = Page::new(&document, page_url, settings, rules);
    page.scan();

    let report = ScanReport {
        domain: rb_core::url::domain_of(page_url),
        blocked: page.blocked_count(),
        results: page.blocked_results(),
    };

    if json {
        let text = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
        println!("{text}");
        return Ok(());
    }

    println!("Scanned '{}'", page_path);
    println!("  Domain:   {}", report.domain);
    println!("  Blocked:  {} result(s)", report.blocked);
    for result in &report.results {
        let title = if result.title.is_empty() {
            "(untitled)"
        } else {
            result.title.as_str()
        };
        println!("    {}  [{}]", title, result.rule);
    }
    Ok(())
}

fn cmd_lint(rules_path: &str) -> Result<(), String> {
    let text = fs::read_to_string(rules_path)
        .map_err(|e| format!("Failed to read '{}': {}", rules_path, e))?;

    let mut rule_count = 0usize;
    let mut issue_count = 0usize;

    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        rule_count += 1;

        if let Some(pattern) = trimmed.strip_prefix(REGEX_PREFIX) {
            if let Err(issue) = validate_regex_pattern(pattern) {
                issue_count += 1;
                println!("Line {}: {}", index + 1, issue);
            }
        }
    }

    if issue_count > 0 {
        return Err(format!("{} invalid rule(s) out of {}", issue_count, rule_count));
    }

    println!("No issues found in {} rule(s)", rule_count);
    Ok(())
}

fn cmd_add(rules_path: &str, rule: &str) -> Result<(), String> {
    let rule = rule.trim();
    if rule.is_empty() {
        return Err("Rule is empty".to_string());
    }

    // A missing file starts an empty list, matching a fresh install.
    let text = fs::read_to_string(rules_path).unwrap_or_default();
    let mut rules = parse_rules_from_text(&text);

    if !add_rule(&mut rules, rule) {
        println!("Rule '{}' is already present", rule);
        return Ok(());
    }

    let mut output = rules_to_text(&rules);
    output.push('\n');
    fs::write(rules_path, output).map_err(|e| format!("Failed to write '{}': {}", rules_path, e))?;

    println!("Added rule '{}' ({} total)", rule, rules.len());
    Ok(())
}
