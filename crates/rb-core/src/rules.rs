//! Block rule parsing and matching.
//!
//! A rule is one line of user input and its kind is determined by prefix:
//! `contains:<substring>`, `regex:<pattern>`, or a plain hostname (optionally
//! `*.`-prefixed). The active rule set is an ordered list; evaluation is a
//! linear scan and the first matching rule wins.

use log::debug;
use regex::Regex;

use crate::url::{normalize_for_match, normalize_host};
use crate::validate::validate_regex_pattern;

pub const CONTAINS_PREFIX: &str = "contains:";
pub const REGEX_PREFIX: &str = "regex:";

/// Normalize one raw rule line.
pub fn parse_rule_line(line: &str) -> &str {
    line.trim()
}

/// Split rule text into an ordered rule list, dropping blank lines.
/// Order is significant: matching is first-match-wins.
pub fn parse_rules_from_text(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Inverse of [`parse_rules_from_text`], used by rule-editing surfaces.
pub fn rules_to_text(rules: &[String]) -> String {
    rules.join("\n")
}

/// Append a rule unless an identical one is already present.
/// Returns whether the list changed.
pub fn add_rule(rules: &mut Vec<String>, rule: &str) -> bool {
    if rules.iter().any(|existing| existing == rule) {
        return false;
    }
    rules.push(rule.to_string());
    true
}

/// Exact host match, or subdomain match at a dot boundary. A bare host rule
/// never matches as a substring.
fn host_matches(host: &str, rule_host: &str) -> bool {
    if host == rule_host {
        return true;
    }
    host.len() > rule_host.len()
        && host.ends_with(rule_host)
        && host.as_bytes()[host.len() - rule_host.len() - 1] == b'.'
}

fn rule_matches_url(normalized: Option<&str>, host: Option<&str>, rule: &str) -> bool {
    let normalized = match normalized {
        Some(url) => url,
        None => return false,
    };

    if let Some(needle) = rule.strip_prefix(CONTAINS_PREFIX) {
        if needle.is_empty() {
            return false;
        }
        return normalized.contains(needle);
    }

    if let Some(pattern) = rule.strip_prefix(REGEX_PREFIX) {
        if validate_regex_pattern(pattern).is_err() {
            return false;
        }
        return Regex::new(pattern)
            .map(|regex| regex.is_match(normalized))
            .unwrap_or(false);
    }

    let rule_host = rule.strip_prefix("*.").unwrap_or(rule);
    if rule_host.is_empty() {
        return false;
    }
    match host {
        Some(host) => host_matches(host, rule_host),
        None => false,
    }
}

/// Evaluate a raw URL against the rule list.
///
/// Returns the first rule (in list order) that matches the normalized URL,
/// or `None`. Empty input never matches; URLs whose host cannot be derived
/// are still checked against substring and regex rules.
pub fn should_block<'r>(raw_url: &str, rules: &'r [String]) -> Option<&'r str> {
    if raw_url.is_empty() {
        return None;
    }

    let normalized = normalize_for_match(raw_url);
    let host = normalize_host(raw_url);

    for raw_rule in rules {
        let rule = parse_rule_line(raw_rule);
        if rule.is_empty() {
            continue;
        }
        if rule_matches_url(normalized.as_deref(), host.as_deref(), rule) {
            debug!("rule {rule:?} matched {raw_url:?}");
            return Some(rule);
        }
    }

    None
}
