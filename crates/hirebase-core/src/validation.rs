//! Onboarding input validation
//!
//! Helpers for the values a company chooses (or is assigned) at registration:
//! - Subdomain sanitization and collision suffixes
//! - Tenant database naming
//! - Admin password and email checks

use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;
use uuid::Uuid;

use crate::constants::{
    MAX_DATABASE_NAME_LENGTH, MAX_SUBDOMAIN_LENGTH, MIN_SUBDOMAIN_LENGTH, RESERVED_SUBDOMAINS,
    SUBDOMAIN_SUFFIX_LENGTH, TENANT_DATABASE_PREFIX,
};
use crate::error::AppError;

static SUBDOMAIN_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9](?:[a-z0-9-]*[a-z0-9])?$").ok());

const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Sanitize a requested (or name-derived) subdomain.
///
/// Lowercases, maps whitespace and underscores to hyphens, drops every other character
/// outside `[a-z0-9-]`, collapses hyphen runs and trims leading/trailing hyphens.
/// Fails when fewer than three characters remain or the label is reserved.
pub fn sanitize_subdomain(input: &str) -> Result<String, AppError> {
    let mut out = String::with_capacity(input.len());
    for c in input.trim().to_lowercase().chars() {
        let mapped = match c {
            'a'..='z' | '0'..='9' => Some(c),
            '-' | '_' | ' ' | '\t' | '.' => Some('-'),
            _ => None,
        };
        if let Some(m) = mapped {
            if m == '-' && out.ends_with('-') {
                continue;
            }
            out.push(m);
        }
    }

    let mut sanitized = out.trim_matches('-').to_string();
    if sanitized.len() > MAX_SUBDOMAIN_LENGTH {
        sanitized.truncate(MAX_SUBDOMAIN_LENGTH);
        sanitized = sanitized.trim_end_matches('-').to_string();
    }

    if sanitized.len() < MIN_SUBDOMAIN_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "Subdomain must contain at least {} letters or digits",
            MIN_SUBDOMAIN_LENGTH
        )));
    }

    if is_reserved_subdomain(&sanitized) {
        return Err(AppError::InvalidInput(format!(
            "Subdomain '{}' is reserved",
            sanitized
        )));
    }

    Ok(sanitized)
}

/// Whether a host label can never name a tenant.
pub fn is_reserved_subdomain(label: &str) -> bool {
    RESERVED_SUBDOMAINS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(label))
}

/// Whether a label is a syntactically valid tenant subdomain.
pub fn is_valid_subdomain(label: &str) -> bool {
    label.len() >= MIN_SUBDOMAIN_LENGTH
        && label.len() <= MAX_SUBDOMAIN_LENGTH
        && SUBDOMAIN_PATTERN
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(label))
}

/// Random lowercase alphanumeric token used to disambiguate colliding subdomains.
pub fn random_suffix() -> String {
    let mut rng = rand::rng();
    (0..SUBDOMAIN_SUFFIX_LENGTH)
        .map(|_| SUFFIX_CHARSET[rng.random_range(0..SUFFIX_CHARSET.len())] as char)
        .collect()
}

/// Append `-suffix` to a base subdomain, shortening the base to stay within a DNS label.
pub fn with_suffix(base: &str, suffix: &str) -> String {
    let max_base = MAX_SUBDOMAIN_LENGTH.saturating_sub(suffix.len() + 1);
    let trimmed = if base.len() > max_base {
        base[..max_base].trim_end_matches('-')
    } else {
        base
    };
    format!("{}-{}", trimmed, suffix)
}

/// Physical database name for a company: `tenant_<uuid without hyphens>`.
pub fn tenant_database_name(company_id: Uuid) -> String {
    let raw = format!("{}{}", TENANT_DATABASE_PREFIX, company_id.simple());
    let mut name: String = raw
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect();
    name.truncate(MAX_DATABASE_NAME_LENGTH);
    name
}

/// Whether a name is safe to splice into `CREATE DATABASE` / `DROP DATABASE`.
pub fn is_safe_database_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_DATABASE_NAME_LENGTH
        && name.starts_with(TENANT_DATABASE_PREFIX)
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Enforce the minimum administrator password length.
pub fn validate_password(password: &str, min_length: usize) -> Result<(), AppError> {
    if password.chars().count() < min_length {
        return Err(AppError::InvalidInput(format!(
            "Password must be at least {} characters long",
            min_length
        )));
    }
    Ok(())
}

/// Emails are compared case-insensitively everywhere.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
