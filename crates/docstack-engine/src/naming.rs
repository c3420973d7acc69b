//! Generated resource names
//!
//! Globally-unique resource types get deterministic-scheme names:
//! `{org}{env}{type tag}{random suffix}`. Per-type constraints differ:
//! storage accounts take at most 24 lowercase alphanumeric characters,
//! the others allow hyphens.

use docstack_config::Environment;
use uuid::Uuid;

const STORAGE_NAME_MAX: usize = 24;

/// Default resource group name; deterministic, no random suffix
pub fn resource_group_name(org_tag: &str, environment: Environment) -> String {
    format!("{}-{}-rg", org_tag, environment.code())
}

/// Storage account name: lowercase alphanumeric, at most 24 chars
pub fn storage_account_name(org_tag: &str, environment: Environment) -> String {
    let org = sanitize_alnum(org_tag);
    let base = format!("{}{}stor", org, environment.code());
    // leave room for the 8-char suffix
    let trimmed: String = base.chars().take(STORAGE_NAME_MAX - 8).collect();
    format!("{}{}", trimmed, hex_suffix(8))
}

/// Form Recognizer service name; hyphens allowed
pub fn form_recognizer_name(org_tag: &str, environment: Environment) -> String {
    format!(
        "{}-{}-formrec-{}",
        sanitize_alnum(org_tag),
        environment.code(),
        hex_suffix(4)
    )
}

/// AI Search service name; lowercase, hyphens allowed
pub fn search_service_name(org_tag: &str, environment: Environment) -> String {
    format!(
        "{}-{}-search-{}",
        sanitize_alnum(org_tag),
        environment.code(),
        hex_suffix(4)
    )
}

fn sanitize_alnum(tag: &str) -> String {
    tag.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

fn hex_suffix(len: usize) -> String {
    Uuid::new_v4().simple().to_string()[..len].to_string()
}
