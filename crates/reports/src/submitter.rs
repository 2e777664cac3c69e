use serde::{Deserialize, Serialize};

use purchreq_forms::FormPayload;

/// The club member submitting the batch, as shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submitter {
    pub name: String,
    pub email: String,
    pub e_transfer_email: String,
    pub address: String,
    pub team: String,
}

impl Submitter {
    /// Read the profile fields posted alongside the invoice forms.
    pub fn from_payload(payload: &FormPayload) -> Self {
        let get = |name| payload.field(name).unwrap_or_default().trim().to_string();
        Self {
            name: get("name"),
            email: get("email"),
            e_transfer_email: get("e_transfer_email"),
            address: get("address"),
            team: get("team"),
        }
    }

    /// `Jamie de la Cruz` → `JamieDeLaCruz`.
    pub fn pascal_name(&self) -> String {
        let name: String = self
            .name
            .split_whitespace()
            .map(capitalize)
            .collect();
        if name.is_empty() {
            "UnknownUser".to_string()
        } else {
            name
        }
    }

    /// `Jamie Doe` → `jamie_doe`.
    ///
    /// Safe to use as a path segment: separators and `..` become `_` and
    /// leading dots are dropped.
    pub fn snake_name(&self) -> String {
        let name: String = self
            .name
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| match c {
                ' ' | '/' | '\\' | '\0' => '_',
                c => c,
            })
            .collect();
        let name = name.replace("..", "_");
        let name = name.trim_start_matches('.');
        if name.is_empty() {
            "unknown_user".to_string()
        } else {
            name.to_string()
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
