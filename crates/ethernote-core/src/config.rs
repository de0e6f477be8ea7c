//! Remote store configuration.
//!
//! Front-ends resolve a [`StoreConfig`] from the environment (optionally after
//! loading a `.env` file) or from a JSON file, then hand it to
//! [`crate::store::SupabaseStore::from_config`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{has_http_scheme, non_blank};

pub const DEFAULT_NOTES_TABLE: &str = "notes";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Connection settings for the Supabase project holding the notes table.
///
/// The anon key is a publishable key; a user access token, when present,
/// replaces it as the bearer credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_notes_table")]
    pub notes_table: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_notes_table() -> String {
    DEFAULT_NOTES_TABLE.to_string()
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl StoreConfig {
    /// Resolve from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve from an arbitrary variable source.
    ///
    /// Plain names win over their `EXPO_PUBLIC_` counterparts.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let first = |names: &[&str]| {
            names
                .iter()
                .find_map(|name| non_blank(lookup(*name)))
        };

        let supabase_url = first(&["SUPABASE_URL", "EXPO_PUBLIC_SUPABASE_URL"])
            .ok_or_else(|| Error::Config("SUPABASE_URL is not set".to_string()))?;
        let supabase_anon_key = first(&["SUPABASE_ANON_KEY", "EXPO_PUBLIC_SUPABASE_ANON_KEY"])
            .ok_or_else(|| Error::Config("SUPABASE_ANON_KEY is not set".to_string()))?;
        let timeout_secs = match first(&["ETHERNOTE_TIMEOUT_SECS"]) {
            Some(raw) => raw.parse().map_err(|_| {
                Error::Config(format!("ETHERNOTE_TIMEOUT_SECS must be a number, got '{raw}'"))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Self {
            supabase_url,
            supabase_anon_key,
            access_token: first(&["SUPABASE_ACCESS_TOKEN"]),
            notes_table: first(&["ETHERNOTE_TABLE"]).unwrap_or_else(default_notes_table),
            timeout_secs,
        }
        .normalized()
    }

    /// Load a JSON config file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|error| {
            Error::Config(format!("Failed to read config at {}: {error}", path.display()))
        })?;
        let config = serde_json::from_str::<Self>(&raw).map_err(|error| {
            Error::Config(format!("Failed to parse config at {}: {error}", path.display()))
        })?;
        config.normalized()
    }

    /// Trim values and check required fields.
    pub fn normalized(self) -> Result<Self> {
        let supabase_url = non_blank(Some(self.supabase_url))
            .ok_or_else(|| Error::Config("supabase_url must not be empty".to_string()))?;
        if !has_http_scheme(&supabase_url) {
            return Err(Error::Config(
                "supabase_url must include http:// or https://".to_string(),
            ));
        }
        let supabase_anon_key = non_blank(Some(self.supabase_anon_key))
            .ok_or_else(|| Error::Config("supabase_anon_key must not be empty".to_string()))?;
        let notes_table = non_blank(Some(self.notes_table))
            .ok_or_else(|| Error::Config("notes_table must not be empty".to_string()))?;
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be positive".to_string()));
        }

        Ok(Self {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            supabase_anon_key,
            access_token: non_blank(self.access_token),
            notes_table,
            timeout_secs: self.timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn from_lookup_reads_plain_names_with_defaults() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://demo.supabase.co/"),
            ("SUPABASE_ANON_KEY", " anon "),
        ]))
        .unwrap();

        assert_eq!(
            config,
            StoreConfig {
                supabase_url: "https://demo.supabase.co".to_string(),
                supabase_anon_key: "anon".to_string(),
                access_token: None,
                notes_table: "notes".to_string(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
            }
        );
    }

    #[test]
    fn from_lookup_falls_back_to_expo_names() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("EXPO_PUBLIC_SUPABASE_URL", "https://expo.supabase.co"),
            ("EXPO_PUBLIC_SUPABASE_ANON_KEY", "expo-anon"),
            ("ETHERNOTE_TABLE", "journal"),
        ]))
        .unwrap();

        assert_eq!(config.supabase_url, "https://expo.supabase.co");
        assert_eq!(config.supabase_anon_key, "expo-anon");
        assert_eq!(config.notes_table, "journal");
    }

    #[test]
    fn from_lookup_requires_url_and_key() {
        let error = StoreConfig::from_lookup(lookup(&[("SUPABASE_ANON_KEY", "anon")])).unwrap_err();
        assert!(error.to_string().contains("SUPABASE_URL"));

        let error =
            StoreConfig::from_lookup(lookup(&[("SUPABASE_URL", "https://x.supabase.co")]))
                .unwrap_err();
        assert!(error.to_string().contains("SUPABASE_ANON_KEY"));
    }

    #[test]
    fn from_lookup_rejects_bad_timeout() {
        let error = StoreConfig::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("ETHERNOTE_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(error.to_string().contains("ETHERNOTE_TIMEOUT_SECS"));
    }

    #[test]
    fn normalized_rejects_url_without_scheme() {
        let error = StoreConfig {
            supabase_url: "demo.supabase.co".to_string(),
            supabase_anon_key: "anon".to_string(),
            access_token: None,
            notes_table: "notes".to_string(),
            timeout_secs: 5,
        }
        .normalized()
        .unwrap_err();
        assert!(matches!(error, Error::Config(message) if message.contains("http")));
    }

    #[test]
    fn load_from_path_rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ethernote.json");
        std::fs::write(
            &path,
            r#"{"supabase_url":"https://demo.supabase.co","supabase_anon_key":"anon","extra":1}"#,
        )
        .unwrap();

        let error = StoreConfig::load_from_path(&path).unwrap_err();
        assert!(error.to_string().contains("unknown field"));
    }

    #[test]
    fn load_from_path_applies_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ethernote.json");
        std::fs::write(
            &path,
            r#"{"supabase_url":"https://demo.supabase.co","supabase_anon_key":"anon","access_token":"  "}"#,
        )
        .unwrap();

        let config = StoreConfig::load_from_path(&path).unwrap();
        assert_eq!(config.notes_table, DEFAULT_NOTES_TABLE);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.access_token, None);
    }
}
