use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::lookup::{CatalogLookup, ProductInfo};
use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub key_bindings: KeyBindings,
    #[serde(default)]
    pub theme: Theme,
    /// Barcode → product table used to pre-fill new items
    #[serde(default)]
    pub catalog: HashMap<String, ProductInfo>,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_quit")]
    pub quit: String,
    #[serde(default = "default_new")]
    pub new: String,
    #[serde(default = "default_edit")]
    pub edit: String,
    #[serde(default = "default_delete")]
    pub delete: String,
    #[serde(default = "default_search")]
    pub search: String,
    #[serde(default = "default_restock")]
    pub restock: String,
    #[serde(default = "default_list_up")]
    pub list_up: String,
    #[serde(default = "default_list_down")]
    pub list_down: String,
    #[serde(default = "default_prev_month")]
    pub prev_month: String,
    #[serde(default = "default_next_month")]
    pub next_month: String,
    #[serde(default = "default_increment")]
    pub increment: String,
    #[serde(default = "default_decrement")]
    pub decrement: String,
    #[serde(default = "default_tab_1")]
    pub tab_1: String,
    #[serde(default = "default_tab_2")]
    pub tab_2: String,
    #[serde(default = "default_tab_3")]
    pub tab_3: String,
    #[serde(default = "default_help")]
    pub help: String,
    #[serde(default = "default_logout")]
    pub logout: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default = "default_fg")]
    pub fg: String,
    #[serde(default = "default_bg")]
    pub bg: String,
    #[serde(default = "default_highlight_bg")]
    pub highlight_bg: String,
    #[serde(default = "default_highlight_fg")]
    pub highlight_fg: String,
    #[serde(default = "default_accent")]
    pub accent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            log_level: default_log_level(),
            key_bindings: KeyBindings::default(),
            theme: Theme::default(),
            catalog: HashMap::new(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: default_quit(),
            new: default_new(),
            edit: default_edit(),
            delete: default_delete(),
            search: default_search(),
            restock: default_restock(),
            list_up: default_list_up(),
            list_down: default_list_down(),
            prev_month: default_prev_month(),
            next_month: default_next_month(),
            increment: default_increment(),
            decrement: default_decrement(),
            tab_1: default_tab_1(),
            tab_2: default_tab_2(),
            tab_3: default_tab_3(),
            help: default_help(),
            logout: default_logout(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: default_fg(),
            bg: default_bg(),
            highlight_bg: default_highlight_bg(),
            highlight_fg: default_highlight_fg(),
            accent: default_accent(),
        }
    }
}

// Default value functions
fn default_database_path() -> String {
    // Fallback only; the profile decides the real path at load time
    if let Some(data_dir) = utils::get_data_dir(utils::Profile::Prod) {
        data_dir.join("larder.db").to_string_lossy().to_string()
    } else {
        "~/.local/share/larder/larder.db".to_string()
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_quit() -> String {
    "q".to_string()
}

fn default_new() -> String {
    "n".to_string()
}

fn default_edit() -> String {
    "e".to_string()
}

fn default_delete() -> String {
    "d".to_string()
}

fn default_search() -> String {
    "/".to_string()
}

fn default_restock() -> String {
    "r".to_string()
}

fn default_list_up() -> String {
    "k".to_string()
}

fn default_list_down() -> String {
    "j".to_string()
}

fn default_prev_month() -> String {
    "h".to_string()
}

fn default_next_month() -> String {
    "l".to_string()
}

fn default_increment() -> String {
    "+".to_string()
}

fn default_decrement() -> String {
    "-".to_string()
}

fn default_tab_1() -> String {
    "1".to_string()
}

fn default_tab_2() -> String {
    "2".to_string()
}

fn default_tab_3() -> String {
    "3".to_string()
}

fn default_help() -> String {
    "F1".to_string()
}

fn default_logout() -> String {
    "Ctrl+o".to_string()
}

fn default_fg() -> String {
    "white".to_string()
}

fn default_bg() -> String {
    "black".to_string()
}

fn default_highlight_bg() -> String {
    "blue".to_string()
}

fn default_highlight_fg() -> String {
    "white".to_string()
}

fn default_accent() -> String {
    "yellow".to_string()
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
    #[error("Invalid key binding '{binding}' for {action}: {reason}")]
    KeyBindingError {
        action: &'static str,
        binding: String,
        reason: String,
    },
}

impl Config {
    /// Load configuration from the profile's config file, or create it with defaults
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;
        Self::load_from_path(&config_path, profile)
    }

    /// Load configuration from an explicit file. A missing file is created with defaults.
    pub fn load_from_path(config_path: &Path, profile: utils::Profile) -> Result<Self, ConfigError> {
        let config = if config_path.exists() {
            let contents = fs::read_to_string(config_path)
                .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            let mut config: Config = toml::from_str(&contents)?;

            // Keep dev and prod data apart even if the file was copied between profiles
            if profile == utils::Profile::Dev {
                config.database_path = Self::default_database_path_for_profile(profile);
            }
            config
        } else {
            let mut config = Config::default();
            config.database_path = Self::default_database_path_for_profile(profile);
            config.save_to_path(config_path)?;
            config
        };

        config.validate_key_bindings()?;
        Ok(config)
    }

    pub fn save_to_path(&mut self, config_path: &Path) -> Result<(), ConfigError> {
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(config_path, toml_string).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile)
            .ok_or_else(|| ConfigError::ConfigDirError("Could not determine config directory".to_string()))?;
        Ok(config_dir.join("config.toml"))
    }

    fn default_database_path_for_profile(profile: utils::Profile) -> String {
        if let Some(data_dir) = utils::get_data_dir(profile) {
            data_dir.join("larder.db").to_string_lossy().to_string()
        } else {
            match profile {
                utils::Profile::Dev => "~/.local/share/larder-dev/larder.db".to_string(),
                utils::Profile::Prod => "~/.local/share/larder/larder.db".to_string(),
            }
        }
    }

    /// Get the expanded database path (with ~ expansion)
    pub fn get_database_path(&self) -> PathBuf {
        utils::expand_path(&self.database_path)
    }

    /// Log file sits next to the database
    pub fn get_log_path(&self) -> PathBuf {
        let db_path = self.get_database_path();
        match db_path.parent() {
            Some(dir) => dir.join("larder.log"),
            None => PathBuf::from("larder.log"),
        }
    }

    pub fn catalog_lookup(&self) -> CatalogLookup {
        CatalogLookup::new(self.catalog.clone())
    }

    /// Reject bindings the TUI could never match
    pub fn validate_key_bindings(&self) -> Result<(), ConfigError> {
        let kb = &self.key_bindings;
        let bindings: [(&'static str, &str); 17] = [
            ("quit", &kb.quit),
            ("new", &kb.new),
            ("edit", &kb.edit),
            ("delete", &kb.delete),
            ("search", &kb.search),
            ("restock", &kb.restock),
            ("list_up", &kb.list_up),
            ("list_down", &kb.list_down),
            ("prev_month", &kb.prev_month),
            ("next_month", &kb.next_month),
            ("increment", &kb.increment),
            ("decrement", &kb.decrement),
            ("tab_1", &kb.tab_1),
            ("tab_2", &kb.tab_2),
            ("tab_3", &kb.tab_3),
            ("help", &kb.help),
            ("logout", &kb.logout),
        ];
        for (action, binding) in bindings {
            utils::parse_key_binding(binding).map_err(|reason| ConfigError::KeyBindingError {
                action,
                binding: binding.to_string(),
                reason,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg").join("config.toml");

        let config = Config::load_from_path(&path, utils::Profile::Prod).unwrap();
        assert!(path.exists());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.key_bindings.quit, "q");
        assert!(config.catalog.is_empty());
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
database_path = "/tmp/larder-test.db"
log_level = "debug"

[key_bindings]
quit = "Ctrl+q"

[catalog.4901234567894]
name = "Soy Sauce"
genre = "Seasonings"
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path, utils::Profile::Prod).unwrap();
        assert_eq!(config.database_path, "/tmp/larder-test.db");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.key_bindings.quit, "Ctrl+q");
        assert_eq!(config.key_bindings.new, "n");
        assert_eq!(config.catalog_lookup().len(), 1);
        assert_eq!(config.get_log_path(), PathBuf::from("/tmp/larder.log"));
    }

    #[test]
    fn bad_key_binding_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[key_bindings]\nsearch = \"Hyper+x\"\n").unwrap();

        match Config::load_from_path(&path, utils::Profile::Prod) {
            Err(ConfigError::KeyBindingError { action, .. }) => assert_eq!(action, "search"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.catalog.insert(
            "123".to_string(),
            ProductInfo {
                name: "Rice".to_string(),
                genre: "Grains".to_string(),
            },
        );
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path, utils::Profile::Prod).unwrap();
        assert_eq!(loaded.catalog.get("123").map(|p| p.name.as_str()), Some("Rice"));
        assert_eq!(loaded.config_version, Some(CURRENT_CONFIG_VERSION));
    }
}
