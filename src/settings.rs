// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use config::{Config, ConfigError, File};
use lazy_static::*;
use log::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, metadata, File as FsFile};
use std::io::Write;
use std::path::PathBuf;
use struct_field_names_as_array::FieldNamesAsArray;

const ENV_PREFIX: &str = "tokenlayer";

lazy_static! {
    pub static ref SETTINGS: Settings = Settings::new().unwrap_or_else(|err| {
        error!("Failed to load configuration, using defaults! Reason: {err}");
        Settings::default()
    });
}

#[derive(Debug, Serialize, Deserialize, Default, FieldNamesAsArray)]
pub struct Settings {
    /// Node settings.
    pub node: Node,

    /// Protocol settings.
    #[serde(default)]
    pub protocol: Protocol,
}

fn config_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(std::env::temp_dir);
    path.push("Tokenlayer");
    path
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = config_dir();
        let config_path = config_dir.join("config.toml");
        let default_settings = Settings::default();

        // Create default configuration
        if metadata(&config_path).is_err() {
            match toml::ser::to_string_pretty(&default_settings) {
                Ok(settings_str) => {
                    let created = fs::create_dir_all(&config_dir)
                        .and_then(|_| FsFile::create(&config_path))
                        .and_then(|mut file| file.write_all(settings_str.as_bytes()));

                    if let Err(err) = created {
                        // Fall back to defaults and environment variables
                        error!("Failed to create configuration! Reason: {:#?}", err);
                    }
                }
                Err(err) => error!("Failed to serialize default configuration! Reason: {err}"),
            }
        }

        let mut s = Config::builder()
            .add_source(File::from(config_path.as_path()).required(false));

        // Set defaults
        let defaults: HashMap<String, HashMap<String, DynamicConfVal>> =
            serde_yaml::to_value(&default_settings)
                .and_then(serde_yaml::from_value)
                .map_err(|err| ConfigError::Foreign(Box::new(err)))?;

        for (k1, inner) in &defaults {
            for (k2, v) in inner {
                match v {
                    DynamicConfVal::String(v) => {
                        s = s.set_default(format!("{k1}.{k2}"), v.as_str())?;
                    }

                    DynamicConfVal::Bool(v) => {
                        s = s.set_default(format!("{k1}.{k2}"), v.to_string())?;
                    }

                    DynamicConfVal::Option(v) => {
                        if let Some(v) = v {
                            s = s.set_default(format!("{k1}.{k2}"), v.as_str())?;
                        }
                    }
                }
            }
        }

        let possible_keys = env_keys();

        // Parse env vars manually and set overrides if they exist as the
        // config package `Environment` module seems to behave poorly.
        for (k, v) in std::env::vars() {
            let k = k.to_lowercase();

            if let Some(k_postfix) = possible_keys.get(&k) {
                // Filter empty values
                if v.is_empty() {
                    continue;
                }

                let mut k: Vec<_> = k.split('_').filter(|x| x != &ENV_PREFIX).collect();
                if let Some(last) = k.last_mut() {
                    *last = *k_postfix;
                }

                s = s.set_override(k.join("."), v.as_str())?;
            }
        }

        s.build()?.try_deserialize()
    }
}

/// Maps lowercased environment variable names to the setting they override,
/// e.g. `tokenlayer_node_datadir` to `data_dir`.
fn env_keys() -> HashMap<String, &'static str> {
    // Make sure to list these in order
    let settings_modules: [&[&str]; 2] =
        [&Node::FIELD_NAMES_AS_ARRAY, &Protocol::FIELD_NAMES_AS_ARRAY];

    Settings::FIELD_NAMES_AS_ARRAY
        .iter()
        .zip(settings_modules)
        .flat_map(|(field, nested_fields)| {
            nested_fields.iter().map(move |nested| {
                (
                    format!("{ENV_PREFIX}_{field}_{}", nested.replace('_', "")),
                    *nested,
                )
            })
        })
        .collect()
}

#[derive(Debug, Serialize, Deserialize, FieldNamesAsArray)]
pub struct Node {
    /// The network the ledger follows. Either `mainnet` or `testnet`.
    #[serde(alias = "networkname")]
    pub network_name: String,

    /// Node data directory
    #[serde(alias = "datadir")]
    pub data_dir: String,

    /// If specified, we won't be storing anything to disk.
    #[serde(alias = "memoryonly")]
    pub memory_only: bool,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            network_name: "testnet".to_owned(), // Use testnet as default for now
            data_dir: config_dir().to_string_lossy().into_owned(),
            memory_only: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default, FieldNamesAsArray)]
pub struct Protocol {
    /// JSON file with protocol change activation heights. The built in
    /// table is used if not present.
    #[serde(alias = "changesfile")]
    pub changes_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum DynamicConfVal {
    String(String),
    Option(Option<String>),
    Bool(bool),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_has_sane_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.node.network_name, "testnet");
        assert!(!settings.node.memory_only);
        assert!(settings.node.data_dir.ends_with("Tokenlayer"));
        assert!(settings.protocol.changes_file.is_none());
    }

    #[test]
    fn it_maps_env_keys() {
        let keys = env_keys();
        assert_eq!(keys.len(), 4);
        assert_eq!(keys.get("tokenlayer_node_datadir"), Some(&"data_dir"));
        assert_eq!(keys.get("tokenlayer_node_memoryonly"), Some(&"memory_only"));
        assert_eq!(
            keys.get("tokenlayer_protocol_changesfile"),
            Some(&"changes_file")
        );
    }

    #[test]
    fn it_flattens_defaults() {
        let defaults: HashMap<String, HashMap<String, DynamicConfVal>> =
            serde_yaml::from_value(serde_yaml::to_value(Settings::default()).unwrap()).unwrap();
        assert!(matches!(
            defaults["node"]["memory_only"],
            DynamicConfVal::Bool(false)
        ));
        assert!(matches!(
            defaults["protocol"]["changes_file"],
            DynamicConfVal::Option(None)
        ));
    }

    #[test]
    fn it_writes_default_toml() {
        let toml = toml::ser::to_string_pretty(&Settings::default()).unwrap();
        assert!(toml.contains("[node]"));

        let parsed: Settings = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.node.network_name, "testnet");
        assert!(!parsed.node.memory_only);
        assert!(parsed.protocol.changes_file.is_none());
    }
}
