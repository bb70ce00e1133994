//! Line-oriented `key=value` properties files
//!
//! Used for both the bootstrap file and the local credentials file. Blank
//! lines and lines starting with `#` are skipped. Everything after the first
//! `=` is the value, so values may themselves contain `=`.

use std::collections::HashMap;

pub type Properties = HashMap<String, String>;

pub fn parse_properties(contents: &str) -> Properties {
    let mut properties = Properties::new();

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match line.split_once('=') {
            Some((key, value)) => {
                let key = key.trim();
                if !key.is_empty() {
                    properties.insert(key.to_string(), value.trim().to_string());
                }
            }
            None => log::debug!("Ignoring properties line without '=': {}", line),
        }
    }

    properties
}
