//! Bot configuration loading.
//!
//! Reads `comanda.toml` from the working directory or the user config
//! directory, then applies `COMANDA_*` environment overrides. A missing
//! file means defaults; a malformed file or override is a startup error.

use std::env;
use std::fs;
use std::path::PathBuf;

use comanda_core::config::BotConfig;
use comanda_core::{ComandaError, Result};

const CONFIG_FILE: &str = "comanda.toml";

/// Loads the effective configuration.
pub fn load_config() -> Result<BotConfig> {
    let mut config = match find_config_file() {
        Some(path) => {
            let source = fs::read_to_string(&path)?;
            toml::from_str(&source)
                .map_err(|err| ComandaError::config(format!("{}: {err}", path.display())))?
        }
        None => BotConfig::default(),
    };
    apply_overrides(&mut config, |name| env::var(name).ok())?;
    Ok(config)
}

fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }
    let user = dirs::config_dir()?.join("comanda").join(CONFIG_FILE);
    user.exists().then_some(user)
}

/// Applies overrides from a variable lookup. Split from the environment so
/// tests can drive it with a plain map.
fn apply_overrides(
    config: &mut BotConfig,
    get: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(value) = get("COMANDA_BUSINESS_NAME") {
        config.business_name = value;
    }
    if let Some(value) = get("COMANDA_DELIVERY_FEE") {
        config.delivery_fee = value
            .parse()
            .map_err(|_| ComandaError::config(format!("invalid COMANDA_DELIVERY_FEE '{value}'")))?;
    }
    if let Some(value) = get("COMANDA_ETA_MIN") {
        config.eta_minutes = value
            .parse()
            .map_err(|_| ComandaError::config(format!("invalid COMANDA_ETA_MIN '{value}'")))?;
    }
    if let Some(value) = get("COMANDA_IDLE_TIMEOUT_MIN") {
        config.idle_timeout_minutes = value.parse().map_err(|_| {
            ComandaError::config(format!("invalid COMANDA_IDLE_TIMEOUT_MIN '{value}'"))
        })?;
    }
    if let Some(value) = get("COMANDA_AI_ENABLED") {
        config.fallback.enabled = matches!(value.trim(), "1" | "true");
    }
    if let Some(value) = get("COMANDA_AI_BASE_URL") {
        config.fallback.base_url = value.trim_end_matches('/').to_string();
    }
    if let Some(value) = get("COMANDA_AI_MODEL") {
        config.fallback.model = value;
    }
    if let Some(value) = get("COMANDA_AI_API_KEY") {
        config.fallback.api_key = value;
    }
    if let Some(value) = get("COMANDA_AI_TIMEOUT_SECS") {
        config.fallback.timeout_secs = value.parse().map_err(|_| {
            ComandaError::config(format!("invalid COMANDA_AI_TIMEOUT_SECS '{value}'"))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn toml_round_trip_with_defaults() {
        let config: BotConfig = toml::from_str(
            r#"
business_name = "Pincho"
delivery_fee = "3.00"
eta_minutes = 25

[fallback]
enabled = true
base_url = "http://127.0.0.1:9999/v1"
"#,
        )
        .unwrap();
        assert_eq!(config.business_name, "Pincho");
        assert_eq!(config.delivery_fee, "3.00".parse().unwrap());
        assert_eq!(config.eta_minutes, 25);
        assert!(config.fallback.enabled);
        // Unset fields keep their defaults.
        assert_eq!(config.idle_timeout_minutes, 20);
        assert_eq!(config.fallback.timeout_secs, 10);
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = BotConfig::default();
        let vars: HashMap<&str, &str> = HashMap::from([
            ("COMANDA_DELIVERY_FEE", "4.50"),
            ("COMANDA_AI_ENABLED", "1"),
            ("COMANDA_AI_BASE_URL", "http://10.0.0.5:8080/v1/"),
        ]);
        apply_overrides(&mut config, |name| {
            vars.get(name).map(|v| v.to_string())
        })
        .unwrap();

        assert_eq!(config.delivery_fee, "4.50".parse().unwrap());
        assert!(config.fallback.enabled);
        assert_eq!(config.fallback.base_url, "http://10.0.0.5:8080/v1");
    }

    #[test]
    fn malformed_override_is_a_config_error() {
        let mut config = BotConfig::default();
        let err = apply_overrides(&mut config, |name| {
            (name == "COMANDA_ETA_MIN").then(|| "pronto".to_string())
        })
        .unwrap_err();
        assert_eq!(err, ComandaError::config("invalid COMANDA_ETA_MIN 'pronto'"));
    }
}
