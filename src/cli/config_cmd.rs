//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::clipboard::PasteModifier;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;
use crate::domain::interval::Interval;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    validate_config_value(key, value)?;

    let mut config = store.load().await?;
    *field_mut(&mut config, key)? = Some(value.to_string());
    store.save(&config).await?;

    presenter.success(&format!("{} = {}", key, value));
    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let mut config = store.load().await?;
    let value = field_mut(&mut config, key)?.take();
    presenter.output(value.as_deref().unwrap_or(NOT_SET));

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let mut config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        let value = field_mut(&mut config, key)?.take();
        presenter.key_value(key, value.as_deref().unwrap_or(NOT_SET));
    }

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn unknown_key(key: &str) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    }
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        Ok(())
    } else {
        Err(unknown_key(key))
    }
}

/// Field backing `key`
fn field_mut<'a>(
    config: &'a mut AppConfig,
    key: &str,
) -> Result<&'a mut Option<String>, ConfigError> {
    let field = match key {
        "browser_path" => &mut config.browser_path,
        "start_url" => &mut config.start_url,
        "launch_timeout" => &mut config.launch_timeout,
        "capture_timeout" => &mut config.capture_timeout,
        "interval" => &mut config.interval,
        "paste_modifier" => &mut config.paste_modifier,
        _ => return Err(unknown_key(key)),
    };
    Ok(field)
}

/// Validate a config value based on key type
fn validate_config_value(key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::ValidationError {
        key: key.to_string(),
        message,
    };

    match key {
        "launch_timeout" | "interval" => {
            value
                .parse::<Interval>()
                .map_err(|e| invalid(e.to_string()))?;
        }
        "capture_timeout" => {
            if !value.eq_ignore_ascii_case("none") {
                value
                    .parse::<Interval>()
                    .map_err(|e| invalid(e.to_string()))?;
            }
        }
        "paste_modifier" => {
            value
                .parse::<PasteModifier>()
                .map_err(|e| invalid(e.to_string()))?;
        }
        "browser_path" | "start_url" => {
            if value.trim().is_empty() {
                return Err(invalid("Value must not be empty".to_string()));
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::XdgConfigStore;

    #[test]
    fn validate_intervals() {
        assert!(validate_config_value("interval", "500ms").is_ok());
        assert!(validate_config_value("launch_timeout", "1m").is_ok());
        assert!(validate_config_value("interval", "0s").is_err());
        assert!(validate_config_value("launch_timeout", "soon").is_err());
    }

    #[test]
    fn validate_capture_timeout_accepts_none() {
        assert!(validate_config_value("capture_timeout", "none").is_ok());
        assert!(validate_config_value("capture_timeout", "5s").is_ok());
        assert!(validate_config_value("capture_timeout", "never").is_err());
    }

    #[test]
    fn validate_modifier() {
        assert!(validate_config_value("paste_modifier", "ctrl").is_ok());
        assert!(validate_config_value("paste_modifier", "meta").is_ok());
        assert!(validate_config_value("paste_modifier", "alt").is_err());
    }

    #[test]
    fn validate_paths_not_empty() {
        assert!(validate_config_value("browser_path", "/usr/bin/chromium").is_ok());
        assert!(validate_config_value("browser_path", "  ").is_err());
        assert!(validate_config_value("start_url", "").is_err());
    }

    #[test]
    fn every_key_has_its_own_field() {
        let mut config = AppConfig::empty();
        for (i, key) in VALID_CONFIG_KEYS.iter().enumerate() {
            *field_mut(&mut config, key).unwrap() = Some(i.to_string());
        }
        assert_eq!(config.browser_path.as_deref(), Some("0"));
        assert_eq!(config.paste_modifier.as_deref(), Some("5"));
        assert_eq!(config.interval.as_deref(), Some("4"));
    }

    #[test]
    fn unlisted_key_has_no_field() {
        let mut config = AppConfig::empty();

        let err = field_mut(&mut config, "api_key").unwrap_err();

        assert!(matches!(err, ConfigError::ValidationError { ref key, .. } if key == "api_key"));
        assert_eq!(config, AppConfig::empty());
    }

    #[tokio::test]
    async fn set_persists_and_unknown_key_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("config.toml"));
        let presenter = Presenter::new();

        handle_set(&store, &presenter, "interval", "750ms")
            .await
            .unwrap();
        assert_eq!(store.load().await.unwrap().interval.as_deref(), Some("750ms"));

        let err = handle_set(&store, &presenter, "api_key", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref key, .. } if key == "api_key"));
    }
}
