use crate::settings::Settings;
use eyre::Result;
use serde_json;
use std::{fs, path::PathBuf};

#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    filepath: PathBuf,
}

impl Config {
    pub fn new() -> Result<Self> {
        let prefix = get_app_data_prefix()?;
        Self::load_from(prefix.join("configuration.json"))
    }

    /// Load configuration from a custom path. A missing file or a malformed
    /// `Setting` section yields defaults.
    pub fn load_from(filepath: PathBuf) -> Result<Self> {
        let mut settings = Settings::default();

        if filepath.exists() {
            let config_str = fs::read_to_string(&filepath)?;
            match serde_json::from_str::<serde_json::Value>(&config_str) {
                Ok(user_config) => {
                    if let Some(user_settings) = user_config.get("Setting") {
                        match serde_json::from_value::<Settings>(user_settings.clone()) {
                            Ok(parsed) => settings = parsed,
                            Err(err) => log::warn!(
                                "ignoring invalid settings in {}: {}",
                                filepath.display(),
                                err
                            ),
                        }
                    }
                }
                Err(err) => log::warn!("ignoring unreadable {}: {}", filepath.display(), err),
            }
        }

        Ok(Self { settings, filepath })
    }

    /// Get the configuration file path
    pub fn filepath(&self) -> &PathBuf {
        &self.filepath
    }

    /// Directory that holds the configuration and the durable state database.
    pub fn data_dir(&self) -> PathBuf {
        self.filepath
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn with_settings(settings: Settings, filepath: PathBuf) -> Self {
        Self { settings, filepath }
    }

    /// Save current configuration to file
    pub fn save(&self) -> Result<()> {
        let config_json = serde_json::json!({
            "Setting": self.settings,
        });
        let config_str = serde_json::to_string_pretty(&config_json)?;

        if let Some(parent) = self.filepath.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.filepath, config_str)?;
        Ok(())
    }
}

pub fn get_app_data_prefix() -> Result<PathBuf> {
    if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(config_home).join("lectern"));
    } else if let Some(home) = std::env::var_os("HOME") {
        let path = PathBuf::from(home.clone()).join(".config").join("lectern");
        if path.exists() {
            return Ok(path);
        } else {
            return Ok(PathBuf::from(home).join(".lectern"));
        }
    } else if let Some(user_profile) = std::env::var_os("USERPROFILE") {
        return Ok(PathBuf::from(user_profile).join(".lectern"));
    }

    Err(eyre::eyre!("Could not determine application data directory"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};
    use tempfile::tempdir;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .expect("lock env mutex")
    }

    fn restore_var(name: &str, value: Option<std::ffi::OsString>) {
        unsafe {
            match value {
                Some(value) => env::set_var(name, value),
                None => env::remove_var(name),
            }
        }
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = Config::load_from(dir.path().join("configuration.json"))?;
        assert_eq!(config.settings, Settings::default());
        assert_eq!(config.data_dir(), dir.path());
        Ok(())
    }

    #[test]
    fn test_load_from_partial_settings() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("configuration.json");
        fs::write(
            &path,
            r#"{"Setting": {"hide_delay_ms": 400, "chapters_dir": "text"}}"#,
        )?;

        let config = Config::load_from(path)?;
        assert_eq!(config.settings.hide_delay_ms, 400);
        assert_eq!(config.settings.chapters_dir, "text");
        assert_eq!(config.settings.probe_timeout_ms, 3000);
        Ok(())
    }

    #[test]
    fn test_load_from_invalid_json_uses_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("configuration.json");
        fs::write(&path, "{ not json")?;
        let config = Config::load_from(path)?;
        assert_eq!(config.settings, Settings::default());

        let path = dir.path().join("wrong_types.json");
        fs::write(&path, r#"{"Setting": {"hide_delay_ms": "soon"}}"#)?;
        let config = Config::load_from(path)?;
        assert_eq!(config.settings, Settings::default());
        Ok(())
    }

    #[test]
    fn test_save_and_reload() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("configuration.json");
        let mut settings = Settings::default();
        settings.zoom_scale = 3.0;
        settings.restore_frames = 4;
        Config::with_settings(settings.clone(), path.clone()).save()?;

        let reloaded = Config::load_from(path)?;
        assert_eq!(reloaded.settings, settings);
        Ok(())
    }

    #[test]
    fn test_get_app_data_prefix() {
        let _env_lock = lock_env();
        let original_home = env::var_os("HOME");
        let original_xdg_config_home = env::var_os("XDG_CONFIG_HOME");
        let original_userprofile = env::var_os("USERPROFILE");

        let xdg_dir = tempdir().unwrap();
        let home_dir = tempdir().unwrap();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", xdg_dir.path());
        }
        assert_eq!(
            get_app_data_prefix().unwrap(),
            xdg_dir.path().join("lectern")
        );

        unsafe {
            env::remove_var("XDG_CONFIG_HOME");
            env::set_var("HOME", home_dir.path());
        }
        assert_eq!(
            get_app_data_prefix().unwrap(),
            home_dir.path().join(".lectern")
        );

        fs::create_dir_all(home_dir.path().join(".config").join("lectern")).unwrap();
        assert_eq!(
            get_app_data_prefix().unwrap(),
            home_dir.path().join(".config").join("lectern")
        );

        unsafe {
            env::remove_var("HOME");
            env::remove_var("USERPROFILE");
        }
        assert!(get_app_data_prefix().is_err());

        restore_var("HOME", original_home);
        restore_var("XDG_CONFIG_HOME", original_xdg_config_home);
        restore_var("USERPROFILE", original_userprofile);
    }
}
