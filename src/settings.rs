use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

pub const BACKEND_URL_ENV: &str = "SOS_BACKEND_URL";
pub const ROOM_URL_ENV: &str = "SOS_ROOM_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the SOS backend (token, photo, location endpoints).
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Realtime room server the credential is presented to.
    #[serde(default = "default_room_url")]
    pub room_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.clamp(1, 120))
    }

    /// Environment variables win over the saved file.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(BACKEND_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.backend_url = v.trim().to_string();
        }
        if let Some(v) = lookup(ROOM_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.room_url = v.trim().to_string();
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            room_url: default_room_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_backend_url() -> String {
    "http://127.0.0.1:5000".into()
}

fn default_room_url() -> String {
    "ws://127.0.0.1:7880".into()
}

fn default_request_timeout_secs() -> u64 {
    15
}

pub fn settings_path() -> Result<PathBuf, String> {
    if let Some(dir) = dirs::data_local_dir() {
        return Ok(dir.join("SosAssist").join("settings.json"));
    }
    if let Some(home) = dirs::home_dir() {
        return Ok(home.join(".sos-assist").join("settings.json"));
    }
    Err("Failed to resolve data directory".into())
}

pub fn parse(text: &str) -> Settings {
    serde_json::from_str(text).unwrap_or_else(|e| {
        log::warn!("[settings] ignoring unreadable settings: {}", e);
        Settings::default()
    })
}

/// Load saved settings (or defaults) and apply environment overrides.
pub fn load() -> Settings {
    let mut settings = match settings_path().and_then(|p| {
        fs::read_to_string(&p).map_err(|e| format!("{}: {}", p.display(), e))
    }) {
        Ok(text) => parse(&text),
        Err(e) => {
            log::debug!("[settings] using defaults ({})", e);
            Settings::default()
        }
    };
    settings.apply_env_overrides(|key| std::env::var(key).ok());
    settings
}

pub fn save(settings: &Settings) -> Result<(), String> {
    let path = settings_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create settings dir: {}", e))?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {}", e))?;
    fs::write(&path, json).map_err(|e| format!("Failed to write settings: {}", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let s = parse(r#"{"backend_url":"https://sos.example.org"}"#);
        assert_eq!(s.backend_url, "https://sos.example.org");
        assert_eq!(s.room_url, "ws://127.0.0.1:7880");
        assert_eq!(s.request_timeout_secs, 15);
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        assert_eq!(parse("{not json"), Settings::default());
    }

    #[test]
    fn env_overrides_win() {
        let mut s = Settings::default();
        s.apply_env_overrides(|key| match key {
            BACKEND_URL_ENV => Some(" http://10.0.0.2:5000 ".into()),
            ROOM_URL_ENV => Some("".into()),
            _ => None,
        });
        assert_eq!(s.backend_url, "http://10.0.0.2:5000");
        assert_eq!(s.room_url, default_room_url());
    }

    #[test]
    fn timeout_is_clamped() {
        let mut s = Settings::default();
        s.request_timeout_secs = 0;
        assert_eq!(s.request_timeout(), Duration::from_secs(1));
        s.request_timeout_secs = 9_999;
        assert_eq!(s.request_timeout(), Duration::from_secs(120));
    }
}
