use crate::settings::Settings;

/// Editable copy of [`Settings`] backing the settings panel. Text fields stay
/// raw until saved so half-typed values never reach the live config.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub backend_url: String,
    pub room_url: String,
    pub request_timeout_secs: String,
}

impl FormState {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            backend_url: settings.backend_url.clone(),
            room_url: settings.room_url.clone(),
            request_timeout_secs: settings.request_timeout_secs.to_string(),
        }
    }

    pub fn is_dirty(&self, settings: &Settings) -> bool {
        *self != Self::from_settings(settings)
    }

    pub fn apply_to_settings(&self, settings: &mut Settings) -> Result<(), String> {
        let backend_url = self.backend_url.trim();
        if !(backend_url.starts_with("http://") || backend_url.starts_with("https://")) {
            return Err("Backend URL must start with http:// or https://".into());
        }
        let room_url = self.room_url.trim();
        if !["ws://", "wss://", "http://", "https://"]
            .iter()
            .any(|p| room_url.starts_with(p))
        {
            return Err("Room URL must start with ws://, wss://, http:// or https://".into());
        }
        let timeout: u64 = self
            .request_timeout_secs
            .trim()
            .parse()
            .map_err(|_| "Timeout must be a whole number of seconds".to_string())?;

        settings.backend_url = backend_url.trim_end_matches('/').to_string();
        settings.room_url = room_url.to_string();
        settings.request_timeout_secs = timeout.clamp(1, 120);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_defaults_without_dirtying() {
        let settings = Settings::default();
        let form = FormState::from_settings(&settings);
        assert!(!form.is_dirty(&settings));

        let mut copy = settings.clone();
        form.apply_to_settings(&mut copy).unwrap();
        assert_eq!(copy, settings);
    }

    #[test]
    fn apply_trims_and_clamps() {
        let mut settings = Settings::default();
        let mut form = FormState::from_settings(&settings);
        form.backend_url = " https://sos.example.org/ ".into();
        form.request_timeout_secs = "600".into();
        assert!(form.is_dirty(&settings));

        form.apply_to_settings(&mut settings).unwrap();
        assert_eq!(settings.backend_url, "https://sos.example.org");
        assert_eq!(settings.request_timeout_secs, 120);
    }

    #[test]
    fn invalid_fields_leave_settings_untouched() {
        let mut settings = Settings::default();
        let mut form = FormState::from_settings(&settings);
        form.backend_url = "localhost:5000".into();
        assert!(form.apply_to_settings(&mut settings).is_err());

        form.backend_url = "http://localhost:5000".into();
        form.request_timeout_secs = "soon".into();
        assert!(form.apply_to_settings(&mut settings).is_err());
        assert_eq!(settings, Settings::default());
    }
}
