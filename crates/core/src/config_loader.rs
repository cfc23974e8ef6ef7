use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration by layering TOML, environment variables, and
    /// JSON over the built-in defaults, then validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed,
    /// or if the merged configuration fails validation.
    pub fn load() -> Result<AppConfig> {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file("config/Config.toml"))
            .merge(Env::prefixed("FOLIO_"))
            .join(Json::file("config/Config.json"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Loads configuration with a profile-specific TOML overlay.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed,
    /// or if the merged configuration fails validation.
    pub fn load_with_profile(profile: &str) -> Result<AppConfig> {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file("config/Config.toml"))
            .merge(Toml::file(format!("config/Config.{profile}.toml")))
            .merge(Env::prefixed("FOLIO_"))
            .join(Json::file("config/Config.json"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }
}
