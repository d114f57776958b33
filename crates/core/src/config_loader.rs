use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

/// Default location of the TOML configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/Config.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads application configuration from the default TOML file and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load() -> Result<AppConfig> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Loads application configuration layered as defaults, TOML file,
    /// `HOOPS_`-prefixed environment, then the legacy insight variables.
    ///
    /// A missing TOML file is not an error; the defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or environment values cannot be parsed.
    pub fn load_from(path: &str) -> Result<AppConfig> {
        let config: AppConfig = Self::figment(path).extract()?;
        Ok(config)
    }

    fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("HOOPS_").split("__"))
            .merge(
                Env::raw()
                    .only(&["REQUESTS_CA_BUNDLE"])
                    .map(|_| "insights.ca_bundle".into()),
            )
            .merge(
                Env::raw()
                    .only(&["GEMINI_API_KEY", "GEMINI_API_URL", "GEMINI_CA_BUNDLE"])
                    .map(|key| {
                        let lowered = key.as_str().to_ascii_lowercase();
                        let field = lowered.trim_start_matches("gemini_").to_string();
                        format!("insights.{field}").into()
                    }),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = ConfigLoader::load_from("missing.toml").expect("defaults");
            assert_eq!(config.server.port, 8000);
            assert_eq!(config.upstream.standings_ttl_secs, 900);
            assert_eq!(config.upstream.scoreboard_ttl_secs, 60);
            assert_eq!(config.insights.timeout_secs, 10);
            assert!(config.insights.api_key().is_none());
            Ok(())
        });
    }

    #[test]
    fn test_toml_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "Config.toml",
                r#"
                [server]
                port = 9090

                [dataset]
                path = "fixtures/games.csv"
                "#,
            )?;

            let config = ConfigLoader::load_from("Config.toml").expect("toml config");
            assert_eq!(config.server.port, 9090);
            assert_eq!(config.server.host, "0.0.0.0");
            assert_eq!(config.dataset.path, "fixtures/games.csv");
            Ok(())
        });
    }

    #[test]
    fn test_prefixed_env_overrides_toml() {
        Jail::expect_with(|jail| {
            jail.create_file("Config.toml", "[upstream]\nseason = \"2024-25\"\n")?;
            jail.set_env("HOOPS_UPSTREAM__SEASON", "2025-26");
            jail.set_env("HOOPS_SERVER__PORT", "7000");

            let config = ConfigLoader::load_from("Config.toml").expect("env config");
            assert_eq!(config.upstream.season, "2025-26");
            assert_eq!(config.server.port, 7000);
            Ok(())
        });
    }

    #[test]
    fn test_legacy_gemini_variables() {
        Jail::expect_with(|jail| {
            jail.set_env("GEMINI_API_KEY", "secret");
            jail.set_env("GEMINI_API_URL", "http://localhost:9999/generate");
            jail.set_env("REQUESTS_CA_BUNDLE", "/etc/ssl/proxy.pem");

            let config = ConfigLoader::load_from("missing.toml").expect("legacy env");
            assert_eq!(config.insights.api_key(), Some("secret"));
            assert_eq!(config.insights.api_url, "http://localhost:9999/generate");
            assert_eq!(config.insights.ca_bundle.as_deref(), Some("/etc/ssl/proxy.pem"));
            Ok(())
        });
    }

    #[test]
    fn test_gemini_ca_bundle_wins_over_requests_bundle() {
        Jail::expect_with(|jail| {
            jail.set_env("REQUESTS_CA_BUNDLE", "/etc/ssl/requests.pem");
            jail.set_env("GEMINI_CA_BUNDLE", "/etc/ssl/gemini.pem");

            let config = ConfigLoader::load_from("missing.toml").expect("legacy env");
            assert_eq!(config.insights.ca_bundle.as_deref(), Some("/etc/ssl/gemini.pem"));
            Ok(())
        });
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        Jail::expect_with(|jail| {
            jail.set_env("GEMINI_API_KEY", "   ");
            let config = ConfigLoader::load_from("missing.toml").expect("legacy env");
            assert!(config.insights.api_key().is_none());
            Ok(())
        });
    }
}
