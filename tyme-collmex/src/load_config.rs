/// `load_config` module: Loads a static YAML config, injects the Collmex password from the
/// environment, and adapts both into the typed settings used by the CLI and the core crate.
///
/// This module is the only place where untrusted YAML is parsed and mapped to strongly-typed structs.
///
/// # Responsibilities
/// - Parse the user-supplied YAML file into intermediate (YAML-side) structs
/// - Map loose YAML values (numbers-or-strings, marker strings) to rich types
/// - Inject the `COLLMEX_PASSWORD` secret from the environment; it never lives in the file
/// - Surface clear diagnostics: any failure while loading names the offending key or file
///
/// # Errors
/// All errors in this module use `anyhow::Error` and are surfaced at the CLI boundary.
///
/// Accepted YAML:
///
/// ```yaml
/// collmex:
///   customer_id: "111111"
///   user: "2222222"
///   use_api: false
/// conversion:
///   employee_id: 1
///   company_id: 1
///   id_marker: { start: "[", end: "]" }
///   break_time: "00:00"
///   strict: true
///   midnight_end: keep   # or `drop`
/// ```
use anyhow::{bail, Result};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};
use tyme_collmex_core::config::{ConversionSettings, DEFAULT_BREAK_TIME};
use tyme_collmex_core::marker::IdMarkers;
use tyme_collmex_core::record::LoginRecord;
use tyme_collmex_core::schema::is_time;
use tyme_collmex_core::span::MidnightEnd;

pub const PASSWORD_ENV: &str = "COLLMEX_PASSWORD";
pub const DEFAULT_BASE_URL: &str = "https://www.collmex.de";

/// Fully loaded configuration for one CLI run.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub collmex: CollmexSettings,
    pub conversion: ConversionSettings,
}

/// Account and endpoint settings for the Collmex data-exchange API.
#[derive(Clone)]
pub struct CollmexSettings {
    pub customer_id: String,
    pub user: String,
    pub password: Option<String>,
    pub use_api: bool,
    pub base_url: String,
}

impl fmt::Debug for CollmexSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollmexSettings")
            .field("customer_id", &self.customer_id)
            .field("user", &self.user)
            .field("password_set", &self.password.is_some())
            .field("use_api", &self.use_api)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CollmexSettings {
    /// Login line for uploads. Fails when no password was provided.
    pub fn login(&self) -> Result<LoginRecord> {
        match &self.password {
            Some(password) => Ok(LoginRecord::new(self.user.clone(), password.clone())),
            None => {
                error!(env = PASSWORD_ENV, "Collmex password missing in environment");
                bail!("{PASSWORD_ENV} environment variable not set; it is required for uploads")
            }
        }
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/cgi-bin/cgi.exe?{},0,data_exchange",
            self.base_url.trim_end_matches('/'),
            self.customer_id
        )
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    collmex: CollmexSection,
    conversion: ConversionSection,
}

#[derive(Debug, Deserialize)]
struct CollmexSection {
    #[serde(deserialize_with = "string_or_number")]
    customer_id: String,
    #[serde(deserialize_with = "string_or_number")]
    user: String,
    #[serde(default)]
    use_api: bool,
    #[serde(default)]
    base_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConversionSection {
    employee_id: u32,
    company_id: u32,
    #[serde(default)]
    id_marker: Option<MarkerSection>,
    #[serde(default)]
    break_time: Option<String>,
    #[serde(default)]
    strict: Option<bool>,
    #[serde(default)]
    midnight_end: MidnightEnd,
}

#[derive(Debug, Deserialize)]
struct MarkerSection {
    start: String,
    end: String,
}

/// Collmex numbers are often written unquoted in YAML; accept both forms.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text.trim().to_string(),
        Raw::Number(number) => number.to_string(),
    })
}

fn single_char(key: &str, value: &str) -> Result<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => {
            error!(key, value, "Marker must be a single character");
            bail!("conversion.id_marker.{key} must be a single character, got {value:?}")
        }
    }
}

/// Loads a static YAML config file (no secrets) and injects the password from the environment.
/// Returns a processable CLI config for use by the CLI.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: RawConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if raw.collmex.customer_id.is_empty() || raw.collmex.user.is_empty() {
        error!("collmex.customer_id and collmex.user must not be empty");
        bail!("collmex.customer_id and collmex.user must not be empty");
    }
    if raw.conversion.employee_id == 0 || raw.conversion.company_id == 0 {
        error!(
            employee_id = raw.conversion.employee_id,
            company_id = raw.conversion.company_id,
            "Collmex ids start at 1"
        );
        bail!("conversion.employee_id and conversion.company_id must be positive");
    }

    let markers = match &raw.conversion.id_marker {
        Some(marker) => IdMarkers::new(
            single_char("start", &marker.start)?,
            single_char("end", &marker.end)?,
        ),
        None => IdMarkers::default(),
    };

    let break_time = raw
        .conversion
        .break_time
        .unwrap_or_else(|| DEFAULT_BREAK_TIME.to_string());
    if !break_time.is_empty() && !is_time(&break_time) {
        error!(break_time = %break_time, "Break time must be HH:MM");
        bail!("conversion.break_time must be an HH:MM time or empty, got {break_time:?}");
    }

    let conversion = ConversionSettings {
        employee_id: raw.conversion.employee_id,
        company_id: raw.conversion.company_id,
        markers,
        break_time,
        strict: raw.conversion.strict.unwrap_or(true),
        midnight_end: raw.conversion.midnight_end,
    };

    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) if !password.is_empty() => {
            info!(env = PASSWORD_ENV, "Collmex password found in env");
            Some(password)
        }
        _ => {
            if raw.collmex.use_api {
                warn!(env = PASSWORD_ENV, "use_api is set but no password is in the environment");
            }
            None
        }
    };

    let collmex = CollmexSettings {
        customer_id: raw.collmex.customer_id,
        user: raw.collmex.user,
        password,
        use_api: raw.collmex.use_api,
        base_url: raw
            .collmex
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
    };

    info!(
        customer_id = %collmex.customer_id,
        use_api = collmex.use_api,
        "Config loaded and merged successfully"
    );

    Ok(CliConfig {
        collmex,
        conversion,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(base_url: &str) -> CollmexSettings {
        CollmexSettings {
            customer_id: "111111".into(),
            user: "2222222".into(),
            password: None,
            use_api: true,
            base_url: base_url.into(),
        }
    }

    #[test]
    fn endpoint_targets_the_data_exchange_cgi() {
        assert_eq!(
            settings("https://www.collmex.de/").endpoint(),
            "https://www.collmex.de/cgi-bin/cgi.exe?111111,0,data_exchange"
        );
    }

    #[test]
    fn login_requires_a_password() {
        let without = settings(DEFAULT_BASE_URL);
        assert!(without.login().is_err());

        let with = CollmexSettings {
            password: Some("secret".into()),
            ..without
        };
        assert_eq!(with.login().unwrap(), LoginRecord::new("2222222", "secret"));
    }

    #[test]
    fn debug_output_hides_the_password() {
        let with = CollmexSettings {
            password: Some("hunter2".into()),
            ..settings(DEFAULT_BASE_URL)
        };
        let shown = format!("{with:?}");
        assert!(shown.contains("password_set: true"));
        assert!(!shown.contains("hunter2"));
    }

    #[test]
    fn markers_must_be_single_characters() {
        assert_eq!(single_char("start", "{").unwrap(), '{');
        assert!(single_char("start", "").is_err());
        assert!(single_char("end", "]]").is_err());
    }
}
