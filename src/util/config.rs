use std::sync::OnceLock;
use std::time::Duration;

use log::LevelFilter;

/// Names a `key = value` file read once at first use.
pub const CONFIG_ENV: &str = "MAPRENDER_CONFIG";
const TTL_ENV: &str = "MAPRENDER_SESSION_TTL_MS";
const EAGER_ENV: &str = "MAPRENDER_EAGER_SESSION";
const LOG_ENV: &str = "MAPRENDER_LOG";

/// Idle time after which a handle's engine session is rebuilt.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BridgeConfig {
    pub session_ttl: Duration,
    /// Build the engine session when the handle is created instead of on first render.
    pub eager_session: bool,
    pub log_level: LevelFilter,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            session_ttl: DEFAULT_SESSION_TTL,
            eager_session: false,
            log_level: if cfg!(feature = "verbose_logs") {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            },
        }
    }
}

static CONFIG: OnceLock<BridgeConfig> = OnceLock::new();

pub fn bridge_config() -> &'static BridgeConfig {
    CONFIG.get_or_init(read_config)
}

fn read_config() -> BridgeConfig {
    let mut cfg = BridgeConfig::default();

    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if let Ok(text) = std::fs::read_to_string(&path) {
            apply_config_text(&mut cfg, &text);
        }
    }

    if let Ok(value) = std::env::var(TTL_ENV) {
        apply_key(&mut cfg, "session_ttl_ms", &value);
    }
    if let Ok(value) = std::env::var(EAGER_ENV) {
        apply_key(&mut cfg, "eager_session", &value);
    }
    if let Ok(value) = std::env::var(LOG_ENV) {
        apply_key(&mut cfg, "log_level", &value);
    }

    cfg
}

/// Apply every recognised `key = value` line of `text` on top of `cfg`.
pub fn apply_config_text(cfg: &mut BridgeConfig, text: &str) {
    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.splitn(2, '=');
        let key = parts.next().unwrap_or("").trim();
        let value = parts.next().unwrap_or("").trim();
        apply_key(cfg, key, value);
    }
}

fn apply_key(cfg: &mut BridgeConfig, key: &str, value: &str) {
    let value = value.trim();
    if key.eq_ignore_ascii_case("session_ttl_ms") {
        if let Ok(ms) = value.parse::<u64>() {
            cfg.session_ttl = Duration::from_millis(ms);
        }
    } else if key.eq_ignore_ascii_case("eager_session") {
        cfg.eager_session = parse_flag(value);
    } else if key.eq_ignore_ascii_case("log_level") {
        if let Ok(level) = value.parse::<LevelFilter>() {
            cfg.log_level = level;
        }
    }
}

fn parse_flag(value: &str) -> bool {
    ["1", "true", "on", "yes"]
        .iter()
        .any(|v| value.eq_ignore_ascii_case(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_twenty_second_ttl() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.session_ttl, Duration::from_secs(20));
        assert!(!cfg.eager_session);
    }

    #[test]
    fn config_text_overrides_known_keys() {
        let mut cfg = BridgeConfig::default();
        apply_config_text(
            &mut cfg,
            "# renderer tuning\n\
             session_ttl_ms = 1500\n\
             \n\
             EAGER_SESSION=Yes\n\
             log_level = warn\n",
        );
        assert_eq!(cfg.session_ttl, Duration::from_millis(1500));
        assert!(cfg.eager_session);
        assert_eq!(cfg.log_level, LevelFilter::Warn);
    }

    #[test]
    fn bad_values_and_unknown_keys_keep_defaults() {
        let mut cfg = BridgeConfig::default();
        apply_config_text(&mut cfg, "session_ttl_ms = soon\nlog_level = loud\ncolour = red\nnoequals\n");
        assert_eq!(cfg, BridgeConfig::default());
    }

    #[test]
    fn flags_accept_common_spellings() {
        assert!(parse_flag("ON"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("off"));
    }
}
