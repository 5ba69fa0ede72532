use serde::{Deserialize, Serialize};

/// Configuration from board.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    pub board: BoardInfo,
    #[serde(default)]
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardInfo {
    pub name: String,
    /// Id of the active status template
    #[serde(default = "default_template")]
    pub template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// Days added to a task's start when it has no end date.
    /// Default: see src/templates/board.toml
    #[serde(default = "default_duration_days")]
    pub default_duration_days: u32,
    /// Zoom level 1-5. Default: see src/templates/board.toml
    #[serde(default = "default_zoom")]
    pub zoom: u8,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        TimelineConfig {
            default_duration_days: default_duration_days(),
            zoom: default_zoom(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Seconds between auto-refresh ticks
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Upper bound on any single repository call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        RefreshConfig {
            interval_secs: default_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_template() -> String {
    "default".to_string()
}

/// Default: see src/templates/board.toml
fn default_duration_days() -> u32 {
    3
}

/// Default: see src/templates/board.toml
fn default_zoom() -> u8 {
    3
}

fn default_interval_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let config: BoardConfig = toml::from_str("[board]\nname = \"ops\"\n").unwrap();
        assert_eq!(config.board.name, "ops");
        assert_eq!(config.board.template, "default");
        assert_eq!(config.timeline.default_duration_days, 3);
        assert_eq!(config.timeline.zoom, 3);
        assert_eq!(config.refresh.interval_secs, 30);
        assert_eq!(config.refresh.request_timeout_secs, 10);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: BoardConfig =
            toml::from_str("[board]\nname = \"x\"\ntemplate = \"agile\"\n\n[timeline]\nzoom = 5\n")
                .unwrap();
        assert_eq!(config.board.template, "agile");
        assert_eq!(config.timeline.zoom, 5);
        assert_eq!(config.timeline.default_duration_days, 3);
    }
}
