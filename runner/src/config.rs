use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use engine::{MissionSpec, SimConfig};

// ============================================================================
// Logging
// ============================================================================

// RUST_LOG wins unless --verbose asks for debug output outright
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

// ============================================================================
// Input Files
// ============================================================================

pub fn load_mission(path: &Path) -> Result<MissionSpec> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read mission file {}", path.display()))?;
    MissionSpec::from_json_str(&text).with_context(|| format!("invalid mission file {}", path.display()))
}

// A standalone rules file replaces the mission's own `config` block
pub fn load_config(path: &Path) -> Result<SimConfig> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::Objective;

    #[test]
    fn bundled_missions_parse() {
        let breach = MissionSpec::from_json_str(include_str!("../../missions/breach.json")).expect("breach parses");
        assert_eq!(breach.objective, Objective::EliminateAll);
        assert_eq!(breach.crew.len(), 3);

        let blacksite =
            MissionSpec::from_json_str(include_str!("../../missions/blacksite.json")).expect("blacksite parses");
        assert_eq!(blacksite.objective, Objective::HackAndExtract);
        assert!(blacksite.definitions.is_some());

        let patrol = MissionSpec::from_json_str(include_str!("../../missions/patrol.json")).expect("patrol parses");
        assert!(patrol.config.crew_autopilot);
    }

    #[test]
    fn partial_config_files_fill_in_defaults() {
        let config: SimConfig = serde_json::from_str(r#"{ "ai_interval_ticks": 5 }"#).expect("config parses");
        assert_eq!(config.ai_interval_ticks, 5);
        assert_eq!(config.tick_rate_hz, SimConfig::default().tick_rate_hz);
    }

    #[test]
    fn missing_files_name_the_path() {
        let err = load_mission(Path::new("no/such/mission.json")).expect_err("missing file");
        assert!(err.to_string().contains("no/such/mission.json"));
    }
}
