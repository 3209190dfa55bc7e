use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "keyball-tutor";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME)
    }

    /// $HOME/.local/state/keyball-tutor, falling back to the platform data dir
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join(APP_NAME))
        } else {
            Self::project().map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn stats_json_path() -> PathBuf {
        Self::state_dir()
            .map(|d| d.join("stats.json"))
            .unwrap_or_else(|| PathBuf::from("keyball_tutor_stats.json"))
    }

    pub fn stats_db_path() -> PathBuf {
        Self::state_dir()
            .map(|d| d.join("stats.db"))
            .unwrap_or_else(|| PathBuf::from("keyball_tutor_stats.db"))
    }

    pub fn log_path() -> PathBuf {
        Self::state_dir()
            .map(|d| d.join("keyball-tutor.log"))
            .unwrap_or_else(|| PathBuf::from("keyball-tutor.log"))
    }

    pub fn config_path() -> PathBuf {
        Self::project()
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("keyball_tutor_config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_have_expected_file_names() {
        assert!(AppDirs::stats_json_path().ends_with("stats.json"));
        assert!(AppDirs::stats_db_path().ends_with("stats.db"));
        assert!(AppDirs::log_path().ends_with("keyball-tutor.log"));
        assert!(AppDirs::config_path().ends_with("config.json"));
    }
}
