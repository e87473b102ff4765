use crate::logging::LogConfig;
use rdpwn_runtime::{DEFAULT_SCREEN_HEIGHT, DEFAULT_SCREEN_WIDTH};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RunConfig {
    #[serde(default)]
    pub screen: ScreenConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScreenConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub save: bool,
    #[serde(default = "default_report")]
    pub report: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            save: false,
            report: default_report(),
        }
    }
}

fn default_width() -> u32 {
    DEFAULT_SCREEN_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_SCREEN_HEIGHT
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_report() -> bool {
    true
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let src = fs::read_to_string(path)
            .map_err(|err| format!("read run config {}: {err}", path.display()))?;
        let mut config = Self::parse(&src)?;
        if config.output.dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.output.dir = parent.join(&config.output.dir);
            }
        }
        Ok(config)
    }

    pub fn parse(src: &str) -> Result<Self, String> {
        let config: RunConfig =
            toml::from_str(src).map_err(|err| format!("invalid run config: {err}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.screen.width == 0 || self.screen.height == 0 {
            return Err("screen width and height must be non-zero".to_string());
        }
        if self.log.level.trim().is_empty() {
            return Err("log level is empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = RunConfig::parse("").expect("parse");
        assert_eq!(config.screen.width, 1024);
        assert_eq!(config.screen.height, 800);
        assert_eq!(config.output.dir, PathBuf::from("."));
        assert!(!config.output.save);
        assert!(config.output.report);
        assert_eq!(config.log.level, "warn");
        assert!(!config.log.json);
    }

    #[test]
    fn sections_override_defaults() {
        let config = RunConfig::parse(
            r#"
            [screen]
            width = 64
            height = 48

            [output]
            dir = "captures"
            save = true
            report = false

            [log]
            level = "debug"
            json = true
            "#,
        )
        .expect("parse");
        assert_eq!((config.screen.width, config.screen.height), (64, 48));
        assert_eq!(config.output.dir, PathBuf::from("captures"));
        assert!(config.output.save);
        assert!(!config.output.report);
        assert_eq!(config.log.level, "debug");
        assert!(config.log.json);
    }

    #[test]
    fn zero_screen_is_rejected() {
        let err = RunConfig::parse("[screen]\nwidth = 0\n").unwrap_err();
        assert!(err.contains("non-zero"), "{err}");
    }

    #[test]
    fn load_resolves_output_dir_next_to_config() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("rdpwn.toml");
        fs::write(&path, "[output]\ndir = \"out\"\n").expect("write config");
        let config = RunConfig::load(&path).expect("load");
        assert_eq!(config.output.dir, temp.path().join("out"));
    }
}
