//! Run configuration, resolved once at startup and passed around explicitly

use crate::requests::{Error, Result};

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Extension of the produced archive.
///
/// All three are plain zip containers, the extension only decides what the
/// file is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputExt {
    #[default]
    Cbz,
    Cbr,
    Zip,
}

impl OutputExt {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cbz => "cbz",
            Self::Cbr => "cbr",
            Self::Zip => "zip",
        }
    }
}

impl fmt::Display for OutputExt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputExt {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "cbz" => Ok(Self::Cbz),
            "cbr" => Ok(Self::Cbr),
            "zip" => Ok(Self::Zip),
            other => Err(format!("extension {other} not supported")),
        }
    }
}

/// Inclusive window of volumes targeted by one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeRange {
    pub from: u32,
    pub to: u32,
}

impl VolumeRange {
    pub fn single(volume: u32) -> Self {
        Self {
            from: volume,
            to: volume,
        }
    }

    pub fn is_single(&self) -> bool {
        self.from == self.to
    }

    /// Volume tags of the window, in ascending order. Chapters survive
    /// filtering only when their tag equals one of these exactly.
    pub fn tags(&self) -> Vec<String> {
        (self.from..=self.to).map(|v| v.to_string()).collect()
    }
}

impl fmt::Display for VolumeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            write!(f, "{}", self.from)
        } else {
            write!(f, "{}-{}", self.from, self.to)
        }
    }
}

/// Everything one run needs to know, never read from ambient process state
#[derive(Debug, Clone, bon::Builder)]
#[builder(on(String, into))]
pub struct Config {
    pub api_base_url: String,
    pub image_base_url: String,
    pub slug: String,
    pub volumes: VolumeRange,
    #[builder(default = 8)]
    pub workers: usize,
    #[builder(default)]
    pub extension: OutputExt,
    #[builder(default)]
    pub retain_staging: bool,
    #[builder(default = PathBuf::from("output"))]
    pub output_root: PathBuf,
    #[builder(default = PathBuf::from("tmp"))]
    pub staging_root: PathBuf,
    /// Minimum spacing between requests of the concurrent stages
    #[builder(default = Duration::from_millis(500))]
    pub request_pacing: Duration,
}

/// Reads an environment variable that the run cannot do without
pub fn required_env(name: &'static str) -> Result<String> {
    std::env::var(name).map_err(|_| Error::MissingEnvVar(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_round_trips_through_str() {
        for ext in [OutputExt::Cbz, OutputExt::Cbr, OutputExt::Zip] {
            assert_eq!(ext.as_str().parse::<OutputExt>().unwrap(), ext);
        }

        assert!("rar".parse::<OutputExt>().is_err());
    }

    #[test]
    fn volume_range_tags_are_ascending_strings() {
        assert_eq!(VolumeRange::single(3).tags(), vec!["3"]);
        assert_eq!(
            VolumeRange { from: 9, to: 11 }.tags(),
            vec!["9", "10", "11"]
        );
    }

    #[test]
    fn volume_range_display_matches_artifact_naming() {
        assert_eq!(VolumeRange::single(3).to_string(), "3");
        assert_eq!(VolumeRange { from: 3, to: 5 }.to_string(), "3-5");
    }

    #[test]
    fn config_builder_fills_defaults() {
        let config = Config::builder()
            .api_base_url("https://api.example.org")
            .image_base_url("https://img.example.org")
            .slug("example")
            .volumes(VolumeRange::single(1))
            .build();

        assert_eq!(config.workers, 8);
        assert_eq!(config.extension, OutputExt::Cbz);
        assert!(!config.retain_staging);
        assert_eq!(config.staging_root, PathBuf::from("tmp"));
        assert_eq!(config.request_pacing, Duration::from_millis(500));
    }
}
