use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use super::constants::{
    COCO_CLASS_NAMES, DEFAULT_CONFIDENCE, DEFAULT_INPUT_SIZE, DEFAULT_IOU_THRESHOLD,
    DEFAULT_TARGET_CLASS,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{name} must be between 0.0 and 1.0, got {value}")]
    OutOfRange { name: &'static str, value: f64 },
    #[error("input size must be positive")]
    ZeroInputSize,
    #[error("class table is empty")]
    NoClassNames,
    #[error("unknown target class '{0}'")]
    UnknownClass(String),
}

/// Class of interest, given either by name or by model class index.
///
/// Config files accept a JSON number or a string; strings go through
/// [`TargetClass::parse`] like CLI values, so `"2"` and `2` agree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TargetClass {
    Id(usize),
    Name(String),
}

impl<'de> Deserialize<'de> for TargetClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Id(usize),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Id(id) => TargetClass::Id(id),
            Raw::Text(text) => TargetClass::parse(&text),
        })
    }
}

impl TargetClass {
    /// Parses a CLI value: all-digit strings are class ids, anything else a name.
    pub fn parse(value: &str) -> Self {
        match value.parse::<usize>() {
            Ok(id) => TargetClass::Id(id),
            Err(_) => TargetClass::Name(value.to_string()),
        }
    }
}

impl fmt::Display for TargetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetClass::Id(id) => write!(f, "#{id}"),
            TargetClass::Name(name) => write!(f, "{name}"),
        }
    }
}

/// Run configuration for a detection session.
///
/// Every field has a default, so a JSON config file only needs the keys it
/// wants to change. Paths have no sensible default and are checked by
/// [`AppConfig::validate`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub video_path: Option<PathBuf>,
    pub model_path: Option<PathBuf>,
    pub class_names: Vec<String>,
    pub target_class: TargetClass,
    pub confidence_threshold: f64,
    pub iou_threshold: f64,
    pub input_size: u32,
    pub use_gpu: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            video_path: None,
            model_path: None,
            class_names: COCO_CLASS_NAMES.iter().map(|s| s.to_string()).collect(),
            target_class: TargetClass::Name(DEFAULT_TARGET_CLASS.to_string()),
            confidence_threshold: DEFAULT_CONFIDENCE,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            input_size: DEFAULT_INPUT_SIZE,
            use_gpu: false,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.video_path.is_none() {
            return Err(ConfigError::Missing("video path"));
        }
        if self.model_path.is_none() {
            return Err(ConfigError::Missing("model path"));
        }
        check_unit_range("confidence threshold", self.confidence_threshold)?;
        check_unit_range("IoU threshold", self.iou_threshold)?;
        if self.input_size == 0 {
            return Err(ConfigError::ZeroInputSize);
        }
        if self.class_names.is_empty() {
            return Err(ConfigError::NoClassNames);
        }
        self.target_class_id().map(|_| ())
    }

    /// Resolves the configured target class to a model class index.
    pub fn target_class_id(&self) -> Result<usize, ConfigError> {
        match &self.target_class {
            TargetClass::Id(id) if *id < self.class_names.len() => Ok(*id),
            TargetClass::Id(id) => Err(ConfigError::UnknownClass(id.to_string())),
            TargetClass::Name(name) => self
                .class_names
                .iter()
                .position(|n| n.eq_ignore_ascii_case(name))
                .ok_or_else(|| ConfigError::UnknownClass(name.clone())),
        }
    }

    pub fn class_name(&self, class_id: usize) -> Option<&str> {
        self.class_names.get(class_id).map(String::as_str)
    }
}

fn check_unit_range(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { name, value })
    }
}
