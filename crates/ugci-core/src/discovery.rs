//! Discovery thresholds: window durations, clustering, validation and proof
//! settings.
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! `UGCI_*` environment overrides. The result is validated before use.

use std::env::VarError;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Longest span any discovery window may cover: ten years.
pub const MAX_WINDOW_HOURS: u32 = 24 * 365 * 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowSettings {
    #[serde(rename = "early_detection")]
    pub early_detection_hours: u32,
    #[serde(rename = "validation")]
    pub validation_hours: u32,
    #[serde(rename = "saturation")]
    pub saturation_hours: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            early_detection_hours: 48,
            validation_hours: 168,
            saturation_hours: 336,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusteringSettings {
    /// Minimum number of posts two hashtags must share to seed a cluster.
    pub min_shared_hashtags: usize,
    pub min_posts_per_cluster: usize,
    /// Jaccard similarity at or above which two clusters merge.
    pub hashtag_similarity: f64,
    pub creator_diversity_weight: f64,
    pub engagement_strength_weight: f64,
    pub velocity_weight: f64,
    /// Union merged key sets and repeat the merge pass until nothing changes.
    pub transitive_merge: bool,
}

impl Default for ClusteringSettings {
    fn default() -> Self {
        Self {
            min_shared_hashtags: 2,
            min_posts_per_cluster: 3,
            hashtag_similarity: 0.5,
            creator_diversity_weight: 0.4,
            engagement_strength_weight: 0.3,
            velocity_weight: 0.3,
            transitive_merge: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationSettings {
    pub min_creators: u32,
    pub min_regions: u32,
    pub confidence_threshold: f64,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            min_creators: 10,
            min_regions: 2,
            confidence_threshold: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProofSettings {
    pub urgency_threshold: f64,
}

impl Default for ProofSettings {
    fn default() -> Self {
        Self {
            urgency_threshold: 0.8,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    pub windows: WindowSettings,
    pub clustering: ClusteringSettings,
    pub validation: ValidationSettings,
    pub proof: ProofSettings,
}

impl DiscoveryConfig {
    /// Parse a YAML document. Omitted sections and keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DiscoveryFileParse`] for malformed YAML or unknown keys.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Check thresholds and weights.
    ///
    /// Weights that do not sum to roughly 1.0 are allowed but logged.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] describing the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let windows = &self.windows;
        for (name, hours) in [
            ("early_detection", windows.early_detection_hours),
            ("validation", windows.validation_hours),
            ("saturation", windows.saturation_hours),
        ] {
            if hours == 0 {
                return Err(ConfigError::Validation(format!(
                    "window '{name}' must span at least one hour"
                )));
            }
            if hours > MAX_WINDOW_HOURS {
                return Err(ConfigError::Validation(format!(
                    "window '{name}' must span at most {MAX_WINDOW_HOURS} hours, got {hours}"
                )));
            }
        }

        let clustering = &self.clustering;
        if clustering.min_shared_hashtags == 0 {
            return Err(ConfigError::Validation(
                "min_shared_hashtags must be at least 1".to_string(),
            ));
        }

        for (name, value) in [
            ("hashtag_similarity", clustering.hashtag_similarity),
            ("confidence_threshold", self.validation.confidence_threshold),
            ("urgency_threshold", self.proof.urgency_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        let weights = [
            ("creator_diversity_weight", clustering.creator_diversity_weight),
            ("engagement_strength_weight", clustering.engagement_strength_weight),
            ("velocity_weight", clustering.velocity_weight),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "{name} must be a non-negative number, got {weight}"
                )));
            }
        }

        let sum: f64 = weights.iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > 0.01 {
            tracing::warn!(
                sum,
                "health weights do not sum to 1.0; scores will be scaled accordingly"
            );
        }

        Ok(())
    }
}

/// Load discovery settings from `path` (if present) and the process environment.
///
/// A missing file is not an error: defaults are used.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed, an override is
/// malformed, or the merged settings fail validation.
pub fn load_discovery_config(path: &Path) -> Result<DiscoveryConfig, ConfigError> {
    let base = match std::fs::read_to_string(path) {
        Ok(content) => DiscoveryConfig::from_yaml_str(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "discovery config not found; using defaults");
            DiscoveryConfig::default()
        }
        Err(e) => {
            return Err(ConfigError::DiscoveryFileIo {
                path: path.display().to_string(),
                source: e,
            })
        }
    };

    let config = apply_env_overrides(base, |key| std::env::var(key))?;
    config.validate()?;
    Ok(config)
}

pub(crate) fn apply_env_overrides<F>(
    mut config: DiscoveryConfig,
    lookup: F,
) -> Result<DiscoveryConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let windows = &mut config.windows;
    override_with(&lookup, "UGCI_EARLY_DETECTION_HOURS", &mut windows.early_detection_hours)?;
    override_with(&lookup, "UGCI_VALIDATION_HOURS", &mut windows.validation_hours)?;
    override_with(&lookup, "UGCI_SATURATION_HOURS", &mut windows.saturation_hours)?;

    let clustering = &mut config.clustering;
    override_with(&lookup, "UGCI_MIN_SHARED_HASHTAGS", &mut clustering.min_shared_hashtags)?;
    override_with(&lookup, "UGCI_MIN_POSTS_PER_CLUSTER", &mut clustering.min_posts_per_cluster)?;
    override_with(&lookup, "UGCI_HASHTAG_SIMILARITY", &mut clustering.hashtag_similarity)?;
    override_with(
        &lookup,
        "UGCI_CREATOR_DIVERSITY_WEIGHT",
        &mut clustering.creator_diversity_weight,
    )?;
    override_with(
        &lookup,
        "UGCI_ENGAGEMENT_STRENGTH_WEIGHT",
        &mut clustering.engagement_strength_weight,
    )?;
    override_with(&lookup, "UGCI_VELOCITY_WEIGHT", &mut clustering.velocity_weight)?;

    let validation = &mut config.validation;
    override_with(&lookup, "UGCI_MIN_CREATORS", &mut validation.min_creators)?;
    override_with(&lookup, "UGCI_MIN_REGIONS", &mut validation.min_regions)?;
    override_with(&lookup, "UGCI_CONFIDENCE_THRESHOLD", &mut validation.confidence_threshold)?;

    override_with(&lookup, "UGCI_URGENCY_THRESHOLD", &mut config.proof.urgency_threshold)?;

    Ok(config)
}

fn override_with<T, F>(lookup: &F, var: &str, target: &mut T) -> Result<(), ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Result<String, VarError>,
{
    if let Ok(raw) = lookup(var) {
        *target = raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.windows.early_detection_hours, 48);
        assert_eq!(config.windows.validation_hours, 168);
        assert_eq!(config.windows.saturation_hours, 336);
        assert_eq!(config.clustering.min_shared_hashtags, 2);
        assert_eq!(config.clustering.min_posts_per_cluster, 3);
        assert!((config.clustering.hashtag_similarity - 0.5).abs() < f64::EPSILON);
        assert!(!config.clustering.transitive_merge);
        assert_eq!(config.validation.min_creators, 10);
        assert_eq!(config.validation.min_regions, 2);
        assert!((config.validation.confidence_threshold - 0.7).abs() < f64::EPSILON);
        assert!((config.proof.urgency_threshold - 0.8).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn yaml_overrides_only_the_keys_it_names() {
        let yaml = "windows:\n  early_detection: 24\nclustering:\n  min_posts_per_cluster: 5\n";
        let config = DiscoveryConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.windows.early_detection_hours, 24);
        assert_eq!(config.windows.validation_hours, 168);
        assert_eq!(config.clustering.min_posts_per_cluster, 5);
        assert_eq!(config.clustering.min_shared_hashtags, 2);
    }

    #[test]
    fn yaml_rejects_unknown_keys() {
        let result = DiscoveryConfig::from_yaml_str("clustering:\n  min_shared_tags: 3\n");
        assert!(matches!(result, Err(ConfigError::DiscoveryFileParse(_))));
    }

    #[test]
    fn empty_yaml_means_defaults() {
        assert_eq!(
            DiscoveryConfig::from_yaml_str("  \n").unwrap(),
            DiscoveryConfig::default()
        );
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let mut map = HashMap::new();
        map.insert("UGCI_VALIDATION_HOURS", "72");
        map.insert("UGCI_HASHTAG_SIMILARITY", "0.6");
        map.insert("UGCI_MIN_CREATORS", "4");
        map.insert("UGCI_URGENCY_THRESHOLD", " 0.9 ");
        let config =
            apply_env_overrides(DiscoveryConfig::default(), lookup_from_map(&map)).unwrap();
        assert_eq!(config.windows.validation_hours, 72);
        assert!((config.clustering.hashtag_similarity - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.validation.min_creators, 4);
        assert!((config.proof.urgency_threshold - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_env_override_names_the_variable() {
        let mut map = HashMap::new();
        map.insert("UGCI_MIN_REGIONS", "two");
        let result = apply_env_overrides(DiscoveryConfig::default(), lookup_from_map(&map));
        assert!(
            matches!(
                result,
                Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "UGCI_MIN_REGIONS"
            ),
            "expected InvalidEnvVar(UGCI_MIN_REGIONS), got: {result:?}"
        );
    }

    #[test]
    fn validate_rejects_zero_min_shared_hashtags() {
        let mut config = DiscoveryConfig::default();
        config.clustering.min_shared_hashtags = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_out_of_range_thresholds() {
        let mut config = DiscoveryConfig::default();
        config.clustering.hashtag_similarity = 1.2;
        assert!(config.validate().is_err());

        let mut config = DiscoveryConfig::default();
        config.validation.confidence_threshold = -0.1;
        assert!(config.validate().is_err());

        let mut config = DiscoveryConfig::default();
        config.proof.urgency_threshold = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_negative_weight_and_zero_window() {
        let mut config = DiscoveryConfig::default();
        config.clustering.velocity_weight = -0.3;
        assert!(config.validate().is_err());

        let mut config = DiscoveryConfig::default();
        config.windows.saturation_hours = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_bounds_window_hours() {
        let mut config = DiscoveryConfig::default();
        config.windows.saturation_hours = MAX_WINDOW_HOURS;
        assert!(config.validate().is_ok());

        config.windows.saturation_hours = u32::MAX;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("saturation"), "{err}");
    }

    #[test]
    fn huge_window_override_is_rejected_at_load() {
        let map = HashMap::from([("UGCI_SATURATION_HOURS", "4294967295")]);
        let config =
            apply_env_overrides(DiscoveryConfig::default(), lookup_from_map(&map)).unwrap();
        assert_eq!(config.windows.saturation_hours, u32::MAX);
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_accepts_weights_that_do_not_sum_to_one() {
        let mut config = DiscoveryConfig::default();
        config.clustering.creator_diversity_weight = 0.1;
        config.clustering.engagement_strength_weight = 0.1;
        config.clustering.velocity_weight = 0.1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = Path::new("/nonexistent/ugci/discovery.yaml");
        let result = load_discovery_config(path);
        assert!(result.is_ok(), "expected defaults, got: {result:?}");
    }

    #[test]
    fn shipped_discovery_yaml_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("discovery.yaml");
        let content = std::fs::read_to_string(&path).unwrap();
        let config = DiscoveryConfig::from_yaml_str(&content).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config, DiscoveryConfig::default());
    }
}
