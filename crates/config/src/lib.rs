//! Configuration models and loaders for propagation scenarios.

use std::fs::File;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Attracting-body entry parsed from a YAML catalog.
#[derive(Debug, Deserialize, Clone)]
pub struct AttractorConfig {
    pub name: String,
    pub mu_km3_s2: f64,
}

/// Initial classical elements in a scenario manifest. Angles in degrees for
/// readability; conversion to radians happens at the library boundary.
#[derive(Debug, Deserialize, Clone)]
pub struct OrbitConfig {
    pub p_km: f64,
    pub ecc: f64,
    pub inc_deg: f64,
    pub raan_deg: f64,
    pub argp_deg: f64,
    pub nu_deg: f64,
}

/// Kepler-solver selection in scenario manifests.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum SolverConfig {
    Farnocchia,
    Danby,
    Markley,
    Mikkola,
    Gooding,
    #[serde(other)]
    Unsupported,
}

/// Propagation block of a scenario manifest.
#[derive(Debug, Deserialize, Clone)]
pub struct PropagationConfig {
    pub tof_s: f64,
    /// Number of sample points along the arc; the library default applies
    /// when omitted.
    #[serde(default)]
    pub samples: Option<usize>,
    pub solver: SolverConfig,
}

/// A full propagation scenario.
#[derive(Debug, Deserialize, Clone)]
pub struct ScenarioConfig {
    pub attractor: AttractorConfig,
    pub orbit: OrbitConfig,
    pub propagation: PropagationConfig,
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Load an attractor catalog from a YAML file.
pub fn load_attractors<P: AsRef<Path>>(path: P) -> Result<Vec<AttractorConfig>, ConfigError> {
    let reader = File::open(path)?;
    let attractors: Vec<AttractorConfig> = serde_yaml::from_reader(reader)?;
    for attractor in &attractors {
        validate_attractor(attractor)?;
    }
    Ok(attractors)
}

/// Load and validate a scenario manifest from a TOML file.
pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<ScenarioConfig, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    let scenario: ScenarioConfig = toml::from_str(&text)?;
    validate_scenario(&scenario)?;
    Ok(scenario)
}

/// Validate an attractor entry.
pub fn validate_attractor(attractor: &AttractorConfig) -> Result<(), ConfigError> {
    if !(attractor.mu_km3_s2 > 0.0) {
        return Err(ConfigError::Invalid(format!(
            "attractor '{}' must have a positive gravitational parameter, got {}",
            attractor.name, attractor.mu_km3_s2
        )));
    }
    Ok(())
}

/// Validate a scenario manifest.
pub fn validate_scenario(scenario: &ScenarioConfig) -> Result<(), ConfigError> {
    validate_attractor(&scenario.attractor)?;

    let orbit = &scenario.orbit;
    if !(orbit.p_km > 0.0) {
        return Err(ConfigError::Invalid(format!(
            "semi-latus rectum must be positive, got {}",
            orbit.p_km
        )));
    }
    if !(orbit.ecc >= 0.0) {
        return Err(ConfigError::Invalid(format!(
            "eccentricity must be non-negative, got {}",
            orbit.ecc
        )));
    }
    if !(0.0..=180.0).contains(&orbit.inc_deg) {
        return Err(ConfigError::Invalid(format!(
            "inclination must lie in [0, 180] degrees, got {}",
            orbit.inc_deg
        )));
    }

    let propagation = &scenario.propagation;
    if !propagation.tof_s.is_finite() {
        return Err(ConfigError::Invalid(format!(
            "time of flight must be finite, got {}",
            propagation.tof_s
        )));
    }
    if let Some(samples) = propagation.samples {
        if samples < 2 {
            return Err(ConfigError::Invalid(format!(
                "at least two samples are required, got {samples}"
            )));
        }
    }
    Ok(())
}
