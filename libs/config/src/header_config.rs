//! Configuration header parsing
//!
//! A session opens with a structured-text header describing the experiment
//! and its encoding spaces. Stages read matrix sizes and encoding limits from
//! it to prepare reconstruction buffers.
//!
//! A malformed header must not take the process down: [`parse_header_config`]
//! logs the failure and returns `None`. Callers that want the reason use
//! [`try_parse_header_config`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Header parse failures
#[derive(Debug, Error)]
pub enum HeaderConfigError {
    #[error("Malformed configuration header: {0}")]
    Syntax(#[from] toml::de::Error),

    #[error("Invalid configuration header: {0}")]
    Invalid(String),
}

/// Parsed configuration header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderConfig {
    pub experimental_conditions: ExperimentalConditions,

    #[serde(default)]
    pub acquisition_system: Option<AcquisitionSystem>,

    /// One entry per encoding space, referenced by `encoding_space_ref`
    #[serde(rename = "encoding")]
    pub encodings: Vec<Encoding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentalConditions {
    pub h1_resonance_frequency_hz: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionSystem {
    #[serde(default)]
    pub system_vendor: Option<String>,
    #[serde(default)]
    pub system_model: Option<String>,
    #[serde(default)]
    pub system_field_strength_t: Option<f32>,
    #[serde(default)]
    pub receiver_channels: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encoding {
    pub encoded_space: EncodingSpace,
    pub recon_space: EncodingSpace,
    pub trajectory: TrajectoryType,
    #[serde(default)]
    pub encoding_limits: EncodingLimits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrajectoryType {
    Cartesian,
    Epi,
    Radial,
    GoldenAngle,
    Spiral,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingSpace {
    pub matrix_size: MatrixSize,
    pub field_of_view_mm: FieldOfView,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixSize {
    pub x: u16,
    pub y: u16,
    #[serde(default = "one")]
    pub z: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldOfView {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limit {
    pub minimum: u16,
    pub maximum: u16,
    pub center: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingLimits {
    pub kspace_encoding_step_1: Option<Limit>,
    pub kspace_encoding_step_2: Option<Limit>,
    pub average: Option<Limit>,
    pub slice: Option<Limit>,
    pub contrast: Option<Limit>,
    pub phase: Option<Limit>,
    pub repetition: Option<Limit>,
    pub set: Option<Limit>,
    pub segment: Option<Limit>,
}

fn one() -> u16 {
    1
}

impl HeaderConfig {
    pub fn validate(&self) -> Result<(), HeaderConfigError> {
        if self.encodings.is_empty() {
            return Err(HeaderConfigError::Invalid(
                "at least one encoding is required".to_string(),
            ));
        }

        for (i, encoding) in self.encodings.iter().enumerate() {
            for (name, space) in [
                ("encoded_space", &encoding.encoded_space),
                ("recon_space", &encoding.recon_space),
            ] {
                let m = space.matrix_size;
                if m.x == 0 || m.y == 0 || m.z == 0 {
                    return Err(HeaderConfigError::Invalid(format!(
                        "encoding {} {} has an empty matrix {}x{}x{}",
                        i, name, m.x, m.y, m.z
                    )));
                }
            }

            for limit in encoding.encoding_limits.iter().flatten() {
                if limit.minimum > limit.maximum
                    || limit.center < limit.minimum
                    || limit.center > limit.maximum
                {
                    return Err(HeaderConfigError::Invalid(format!(
                        "encoding {} has inconsistent limit {:?}",
                        i, limit
                    )));
                }
            }
        }
        Ok(())
    }

    /// Encoding space an acquisition refers to via `encoding_space_ref`
    pub fn encoding(&self, encoding_space_ref: u16) -> Option<&Encoding> {
        self.encodings.get(encoding_space_ref as usize)
    }
}

impl EncodingLimits {
    fn iter(&self) -> impl Iterator<Item = &Option<Limit>> {
        [
            &self.kspace_encoding_step_1,
            &self.kspace_encoding_step_2,
            &self.average,
            &self.slice,
            &self.contrast,
            &self.phase,
            &self.repetition,
            &self.set,
            &self.segment,
        ]
        .into_iter()
    }
}

/// Parse and validate a configuration header, reporting why it failed
pub fn try_parse_header_config(text: &str) -> Result<HeaderConfig, HeaderConfigError> {
    let config: HeaderConfig = toml::from_str(text)?;
    config.validate()?;
    debug!(
        encodings = config.encodings.len(),
        "Parsed configuration header"
    );
    Ok(config)
}

/// Parse a configuration header; failures are logged and yield `None`
pub fn parse_header_config(text: &str) -> Option<HeaderConfig> {
    match try_parse_header_config(text) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(error = %e, "Failed to parse configuration header");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = r#"
[experimental_conditions]
h1_resonance_frequency_hz = 63500000

[acquisition_system]
system_vendor = "Example"
receiver_channels = 8

[[encoding]]
trajectory = "cartesian"

[encoding.encoded_space]
matrix_size = { x = 256, y = 128, z = 1 }
field_of_view_mm = { x = 600.0, y = 300.0, z = 6.0 }

[encoding.recon_space]
matrix_size = { x = 128, y = 128 }
field_of_view_mm = { x = 300.0, y = 300.0, z = 6.0 }

[encoding.encoding_limits]
kspace_encoding_step_1 = { minimum = 0, maximum = 127, center = 64 }
slice = { minimum = 0, maximum = 0, center = 0 }
"#;

    #[test]
    fn test_parse_header() {
        let config = parse_header_config(HEADER).unwrap();
        assert_eq!(config.experimental_conditions.h1_resonance_frequency_hz, 63_500_000);
        assert_eq!(
            config.acquisition_system.as_ref().and_then(|s| s.receiver_channels),
            Some(8)
        );

        let encoding = config.encoding(0).unwrap();
        assert_eq!(encoding.trajectory, TrajectoryType::Cartesian);
        assert_eq!(encoding.encoded_space.matrix_size.x, 256);
        assert_eq!(encoding.recon_space.matrix_size.z, 1);
        assert_eq!(
            encoding.encoding_limits.kspace_encoding_step_1.map(|l| l.center),
            Some(64)
        );
        assert!(encoding.encoding_limits.phase.is_none());
        assert!(config.encoding(1).is_none());
    }

    #[test]
    fn test_malformed_header_is_absent() {
        assert!(parse_header_config("<ismrmrdHeader>").is_none());
        assert!(matches!(
            try_parse_header_config("[experimental_conditions"),
            Err(HeaderConfigError::Syntax(_))
        ));
    }

    #[test]
    fn test_invalid_header_is_absent() {
        let no_encodings = "encoding = []\n[experimental_conditions]\nh1_resonance_frequency_hz = 1\n";
        assert!(matches!(
            try_parse_header_config(no_encodings),
            Err(HeaderConfigError::Invalid(_))
        ));

        let bad_limit = HEADER.replace("maximum = 127, center = 64", "maximum = 127, center = 200");
        assert!(parse_header_config(&bad_limit).is_none());
    }
}
