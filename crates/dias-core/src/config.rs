//! Profile and pipeline configuration.
//!
//! The defaults encode the fixed DIAS profile used by the Norwegian
//! archives. Every value can be overridden from a TOML file or from
//! `DIAS_*` environment variables.

use crate::PackageError;
use crate::Result;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;

/// Smallest accepted chunk size for hashing and copying.
pub const MIN_CHUNK_SIZE: usize = 4 * 1024;

/// Configuration shared by the assembler, the XML generators and the
/// pre-flight checks.
///
/// # Examples
///
/// ```
/// use dias_core::PackagerConfig;
///
/// let config = PackagerConfig::default()
///     .with_preservation_platform("Preservation platform Test")
///     .with_disk_space_safety_margin(2.0);
///
/// assert_eq!(config.object_identifier_type, "NO/RA");
/// assert!((config.disk_space_safety_margin - 2.0).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagerConfig {
    /// Storage medium recorded on the whole-package PREMIS object.
    pub preservation_platform: String,

    /// Originator recorded on every PREMIS fixity block.
    pub checksum_originator: String,

    /// Agent linked to the automatic log-creation event.
    pub linking_agent: String,

    /// Numeric event type of the automatic log-creation event.
    pub log_creation_event_type: String,

    /// `xsi:schemaLocation` of the container wrapper document.
    pub mets_info_schema_location: String,

    /// `xsi:schemaLocation` of the package structural document.
    pub mets_sip_schema_location: String,

    /// METS `PROFILE` attribute.
    pub mets_profile: String,

    /// `xsi:schemaLocation` of the provenance documents.
    pub premis_schema_location: String,

    /// PREMIS `version` attribute.
    pub premis_version: String,

    /// Identifier type used for objects, events and linking identifiers.
    pub object_identifier_type: String,

    /// Safety margin applied on top of the estimated package size.
    pub disk_space_safety_margin: f64,

    /// Estimated working-space multiple of the source size.
    pub package_size_multiplier: f64,

    /// Read size used when hashing a finished file.
    pub hash_chunk_size: usize,

    /// Read size used when copying source files.
    pub copy_chunk_size: usize,

    /// Directory searched first for the two schema resources.
    pub schema_dir: Option<PathBuf>,
}

impl Default for PackagerConfig {
    fn default() -> Self {
        Self {
            preservation_platform: "Preservation platform ESSArch".to_string(),
            checksum_originator: "ESSArch".to_string(),
            linking_agent: "ESSArch".to_string(),
            log_creation_event_type: "10000".to_string(),
            mets_info_schema_location:
                "http://www.loc.gov/METS/ http://schema.arkivverket.no/METS/info.xsd".to_string(),
            mets_sip_schema_location:
                "http://www.loc.gov/METS/ http://schema.arkivverket.no/METS/mets.xsd".to_string(),
            mets_profile: "http://xml.ra.se/METS/RA_METS_eARD.xml".to_string(),
            premis_schema_location: "http://arkivverket.no/standarder/PREMIS \
                 http://schema.arkivverket.no/PREMIS/v2.0/DIAS_PREMIS.xsd"
                .to_string(),
            premis_version: "2.0".to_string(),
            object_identifier_type: "NO/RA".to_string(),
            disk_space_safety_margin: 1.5,
            package_size_multiplier: 3.0,
            hash_chunk_size: 64 * 1024,
            copy_chunk_size: 8 * 1024 * 1024,
            schema_dir: None,
        }
    }
}

impl PackagerConfig {
    /// Creates a configuration with profile defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a configuration from a TOML file.
    ///
    /// Keys missing from the file keep their default values.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::Config`] if the file cannot be read or parsed.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PackageError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::Config`] if the text is not valid TOML for
    /// this structure.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| PackageError::Config(e.to_string()))?;
        Ok(config.normalized())
    }

    /// Applies `DIAS_*` environment variable overrides.
    pub fn apply_env_overrides(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    ///
    /// Numeric values that fail to parse are ignored with a warning.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text_fields: [(&str, &mut String); 10] = [
            ("DIAS_PRESERVATION_PLATFORM", &mut self.preservation_platform),
            ("DIAS_CHECKSUM_ORIGINATOR", &mut self.checksum_originator),
            ("DIAS_LINKING_AGENT", &mut self.linking_agent),
            ("DIAS_LOG_CREATION_EVENT_TYPE", &mut self.log_creation_event_type),
            ("DIAS_METS_INFO_SCHEMA_LOCATION", &mut self.mets_info_schema_location),
            ("DIAS_METS_SIP_SCHEMA_LOCATION", &mut self.mets_sip_schema_location),
            ("DIAS_METS_PROFILE", &mut self.mets_profile),
            ("DIAS_PREMIS_SCHEMA_LOCATION", &mut self.premis_schema_location),
            ("DIAS_PREMIS_VERSION", &mut self.premis_version),
            ("DIAS_OBJECT_IDENTIFIER_TYPE", &mut self.object_identifier_type),
        ];
        for (key, field) in text_fields {
            if let Some(value) = lookup(key) {
                *field = value;
            }
        }

        if let Some(value) = parse_override::<f64>(&lookup, "DIAS_DISK_SPACE_SAFETY_MARGIN") {
            self.disk_space_safety_margin = value;
        }
        if let Some(value) = parse_override::<f64>(&lookup, "DIAS_PACKAGE_SIZE_MULTIPLIER") {
            self.package_size_multiplier = value;
        }
        if let Some(value) = parse_override::<usize>(&lookup, "DIAS_SHA256_CHUNK_SIZE") {
            self.hash_chunk_size = value;
        }
        if let Some(value) = parse_override::<usize>(&lookup, "DIAS_FILE_PROCESSOR_CHUNK_SIZE") {
            self.copy_chunk_size = value;
        }
        if let Some(value) = lookup("DIAS_SCHEMA_DIR") {
            self.schema_dir = Some(PathBuf::from(value));
        }

        self.normalized()
    }

    /// Sets the storage medium recorded on the package object.
    #[must_use]
    pub fn with_preservation_platform(mut self, platform: impl Into<String>) -> Self {
        self.preservation_platform = platform.into();
        self
    }

    /// Sets the safety margin for the disk-space estimate.
    #[must_use]
    pub fn with_disk_space_safety_margin(mut self, margin: f64) -> Self {
        self.disk_space_safety_margin = margin;
        self
    }

    /// Sets the working-space multiplier for the disk-space estimate.
    #[must_use]
    pub fn with_package_size_multiplier(mut self, multiplier: f64) -> Self {
        self.package_size_multiplier = multiplier;
        self
    }

    /// Sets the directory searched first for schema resources.
    #[must_use]
    pub fn with_schema_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.schema_dir = Some(dir.into());
        self
    }

    /// Sets the copy chunk size, clamped to [`MIN_CHUNK_SIZE`].
    #[must_use]
    pub fn with_copy_chunk_size(mut self, size: usize) -> Self {
        self.copy_chunk_size = size.max(MIN_CHUNK_SIZE);
        self
    }

    fn normalized(mut self) -> Self {
        self.hash_chunk_size = self.hash_chunk_size.max(MIN_CHUNK_SIZE);
        self.copy_chunk_size = self.copy_chunk_size.max(MIN_CHUNK_SIZE);
        self
    }
}

fn parse_override<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable configuration override");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_profile() {
        let config = PackagerConfig::default();
        assert_eq!(config.preservation_platform, "Preservation platform ESSArch");
        assert_eq!(config.log_creation_event_type, "10000");
        assert_eq!(config.premis_version, "2.0");
        assert_eq!(config.hash_chunk_size, 65536);
        assert_eq!(config.copy_chunk_size, 8 * 1024 * 1024);
        assert!(config.premis_schema_location.ends_with("DIAS_PREMIS.xsd"));
        assert!(config.schema_dir.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PackagerConfig::from_toml_str(
            r#"
            preservation_platform = "Local platform"
            package_size_multiplier = 2.5
            "#,
        )
        .unwrap();

        assert_eq!(config.preservation_platform, "Local platform");
        assert!((config.package_size_multiplier - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.checksum_originator, "ESSArch");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = PackagerConfig::from_toml_str("package_size_multiplier = \"lots\"").unwrap_err();
        assert!(matches!(err, PackageError::Config(_)));
    }

    #[test]
    fn test_overrides_apply_and_ignore_garbage() {
        let env: HashMap<&str, &str> = [
            ("DIAS_CHECKSUM_ORIGINATOR", "Archive X"),
            ("DIAS_DISK_SPACE_SAFETY_MARGIN", "not-a-number"),
            ("DIAS_PACKAGE_SIZE_MULTIPLIER", "4"),
            ("DIAS_SHA256_CHUNK_SIZE", "16"),
            ("DIAS_SCHEMA_DIR", "/opt/schemas"),
        ]
        .into_iter()
        .collect();

        let config = PackagerConfig::default()
            .apply_overrides(|key| env.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.checksum_originator, "Archive X");
        assert!((config.disk_space_safety_margin - 1.5).abs() < f64::EPSILON);
        assert!((config.package_size_multiplier - 4.0).abs() < f64::EPSILON);
        assert_eq!(config.hash_chunk_size, MIN_CHUNK_SIZE);
        assert_eq!(config.schema_dir, Some(PathBuf::from("/opt/schemas")));
    }

    #[test]
    fn test_copy_chunk_size_is_clamped() {
        let config = PackagerConfig::default().with_copy_chunk_size(1);
        assert_eq!(config.copy_chunk_size, MIN_CHUNK_SIZE);
    }

    #[test]
    fn test_disk_factor_builders() {
        let config = PackagerConfig::new()
            .with_package_size_multiplier(2.0)
            .with_disk_space_safety_margin(1.0);
        assert!((config.package_size_multiplier - 2.0).abs() < f64::EPSILON);
        assert!((config.disk_space_safety_margin - 1.0).abs() < f64::EPSILON);
    }
}
