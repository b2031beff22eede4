//! Package metadata record.
//!
//! [`PackageMetadata`] is the caller-supplied description of one package:
//! type and record status, the six agent-role groups, the submission
//! agreement with its date coverage, the optional relation to an earlier
//! package, and user-defined provenance events and agents.
//!
//! Every optional text field treats a blank string as absent.

use crate::PackageError;
use crate::Result;
use crate::creation::preflight::PreflightReport;
use serde::Deserialize;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Package type written to the METS `TYPE` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PackageType {
    /// Submission information package.
    #[default]
    Sip,
    /// Archival information package.
    Aip,
    /// Dissemination information package.
    Dip,
    /// Archival information unit.
    Aiu,
    /// Archival information collection.
    Aic,
}

impl PackageType {
    /// Returns the upper-case profile code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sip => "SIP",
            Self::Aip => "AIP",
            Self::Dip => "DIP",
            Self::Aiu => "AIU",
            Self::Aic => "AIC",
        }
    }

    /// Resolves a free-form value; anything unrecognised becomes `SIP`.
    ///
    /// # Examples
    ///
    /// ```
    /// use dias_core::PackageType;
    ///
    /// assert_eq!(PackageType::resolve(" aip "), PackageType::Aip);
    /// assert_eq!(PackageType::resolve("archive"), PackageType::Sip);
    /// ```
    #[must_use]
    pub fn resolve(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "AIP" => Self::Aip,
            "DIP" => Self::Dip,
            "AIU" => Self::Aiu,
            "AIC" => Self::Aic,
            _ => Self::Sip,
        }
    }
}

impl From<String> for PackageType {
    fn from(value: String) -> Self {
        Self::resolve(&value)
    }
}

impl From<PackageType> for String {
    fn from(value: PackageType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record status written to the METS `RECORDSTATUS` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RecordStatus {
    /// First submission of this content.
    #[default]
    New,
    /// Adds to an earlier package.
    Supplement,
    /// Replaces an earlier package.
    Replacement,
    /// Test submission.
    Test,
    /// New version of an earlier package.
    Version,
    /// Any other status.
    Other,
}

impl RecordStatus {
    /// Returns the upper-case profile code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Supplement => "SUPPLEMENT",
            Self::Replacement => "REPLACEMENT",
            Self::Test => "TEST",
            Self::Version => "VERSION",
            Self::Other => "OTHER",
        }
    }

    /// Returns `true` if this status links the package to an earlier one.
    #[must_use]
    pub const fn is_relational(self) -> bool {
        matches!(self, Self::Supplement | Self::Replacement)
    }

    /// Relation type implied by the status when none is given explicitly.
    #[must_use]
    pub const fn default_relation_type(self) -> Option<&'static str> {
        match self {
            Self::Supplement => Some("supplements"),
            Self::Replacement => Some("replaces"),
            _ => None,
        }
    }
}

impl FromStr for RecordStatus {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" | "NEW" => Ok(Self::New),
            "SUPPLEMENT" => Ok(Self::Supplement),
            "REPLACEMENT" => Ok(Self::Replacement),
            "TEST" => Ok(Self::Test),
            "VERSION" => Ok(Self::Version),
            "OTHER" => Ok(Self::Other),
            _ => Err(PackageError::InvalidInput {
                field: "record_status".to_string(),
                message: format!("unknown record status '{s}'"),
            }),
        }
    }
}

impl TryFrom<String> for RecordStatus {
    type Error = PackageError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RecordStatus> for String {
    fn from(value: RecordStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Archivist organization and the system that produced the content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchivistAgents {
    /// Archivist organization.
    pub organization: Option<String>,
    /// Name of the producing system.
    pub software_name: Option<String>,
    /// Version of the producing system.
    pub software_version: Option<String>,
    /// Format of the exported data.
    pub software_format: Option<String>,
}

/// Organization that created the content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatorAgents {
    /// Creator organization.
    pub organization: Option<String>,
}

/// Producer of the submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerAgents {
    /// Producing organization.
    pub organization: Option<String>,
    /// Producing person.
    pub individual: Option<String>,
    /// Producing software.
    pub software: Option<String>,
}

/// Submitter of the package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitterAgents {
    /// Submitting organization.
    pub organization: Option<String>,
    /// Submitting person.
    pub individual: Option<String>,
}

/// Owner of the intellectual property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpOwnerAgents {
    /// Owning organization.
    pub organization: Option<String>,
}

/// Organization responsible for preservation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreservationAgents {
    /// Preserving organization.
    pub organization: Option<String>,
}

/// Link to an earlier container or package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Relation {
    /// Container id of the related package.
    pub related_container_id: Option<String>,
    /// Package id of the related package.
    pub related_package_id: Option<String>,
    /// Explicit relation type; derived from the record status when absent.
    pub relation_type: Option<String>,
}

impl Relation {
    /// Returns `true` if no relation field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        non_blank(self.related_container_id.as_ref()).is_none()
            && non_blank(self.related_package_id.as_ref()).is_none()
            && non_blank(self.relation_type.as_ref()).is_none()
    }
}

/// User-defined provenance event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvenanceEvent {
    /// Event type, `Creation` by default.
    pub event_type: String,
    /// Free-text event detail.
    pub detail: String,
    /// Outcome code, `0` means success.
    pub outcome: String,
    /// Free-text outcome detail; omitted from the document when blank.
    pub outcome_detail: String,
    /// Event timestamp; blank means the time the document is generated.
    pub date: String,
    /// Include in the package-level log.
    pub include_package: bool,
    /// Include in the container-level log.
    pub include_container: bool,
}

impl Default for ProvenanceEvent {
    fn default() -> Self {
        Self {
            event_type: "Creation".to_string(),
            detail: String::new(),
            outcome: "0".to_string(),
            outcome_detail: String::new(),
            date: String::new(),
            include_package: true,
            include_container: true,
        }
    }
}

/// User-defined provenance agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvenanceAgent {
    /// Agent name.
    pub name: String,
    /// Agent type, `software` by default.
    pub agent_type: String,
    /// Identifier type, `NO/RA` by default.
    pub identifier_type: String,
    /// Identifier value.
    pub identifier_value: String,
    /// Include in the package-level log.
    pub include_package: bool,
    /// Include in the container-level log.
    pub include_container: bool,
}

impl Default for ProvenanceAgent {
    fn default() -> Self {
        Self {
            name: String::new(),
            agent_type: "software".to_string(),
            identifier_type: "NO/RA".to_string(),
            identifier_value: String::new(),
            include_package: true,
            include_container: true,
        }
    }
}

/// Events and agents selected for one provenance document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvenanceSet {
    /// Events in their configured order.
    pub events: Vec<ProvenanceEvent>,
    /// Agents in their configured order.
    pub agents: Vec<ProvenanceAgent>,
}

/// Metadata describing one package.
///
/// # Examples
///
/// ```
/// use dias_core::PackageMetadata;
/// use dias_core::RecordStatus;
///
/// let mut metadata = PackageMetadata::default();
/// metadata.record_status = RecordStatus::Supplement;
/// metadata.relation.related_container_id = Some("X".into());
///
/// assert_eq!(metadata.resolved_relation_type().as_deref(), Some("supplements"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageMetadata {
    /// Package type.
    pub package_type: PackageType,
    /// Record status.
    pub record_status: RecordStatus,
    /// Package label or title.
    pub label: String,
    /// Submission agreement identifier.
    pub submission_agreement: Option<String>,
    /// Start of the content period, `YYYY-MM-DD`.
    pub start_date: Option<String>,
    /// End of the content period, `YYYY-MM-DD`.
    pub end_date: Option<String>,
    /// Archivist role group.
    pub archivist: ArchivistAgents,
    /// Creator role group.
    pub creator: CreatorAgents,
    /// Producer role group.
    pub producer: ProducerAgents,
    /// Submitter role group.
    pub submitter: SubmitterAgents,
    /// IP owner role group.
    pub ipowner: IpOwnerAgents,
    /// Preservation role group.
    pub preservation: PreservationAgents,
    /// Relation to an earlier package.
    pub relation: Relation,
    /// User-defined provenance events.
    pub events: Vec<ProvenanceEvent>,
    /// User-defined provenance agents.
    pub agents: Vec<ProvenanceAgent>,
}

const REQUIRED_FIELDS: [(&str, &str); 5] = [
    ("label", "Label/Title"),
    ("archivist_organization", "Archivist Organization"),
    ("system_name", "System/Software Name"),
    ("creator_organization", "Creator Organization"),
    ("submission_agreement", "Submission Agreement ID"),
];

impl PackageMetadata {
    /// Loads a metadata record from a `.json`, `.xml` or `.toml` file.
    ///
    /// Any other extension is read as TOML. XML may be a METS submission
    /// description or a flat Dublin Core record.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::Metadata`] if the file cannot be read or
    /// does not describe a metadata record.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PackageError::Metadata(format!("cannot read {}: {e}", path.display()))
        })?;
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "json" => {
                serde_json::from_str(&contents).map_err(|e| PackageError::Metadata(e.to_string()))
            }
            "xml" => Self::from_xml_str(&contents),
            _ => Self::from_toml_str(&contents),
        }
    }

    /// Parses a metadata record from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::Metadata`] on malformed input.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| PackageError::Metadata(e.to_string()))
    }

    /// Parses a metadata record from METS or Dublin Core XML.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::Metadata`] on malformed input or an unknown
    /// record status.
    pub fn from_xml_str(contents: &str) -> Result<Self> {
        crate::xml::metadata_from_xml(contents).map_err(|e| PackageError::Metadata(e.to_string()))
    }

    /// Returns a commented TOML template listing every supported field.
    #[must_use]
    pub fn template_toml() -> &'static str {
        TEMPLATE
    }

    /// Checks that required fields are present and dates are well formed.
    pub fn validate(&self) -> PreflightReport {
        let mut report = PreflightReport::new();

        for (field, display) in REQUIRED_FIELDS {
            if self.field_value(field).is_none() {
                report.add_error(format!("{display} is required"), field);
            }
        }

        for (field, value) in [("start_date", &self.start_date), ("end_date", &self.end_date)] {
            if let Some(value) = non_blank(value.as_ref())
                && chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err()
            {
                report.add_warning(format!("{field} should be in ISO format (YYYY-MM-DD)"), field);
            }
        }

        if !self.record_status.is_relational() && !self.relation.is_empty() {
            report.add_warning(
                format!(
                    "Relation fields are ignored for record status {}",
                    self.record_status
                ),
                "relation",
            );
        }

        report
    }

    /// Relation type honoured for this record, if any.
    ///
    /// An explicit value is lower-cased; otherwise the record status
    /// supplies the default. Non-relational statuses never carry one.
    #[must_use]
    pub fn resolved_relation_type(&self) -> Option<String> {
        if !self.record_status.is_relational() {
            return None;
        }
        non_blank(self.relation.relation_type.as_ref())
            .map(str::to_lowercase)
            .or_else(|| self.record_status.default_relation_type().map(str::to_string))
    }

    /// Related container id, honoured only for relational statuses.
    #[must_use]
    pub fn related_container_id(&self) -> Option<&str> {
        self.relational_field(self.relation.related_container_id.as_ref())
    }

    /// Related package id, honoured only for relational statuses.
    #[must_use]
    pub fn related_package_id(&self) -> Option<&str> {
        self.relational_field(self.relation.related_package_id.as_ref())
    }

    /// Splits events and agents into package-level and container-level sets.
    #[must_use]
    pub fn split_provenance(&self) -> (ProvenanceSet, ProvenanceSet) {
        let package = ProvenanceSet {
            events: self.events.iter().filter(|e| e.include_package).cloned().collect(),
            agents: self.agents.iter().filter(|a| a.include_package).cloned().collect(),
        };
        let container = ProvenanceSet {
            events: self.events.iter().filter(|e| e.include_container).cloned().collect(),
            agents: self.agents.iter().filter(|a| a.include_container).cloned().collect(),
        };
        (package, container)
    }

    /// Non-blank value of a flat field name as used in findings.
    #[must_use]
    pub fn field_value(&self, field: &str) -> Option<&str> {
        let value = match field {
            "label" => return non_blank(Some(&self.label)),
            "archivist_organization" => self.archivist.organization.as_ref(),
            "system_name" => self.archivist.software_name.as_ref(),
            "system_version" => self.archivist.software_version.as_ref(),
            "system_format" => self.archivist.software_format.as_ref(),
            "creator_organization" => self.creator.organization.as_ref(),
            "producer_organization" => self.producer.organization.as_ref(),
            "producer_individual" => self.producer.individual.as_ref(),
            "producer_software" => self.producer.software.as_ref(),
            "submitter_organization" => self.submitter.organization.as_ref(),
            "submitter_individual" => self.submitter.individual.as_ref(),
            "ipowner_organization" => self.ipowner.organization.as_ref(),
            "preservation_organization" => self.preservation.organization.as_ref(),
            "submission_agreement" => self.submission_agreement.as_ref(),
            "start_date" => self.start_date.as_ref(),
            "end_date" => self.end_date.as_ref(),
            _ => None,
        };
        non_blank(value)
    }

    fn relational_field<'a>(&self, value: Option<&'a String>) -> Option<&'a str> {
        if self.record_status.is_relational() {
            non_blank(value)
        } else {
            None
        }
    }
}

/// Returns the trimmed value if it is present and not blank.
pub(crate) fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

const TEMPLATE: &str = r#"# DIAS package metadata
#
# Blank values are treated as absent.

# SIP, AIP, DIP, AIU or AIC
package_type = "SIP"
# NEW, SUPPLEMENT, REPLACEMENT, TEST, VERSION or OTHER
record_status = "NEW"
label = ""
submission_agreement = ""
# YYYY-MM-DD
start_date = ""
end_date = ""

[archivist]
organization = ""
software_name = ""
software_version = ""
software_format = ""

[creator]
organization = ""

[producer]
organization = ""
individual = ""
software = ""

[submitter]
organization = ""
individual = ""

[ipowner]
organization = ""

[preservation]
organization = ""

# Only used when record_status is SUPPLEMENT or REPLACEMENT.
[relation]
related_container_id = ""
related_package_id = ""
# Defaults to "supplements" or "replaces".
relation_type = ""

# Repeat for every additional provenance event.
# [[events]]
# event_type = "Creation"
# detail = ""
# outcome = "0"
# outcome_detail = ""
# date = ""
# include_package = true
# include_container = true

# Repeat for every additional provenance agent.
# [[agents]]
# name = ""
# agent_type = "software"
# identifier_type = "NO/RA"
# identifier_value = ""
# include_package = true
# include_container = true
"#;
