//! Container and package identifiers.

use uuid::Uuid;

/// Identifiers for one assembled package.
///
/// The profile nests a sub-package inside the package under the same
/// identifier. Only one value is stored; [`sub_package_id`] returns it.
///
/// [`sub_package_id`]: PackageIdentity::sub_package_id
///
/// # Examples
///
/// ```
/// use dias_core::PackageIdentity;
///
/// let identity = PackageIdentity::generate();
/// assert_eq!(identity.package_id(), identity.sub_package_id());
/// assert_ne!(identity.container_id(), identity.package_id());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageIdentity {
    container_id: String,
    package_id: String,
}

impl PackageIdentity {
    /// Generates fresh random (v4) identifiers.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            container_id: Uuid::new_v4().to_string(),
            package_id: Uuid::new_v4().to_string(),
        }
    }

    /// Builds an identity from known values.
    #[must_use]
    pub fn from_parts(container_id: impl Into<String>, package_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            package_id: package_id.into(),
        }
    }

    /// Outermost container id (AIC).
    #[must_use]
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Package id (AIP).
    #[must_use]
    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    /// Sub-package id (SIP); always the package id.
    #[must_use]
    pub fn sub_package_id(&self) -> &str {
        &self.package_id
    }
}

/// Prefixes an identifier for use as an XML `ID` attribute.
pub(crate) fn xml_id() -> String {
    format!("ID{}", Uuid::new_v4())
}
