//! Laboratory records and access capabilities.

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

/// A laboratory as known to the directory service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct Laboratory {
    pub laboratory_id: String,
    pub organization_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Bucket holding the laboratory's files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_bucket: Option<String>,
}

impl Laboratory {
    /// Creates a laboratory record without a name or bucket.
    pub fn new(laboratory_id: impl Into<String>, organization_id: impl Into<String>) -> Self {
        Self {
            laboratory_id: laboratory_id.into(),
            organization_id: organization_id.into(),
            name: None,
            s3_bucket: None,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the storage bucket.
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.s3_bucket = Some(bucket.into());
        self
    }

    /// Returns the prefix under which the laboratory's objects live.
    ///
    /// Always ends with the delimiter: `{organizationId}/{laboratoryId}/`.
    pub fn default_prefix(&self) -> String {
        format!("{}/{}/", self.organization_id, self.laboratory_id)
    }
}

/// A role that grants access to a laboratory's storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumIter, EnumString, IntoStaticStr)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    /// Administers every laboratory of the organization.
    OrganizationAdmin,
    /// Manages a single laboratory.
    LaboratoryManager,
    /// Works in a single laboratory.
    LaboratoryTechnician,
}

impl Capability {
    /// Capabilities that allow listing a laboratory's files.
    pub const STORAGE_READERS: [Self; 3] = [
        Self::OrganizationAdmin,
        Self::LaboratoryManager,
        Self::LaboratoryTechnician,
    ];

    /// Returns the group name that grants this capability for the laboratory.
    ///
    /// Grants look like `org/{org}/admin` or `org/{org}/lab/{lab}/manager`.
    pub fn grant(self, laboratory: &Laboratory) -> String {
        let org = &laboratory.organization_id;
        let lab = &laboratory.laboratory_id;
        match self {
            Self::OrganizationAdmin => format!("org/{org}/admin"),
            Self::LaboratoryManager => format!("org/{org}/lab/{lab}/manager"),
            Self::LaboratoryTechnician => format!("org/{org}/lab/{lab}/technician"),
        }
    }

    /// Returns `true` if any of the groups grants this capability.
    pub fn is_granted_by<S: AsRef<str>>(self, laboratory: &Laboratory, groups: &[S]) -> bool {
        let grant = self.grant(laboratory);
        groups.iter().any(|group| group.as_ref() == grant)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use strum::IntoEnumIterator;

    use super::*;

    fn laboratory() -> Laboratory {
        Laboratory::new("LAB-1", "ORG-1").with_bucket("genomics")
    }

    #[test]
    fn default_prefix() {
        assert_eq!(laboratory().default_prefix(), "ORG-1/LAB-1/");
    }

    #[test]
    fn deserializes_camel_case() {
        let lab: Laboratory = serde_json::from_value(json!({
            "laboratoryId": "LAB-1",
            "organizationId": "ORG-1",
            "s3Bucket": "genomics",
        }))
        .unwrap();
        assert_eq!(lab, laboratory());
    }

    #[test]
    fn grants() {
        let lab = laboratory();
        assert_eq!(Capability::OrganizationAdmin.grant(&lab), "org/ORG-1/admin");
        assert_eq!(
            Capability::LaboratoryManager.grant(&lab),
            "org/ORG-1/lab/LAB-1/manager"
        );
        assert_eq!(
            Capability::LaboratoryTechnician.grant(&lab),
            "org/ORG-1/lab/LAB-1/technician"
        );
    }

    #[test]
    fn grant_matching() {
        let lab = laboratory();
        let groups = ["org/ORG-1/lab/LAB-1/technician"];

        assert!(Capability::LaboratoryTechnician.is_granted_by(&lab, &groups));
        assert!(!Capability::LaboratoryManager.is_granted_by(&lab, &groups));

        let other = Laboratory::new("LAB-2", "ORG-1");
        assert!(!Capability::LaboratoryTechnician.is_granted_by(&other, &groups));
    }

    #[test]
    fn storage_readers_cover_every_capability() {
        assert_eq!(
            Capability::iter().count(),
            Capability::STORAGE_READERS.len()
        );
    }
}
