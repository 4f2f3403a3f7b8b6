//! Data Model: SoftwareRecord, Instance, facets
//!
//! Records are built once when the catalog is fetched and never mutated in
//! place. Every filter and sort produces a new derived sequence.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unix epoch timestamp in milliseconds
pub type Timestamp = i64;

/// Identifier of a software record in the catalog
pub type SoftwareId = u64;

/// Identifier of an instance record
pub type InstanceId = u64;

/// Current time as a catalog timestamp
pub fn now_millis() -> Timestamp {
    Utc::now().timestamp_millis()
}

// ============================================================================
// ENVIRONMENTS
// ============================================================================

/// Runtime environment a software can be used in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Environment {
    Linux,
    Windows,
    Mac,
    Browser,
    Smartphone,
}

impl Environment {
    /// Every environment, in facet display order
    pub const ALL: [Environment; 5] = [
        Environment::Linux,
        Environment::Windows,
        Environment::Mac,
        Environment::Browser,
        Environment::Smartphone,
    ];

    /// Wire name (ex: "linux")
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::Mac => "mac",
            Self::Browser => "browser",
            Self::Smartphone => "smartphone",
        }
    }

    /// Whether the environment is a desktop operating system
    pub fn is_desktop(&self) -> bool {
        matches!(self, Self::Linux | Self::Windows | Self::Mac)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|env| env.as_str() == s)
            .ok_or_else(|| format!("unknown environment '{}'", s))
    }
}

/// Environment support flags of a software
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Environments {
    pub linux: bool,
    pub windows: bool,
    pub mac: bool,
    pub browser: bool,
    pub smartphone: bool,
}

impl Environments {
    /// Flag for one environment
    pub fn get(&self, env: Environment) -> bool {
        match env {
            Environment::Linux => self.linux,
            Environment::Windows => self.windows,
            Environment::Mac => self.mac,
            Environment::Browser => self.browser,
            Environment::Smartphone => self.smartphone,
        }
    }

    /// Set the flag for one environment
    pub fn set(&mut self, env: Environment, value: bool) {
        match env {
            Environment::Linux => self.linux = value,
            Environment::Windows => self.windows = value,
            Environment::Mac => self.mac = value,
            Environment::Browser => self.browser = value,
            Environment::Smartphone => self.smartphone = value,
        }
    }

    /// Builder form of [`Environments::set`]
    pub fn with(mut self, env: Environment) -> Self {
        self.set(env, true);
        self
    }

    /// True iff any desktop environment is supported
    pub fn is_installable_on_user_terminal(&self) -> bool {
        self.linux || self.windows || self.mac
    }
}

// ============================================================================
// PREROGATIVES
// ============================================================================

/// Procurement and compliance properties of a software
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Prerogative {
    /// Derived from the desktop environment flags, never stored
    IsInstallableOnUserTerminal,
    IsPresentInSupportContract,
    IsFromFrenchPublicServices,
    DoRespectRgaa,
}

impl Prerogative {
    pub const ALL: [Prerogative; 4] = [
        Prerogative::IsInstallableOnUserTerminal,
        Prerogative::IsPresentInSupportContract,
        Prerogative::IsFromFrenchPublicServices,
        Prerogative::DoRespectRgaa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IsInstallableOnUserTerminal => "isInstallableOnUserTerminal",
            Self::IsPresentInSupportContract => "isPresentInSupportContract",
            Self::IsFromFrenchPublicServices => "isFromFrenchPublicServices",
            Self::DoRespectRgaa => "doRespectRgaa",
        }
    }
}

impl fmt::Display for Prerogative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Prerogative {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown prerogative '{}'", s))
    }
}

/// The prerogatives that are stored on the record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoredPrerogatives {
    pub is_present_in_support_contract: bool,
    pub is_from_french_public_services: bool,
    pub do_respect_rgaa: bool,
}

// ============================================================================
// SOFTWARE RECORD
// ============================================================================

/// Latest published version of a software
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftwareVersion {
    pub semver: String,
    pub publication_time: Timestamp,
}

/// Kind of software, as declared in the software form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SoftwareType {
    /// Installed on a desktop or a phone
    Desktop { os: Environments },
    /// Used through a browser
    Cloud,
    /// Building block of other software
    Stack,
}

impl SoftwareType {
    /// Environment flags implied by the software type
    pub fn environments(&self) -> Environments {
        match self {
            Self::Desktop { os } => *os,
            Self::Cloud => Environments::default().with(Environment::Browser),
            Self::Stack => Environments::default(),
        }
    }
}

/// One software of the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftwareRecord {
    pub software_id: SoftwareId,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Set semantics, kept in declaration order
    #[serde(default)]
    pub categories: Vec<String>,
    /// Set semantics, kept in declaration order
    #[serde(default)]
    pub organizations: Vec<String>,
    #[serde(default)]
    pub environments: Environments,
    #[serde(default)]
    pub prerogatives: StoredPrerogatives,
    #[serde(default)]
    pub user_count: u32,
    #[serde(default)]
    pub referent_count: u32,
    pub added_time: Timestamp,
    pub update_time: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_version: Option<SoftwareVersion>,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Wikidata-style identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_min: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub software_type: Option<SoftwareType>,
    #[serde(default)]
    pub similar_software_external_ids: Vec<String>,
}

impl SoftwareRecord {
    /// Create a record with empty classification
    pub fn new(software_id: SoftwareId, name: impl Into<String>) -> Self {
        Self {
            software_id,
            name: name.into(),
            description: String::new(),
            logo_url: None,
            categories: Vec::new(),
            organizations: Vec::new(),
            environments: Environments::default(),
            prerogatives: StoredPrerogatives::default(),
            user_count: 0,
            referent_count: 0,
            added_time: 0,
            update_time: 0,
            last_version: None,
            license: String::new(),
            keywords: Vec::new(),
            external_id: None,
            version_min: None,
            software_type: None,
            similar_software_external_ids: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a category (ignored if already present)
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        push_unique(&mut self.categories, category.into());
        self
    }

    /// Add an organization (ignored if already present)
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        push_unique(&mut self.organizations, organization.into());
        self
    }

    pub fn with_environment(mut self, env: Environment) -> Self {
        self.environments.set(env, true);
        self
    }

    pub fn with_prerogative(mut self, prerogative: Prerogative) -> Self {
        match prerogative {
            Prerogative::IsInstallableOnUserTerminal => {
                // Derived: the record has to run on some desktop
                if !self.environments.is_installable_on_user_terminal() {
                    self.environments.set(Environment::Linux, true);
                }
            }
            Prerogative::IsPresentInSupportContract => {
                self.prerogatives.is_present_in_support_contract = true
            }
            Prerogative::IsFromFrenchPublicServices => {
                self.prerogatives.is_from_french_public_services = true
            }
            Prerogative::DoRespectRgaa => self.prerogatives.do_respect_rgaa = true,
        }
        self
    }

    pub fn with_counts(mut self, user_count: u32, referent_count: u32) -> Self {
        self.user_count = user_count;
        self.referent_count = referent_count;
        self
    }

    pub fn with_times(mut self, added_time: Timestamp, update_time: Timestamp) -> Self {
        self.added_time = added_time;
        self.update_time = update_time;
        self
    }

    pub fn with_last_version(mut self, semver: impl Into<String>, publication_time: Timestamp) -> Self {
        self.last_version = Some(SoftwareVersion {
            semver: semver.into(),
            publication_time,
        });
        self
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    pub fn has_organization(&self, organization: &str) -> bool {
        self.organizations.iter().any(|o| o == organization)
    }

    /// Value of a prerogative, deriving `isInstallableOnUserTerminal`
    pub fn prerogative(&self, prerogative: Prerogative) -> bool {
        match prerogative {
            Prerogative::IsInstallableOnUserTerminal => {
                self.environments.is_installable_on_user_terminal()
            }
            Prerogative::IsPresentInSupportContract => {
                self.prerogatives.is_present_in_support_contract
            }
            Prerogative::IsFromFrenchPublicServices => {
                self.prerogatives.is_from_french_public_services
            }
            Prerogative::DoRespectRgaa => self.prerogatives.do_respect_rgaa,
        }
    }

    /// Publication time of the last version, 0 when none was published
    pub fn last_version_publication_time(&self) -> Timestamp {
        self.last_version
            .as_ref()
            .map(|v| v.publication_time)
            .unwrap_or(0)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.update_time)
    }
}

fn push_unique(values: &mut Vec<String>, value: String) {
    if !values.contains(&value) {
        values.push(value);
    }
}

// ============================================================================
// INSTANCES & EXTERNAL ENTITIES
// ============================================================================

/// A deployment of a catalog software run by a public organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: InstanceId,
    pub main_software_id: SoftwareId,
    pub organization: String,
    pub target_audience: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    #[serde(default)]
    pub other_software_external_ids: Vec<String>,
    pub added_time: Timestamp,
    pub update_time: Timestamp,
}

/// Entry returned by the external knowledge base lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalEntity {
    pub id: String,
    pub label: String,
    pub description: String,
}

/// Software fields that can be prefilled from the external knowledge base
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutofillData {
    pub name: Option<String>,
    pub description: Option<String>,
    pub license: Option<String>,
    pub logo_url: Option<String>,
    pub keywords: Vec<String>,
}
