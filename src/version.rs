//! Standard version a schema variant targets

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version of the publication standard a schema renders
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StandardVersion {
    pub version: Version,
}

impl StandardVersion {
    pub fn new(major: u64, minor: u64) -> Self {
        Self {
            version: Version::new(major, minor, 0),
        }
    }

    /// Parse "1.1", "v1.1" or a full "1.1.0"
    pub fn parse(version_str: &str) -> Result<Self, semver::Error> {
        let version_str = version_str.strip_prefix('v').unwrap_or(version_str);
        let version = match version_str.matches('.').count() {
            1 => Version::parse(&format!("{}.0", version_str))?,
            _ => Version::parse(version_str)?,
        };
        Ok(Self { version })
    }

    /// "major.minor", as written into package metadata
    pub fn package_version(&self) -> String {
        format!("{}.{}", self.version.major, self.version.minor)
    }
}

impl fmt::Display for StandardVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.package_version())
    }
}
