use std::fmt;

/// Maven coordinate `group:artifact:version`.
///
/// The version may still be a range expression or empty while a
/// dependency is being resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

impl Coordinate {
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
        }
    }

    /// Parse `"group:artifact:version"`; anything without exactly two colons is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            return None;
        }
        Some(Self::new(parts[0], parts[1], parts[2]))
    }

    /// Canonical id, used as cache key and diagnostic subject.
    pub fn id(&self) -> String {
        self.to_string()
    }

    /// `group:artifact`, the key for version listings.
    pub fn key(&self) -> String {
        format!("{}:{}", self.group, self.artifact)
    }

    /// Repository-relative directory: `org/example/lib/1.0`.
    pub fn path(&self) -> String {
        format!(
            "{}/{}/{}",
            self.group.replace('.', "/"),
            self.artifact,
            self.version
        )
    }

    /// Repository-relative descriptor path: `org/example/lib/1.0/lib-1.0.pom`.
    pub fn pom_path(&self) -> String {
        format!("{}/{}", self.path(), self.pom_file_name())
    }

    /// `lib-1.0.pom`
    pub fn pom_file_name(&self) -> String {
        format!("{}-{}.pom", self.artifact, self.version)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}
