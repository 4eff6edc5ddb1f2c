//! Descriptors: POM documents with their licenses judged, their properties
//! substituted, and their parents' declarations inherited.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use mvnget_core::coordinate::Coordinate;
use mvnget_core::diagnostic::Diagnostics;
use mvnget_maven::license::LicensePolicy;
use mvnget_maven::pom::{self, PomDependency, PomDocument, PomLicense};

use crate::range::VersionRange;

pub const PROJECT_GROUP_ID: &str = "project.groupId";
pub const PROJECT_ARTIFACT_ID: &str = "project.artifactId";
pub const PROJECT_VERSION: &str = "project.version";
pub const PARENT_GROUP_ID: &str = "project.parent.groupId";
pub const PARENT_VERSION: &str = "project.parent.version";

/// Upper bound on substitution passes; a value that keeps growing
/// (`a = x${a}`) stops here instead of looping.
const MAX_SUBSTITUTION_PASSES: usize = 20;

/// Replace `${key}` placeholders until nothing changes.
///
/// Unknown keys are left as-is.
pub fn substitute(value: &str, properties: &BTreeMap<String, String>) -> String {
    let mut current = value.to_string();
    for _ in 0..MAX_SUBSTITUTION_PASSES {
        if !current.contains("${") {
            break;
        }
        let mut next = current.clone();
        for (key, replacement) in properties {
            let placeholder = format!("${{{key}}}");
            if next.contains(&placeholder) {
                next = next.replace(&placeholder, replacement);
            }
        }
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// A `dependency` or `parent` declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyEntry {
    /// The version may be empty or a range expression.
    pub coordinate: Coordinate,
    pub scope: String,
    pub optional: bool,
}

impl DependencyEntry {
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            coordinate: Coordinate::new(group, artifact, version),
            ..Self::default()
        }
    }

    pub fn from_declaration(declared: &PomDependency) -> Self {
        Self {
            coordinate: Coordinate::new(
                declared.group_id.trim(),
                declared.artifact_id.trim(),
                declared.version.trim(),
            ),
            scope: declared.scope.trim().to_string(),
            optional: declared.optional,
        }
    }

    pub fn id(&self) -> String {
        self.coordinate.id()
    }

    pub fn has_no_group(&self) -> bool {
        self.coordinate.group.trim().is_empty()
    }

    pub fn is_test_or_provided(&self) -> bool {
        self.scope == "test" || self.scope == "provided"
    }

    /// Empty, an unpinned range, or not parsable as a range at all.
    pub fn is_vague_version(&self) -> bool {
        if self.coordinate.version.is_empty() {
            return true;
        }
        VersionRange::parse(&self.coordinate.version)
            .map(|range| range.is_vague())
            .unwrap_or(true)
    }

    /// Substitute properties into the coordinate.
    ///
    /// An unset version takes `project.version` when the properties belong
    /// to a parent, or when the entry shares the project's group.
    pub fn apply_properties(&mut self, properties: &BTreeMap<String, String>, is_parent: bool) {
        let original_version = self.coordinate.version.clone();
        self.coordinate.artifact = substitute(&self.coordinate.artifact, properties);
        self.coordinate.group = substitute(&self.coordinate.group, properties);

        let project_group = properties
            .get(PROJECT_GROUP_ID)
            .map(String::as_str)
            .unwrap_or_default();
        let own_group = is_parent || self.coordinate.group == project_group;
        if self.coordinate.version.is_empty() && own_group {
            self.coordinate.version = properties.get(PROJECT_VERSION).cloned().unwrap_or_default();
        }
        self.coordinate.version = substitute(&self.coordinate.version, properties);

        if original_version != self.coordinate.version {
            tracing::trace!("{}: replaced version from {original_version}", self.id());
        } else if self.coordinate.version.is_empty() {
            tracing::debug!("{}: no version information after replacement", self.id());
        }
    }

    /// Take the version of a matching dependency-management entry, if unset.
    fn inherit_managed_version(&mut self, managed: &[DependencyEntry]) {
        if !self.coordinate.version.is_empty() {
            return;
        }
        if let Some(reference) = managed.iter().find(|m| {
            m.coordinate.group == self.coordinate.group
                && m.coordinate.artifact == self.coordinate.artifact
        }) {
            tracing::debug!("Inheriting information from {}", reference.id());
            self.coordinate.version = reference.coordinate.version.clone();
        }
    }
}

/// Settings that shape how a POM document becomes a [`Descriptor`].
#[derive(Debug, Clone, Default)]
pub struct DescriptorPolicy {
    pub licenses: LicensePolicy,
    /// Treat dependency-management entries as real dependencies.
    pub include_dep_management: bool,
}

/// A resolved artifact descriptor.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub coordinate: Coordinate,
    pub file: PathBuf,
    pub properties: BTreeMap<String, String>,
    pub licenses: Vec<PomLicense>,
    pub parents: Vec<DependencyEntry>,
    pub dependency_management: Vec<DependencyEntry>,
    pub dependencies: Vec<DependencyEntry>,
    /// Fetched on demand rather than found in the output tree or a local repository.
    pub missing: bool,
    /// `false` once a license violation was recorded against it.
    pub valid: bool,
}

impl Descriptor {
    /// Read and build the descriptor stored at `path`.
    pub fn load(
        path: &Path,
        reference: Option<&DependencyEntry>,
        policy: &DescriptorPolicy,
        diagnostics: &Diagnostics,
    ) -> miette::Result<Self> {
        let document = pom::read_pom(path)?;
        Ok(Self::build(document, path, reference, policy, diagnostics))
    }

    /// Build from a parsed document.
    ///
    /// `reference` is the declaration that led here; it fills in a group or
    /// version the document leaves unset.
    pub fn build(
        document: PomDocument,
        file: &Path,
        reference: Option<&DependencyEntry>,
        policy: &DescriptorPolicy,
        diagnostics: &Diagnostics,
    ) -> Self {
        let mut coordinate = Coordinate::new(
            document.group_id.trim(),
            document.artifact_id.trim(),
            document.version.trim(),
        );
        if coordinate.group.is_empty() {
            match reference {
                Some(r) => coordinate.group = r.coordinate.group.clone(),
                None => tracing::debug!("No group defined for pom file {}", file.display()),
            }
        }
        let own_version = DependencyEntry {
            coordinate: coordinate.clone(),
            ..DependencyEntry::default()
        };
        if own_version.is_vague_version() {
            match reference {
                Some(r) => {
                    tracing::debug!("loading version {} into {}", r.coordinate.version, coordinate);
                    coordinate.version = r.coordinate.version.clone();
                }
                None => tracing::debug!("No version defined for pom file {}", file.display()),
            }
        }

        let mut properties = BTreeMap::from([
            (PROJECT_GROUP_ID.to_string(), document.group_id.trim().to_string()),
            (PROJECT_ARTIFACT_ID.to_string(), document.artifact_id.trim().to_string()),
            (PROJECT_VERSION.to_string(), document.version.trim().to_string()),
        ]);
        properties.extend(document.properties);

        let mut parents = Vec::new();
        for declared in &document.parents {
            let mut parent = DependencyEntry::from_declaration(declared);
            if parent.id() == coordinate.id() {
                tracing::warn!("{} declares itself as a parent.", parent.id());
                diagnostics.note(
                    coordinate.id(),
                    vec![],
                    format!("{} declares itself as a parent.", parent.id()),
                );
                continue;
            }
            if parent.has_no_group() {
                if coordinate.group.is_empty() {
                    tracing::warn!(
                        "Parent ({}) of {} has no group, and current ({coordinate}) has no group",
                        parent.id(),
                        file.display()
                    );
                }
                parent.coordinate.group = coordinate.group.clone();
            } else if coordinate.group.is_empty() {
                coordinate.group = parent.coordinate.group.clone();
            }
            if parent.is_vague_version() {
                parent.coordinate.version = coordinate.version.clone();
            } else if coordinate.version.is_empty() {
                coordinate.version = parent.coordinate.version.clone();
            }
            parents.push(parent);
        }

        // Declared fields win; fallbacks only fill what the document left empty.
        for (key, value) in [
            (PROJECT_GROUP_ID, &coordinate.group),
            (PROJECT_VERSION, &coordinate.version),
        ] {
            if properties.get(key).map_or(true, |v| v.is_empty()) {
                properties.insert(key.to_string(), value.clone());
            }
        }

        let mut descriptor = Self {
            coordinate,
            file: file.to_path_buf(),
            properties,
            licenses: document.licenses,
            parents,
            dependency_management: Vec::new(),
            dependencies: Vec::new(),
            missing: false,
            valid: true,
        };
        descriptor.judge_licenses(&policy.licenses, diagnostics);

        for declared in &document.dependency_management {
            let mut entry = DependencyEntry::from_declaration(declared);
            entry.apply_properties(&descriptor.properties, false);
            descriptor.inherit_group(&mut entry, diagnostics);
            if policy.include_dep_management {
                descriptor.dependencies.push(entry.clone());
            }
            descriptor.dependency_management.push(entry);
        }

        for declared in &document.dependencies {
            let mut entry = DependencyEntry::from_declaration(declared);
            entry.inherit_managed_version(&descriptor.dependency_management);
            entry.apply_properties(&descriptor.properties, false);
            descriptor.inherit_group(&mut entry, diagnostics);
            tracing::debug!("=== Dependency from {}: {}", descriptor.id(), entry.id());
            descriptor.dependencies.push(entry);
        }

        descriptor
    }

    pub fn id(&self) -> String {
        self.coordinate.id()
    }

    /// Merge an already-resolved parent into this descriptor.
    ///
    /// Dependency-management entries are appended, unset group and version
    /// are filled in, and parent properties are added where not already
    /// defined locally.
    pub fn inherit_from_parent(&mut self, parent: &Descriptor) {
        tracing::debug!("Adding parent properties into {} from {}", self.id(), parent.id());
        if self.coordinate.group.is_empty() && !parent.coordinate.group.is_empty() {
            self.coordinate.group = parent.coordinate.group.clone();
        }
        self.dependency_management
            .extend(parent.dependency_management.iter().cloned());
        for declared in &mut self.parents {
            declared.apply_properties(&parent.properties, true);
        }
        for dependency in &mut self.dependencies {
            dependency.inherit_managed_version(&self.dependency_management);
            dependency.apply_properties(&parent.properties, false);
        }
        if self.coordinate.version.is_empty() {
            self.coordinate.version = parent.coordinate.version.clone();
        }
        for (key, value) in &parent.properties {
            self.properties
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        self.properties
            .insert(PARENT_GROUP_ID.to_string(), parent.coordinate.group.clone());
        self.properties
            .insert(PARENT_VERSION.to_string(), parent.coordinate.version.clone());
    }

    fn judge_licenses(&mut self, policy: &LicensePolicy, diagnostics: &Diagnostics) {
        let verdict = policy.evaluate(&self.licenses);
        let Some(message) = verdict.message() else {
            return;
        };
        let files = vec![self.file.clone()];
        if verdict.is_violation() {
            diagnostics.violation(self.id(), files, message);
            self.valid = false;
        } else {
            diagnostics.note(self.id(), files, message);
        }
    }

    /// An entry without a group takes this descriptor's group.
    fn inherit_group(&self, entry: &mut DependencyEntry, diagnostics: &Diagnostics) {
        if !entry.has_no_group() {
            return;
        }
        if self.coordinate.group.is_empty() {
            tracing::warn!(
                "Dependent ({}) has no group, and current ({}) has no group",
                entry.id(),
                self.id()
            );
            diagnostics.note(
                self.id(),
                vec![],
                format!(
                    "Dependent ({}) has no group, and current ({}) has no group",
                    entry.id(),
                    self.id()
                ),
            );
        }
        entry.coordinate.group = self.coordinate.group.clone();
    }
}
