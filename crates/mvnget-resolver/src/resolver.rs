//! Declaration graph resolution for one run.
//!
//! A [`ResolutionSession`] finds descriptors (in the output tree, the temp
//! cache, local repositories, then remote ones), walks and folds their parent
//! chains, picks concrete versions for ranged dependencies, and reports which
//! declared dependencies are not yet in the output tree.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use mvnget_core::config::{Config, GroupReplacement};
use mvnget_core::coordinate::Coordinate;
use mvnget_core::diagnostic::Diagnostics;
use mvnget_maven::cache::TempCache;
use mvnget_maven::download::{Downloader, ReportPolicy};
use mvnget_maven::license::LicensePolicy;
use mvnget_maven::metadata::parse_metadata;
use mvnget_maven::repository::RepositoryLayout;
use mvnget_util::errors::MvnGetError;
use mvnget_util::fs::{delete_file, list_file_names};

use crate::cache::{DescriptorCache, VisitedSet};
use crate::descriptor::{DependencyEntry, Descriptor, DescriptorPolicy};
use crate::range::{VersionListing, VersionRange};

/// Group placeholders that signal a descriptor whose group never resolved.
const UNRESOLVED_GROUPS: [&str; 2] = ["${pom.groupId}", "${project.groupId}"];

/// A descriptor together with the parents folded into it.
#[derive(Debug, Clone)]
pub struct LoadedDescriptor {
    pub descriptor: Descriptor,
    /// Resolved direct parents, each with its own ancestry folded in.
    pub parents: Vec<Descriptor>,
}

pub struct ResolutionSession {
    outdir: PathBuf,
    layout: RepositoryLayout,
    temp: TempCache,
    downloader: Downloader,
    policy: DescriptorPolicy,
    check_in_local: bool,
    mislabeled: BTreeMap<String, GroupReplacement>,
    parents: DescriptorCache,
    listings: HashMap<String, Option<VersionListing>>,
}

impl ResolutionSession {
    pub fn new(config: &Config, downloader: Downloader) -> Self {
        Self {
            outdir: config.outdir.clone(),
            layout: RepositoryLayout::from_config(config),
            temp: TempCache::new(&config.outdir),
            downloader,
            policy: DescriptorPolicy {
                licenses: LicensePolicy::from_config(config),
                include_dep_management: config.include_dep_management,
            },
            check_in_local: config.check_in_local,
            mislabeled: config.mislabeled_artifact_groups.clone(),
            parents: DescriptorCache::new(),
            listings: HashMap::new(),
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        self.downloader.diagnostics()
    }

    /// Find the descriptor for `entry` and fold in its parents.
    ///
    /// Returns `None` when no copy could be found or parsed; a parse failure
    /// is recorded as a violation.
    pub async fn load_descriptor(
        &mut self,
        entry: &DependencyEntry,
    ) -> miette::Result<Option<LoadedDescriptor>> {
        match self.find_descriptor(entry).await? {
            Some(descriptor) => Ok(Some(self.with_parents(descriptor).await?)),
            None => Ok(None),
        }
    }

    /// Dependencies of the artifact downloaded into `dir` that still need fetching.
    ///
    /// Parents fetched on demand are included, then every non-optional
    /// compile/runtime dependency whose descriptor was not already present.
    pub async fn required_dependencies(
        &mut self,
        dir: &Path,
    ) -> miette::Result<Vec<Coordinate>> {
        let Some(pom_file) = find_downloaded_pom(dir)? else {
            tracing::info!("{} has no pom file", dir.display());
            return Ok(Vec::new());
        };
        let diagnostics = self.diagnostics().clone();
        let descriptor = match Descriptor::load(&pom_file, None, &self.policy, &diagnostics) {
            Ok(d) => d,
            Err(e) => {
                tracing::debug!("Failed to parse {}: {e}", pom_file.display());
                diagnostics.violation(
                    pom_file.display().to_string(),
                    vec![pom_file.clone()],
                    format!("Failed to parse POM file {}", pom_file.display()),
                );
                return Ok(Vec::new());
            }
        };
        let loaded = self.with_parents(descriptor).await?;
        let subject = loaded.descriptor.id();

        let mut required = Vec::new();
        for parent in &loaded.parents {
            if parent.missing {
                tracing::debug!("{subject} requires missing parent {}", parent.id());
                required.push(parent.coordinate.clone());
            }
        }

        for declared in &loaded.descriptor.dependencies {
            if declared.optional || declared.is_test_or_provided() {
                tracing::debug!("Skipping {} ({})", declared.id(), declared.scope);
                continue;
            }
            let mut dependency = declared.clone();
            if dependency.has_no_group() {
                dependency.coordinate.group = loaded.descriptor.coordinate.group.clone();
            }
            self.relabel(&subject, &mut dependency);
            if dependency.is_vague_version() {
                match self.best_version(&dependency).await? {
                    Some(version) => dependency.coordinate.version = version,
                    None => {
                        diagnostics.note(
                            &subject,
                            vec![],
                            format!(
                                "Unable to determine version number for declared dependency {}",
                                dependency.id()
                            ),
                        );
                        continue;
                    }
                }
            }

            // Its parents are walked once the dependency itself is fetched.
            match self.find_descriptor(&dependency).await? {
                None => diagnostics.note(
                    &subject,
                    vec![],
                    format!("Could not find declared dependency {}", dependency.id()),
                ),
                Some(found) if found.missing => {
                    tracing::debug!("{subject} requires missing dependency {}", dependency.id());
                    required.push(dependency.coordinate);
                }
                Some(_) => {}
            }
        }
        Ok(required)
    }

    /// The latest published version inside the entry's range.
    pub async fn best_version(
        &mut self,
        entry: &DependencyEntry,
    ) -> miette::Result<Option<String>> {
        let range = match VersionRange::parse(&entry.coordinate.version) {
            Ok(range) => range,
            Err(e) => {
                tracing::debug!("{}: {e}", entry.id());
                return Ok(None);
            }
        };
        let Some(listing) = self
            .version_listing(&entry.coordinate.group, &entry.coordinate.artifact)
            .await?
        else {
            return Ok(None);
        };
        Ok(range.best_fit(listing).map(|v| v.as_str().to_string()))
    }

    /// Published versions of `group:artifact`, from the cached or freshly
    /// fetched metadata document.
    pub async fn version_listing(
        &mut self,
        group: &str,
        artifact: &str,
    ) -> miette::Result<Option<&VersionListing>> {
        let key = format!("{group}:{artifact}");
        if !self.listings.contains_key(&key) {
            let listing = self.fetch_listing(group, artifact).await?;
            self.listings.insert(key.clone(), listing);
        }
        Ok(self.listings.get(&key).and_then(Option::as_ref))
    }

    async fn fetch_listing(
        &self,
        group: &str,
        artifact: &str,
    ) -> miette::Result<Option<VersionListing>> {
        let path = self.temp.metadata_path(group, artifact)?;
        if !path.is_file() {
            let policy = ReportPolicy {
                show_errors: true,
                show_not_found: false,
            };
            for url in self.layout.metadata_urls(group, artifact) {
                if self.downloader.download(&url, &path, false, policy).await?.is_present() {
                    break;
                }
            }
        }
        if !path.is_file() {
            tracing::debug!("No metadata found for {group}:{artifact}");
            return Ok(None);
        }
        let bytes = std::fs::read(&path).map_err(MvnGetError::Io)?;
        match parse_metadata(&String::from_utf8_lossy(&bytes)) {
            Ok(metadata) => Ok(Some(VersionListing::from_metadata(&metadata))),
            Err(e) => {
                tracing::debug!("{e}");
                self.diagnostics().violation(
                    format!("{group}:{artifact}"),
                    vec![path.clone()],
                    format!("Invalid metadata file {}", path.display()),
                );
                Ok(None)
            }
        }
    }

    /// Rewrite an entry of `dependent` whose group is an unresolved project
    /// placeholder, using the configured artifact-prefix table.
    fn relabel(&self, dependent: &str, entry: &mut DependencyEntry) {
        if !UNRESOLVED_GROUPS.contains(&entry.coordinate.group.as_str()) {
            return;
        }
        let artifact = entry.coordinate.artifact.clone();
        let Some((prefix, replacement)) = self
            .mislabeled
            .iter()
            .find(|(prefix, _)| artifact.starts_with(prefix.as_str()))
        else {
            return;
        };
        let old = entry.id();
        entry.coordinate.group = replacement.group.clone();
        entry.coordinate.artifact =
            format!("{}{}", replacement.artifact_prefix, &artifact[prefix.len()..]);
        self.diagnostics().note(
            dependent,
            vec![],
            format!(
                "Dependent {old} of {dependent} has no group, but is using a mislabeled artifact; using {}",
                entry.id()
            ),
        );
    }

    async fn with_parents(
        &mut self,
        mut descriptor: Descriptor,
    ) -> miette::Result<LoadedDescriptor> {
        let mut parents = Vec::new();
        for declared in descriptor.parents.clone() {
            if let Some(parent) = self.resolve_parent(&descriptor.id(), &declared).await? {
                descriptor.inherit_from_parent(&parent);
                parents.push(parent);
            }
        }
        Ok(LoadedDescriptor {
            descriptor,
            parents,
        })
    }

    /// Load a parent and every ancestor above it, folding each into the one
    /// below from the top down.
    ///
    /// The walk stops at a cached ancestor, a missing one, or one already on
    /// the chain.
    async fn resolve_parent(
        &mut self,
        child: &str,
        declared: &DependencyEntry,
    ) -> miette::Result<Option<Descriptor>> {
        let mut on_chain = VisitedSet::new();
        on_chain.visit(child);

        let mut chain: Vec<(String, Descriptor)> = Vec::new();
        let mut top: Option<Descriptor> = None;
        let mut next = Some((child.to_string(), declared.clone()));
        while let Some((dependent, entry)) = next.take() {
            let id = entry.id();
            if let Some(cached) = self.parents.get(&id) {
                top = Some(cached.clone());
                break;
            }
            if !on_chain.visit(&id) {
                tracing::warn!("Parent chain of {child} cycles back to {id}");
                self.diagnostics().note(
                    &dependent,
                    vec![],
                    format!("parent chain cycles back to {id}"),
                );
                break;
            }
            match self.find_descriptor(&entry).await? {
                Some(found) => {
                    next = found.parents.first().map(|p| (found.id(), p.clone()));
                    chain.push((id, found));
                }
                None => {
                    self.diagnostics().note(
                        &dependent,
                        vec![],
                        format!("Could not find declared parent {id}"),
                    );
                    break;
                }
            }
        }

        for (declared_id, mut descriptor) in chain.into_iter().rev() {
            if let Some(above) = &top {
                descriptor.inherit_from_parent(above);
            }
            self.parents.insert(declared_id, descriptor.clone());
            top = Some(descriptor);
        }
        Ok(top)
    }

    /// Locate and parse a descriptor without touching its parents.
    async fn find_descriptor(
        &self,
        entry: &DependencyEntry,
    ) -> miette::Result<Option<Descriptor>> {
        let diagnostics = self.diagnostics();
        let relative = entry.coordinate.pom_path();
        let pom_file = self.outdir.join(&relative);

        if pom_file.is_file() {
            tracing::debug!("Loading pom file {}", pom_file.display());
            return Ok(
                match Descriptor::load(&pom_file, Some(entry), &self.policy, diagnostics) {
                    Ok(d) => Some(d),
                    Err(e) => {
                        tracing::debug!("{e}");
                        diagnostics.violation(
                            relative.as_str(),
                            vec![pom_file.clone()],
                            format!("Failed to parse POM file {}", pom_file.display()),
                        );
                        None
                    }
                },
            );
        }

        let cached = self.temp.pom_path(&entry.coordinate)?;
        if cached.is_file() {
            tracing::debug!("Loading cached pom file {}", cached.display());
            return Ok(
                match Descriptor::load(&cached, Some(entry), &self.policy, diagnostics) {
                    Ok(mut d) => {
                        d.missing = !TempCache::is_local(&cached);
                        Some(d)
                    }
                    Err(e) => {
                        tracing::debug!("{e}");
                        diagnostics.violation(
                            cached.display().to_string(),
                            vec![pom_file.clone(), cached.clone()],
                            format!("Failed to parse cached POM file {}", cached.display()),
                        );
                        None
                    }
                },
            );
        }

        if self.check_in_local {
            for base in self.layout.local_urls() {
                let url = format!("{base}{relative}");
                if !self
                    .downloader
                    .download(&url, &cached, true, ReportPolicy::QUIET)
                    .await?
                    .is_present()
                {
                    continue;
                }
                TempCache::mark_local(&cached)?;
                return Ok(self.parse_fetched(entry, &cached, false));
            }
        }

        for base in self.layout.remote_urls() {
            let url = format!("{base}{relative}");
            if !self
                .downloader
                .download(&url, &cached, true, ReportPolicy::QUIET)
                .await?
                .is_present()
            {
                continue;
            }
            tracing::info!("Found missing dependency {}", entry.id());
            let parsed = self.parse_fetched(entry, &cached, true);
            delete_file(&cached);
            return Ok(parsed);
        }

        tracing::debug!("No descriptor found for {}", entry.id());
        Ok(None)
    }

    fn parse_fetched(
        &self,
        entry: &DependencyEntry,
        path: &Path,
        missing: bool,
    ) -> Option<Descriptor> {
        let diagnostics = self.diagnostics();
        match Descriptor::load(path, Some(entry), &self.policy, diagnostics) {
            Ok(mut d) => {
                d.missing = missing;
                Some(d)
            }
            Err(e) => {
                tracing::debug!("{e}");
                diagnostics.violation(
                    path.display().to_string(),
                    vec![path.to_path_buf()],
                    format!("Failed to parse POM file {}", path.display()),
                );
                None
            }
        }
    }
}

/// The single descriptor in a downloaded version directory.
///
/// When several `.pom` files are present, only `<artifact>-<dir name>.pom`
/// candidates count. Anything other than exactly one candidate is `None`.
pub fn find_downloaded_pom(dir: &Path) -> miette::Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let mut poms: Vec<String> = list_file_names(dir)
        .map_err(MvnGetError::Io)?
        .into_iter()
        .filter(|name| name.ends_with(".pom"))
        .collect();
    if poms.len() > 1 {
        let version = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let suffix = format!("-{version}.pom");
        poms.retain(|name| name.ends_with(&suffix));
    }
    match poms.as_slice() {
        [only] => Ok(Some(dir.join(only))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const APACHE: &str =
        "<licenses><license><name>Apache License, Version 2.0</name></license></licenses>";

    struct Fixture {
        _tmp: TempDir,
        remote: PathBuf,
        outdir: PathBuf,
        config: Config,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let remote = tmp.path().join("remote");
            let outdir = tmp.path().join("out");
            fs::create_dir_all(&remote).unwrap();
            fs::create_dir_all(&outdir).unwrap();
            let mut config = Config::default();
            config.outdir = outdir.clone();
            config.remote_repo_urls = vec![format!("file://{}/", remote.display())];
            config.check_in_local = false;
            config.normalize();
            Self {
                _tmp: tmp,
                remote,
                outdir,
                config,
            }
        }

        fn publish(&self, root: &Path, coord: &str, body: &str) -> PathBuf {
            let c = Coordinate::parse(coord).unwrap();
            let path = root.join(c.pom_path());
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(
                &path,
                format!(
                    "<project><groupId>{}</groupId><artifactId>{}</artifactId><version>{}</version>{APACHE}{body}</project>",
                    c.group, c.artifact, c.version
                ),
            )
            .unwrap();
            path
        }

        fn session(&self) -> ResolutionSession {
            let downloader = Downloader::from_config(&self.config, Diagnostics::new()).unwrap();
            ResolutionSession::new(&self.config, downloader)
        }
    }

    fn dep(coord: &str) -> String {
        let c = Coordinate::parse(coord).unwrap();
        format!(
            "<dependency><groupId>{}</groupId><artifactId>{}</artifactId><version>{}</version></dependency>",
            c.group, c.artifact, c.version
        )
    }

    fn parent(coord: &str) -> String {
        let c = Coordinate::parse(coord).unwrap();
        format!(
            "<parent><groupId>{}</groupId><artifactId>{}</artifactId><version>{}</version></parent>",
            c.group, c.artifact, c.version
        )
    }

    #[test]
    fn single_pom_is_found() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("1.0");
        fs::create_dir_all(&dir).unwrap();
        assert!(find_downloaded_pom(&dir).unwrap().is_none());
        fs::write(dir.join("lib-1.0.pom"), "").unwrap();
        fs::write(dir.join("lib-1.0.jar"), "").unwrap();
        assert_eq!(find_downloaded_pom(&dir).unwrap(), Some(dir.join("lib-1.0.pom")));
    }

    #[test]
    fn several_poms_narrow_to_directory_version() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("1.0");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("lib-1.0.pom"), "").unwrap();
        fs::write(dir.join("lib-1.0-tests.pom"), "").unwrap();
        assert_eq!(find_downloaded_pom(&dir).unwrap(), Some(dir.join("lib-1.0.pom")));
        fs::write(dir.join("other-1.0.pom"), "").unwrap();
        assert!(find_downloaded_pom(&dir).unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_dependencies_are_required() {
        let fx = Fixture::new();
        let root = fx.publish(
            &fx.outdir,
            "org.ex:app:1.0",
            &format!(
                "<dependencies>{}{}{}</dependencies>",
                dep("org.ex:present:1.0"),
                dep("org.ex:absent:2.0"),
                dep("org.ex:nowhere:3.0"),
            ),
        );
        fx.publish(&fx.outdir, "org.ex:present:1.0", "");
        fx.publish(&fx.remote, "org.ex:absent:2.0", "");

        let mut session = fx.session();
        let required = session
            .required_dependencies(root.parent().unwrap())
            .await
            .unwrap();
        assert_eq!(required, vec![Coordinate::new("org.ex", "absent", "2.0")]);

        let notes = session.diagnostics().snapshot();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].subject, "org.ex:app:1.0");
        assert_eq!(notes[0].message, "Could not find declared dependency org.ex:nowhere:3.0");
        // the on-demand copy is not left in the cache
        assert!(!fx.outdir.join(".tmp").join("absent-2.0.pom").exists());
    }

    #[tokio::test]
    async fn optional_and_test_scopes_are_skipped() {
        let fx = Fixture::new();
        let root = fx.publish(
            &fx.outdir,
            "g:app:1",
            "<dependencies>\
               <dependency><groupId>g</groupId><artifactId>t</artifactId><version>1</version><scope>test</scope></dependency>\
               <dependency><groupId>g</groupId><artifactId>o</artifactId><version>1</version><optional>true</optional></dependency>\
             </dependencies>",
        );
        fx.publish(&fx.remote, "g:t:1", "");
        fx.publish(&fx.remote, "g:o:1", "");
        let mut session = fx.session();
        let required = session
            .required_dependencies(root.parent().unwrap())
            .await
            .unwrap();
        assert!(required.is_empty());
    }

    #[tokio::test]
    async fn missing_parent_is_required_and_inherited() {
        let fx = Fixture::new();
        let root = fx.publish(
            &fx.outdir,
            "g:child:1",
            &format!(
                "{}<dependencies><dependency><groupId>x</groupId><artifactId>lib</artifactId></dependency></dependencies>",
                parent("g:parent:1")
            ),
        );
        fx.publish(
            &fx.remote,
            "g:parent:1",
            &format!(
                "<dependencyManagement><dependencies>{}</dependencies></dependencyManagement>",
                dep("x:lib:4.2")
            ),
        );
        fx.publish(&fx.remote, "x:lib:4.2", "");

        let mut session = fx.session();
        let required = session
            .required_dependencies(root.parent().unwrap())
            .await
            .unwrap();
        assert_eq!(
            required,
            vec![Coordinate::new("g", "parent", "1"), Coordinate::new("x", "lib", "4.2")]
        );
        assert!(session.diagnostics().is_empty());
    }

    #[tokio::test]
    async fn transitive_parent_cycle_terminates_with_note() {
        let fx = Fixture::new();
        fx.publish(&fx.remote, "g:a:1", &parent("g:b:1"));
        fx.publish(&fx.remote, "g:b:1", &parent("g:a:1"));

        let mut session = fx.session();
        let loaded = session
            .load_descriptor(&DependencyEntry::new("g", "a", "1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.parents.len(), 1);
        assert_eq!(loaded.parents[0].id(), "g:b:1");
        let notes = session.diagnostics().snapshot();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].message.contains("cycles"));
    }

    #[tokio::test]
    async fn grandparent_properties_reach_the_child() {
        let fx = Fixture::new();
        fx.publish(&fx.remote, "g:top:1", "<properties><lib.version>9</lib.version></properties>");
        fx.publish(&fx.remote, "g:mid:1", &parent("g:top:1"));
        fx.publish(
            &fx.remote,
            "g:leaf:1",
            &format!(
                "{}<dependencies><dependency><groupId>x</groupId><artifactId>y</artifactId><version>${{lib.version}}</version></dependency></dependencies>",
                parent("g:mid:1")
            ),
        );
        let mut session = fx.session();
        let loaded = session
            .load_descriptor(&DependencyEntry::new("g", "leaf", "1"))
            .await
            .unwrap()
            .unwrap();
        assert!(loaded.descriptor.missing);
        assert_eq!(loaded.descriptor.dependencies[0].id(), "x:y:9");
        assert_eq!(session.parents.len(), 2);
    }

    #[tokio::test]
    async fn missing_parent_is_noted() {
        let fx = Fixture::new();
        fx.publish(&fx.remote, "g:a:1", &parent("g:gone:1"));
        let mut session = fx.session();
        let loaded = session
            .load_descriptor(&DependencyEntry::new("g", "a", "1"))
            .await
            .unwrap()
            .unwrap();
        assert!(loaded.parents.is_empty());
        assert_eq!(
            session.diagnostics().snapshot()[0].message,
            "Could not find declared parent g:gone:1"
        );
    }

    #[tokio::test]
    async fn ranged_dependency_uses_metadata() {
        let fx = Fixture::new();
        let root = fx.publish(
            &fx.outdir,
            "g:app:1",
            &format!(
                "<dependencies>{}{}</dependencies>",
                dep("x:lib:[1.0,2.0)"),
                dep("x:gone:[1.0,)")
            ),
        );
        let meta = fx.remote.join("x/lib/maven-metadata.xml");
        fs::create_dir_all(meta.parent().unwrap()).unwrap();
        fs::write(
            &meta,
            "<metadata><versioning><versions><version>1.0</version><version>1.5</version><version>2.0</version></versions></versioning></metadata>",
        )
        .unwrap();
        fx.publish(&fx.remote, "x:lib:1.5", "");

        let mut session = fx.session();
        let required = session
            .required_dependencies(root.parent().unwrap())
            .await
            .unwrap();
        assert_eq!(required, vec![Coordinate::new("x", "lib", "1.5")]);
        let notes = session.diagnostics().snapshot();
        assert_eq!(notes.len(), 1);
        assert_eq!(
            notes[0].message,
            "Unable to determine version number for declared dependency x:gone:[1.0,)"
        );
    }

    #[tokio::test]
    async fn invalid_metadata_is_a_violation() {
        let fx = Fixture::new();
        let meta = fx.remote.join("x/lib/maven-metadata.xml");
        fs::create_dir_all(meta.parent().unwrap()).unwrap();
        fs::write(&meta, "<metadata><versions></metadata>").unwrap();
        let mut session = fx.session();
        assert!(session.version_listing("x", "lib").await.unwrap().is_none());
        let records = session.diagnostics().snapshot();
        assert_eq!(records.len(), 1);
        assert!(records[0].violation);
        assert!(records[0].message.starts_with("Invalid metadata file"));
    }

    #[tokio::test]
    async fn unparsable_descriptor_is_a_violation() {
        let fx = Fixture::new();
        let dir = fx.outdir.join("g/bad/1");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("bad-1.pom"), "<project><groupId>g</artifactId>").unwrap();
        let mut session = fx.session();
        assert!(session.required_dependencies(&dir).await.unwrap().is_empty());
        let records = session.diagnostics().snapshot();
        assert_eq!(records.len(), 1);
        assert!(records[0].violation);
    }

    #[test]
    fn mislabeled_groups_are_rewritten() {
        let fx = Fixture::new();
        let session = fx.session();
        let mut felix =
            DependencyEntry::new("${project.groupId}", "org.apache.felix.framework", "1");
        session.relabel("g:app:1", &mut felix);
        assert_eq!(felix.id(), "org.apache.felix:framework:1");

        let mut osgi = DependencyEntry::new("${pom.groupId}", "org.osgi.core", "4");
        session.relabel("g:app:1", &mut osgi);
        assert_eq!(osgi.id(), "org.osgi:org.osgi.core:4");

        let mut fine = DependencyEntry::new("org.osgi", "org.osgi.core", "4");
        session.relabel("g:app:1", &mut fine);
        assert_eq!(fine.id(), "org.osgi:org.osgi.core:4");

        let notes = session.diagnostics().snapshot();
        assert_eq!(notes.len(), 2);
        assert!(notes.iter().all(|n| n.subject == "g:app:1" && !n.violation));
        assert_eq!(
            notes[0].message,
            "Dependent ${project.groupId}:org.apache.felix.framework:1 of g:app:1 has no group, \
             but is using a mislabeled artifact; using org.apache.felix:framework:1"
        );
    }

    #[tokio::test]
    async fn parent_with_property_version_is_fetched_once() {
        let fx = Fixture::new();
        let parent_pom = fx.remote.join("g/parent/1/parent-1.pom");
        fs::create_dir_all(parent_pom.parent().unwrap()).unwrap();
        fs::write(
            &parent_pom,
            format!(
                "<project><groupId>g</groupId><artifactId>parent</artifactId>\
                 <version>${{revision}}</version>{APACHE}\
                 <properties><shared>7</shared></properties></project>"
            ),
        )
        .unwrap();
        let body = format!(
            "{}<dependencies><dependency><groupId>x</groupId><artifactId>y</artifactId>\
             <version>${{shared}}</version></dependency></dependencies>",
            parent("g:parent:1")
        );
        let first = fx.publish(&fx.outdir, "g:one:1", &body);
        let second = fx.publish(&fx.outdir, "g:two:1", &body);
        fx.publish(&fx.outdir, "x:y:7", "");

        let mut session = fx.session();
        let required = session
            .required_dependencies(first.parent().unwrap())
            .await
            .unwrap();
        assert_eq!(required, vec![Coordinate::new("g", "parent", "1")]);

        // A second download attempt would now fail.
        fs::remove_file(&parent_pom).unwrap();
        let required = session
            .required_dependencies(second.parent().unwrap())
            .await
            .unwrap();
        assert_eq!(required, vec![Coordinate::new("g", "parent", "1")]);
        assert!(session.diagnostics().is_empty());
        assert_eq!(session.parents.len(), 1);
    }

    #[tokio::test]
    async fn dependency_parents_wait_until_the_dependency_is_fetched() {
        let fx = Fixture::new();
        let root = fx.publish(
            &fx.outdir,
            "g:app:1",
            &format!("<dependencies>{}</dependencies>", dep("x:lib:1")),
        );
        fx.publish(&fx.remote, "x:lib:1", &parent("x:gone:1"));

        let mut session = fx.session();
        let required = session
            .required_dependencies(root.parent().unwrap())
            .await
            .unwrap();
        assert_eq!(required, vec![Coordinate::new("x", "lib", "1")]);
        assert!(session.diagnostics().is_empty());
        assert!(session.parents.is_empty());
    }
}
