//! Per-session caches: resolved parent descriptors and a visited set used
//! to stop cycles in parent chains and in the fetch work-list.

use std::collections::{HashMap, HashSet};

use crate::descriptor::Descriptor;

/// Tracks which coordinate ids have been visited.
#[derive(Debug, Default, Clone)]
pub struct VisitedSet {
    visited: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an id as visited. Returns `false` if already visited.
    pub fn visit(&mut self, id: &str) -> bool {
        self.visited.insert(id.to_string())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.visited.contains(id)
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }
}

/// Parent descriptors with their own ancestry already folded in, keyed by
/// the id children declare for them.
///
/// A parent shared by many artifacts is loaded and resolved once per session.
/// The declared id can differ from the one the parent's own POM yields (a
/// `${revision}` version, say), and lookups only ever know the declared one.
#[derive(Debug, Default)]
pub struct DescriptorCache {
    resolved: HashMap<String, Descriptor>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Descriptor> {
        self.resolved.get(id)
    }

    pub fn insert(&mut self, declared_id: impl Into<String>, descriptor: Descriptor) {
        self.resolved.entry(declared_id.into()).or_insert(descriptor);
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::DescriptorPolicy;
    use mvnget_core::diagnostic::Diagnostics;
    use mvnget_maven::pom::parse_pom;
    use std::path::Path;

    #[test]
    fn visited_tracking() {
        let mut set = VisitedSet::new();
        assert!(set.visit("org.example:lib:1.0"));
        assert!(!set.visit("org.example:lib:1.0"));
        assert!(set.contains("org.example:lib:1.0"));
        assert!(!set.contains("org.example:lib:2.0"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn first_insert_wins() {
        let diags = Diagnostics::new();
        let build = |props: &str| {
            Descriptor::build(
                parse_pom(&format!(
                    "<project><groupId>g</groupId><artifactId>p</artifactId><version>1</version>\
                     <properties><k>{props}</k></properties></project>"
                ))
                .unwrap(),
                Path::new("p-1.pom"),
                None,
                &DescriptorPolicy::default(),
                &diags,
            )
        };
        let mut cache = DescriptorCache::new();
        assert!(cache.is_empty());
        cache.insert("g:p:1", build("first"));
        cache.insert("g:p:1", build("second"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("g:p:1").unwrap().properties["k"], "first");
        assert!(cache.get("g:p:2").is_none());
    }

    #[test]
    fn keyed_by_declared_id() {
        let diags = Diagnostics::new();
        let parent = Descriptor::build(
            parse_pom(
                "<project><groupId>g</groupId><artifactId>p</artifactId>\
                 <version>${revision}</version></project>",
            )
            .unwrap(),
            Path::new("p-1.pom"),
            None,
            &DescriptorPolicy::default(),
            &diags,
        );
        assert_eq!(parent.id(), "g:p:${revision}");
        let mut cache = DescriptorCache::new();
        cache.insert("g:p:1", parent);
        assert!(cache.get("g:p:1").is_some());
        assert!(cache.get("g:p:${revision}").is_none());
    }
}
