//! POM document parsing.
//!
//! Produces the raw declarations of a `project` document: coordinates,
//! properties, licenses, parents, dependency management and dependencies.
//! No property substitution or inheritance happens here.

use std::collections::BTreeMap;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use mvnget_util::errors::MvnGetError;

/// Literal fixups for vendor documents that are not well-formed XML.
const SANITIZE_FIXUPS: &[(&str, &str)] = &[
    // plexus 1.0.3
    ("&oslash;", "o"),
    // javax/portlet/portlet-api
    ("&nbsp;", " "),
    // com/amazonaws/aws-lambda-java-events: unbound xsi prefix
    (
        r#"<project xsi:schemaLocation="http://maven.apache.org/POM/4.0.0 https://maven.apache.org/maven-v4_0_0.xsd">"#,
        "<project>",
    ),
];

/// A parsed POM document, exactly as declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PomDocument {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub properties: BTreeMap<String, String>,
    pub licenses: Vec<PomLicense>,
    /// `project>parent` elements; normally zero or one.
    pub parents: Vec<PomDependency>,
    pub dependency_management: Vec<PomDependency>,
    pub dependencies: Vec<PomDependency>,
}

/// A `dependency` (or `parent`) element. Absent fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PomDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub scope: String,
    pub optional: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PomLicense {
    pub name: String,
    pub url: String,
}

/// Repair known vendor defects before parsing.
pub fn sanitize(contents: &str) -> String {
    let mut fixed = contents.to_string();
    for (from, to) in SANITIZE_FIXUPS {
        if fixed.contains(from) {
            fixed = fixed.replace(from, to);
        }
    }
    fixed
}

/// Read, sanitize and parse a POM file.
pub fn read_pom(path: &Path) -> miette::Result<PomDocument> {
    let bytes = std::fs::read(path).map_err(MvnGetError::Io)?;
    let contents = sanitize(&String::from_utf8_lossy(&bytes));
    parse_document(&contents).map_err(|e| {
        tracing::warn!("Error reading XML file {}: {e}", path.display());
        MvnGetError::Parse {
            message: format!("Failed to parse POM file {}: {e}", path.display()),
        }
        .into()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Parent,
    Managed,
    Direct,
}

/// Accumulates declarations while walking the element tree.
#[derive(Default)]
struct PomBuilder {
    pom: PomDocument,
    path: Vec<String>,
    text: String,
    current: Option<(Section, PomDependency)>,
    license: Option<PomLicense>,
}

impl PomBuilder {
    fn open(&mut self, tag: String) -> Result<(), String> {
        if self.path.is_empty() && tag != "project" {
            return Err(format!("root element is <{tag}>, expected <project>"));
        }
        self.path.push(tag);
        self.text.clear();

        let section = match self.context().as_str() {
            "project>parent" => Some(Section::Parent),
            "project>dependencyManagement>dependencies>dependency" => Some(Section::Managed),
            "project>dependencies>dependency" => Some(Section::Direct),
            "project>licenses>license" => {
                self.license = Some(PomLicense::default());
                None
            }
            _ => None,
        };
        if let Some(section) = section {
            self.current = Some((section, PomDependency::default()));
        }
        Ok(())
    }

    fn close(&mut self) {
        let ctx = self.context();
        let text = self.text.trim().to_string();
        let leaf = self.path.last().cloned().unwrap_or_default();
        let depth = self.path.len();

        if depth == 2 {
            match leaf.as_str() {
                "groupId" => self.pom.group_id = text.clone(),
                "artifactId" => self.pom.artifact_id = text.clone(),
                "version" => self.pom.version = text.clone(),
                _ => {}
            }
        }
        if depth == 3 && self.path[1] == "properties" {
            self.pom.properties.insert(leaf.clone(), text.clone());
        }

        if let Some((section, ref mut dep)) = self.current {
            let container_depth = match section {
                Section::Parent => 2,
                Section::Direct => 3,
                Section::Managed => 4,
            };
            if depth == container_depth + 1 {
                match leaf.as_str() {
                    "groupId" => dep.group_id = text.clone(),
                    "artifactId" => dep.artifact_id = text.clone(),
                    "version" => dep.version = text.clone(),
                    "scope" => dep.scope = text.clone(),
                    "optional" => dep.optional = text == "true",
                    _ => {}
                }
            } else if depth == container_depth {
                if let Some((section, dep)) = self.current.take() {
                    match section {
                        Section::Parent => self.pom.parents.push(dep),
                        Section::Managed => self.pom.dependency_management.push(dep),
                        Section::Direct => self.pom.dependencies.push(dep),
                    }
                }
            }
        }

        if let Some(ref mut license) = self.license {
            match ctx.as_str() {
                "project>licenses>license>name" => license.name = text.clone(),
                "project>licenses>license>url" => license.url = text.clone(),
                "project>licenses>license" => {
                    if let Some(license) = self.license.take() {
                        self.pom.licenses.push(license);
                    }
                }
                _ => {}
            }
        }

        self.path.pop();
        self.text.clear();
    }

    fn context(&self) -> String {
        self.path.join(">")
    }
}

/// Parse POM XML into a [`PomDocument`].
pub fn parse_pom(xml: &str) -> miette::Result<PomDocument> {
    parse_document(xml).map_err(|message| {
        MvnGetError::Parse {
            message: format!("Failed to parse POM XML: {message}"),
        }
        .into()
    })
}

fn parse_document(xml: &str) -> Result<PomDocument, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut builder = PomBuilder::default();
    let mut seen_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                seen_root = true;
                builder.open(String::from_utf8_lossy(e.name().as_ref()).to_string())?;
            }
            Ok(Event::Empty(ref e)) => {
                seen_root = true;
                builder.open(String::from_utf8_lossy(e.name().as_ref()).to_string())?;
                builder.close();
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().map_err(|err| err.to_string())?;
                builder.text.push_str(&text);
            }
            Ok(Event::CData(ref e)) => {
                builder.text.push_str(&String::from_utf8_lossy(e));
            }
            Ok(Event::End(_)) => builder.close(),
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
    }

    if !seen_root {
        return Err("no <project> element".to_string());
    }
    Ok(builder.pom)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <modelVersion>4.0.0</modelVersion>
    <parent>
        <groupId>org.example</groupId>
        <artifactId>parent</artifactId>
        <version>7</version>
    </parent>
    <artifactId>my-lib</artifactId>
    <version>1.0.0</version>

    <properties>
        <slf4j.version>1.7.30</slf4j.version>
        <empty.prop/>
    </properties>

    <licenses>
        <license>
            <name>  Apache License, Version 2.0 </name>
            <url>https://www.apache.org/licenses/LICENSE-2.0.txt</url>
        </license>
    </licenses>

    <dependencyManagement>
        <dependencies>
            <dependency>
                <groupId>junit</groupId>
                <artifactId>junit</artifactId>
                <version>4.13.2</version>
            </dependency>
        </dependencies>
    </dependencyManagement>

    <dependencies>
        <dependency>
            <groupId>org.slf4j</groupId>
            <artifactId>slf4j-api</artifactId>
            <version>${slf4j.version}</version>
            <exclusions>
                <exclusion>
                    <groupId>ignored</groupId>
                    <artifactId>ignored</artifactId>
                </exclusion>
            </exclusions>
        </dependency>
        <dependency>
            <groupId>junit</groupId>
            <artifactId>junit</artifactId>
            <scope>test</scope>
        </dependency>
        <dependency>
            <groupId>com.acme</groupId>
            <artifactId>extra</artifactId>
            <version>[1.0,2.0)</version>
            <optional>true</optional>
        </dependency>
    </dependencies>

    <build>
        <plugins>
            <plugin>
                <dependencies>
                    <dependency>
                        <groupId>plugin.only</groupId>
                        <artifactId>skip-me</artifactId>
                    </dependency>
                </dependencies>
            </plugin>
        </plugins>
    </build>
</project>"#;

    #[test]
    fn top_level_fields() {
        let pom = parse_pom(POM).unwrap();
        assert_eq!(pom.group_id, "");
        assert_eq!(pom.artifact_id, "my-lib");
        assert_eq!(pom.version, "1.0.0");
    }

    #[test]
    fn properties_including_empty() {
        let pom = parse_pom(POM).unwrap();
        assert_eq!(pom.properties["slf4j.version"], "1.7.30");
        assert_eq!(pom.properties["empty.prop"], "");
    }

    #[test]
    fn parent_and_license() {
        let pom = parse_pom(POM).unwrap();
        assert_eq!(pom.parents.len(), 1);
        assert_eq!(pom.parents[0].artifact_id, "parent");
        assert_eq!(pom.parents[0].version, "7");
        assert_eq!(pom.licenses.len(), 1);
        assert_eq!(pom.licenses[0].name, "Apache License, Version 2.0");
    }

    #[test]
    fn dependency_sections_are_separate() {
        let pom = parse_pom(POM).unwrap();
        assert_eq!(pom.dependency_management.len(), 1);
        assert_eq!(pom.dependency_management[0].version, "4.13.2");

        assert_eq!(pom.dependencies.len(), 3);
        let slf4j = &pom.dependencies[0];
        assert_eq!(slf4j.group_id, "org.slf4j");
        assert_eq!(slf4j.version, "${slf4j.version}");
        assert_eq!(pom.dependencies[1].scope, "test");
        assert_eq!(pom.dependencies[1].version, "");
        assert!(pom.dependencies[2].optional);
        assert!(pom
            .dependencies
            .iter()
            .all(|d| d.group_id != "plugin.only" && d.group_id != "ignored"));
    }

    #[test]
    fn sanitize_known_defects() {
        let broken = r#"<project xsi:schemaLocation="http://maven.apache.org/POM/4.0.0 https://maven.apache.org/maven-v4_0_0.xsd"><name>Bj&oslash;rn&nbsp;lib</name><artifactId>x</artifactId></project>"#;
        assert!(parse_pom(broken).is_err());
        let fixed = sanitize(broken);
        assert!(fixed.starts_with("<project>"));
        let pom = parse_pom(&fixed).unwrap();
        assert_eq!(pom.artifact_id, "x");
    }

    #[test]
    fn non_project_root_is_rejected() {
        assert!(parse_pom("<metadata><version>1</version></metadata>").is_err());
        assert!(parse_pom("").is_err());
    }

    #[test]
    fn malformed_xml_is_parse_error() {
        let err = parse_pom("<project><groupId>g</artifactId></project>").unwrap_err();
        assert!(err.to_string().starts_with("Parse error"));
    }

    #[test]
    fn read_pom_from_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("lib-1.0.pom");
        std::fs::write(&path, POM).unwrap();
        let pom = read_pom(&path).unwrap();
        assert_eq!(pom.artifact_id, "my-lib");
        assert!(read_pom(&tmp.path().join("missing.pom")).is_err());
    }
}
