//! `maven-metadata.xml` parsing for version discovery.

use quick_xml::events::Event;
use quick_xml::Reader;

use mvnget_util::errors::MvnGetError;

/// Version strings published for one `group:artifact`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MavenMetadata {
    /// Every `<version>` element, in document order.
    pub versions: Vec<String>,
    /// Every `<release>` element, in document order.
    pub releases: Vec<String>,
}

/// Parse a metadata document. `version` and `release` elements are picked up
/// wherever they appear; blank ones are ignored.
pub fn parse_metadata(xml: &str) -> miette::Result<MavenMetadata> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut meta = MavenMetadata::default();
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                path.push(String::from_utf8_lossy(e.name().as_ref()).to_string());
                text_buf.clear();
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().map_err(|err| MvnGetError::Parse {
                    message: format!("Failed to parse maven-metadata.xml: {err}"),
                })?;
                text_buf.push_str(&text);
            }
            Ok(Event::End(_)) => {
                let value = text_buf.trim();
                if !value.is_empty() {
                    match path.last().map(|s| s.as_str()) {
                        Some("version") => meta.versions.push(value.to_string()),
                        Some("release") => meta.releases.push(value.to_string()),
                        _ => {}
                    }
                }
                path.pop();
                text_buf.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(MvnGetError::Parse {
                    message: format!("Failed to parse maven-metadata.xml: {e}"),
                }
                .into());
            }
            _ => {}
        }
    }

    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_and_release() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>org.slf4j</groupId>
  <artifactId>slf4j-api</artifactId>
  <versioning>
    <latest>2.0.0-alpha1</latest>
    <release>1.7.30</release>
    <versions>
      <version>1.7.28</version>
      <version> 1.7.29 </version>
      <version></version>
      <version>1.7.30</version>
      <version>2.0.0-alpha1</version>
    </versions>
  </versioning>
</metadata>"#;
        let meta = parse_metadata(xml).unwrap();
        assert_eq!(
            meta.versions,
            vec!["1.7.28", "1.7.29", "1.7.30", "2.0.0-alpha1"]
        );
        assert_eq!(meta.releases, vec!["1.7.30"]);
    }

    #[test]
    fn empty_metadata() {
        let meta = parse_metadata("<metadata/>").unwrap();
        assert!(meta.versions.is_empty());
        assert!(meta.releases.is_empty());
    }

    #[test]
    fn malformed_metadata() {
        assert!(parse_metadata("<metadata><versions></metadata>").is_err());
    }
}
