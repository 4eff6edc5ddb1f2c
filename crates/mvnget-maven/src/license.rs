//! License acceptability policy.

use crate::pom::PomLicense;

/// Acceptable license lists and the two toggles deciding whether a finding
/// is a violation.
#[derive(Debug, Clone, Default)]
pub struct LicensePolicy {
    pub acceptable_urls: Vec<String>,
    pub acceptable_names: Vec<String>,
    pub allow_unacceptable: bool,
    pub allow_none: bool,
}

/// Result of checking one descriptor's licenses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseVerdict {
    Accepted,
    /// No license declared.
    Missing { violation: bool },
    /// Licenses declared but none acceptable; holds `name (url)` for each.
    Unacceptable {
        violation: bool,
        rejected: Vec<String>,
    },
}

impl LicenseVerdict {
    pub fn is_violation(&self) -> bool {
        matches!(
            self,
            Self::Missing { violation: true } | Self::Unacceptable { violation: true, .. }
        )
    }

    /// Diagnostic text, or `None` when accepted.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Accepted => None,
            Self::Missing { violation: true } => {
                Some("No license declared in violation of license restriction.".to_string())
            }
            Self::Missing { violation: false } => Some("No license declared.".to_string()),
            Self::Unacceptable {
                violation,
                rejected,
            } => {
                let list = rejected.join(", ");
                Some(if *violation {
                    format!(
                        "Not an acceptable license ({list}) in violation of license restriction"
                    )
                } else {
                    format!("Not an acceptable license ({list})")
                })
            }
        }
    }
}

impl LicensePolicy {
    pub fn from_config(config: &mvnget_core::config::Config) -> Self {
        Self {
            acceptable_urls: config.acceptable_license_urls.clone(),
            acceptable_names: config.acceptable_license_names.clone(),
            allow_unacceptable: config.allow_unacceptable_licenses,
            allow_none: config.allow_no_license,
        }
    }

    pub fn accepts(&self, license: &PomLicense) -> bool {
        let url = license.url.trim();
        if !url.is_empty() && self.acceptable_urls.iter().any(|u| url_matches(url, u)) {
            return true;
        }
        let name = license.name.trim();
        !name.is_empty() && self.acceptable_names.iter().any(|n| name_matches(name, n))
    }

    /// Judge a descriptor's declared licenses. One acceptable license is enough.
    pub fn evaluate(&self, licenses: &[PomLicense]) -> LicenseVerdict {
        if licenses.is_empty() {
            return LicenseVerdict::Missing {
                violation: !self.allow_none,
            };
        }
        let mut rejected = Vec::new();
        let mut accepted = 0;
        for license in licenses {
            if self.accepts(license) {
                accepted += 1;
            } else {
                rejected.push(format!("{} ({})", license.name.trim(), license.url.trim()));
            }
        }
        if accepted > 0 {
            LicenseVerdict::Accepted
        } else {
            LicenseVerdict::Unacceptable {
                violation: !self.allow_unacceptable,
                rejected,
            }
        }
    }
}

fn url_matches(url: &str, acceptable: &str) -> bool {
    url.eq_ignore_ascii_case(acceptable)
}

/// Case-insensitive substring match after collapsing whitespace runs.
fn name_matches(name: &str, acceptable: &str) -> bool {
    let collapsed = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    collapsed.contains(&acceptable.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mvnget_core::config::Config;

    fn lic(name: &str, url: &str) -> PomLicense {
        PomLicense {
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    fn strict() -> LicensePolicy {
        let mut policy = LicensePolicy::from_config(&Config::default());
        policy.allow_none = false;
        policy.allow_unacceptable = false;
        policy
    }

    #[test]
    fn url_match_is_case_insensitive() {
        assert!(strict().accepts(&lic("", "HTTP://www.apache.org/licenses/LICENSE-2.0")));
    }

    #[test]
    fn name_match_collapses_whitespace() {
        assert!(strict().accepts(&lic("The  Apache\n   Software License, Version 2.0", "")));
        assert!(strict().accepts(&lic("MIT License", "http://example.com/whatever")));
    }

    #[test]
    fn gpl_is_rejected() {
        let verdict = strict().evaluate(&[lic("GNU GPL", "")]);
        assert!(verdict.is_violation());
        assert_eq!(
            verdict.message().unwrap(),
            "Not an acceptable license (GNU GPL ()) in violation of license restriction"
        );
    }

    #[test]
    fn one_good_license_is_enough() {
        let verdict = strict().evaluate(&[lic("GNU GPL", ""), lic("Apache 2.0", "")]);
        assert_eq!(verdict, LicenseVerdict::Accepted);
        assert!(verdict.message().is_none());
    }

    #[test]
    fn toggles_decide_violation() {
        let lenient = LicensePolicy::from_config(&Config::default());
        let none = lenient.evaluate(&[]);
        assert_eq!(none, LicenseVerdict::Missing { violation: false });
        assert_eq!(none.message().unwrap(), "No license declared.");
        assert!(!lenient.evaluate(&[lic("Proprietary", "")]).is_violation());
        assert!(strict().evaluate(&[]).is_violation());
    }
}
