//! Operation: order two version strings.

use std::cmp::Ordering;

use mvnget_resolver::version::MavenVersion;

/// `"<a> < <b>"`, `"<a> = <b>"` or `"<a> > <b>"`.
pub fn compare(a: &str, b: &str) -> miette::Result<String> {
    let left = MavenVersion::parse(a)?;
    let right = MavenVersion::parse(b)?;
    let symbol = match left.cmp(&right) {
        Ordering::Less => "<",
        Ordering::Equal => "=",
        Ordering::Greater => ">",
    };
    tracing::debug!(
        "{} [{}] vs {} [{}]",
        left,
        left.normalized(),
        right,
        right.normalized()
    );
    Ok(format!("{left} {symbol} {right}"))
}
