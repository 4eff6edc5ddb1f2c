//! Handler for `mvnget compare`.

use miette::Result;

pub fn exec(a: &str, b: &str) -> Result<()> {
    println!("{}", mvnget_ops::ops_compare::compare(a, b)?);
    Ok(())
}
