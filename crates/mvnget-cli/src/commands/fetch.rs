//! Handler for `mvnget fetch`.

use miette::Result;
use mvnget_core::config::Config;
use mvnget_core::diagnostic::{append_problem_file, clean_violations, report_lines, Diagnostics};
use mvnget_maven::signature::{GpgVerifier, SignatureVerifier};
use mvnget_ops::ops_fetch::{fetch, FetchSummary};
use mvnget_util::progress::{status, status_warn};

use crate::cli::FetchArgs;

pub async fn exec(args: FetchArgs, mut config: Config) -> Result<()> {
    args.apply(&mut config);
    let diagnostics = Diagnostics::new();

    let result = run(&args.artifacts, &config, &diagnostics).await;
    // The report goes out even when the run failed part-way.
    let reported = report(&config, &diagnostics);
    let summary = result?;
    reported?;

    status(
        "Finished",
        &format!("{} artifact(s) into {}", summary.fetched.len(), config.outdir.display()),
    );
    for id in &summary.not_found {
        status_warn("Missing", id);
    }
    Ok(())
}

async fn run(
    artifacts: &[String],
    config: &Config,
    diagnostics: &Diagnostics,
) -> Result<FetchSummary> {
    let verifier = if config.no_pgp {
        None
    } else {
        GpgVerifier::detect(&config.outdir)?
    };
    let verifier = verifier.as_ref().map(|v| v as &dyn SignatureVerifier);
    fetch(config, artifacts, verifier, diagnostics).await
}

/// Print the problem report, append it to the problem file, and remove the
/// files named by violations when configured to.
fn report(config: &Config, diagnostics: &Diagnostics) -> Result<()> {
    let records = diagnostics.snapshot();
    let Some(lines) = report_lines(&records) else {
        return Ok(());
    };
    print!("\n{lines}");
    if let Some(path) = &config.problem_file {
        append_problem_file(path, &records)?;
    }
    if config.clean_violations {
        for removed in clean_violations(&records) {
            tracing::debug!("removed {}", removed.display());
        }
    }
    Ok(())
}
