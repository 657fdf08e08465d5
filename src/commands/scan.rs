use crate::AuditContext;
use crate::manifest::source;
use crate::metadata::{CachedLookup, Enricher, SystemLookup};
use crate::mounts::MountTable;
use crate::output::{FileType, Report};
use crate::scanner::{FsLister, IgnoreSet, find_unmanaged_files};
use anyhow::{Context, Result};
use std::io::{self, BufWriter};
use std::path::Path;
use tracing::{Level, info, span};

/// Run the unmanaged file scan and print the JSON report to stdout
///
/// # Errors
///
/// Returns an error if any phase of [`build_report`] fails or stdout
/// cannot be written.
pub fn execute(ctx: &AuditContext, extract_metadata: bool) -> Result<()> {
    let report = build_report(ctx, extract_metadata)?;
    report.write_to(BufWriter::new(io::stdout().lock()))
}

/// Classify everything below the configured root and optionally enrich it.
///
/// Remote mount points at or below the root are reported as `remote_dir`
/// without being walked.
///
/// # Errors
///
/// Returns an error if the mount table or the manifest cannot be loaded,
/// or if enrichment hits a path that disappeared.
pub fn build_report(ctx: &AuditContext, extract_metadata: bool) -> Result<Report> {
    let span = span!(Level::INFO, "scan");
    let _guard = span.enter();

    let config = &ctx.config;
    let mounts = MountTable::load(&config.mounts)?;
    let own_binary = std::env::current_exe().ok();
    let ignore = IgnoreSet::for_scan(config, &mounts, own_binary.as_deref());

    let managed = source::select(config.manifest.source, config.manifest.path.as_deref())?
        .load()?;

    let root = config
        .scan
        .root
        .to_str()
        .context("Scan root is not valid UTF-8")?;
    let mut classified = find_unmanaged_files(root, &FsLister, &managed, &ignore);

    for mount in &mounts.remote {
        if Path::new(mount).starts_with(&config.scan.root) {
            classified.insert(
                format!("{}/", mount.trim_end_matches('/')),
                FileType::RemoteDir,
            );
        }
    }

    let mut report = Report::from_classified(classified);
    info!(unmanaged = report.files.len(), "Scan finished");

    if extract_metadata {
        let lookup = CachedLookup::new(SystemLookup);
        let enricher = Enricher::new(&FsLister, &lookup, &ignore);
        for record in &mut report.files {
            enricher.enrich(record)?;
        }
        report.extracted = true;
    }

    Ok(report)
}
