//! CLI command implementations

use anyhow::Context;
use atomgraph_core::IntegrityChecker;
use atomgraph_loader::{StoreConfig, StoreLoader};
use atomgraph_merge::{ConflictResolver, MergeMetadata, MergeStrategy};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Paths of the three versions handed to `merge`.
pub struct MergeFiles {
    pub base: PathBuf,
    pub local: PathBuf,
    pub remote: PathBuf,
}

pub fn check(root: &Path, report_only: bool, json: bool) -> anyhow::Result<ExitCode> {
    tracing::info!("Checking atom store: {}", root.display());

    let config = StoreConfig::load(root)?;
    let max_warnings = config.max_displayed_warnings;
    let store = StoreLoader::new(config)?.load(root)?;
    let (graph, load_warnings) = store.into_graph();

    let report = IntegrityChecker::new(&graph)
        .check()
        .with_load_warnings(load_warnings.iter().map(ToString::to_string).collect());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.display(max_warnings));
    }

    if !report.passed() && report_only {
        tracing::info!("Report-only mode: {} error(s) not failing the run", report.errors.len());
    }
    Ok(ExitCode::from(report.exit_code(report_only)))
}

pub fn merge(
    root: &Path,
    files: MergeFiles,
    strategy: Option<String>,
    local_timestamp: Option<String>,
    remote_timestamp: Option<String>,
) -> anyhow::Result<ExitCode> {
    let strategy = match strategy {
        Some(name) => name,
        None => StoreConfig::load(root)?.default_strategy,
    };
    let strategy: MergeStrategy = strategy.parse()?;

    let base = read_document(&files.base)?;
    let local = read_document(&files.local)?;
    let remote = read_document(&files.remote)?;

    let metadata = (local_timestamp.is_some() || remote_timestamp.is_some()).then(|| MergeMetadata {
        local_timestamp,
        remote_timestamp,
    });

    let result = ConflictResolver::new().merge_documents(
        &base,
        &local,
        &remote,
        strategy,
        metadata.as_ref(),
    );
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub fn impact(root: &Path, atom_id: &str) -> anyhow::Result<ExitCode> {
    let store = atomgraph_loader::load_store(root)?;
    let (graph, _) = store.into_graph();

    if !graph.contains_atom(atom_id) {
        anyhow::bail!("unknown atom '{}'", atom_id);
    }

    let upstream = graph.upstream_closure(atom_id);
    let downstream = graph.downstream_closure(atom_id);

    println!("Upstream of {} ({}):", atom_id, upstream.len());
    for id in &upstream {
        println!("  {}", id);
    }
    println!("Downstream of {} ({}):", atom_id, downstream.len());
    for id in &downstream {
        println!("  {}", id);
    }
    Ok(ExitCode::SUCCESS)
}

/// Read a YAML (or JSON) document into a generic value.
fn read_document(path: &Path) -> anyhow::Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("invalid YAML in {}", path.display()))
}
