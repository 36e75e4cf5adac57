//! clustersync — cluster membership synchronizer.
//!
//! # Usage
//!
//! ```text
//! clustersync [-p <PASSWORD>] [-f] [--dry-run]
//!             [--playbook-dir <PATH>] [--cluster-id <ID>] [--endpoint <URL>]
//! ```
//!
//! Fetches the desired cluster topology from the control plane, reconciles
//! it against the local playbook configuration, and runs the playbook only
//! when a file actually changed (or `--force` was given). One shot per
//! invocation; the surrounding scheduler must never run two instances
//! concurrently against the same playbook directory.

mod trigger;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use clustersync_core::PlaybookLayout;
use clustersync_engine::{reconcile, WriteResult};
use clustersync_fetch::{
    agent, cluster_id_from_hostname, fetch, Endpoint, ScalingDirection, DEFAULT_ENDPOINT,
};

#[derive(Parser, Debug)]
#[command(
    name = "clustersync",
    version,
    about = "Synchronize cluster membership into the local playbook configuration",
    long_about = None,
)]
struct Cli {
    /// Cluster password (omit for an interactive masked prompt).
    #[arg(short, long)]
    password: Option<String>,

    /// Run the playbook even when nothing changed.
    #[arg(short, long)]
    force: bool,

    /// Show what would change without writing files or running the playbook.
    #[arg(long)]
    dry_run: bool,

    /// Playbook directory (default: $HOME/playbook).
    #[arg(long, value_name = "PATH")]
    playbook_dir: Option<PathBuf>,

    /// Cluster id (default: suffix of this node's hostname after the last '-').
    #[arg(long, value_name = "ID")]
    cluster_id: Option<String>,

    /// Control-plane endpoint template; `{cluster_id}` is substituted.
    #[arg(long, value_name = "URL", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env().init();
    run(Cli::parse())
}

fn run(cli: Cli) -> Result<()> {
    let secret = match cli.password {
        Some(secret) => secret,
        None => rpassword::prompt_password("Cluster password (input will be hidden): ")
            .context("could not read password from terminal")?,
    };
    if secret.is_empty() {
        bail!("password must not be empty");
    }

    let layout = match cli.playbook_dir {
        Some(dir) => PlaybookLayout::at(dir),
        None => PlaybookLayout::from_home()?,
    };

    let cluster_id = match cli.cluster_id {
        Some(id) => id,
        None => {
            let hostname = gethostname::gethostname().to_string_lossy().into_owned();
            cluster_id_from_hostname(&hostname).to_owned()
        }
    };
    let endpoint = Endpoint::new(&cli.endpoint, &cluster_id);
    tracing::debug!("cluster id {cluster_id}, endpoint {}", endpoint.url());

    let topology = fetch(&agent(), &endpoint, &secret, ScalingDirection::Up)
        .context("fetching the cluster topology failed")?;

    let report = reconcile::run(&layout, &topology, cli.dry_run)
        .context("reconciliation failed; playbook run skipped")?;
    print_report(&report, cli.dry_run);

    if cli.dry_run {
        return Ok(());
    }
    if report.changed() {
        println!("Files changed. Running playbook...");
        trigger::run_playbook(layout.root())?;
    } else if cli.force {
        println!("Force run requested. Running playbook...");
        trigger::run_playbook(layout.root())?;
    } else {
        println!("No changes detected and no force run requested. Skipping playbook execution.");
    }
    Ok(())
}

fn print_report(report: &reconcile::ReconcileReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    let changes = report.writes.iter().filter(|w| w.is_change()).count();
    let unchanged = report.writes.len() - changes;
    println!("{prefix}✓ reconciled ({changes} changed, {unchanged} unchanged)");

    for write in &report.writes {
        match write {
            WriteResult::Written { path } => println!("  ✎  {}", path.display()),
            WriteResult::Removed { path } => println!("  ✗  {}", path.display()),
            WriteResult::WouldWrite { path } => println!("  ~  {}", path.display()),
            WriteResult::WouldRemove { path } => println!("  ~✗ {}", path.display()),
            WriteResult::Unchanged { .. } => {}
        }
    }

    for diff in &report.diffs {
        print!("{}", diff.unified_diff);
    }
}
