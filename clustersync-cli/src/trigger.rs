//! External playbook trigger.
//!
//! Fired only after a reconciliation run that changed something (or with
//! `--force`). The command itself is fixed; parallelism scales with the
//! host's CPU count like the surrounding tooling expects.

use std::path::Path;
use std::process::Command;
use std::thread;

use anyhow::{bail, Context, Result};

/// Run `ansible-playbook -v --forks <cpus*4> -i ansible_hosts site.yml`
/// inside the playbook directory, inheriting stdout/stderr.
pub fn run_playbook(playbook_dir: &Path) -> Result<()> {
    let forks = forks();
    println!("Running: ansible-playbook -v --forks {forks} -i ansible_hosts site.yml");
    let status = Command::new("ansible-playbook")
        .arg("-v")
        .arg("--forks")
        .arg(forks.to_string())
        .arg("-i")
        .arg("ansible_hosts")
        .arg("site.yml")
        .current_dir(playbook_dir)
        .status()
        .context("could not start ansible-playbook")?;

    if !status.success() {
        bail!("ansible-playbook exited with {status}");
    }
    Ok(())
}

fn forks() -> usize {
    let cpus = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    cpus * 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forks_scale_with_cpu_count() {
        assert!(forks() >= 4);
        assert_eq!(forks() % 4, 0);
    }
}
