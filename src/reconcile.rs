// src/reconcile.rs

//! Comparing the desired package set with the system and closing the gap
//!
//! The computations here are pure set arithmetic; the only side effects are
//! the pacman command lines handed to a [`CommandRunner`].

use crate::config::Settings;
use crate::error::Result;
use crate::exec::CommandRunner;
use crate::pacman::PackageDatabase;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::info;

/// pacman invocation that changes an install reason
const MARK_COMMAND: [&str; 3] = ["sudo", "pacman", "-D"];

/// Difference between the manifest and the explicitly installed packages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Drift {
    /// Explicitly installed but not asked for by any included bundle
    pub unspecified: BTreeSet<String>,
    /// Asked for by an included bundle but not explicitly installed
    pub missing: BTreeSet<String>,
}

impl Drift {
    pub fn compute(desired: &BTreeSet<String>, explicit: &BTreeSet<String>) -> Self {
        Self {
            unspecified: explicit.difference(desired).cloned().collect(),
            missing: desired.difference(explicit).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.unspecified.is_empty() && self.missing.is_empty()
    }
}

/// What it takes to make a package set explicitly installed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallPlan {
    /// Not installed at all
    pub install: BTreeSet<String>,
    /// Installed as a dependency; only the reason needs to change
    pub mark_explicit: BTreeSet<String>,
}

impl InstallPlan {
    pub fn compute(
        requested: &BTreeSet<String>,
        explicit: &BTreeSet<String>,
        installed: &BTreeSet<String>,
    ) -> Self {
        let (mark_explicit, install) = requested
            .difference(explicit)
            .cloned()
            .partition(|package| installed.contains(package));
        Self {
            install,
            mark_explicit,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.install.is_empty() && self.mark_explicit.is_empty()
    }

    /// Command lines that carry out the plan, installs first
    pub fn commands(&self, settings: &Settings) -> Vec<Vec<String>> {
        let mut commands = Vec::new();
        if !self.install.is_empty() {
            let mut argv = settings.install_argv();
            argv.extend(self.install.iter().cloned());
            commands.push(argv);
        }
        if !self.mark_explicit.is_empty() {
            commands.push(mark_argv("--asexplicit", &self.mark_explicit));
        }
        commands
    }
}

fn mark_argv(flag: &str, packages: &BTreeSet<String>) -> Vec<String> {
    MARK_COMMAND
        .iter()
        .map(|s| s.to_string())
        .chain(std::iter::once(flag.to_string()))
        .chain(packages.iter().cloned())
        .collect()
}

/// Install the missing packages of `requested` and promote the rest to explicit
pub fn install_or_mark_explicit(
    requested: &BTreeSet<String>,
    db: &dyn PackageDatabase,
    settings: &Settings,
    runner: &dyn CommandRunner,
) -> Result<InstallPlan> {
    let plan = InstallPlan::compute(requested, db.explicit_packages()?, db.installed_packages()?);
    if plan.is_empty() {
        info!("All requested packages are already explicitly installed");
        return Ok(plan);
    }
    info!(
        "Installing {} packages, marking {} as explicit",
        plan.install.len(),
        plan.mark_explicit.len()
    );
    for argv in plan.commands(settings) {
        runner.run(&argv)?;
    }
    Ok(plan)
}

/// Demote packages to dependencies so `pacman -Qdt` can collect them
pub fn mark_as_dependency(packages: &BTreeSet<String>, runner: &dyn CommandRunner) -> Result<()> {
    if packages.is_empty() {
        return Ok(());
    }
    info!("Marking {} packages as dependencies", packages.len());
    runner.run(&mark_argv("--asdeps", packages))
}
