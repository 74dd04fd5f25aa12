// src/commands.rs

//! Implementations of the `pacbundle` subcommands
//!
//! Each command reads the manifest through a [`Session`] and writes its
//! report to the given writer; only confirmed actions reach the runner.

use crate::bundle::{self, BundleSummary, Inclusion, Inclusions};
use crate::config::{self, Config};
use crate::error::{Error, Result};
use crate::exec::{CommandRunner, check_status, shell_join};
use crate::output;
use crate::pacman::PackageDatabase;
use crate::reconcile::{self, Drift};
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// Legend printed above the `list` table
pub const LIST_LEGEND: &str = "✓: directly included, ○: transitively included, ✖: not included";

/// Hint printed after packages were demoted to dependencies
pub const CLEANUP_HINT: &str = "pacman -Rsn $(pacman -Qdtq)";

/// How a command finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// `compare` found differences
    Drift,
}

impl Outcome {
    /// Process exit code for this outcome
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Success => 0,
            Outcome::Drift => 10,
        }
    }
}

/// Asks the user before anything is changed
pub type Confirm<'a> = &'a dyn Fn(&str) -> Result<()>;

/// Everything a command needs for one invocation
pub struct Session<'a> {
    pub config: &'a Config,
    pub db: &'a dyn PackageDatabase,
    pub runner: &'a dyn CommandRunner,
    pub confirm: Confirm<'a>,
    /// Skip confirmation prompts
    pub no_confirm: bool,
    /// Width used for column layouts
    pub width: usize,
}

impl Session<'_> {
    fn confirm_action(&self) -> Result<()> {
        if self.no_confirm {
            return Ok(());
        }
        (self.confirm)("Proceed with action?")
    }

    fn inclusions(&self) -> Result<Inclusions> {
        Inclusions::evaluate(self.config, self.runner)
    }

    fn write_columns(&self, out: &mut dyn Write, items: &BTreeSet<String>) -> Result<()> {
        let items: Vec<&String> = items.iter().collect();
        write!(out, "{}", output::render_columns(&items, self.width))?;
        Ok(())
    }

    /// `list`: show every bundle and whether it is included
    pub fn list(&self, out: &mut dyn Write, json: bool) -> Result<Outcome> {
        let inclusions = self.inclusions()?;

        let entries: Vec<ListEntry> = self
            .config
            .bundles
            .iter()
            .map(|(name, bundle)| ListEntry {
                summary: BundleSummary::new(name, bundle),
                included: inclusions.status(name),
            })
            .collect();

        if json {
            serde_json::to_writer_pretty(&mut *out, &entries).map_err(std::io::Error::from)?;
            writeln!(out)?;
            return Ok(Outcome::Success);
        }

        let rows: Vec<Vec<String>> = entries
            .iter()
            .map(|entry| {
                vec![
                    entry.summary.name.clone(),
                    entry.summary.children.join(", "),
                    entry.summary.counts_label(),
                    entry.included.to_string(),
                ]
            })
            .collect();

        writeln!(out, "{}", LIST_LEGEND)?;
        write!(
            out,
            "{}",
            output::render_table(&["Bundle", "Child Bundles", "Packages", "Included"], &rows)
        )?;
        Ok(Outcome::Success)
    }

    /// Drift between the included bundles and the explicit packages
    pub fn drift(&self) -> Result<Drift> {
        let inclusions = self.inclusions()?;
        let desired = bundle::desired_packages(self.config, &inclusions, self.db)?;
        Ok(Drift::compute(&desired, self.db.explicit_packages()?))
    }

    /// `compare`: report drift; [`Outcome::Drift`] when there is any
    pub fn compare(&self, out: &mut dyn Write, json: bool) -> Result<Outcome> {
        let drift = self.drift()?;

        if json {
            serde_json::to_writer_pretty(&mut *out, &drift).map_err(std::io::Error::from)?;
            writeln!(out)?;
        } else {
            if !drift.unspecified.is_empty() {
                writeln!(
                    out,
                    "There are {} packages are explicitly installed but not specified in included bundles",
                    drift.unspecified.len()
                )?;
                self.write_columns(out, &drift.unspecified)?;
            }
            if !drift.missing.is_empty() {
                writeln!(
                    out,
                    "There are {} packages are specified in included bundles but not explicitly installed",
                    drift.missing.len()
                )?;
                self.write_columns(out, &drift.missing)?;
            }
        }

        if drift.is_empty() {
            Ok(Outcome::Success)
        } else {
            Ok(Outcome::Drift)
        }
    }

    /// `sync`: make the explicit packages match the included bundles
    pub fn sync(&self, out: &mut dyn Write) -> Result<Outcome> {
        let drift = self.drift()?;

        if !drift.unspecified.is_empty() {
            writeln!(
                out,
                "The following {} packages will be unmarked as explicitly installed.",
                drift.unspecified.len()
            )?;
            self.write_columns(out, &drift.unspecified)?;
        }
        if !drift.missing.is_empty() {
            writeln!(
                out,
                "The following {} packages will be installed",
                drift.missing.len()
            )?;
            self.write_columns(out, &drift.missing)?;
        }
        if drift.is_empty() {
            writeln!(out, "Nothing to do")?;
            return Ok(Outcome::Success);
        }

        self.confirm_action()?;

        if !drift.unspecified.is_empty() {
            reconcile::mark_as_dependency(&drift.unspecified, self.runner)?;
            writeln!(
                out,
                "Remember to run {} to clean up unused dependencies",
                output::italic(CLEANUP_HINT)
            )?;
        }
        if !drift.missing.is_empty() {
            reconcile::install_or_mark_explicit(
                &drift.missing,
                self.db,
                &self.config.settings,
                self.runner,
            )?;
        }
        info!("Sync complete");
        Ok(Outcome::Success)
    }

    /// `install NAME`: install a bundle and everything it references
    pub fn install(&self, name: &str, out: &mut dyn Write) -> Result<Outcome> {
        if !self.config.bundles.contains_key(name) {
            return Err(Error::NoSuchBundle(name.to_string()));
        }

        let bundles = bundle::expand_bundles([name], self.config)?;
        debug!("Bundle {} expands to {:?}", name, bundles);
        let packages = bundle::resolve_packages(&bundles, self.config, self.db)?;

        let pending: BTreeSet<String> = packages
            .difference(self.db.explicit_packages()?)
            .cloned()
            .collect();
        if pending.is_empty() {
            writeln!(out, "All packages in the bundle are already installed.")?;
            return Ok(Outcome::Success);
        }

        writeln!(
            out,
            "{}",
            output::bold(
                "The following packages will be installed or marked as explicitly installed."
            )
        )?;
        self.write_columns(out, &pending)?;
        self.confirm_action()?;

        reconcile::install_or_mark_explicit(
            &packages,
            self.db,
            &self.config.settings,
            self.runner,
        )?;
        Ok(Outcome::Success)
    }
}

/// One row of `list --json`
#[derive(Debug, Clone, Serialize)]
pub struct ListEntry {
    #[serde(flatten)]
    pub summary: BundleSummary,
    pub included: Inclusion,
}

/// `config`: open the manifest in `$EDITOR`, creating it first if needed
pub fn edit_config(path: &Path, editor: Option<&str>, out: &mut dyn Write) -> Result<()> {
    if config::ensure_config_file(path)? {
        writeln!(out, "Creating file")?;
    }

    let editor = editor
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or(Error::EditorNotSet)?;
    let mut argv: Vec<String> = editor
        .split(' ')
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect();
    argv.push(path.to_string_lossy().into_owned());

    let command_line = shell_join(&argv);
    debug!("Opening editor: {}", command_line);
    let status = Command::new(&argv[0]).args(&argv[1..]).status()?;
    check_status(&command_line, status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_exit_codes() {
        assert_eq!(Outcome::Success.exit_code(), 0);
        assert_eq!(Outcome::Drift.exit_code(), 10);
    }

    #[test]
    fn test_edit_config_requires_editor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pacbundle/config.toml");
        let mut out = Vec::new();

        let err = edit_config(&path, None, &mut out).unwrap_err();
        assert!(matches!(err, Error::EditorNotSet));
        // The file is still created before the editor check
        assert!(path.is_file());
        assert_eq!(String::from_utf8(out).unwrap(), "Creating file\n");
    }

    #[test]
    fn test_edit_config_runs_editor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();
        let mut out = Vec::new();

        edit_config(&path, Some("true --ignored"), &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_edit_config_reports_editor_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut out = Vec::new();

        let err = edit_config(&path, Some("false"), &mut out).unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));
    }
}
