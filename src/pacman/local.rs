// src/pacman/local.rs

//! Reader for pacman's local package database
//!
//! Every installed package has a directory `<db_path>/local/<name>-<version>/`
//! whose `desc` file lists metadata in `%FIELD%` blocks:
//!
//! ```text
//! %NAME%
//! make
//!
//! %GROUPS%
//! base-devel
//!
//! %REASON%
//! 1
//! ```
//!
//! A `%REASON%` of `1` marks a dependency; a missing reason means explicit.

use super::{GroupMap, PackageDatabase, cached};
use crate::error::{Error, Result};
use std::cell::OnceCell;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One installed package as recorded in the local database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPackage {
    pub name: String,
    pub version: Option<String>,
    pub groups: Vec<String>,
    pub explicit: bool,
}

#[derive(Debug, Default)]
struct Snapshot {
    groups: GroupMap,
    explicit: BTreeSet<String>,
    installed: BTreeSet<String>,
}

impl Snapshot {
    fn from_packages(packages: Vec<LocalPackage>) -> Self {
        let mut snapshot = Snapshot::default();
        for package in packages {
            for group in &package.groups {
                snapshot
                    .groups
                    .entry(group.clone())
                    .or_default()
                    .insert(package.name.clone());
            }
            if package.explicit {
                snapshot.explicit.insert(package.name.clone());
            }
            snapshot.installed.insert(package.name);
        }
        snapshot
    }
}

/// Backend reading `<db_path>/local` without invoking pacman
#[derive(Debug)]
pub struct LocalDatabase {
    db_path: PathBuf,
    snapshot: OnceCell<Snapshot>,
}

impl LocalDatabase {
    pub fn new(db_path: &Path) -> Self {
        Self {
            db_path: db_path.to_path_buf(),
            snapshot: OnceCell::new(),
        }
    }

    /// Read every package entry under `<db_path>/local`
    pub fn read_packages(&self) -> Result<Vec<LocalPackage>> {
        let local_dir = self.db_path.join("local");
        debug!("Reading local database: {}", local_dir.display());

        let entries = fs::read_dir(&local_dir).map_err(|e| {
            Error::Database(format!("cannot read {}: {}", local_dir.display(), e))
        })?;

        let mut packages = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }

            let desc_path = entry.path().join("desc");
            let content = match fs::read_to_string(&desc_path) {
                Ok(content) => content,
                Err(e) => {
                    warn!("Skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };
            let package = parse_desc(&content).map_err(|e| match e {
                Error::Database(msg) => {
                    Error::Database(format!("{}: {}", desc_path.display(), msg))
                }
                other => other,
            })?;
            debug!(
                "Installed: {} {}",
                package.name,
                package.version.as_deref().unwrap_or("(unknown version)")
            );
            packages.push(package);
        }

        debug!("Found {} installed packages", packages.len());
        Ok(packages)
    }

    fn snapshot(&self) -> Result<&Snapshot> {
        cached(&self.snapshot, || {
            Ok(Snapshot::from_packages(self.read_packages()?))
        })
    }
}

impl PackageDatabase for LocalDatabase {
    fn groups(&self) -> Result<&GroupMap> {
        Ok(&self.snapshot()?.groups)
    }

    fn explicit_packages(&self) -> Result<&BTreeSet<String>> {
        Ok(&self.snapshot()?.explicit)
    }

    fn installed_packages(&self) -> Result<&BTreeSet<String>> {
        Ok(&self.snapshot()?.installed)
    }
}

/// Split a desc file into its `%FIELD%` blocks
///
/// Any line of the form `%X%` starts a new block, so a value shaped like a
/// header would be misread. pacman never writes such values.
pub fn parse_desc_fields(content: &str) -> HashMap<String, Vec<String>> {
    let mut fields = HashMap::new();
    let mut current_field: Option<String> = None;
    let mut values: Vec<String> = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.len() > 1 && trimmed.starts_with('%') && trimmed.ends_with('%') {
            if let Some(field) = current_field.take() {
                fields.insert(field, std::mem::take(&mut values));
            }
            current_field = Some(trimmed[1..trimmed.len() - 1].to_string());
        } else if !trimmed.is_empty() && current_field.is_some() {
            values.push(trimmed.to_string());
        }
    }

    if let Some(field) = current_field {
        fields.insert(field, values);
    }

    fields
}

/// Parse one package's desc file
pub fn parse_desc(content: &str) -> Result<LocalPackage> {
    let mut fields = parse_desc_fields(content);

    let name = fields
        .get("NAME")
        .and_then(|v| v.first())
        .cloned()
        .ok_or_else(|| Error::Database("missing %NAME% field".to_string()))?;

    let version = fields.get("VERSION").and_then(|v| v.first()).cloned();
    let groups = fields.remove("GROUPS").unwrap_or_default();
    let explicit = match fields.get("REASON").and_then(|v| v.first()) {
        None => true,
        Some(reason) => reason == "0",
    };

    Ok(LocalPackage {
        name,
        version,
        groups,
        explicit,
    })
}
