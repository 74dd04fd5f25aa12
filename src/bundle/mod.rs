// src/bundle/mod.rs

//! Bundle resolution
//!
//! Turns the manifest into a concrete package set:
//! - Evaluating `include` conditions to find directly included bundles
//! - Expanding `#child` references transitively (cycles are harmless)
//! - Expanding `g#group` references through the package database

mod identifier;

pub use identifier::Identifier;

use crate::config::{Bundle, Config};
use crate::error::{Error, Result};
use crate::exec::CommandRunner;
use crate::pacman::PackageDatabase;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info};

/// How a bundle participates in the desired state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Inclusion {
    /// Its own `include` condition succeeded
    Direct,
    /// Reachable from a directly included bundle
    Transitive,
    /// Not part of the desired state
    Excluded,
}

impl Inclusion {
    pub fn symbol(self) -> &'static str {
        match self {
            Inclusion::Direct => "✓",
            Inclusion::Transitive => "○",
            Inclusion::Excluded => "✖",
        }
    }
}

impl fmt::Display for Inclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Result of evaluating every `include` condition once
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inclusions {
    /// Bundles whose condition exited 0
    pub direct: BTreeSet<String>,
    /// Direct bundles plus everything they reference
    pub reachable: BTreeSet<String>,
}

impl Inclusions {
    /// Run each bundle's `include` condition and expand the result
    pub fn evaluate(config: &Config, runner: &dyn CommandRunner) -> Result<Self> {
        let mut direct = BTreeSet::new();
        for (name, bundle) in &config.bundles {
            let Some(condition) = &bundle.include else {
                continue;
            };
            if runner.probe(condition)? {
                debug!("Bundle {} is included", name);
                direct.insert(name.clone());
            } else {
                debug!("Bundle {} is not included", name);
            }
        }

        let reachable = expand_bundles(&direct, config)?;
        info!(
            "{} bundles included directly, {} in total",
            direct.len(),
            reachable.len()
        );
        Ok(Self { direct, reachable })
    }

    pub fn status(&self, name: &str) -> Inclusion {
        if self.direct.contains(name) {
            Inclusion::Direct
        } else if self.reachable.contains(name) {
            Inclusion::Transitive
        } else {
            Inclusion::Excluded
        }
    }
}

/// Collect `roots` and every bundle they reference, directly or not
pub fn expand_bundles<I, S>(roots: I, config: &Config) -> Result<BTreeSet<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut found = BTreeSet::new();
    let mut pending: Vec<String> = roots.into_iter().map(|s| s.as_ref().to_string()).collect();

    while let Some(name) = pending.pop() {
        if found.contains(&name) {
            continue;
        }
        let bundle = config
            .bundles
            .get(&name)
            .ok_or_else(|| Error::UnknownBundle(name.clone()))?;

        pending.extend(
            bundle
                .members
                .iter()
                .filter_map(|m| match Identifier::parse(m) {
                    Identifier::Bundle(child) => Some(child.to_string()),
                    _ => None,
                }),
        );
        found.insert(name);
    }

    Ok(found)
}

/// Packages contributed by one bundle, with groups expanded
///
/// Child bundles contribute nothing here; expand them with [`expand_bundles`].
pub fn bundle_packages(bundle: &Bundle, db: &dyn PackageDatabase) -> Result<BTreeSet<String>> {
    let mut packages = BTreeSet::new();
    for member in &bundle.members {
        match Identifier::parse(member) {
            Identifier::Package(name) => {
                packages.insert(name.to_string());
            }
            Identifier::Group(group) => {
                let members = db
                    .groups()?
                    .get(group)
                    .ok_or_else(|| Error::UnknownGroup(group.to_string()))?;
                packages.extend(members.iter().cloned());
            }
            Identifier::Bundle(_) => {}
        }
    }
    Ok(packages)
}

/// Union of the packages of the named bundles
pub fn resolve_packages<'a, I>(
    names: I,
    config: &Config,
    db: &dyn PackageDatabase,
) -> Result<BTreeSet<String>>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut packages = BTreeSet::new();
    for name in names {
        let bundle = config
            .bundles
            .get(name)
            .ok_or_else(|| Error::UnknownBundle(name.clone()))?;
        packages.extend(bundle_packages(bundle, db)?);
    }
    Ok(packages)
}

/// Every package the included bundles ask for
pub fn desired_packages(
    config: &Config,
    inclusions: &Inclusions,
    db: &dyn PackageDatabase,
) -> Result<BTreeSet<String>> {
    resolve_packages(&inclusions.reachable, config, db)
}

/// Member counts of a bundle, as shown by `list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleSummary {
    pub name: String,
    pub children: Vec<String>,
    pub packages: usize,
    pub groups: usize,
}

impl BundleSummary {
    pub fn new(name: &str, bundle: &Bundle) -> Self {
        let mut summary = Self {
            name: name.to_string(),
            children: Vec::new(),
            packages: 0,
            groups: 0,
        };
        for member in &bundle.members {
            match Identifier::parse(member) {
                Identifier::Package(_) => summary.packages += 1,
                Identifier::Group(_) => summary.groups += 1,
                Identifier::Bundle(child) => summary.children.push(child.to_string()),
            }
        }
        summary
    }

    /// `N packages`, followed by `M groups` on a new line when there are any
    pub fn counts_label(&self) -> String {
        let mut label = format!("{} packages", self.packages);
        if self.groups > 0 {
            label.push_str(&format!("\n{} groups", self.groups));
        }
        label
    }
}
