// src/bundle/identifier.rs

/// A bundle member, classified by its prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identifier<'a> {
    /// Plain package name
    Package(&'a str),
    /// `g#<group>`: every package of a pacman group
    Group(&'a str),
    /// `#<bundle>`: another bundle of the manifest
    Bundle(&'a str),
}

impl<'a> Identifier<'a> {
    /// Classify a member; the returned name has its prefix stripped
    pub fn parse(member: &'a str) -> Self {
        if let Some(bundle) = member.strip_prefix('#') {
            Identifier::Bundle(bundle)
        } else if let Some(group) = member.strip_prefix("g#") {
            Identifier::Group(group)
        } else {
            Identifier::Package(member)
        }
    }
}
