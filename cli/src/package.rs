//! Package specifiers and requirements files.

use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;

/// Comparison operators recognized in a pip specifier.
/// Two-character operators must be tried before `>` and `<`.
const OPERATORS: [&str; 6] = ["==", ">=", "<=", "~=", ">", "<"];

/// Errors produced while parsing a package specifier.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("empty package specifier")]
    Empty,
}

/// A package name plus an optionally pinned version.
///
/// Only `==` pins a version. Range operators leave the index free to resolve
/// any version, so they carry no version into validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRef {
    /// Package name as written (lower-cased at the network boundary).
    pub name: String,
    /// Exact version when the specifier used `==`.
    pub version: Option<String>,
}

impl PackageRef {
    /// Parse a pip specifier such as `requests`, `keras==3.11.2`, or
    /// `django>=4.0` by splitting on the first recognized operator.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::Empty`] when the specifier has no package name.
    pub fn parse(spec: &str) -> Result<Self, SpecError> {
        let spec = spec.trim();
        for op in OPERATORS {
            if let Some((name, version)) = spec.split_once(op) {
                let name = name.trim();
                if name.is_empty() {
                    return Err(SpecError::Empty);
                }
                let version = (op == "==")
                    .then(|| version.trim().to_string())
                    .filter(|v| !v.is_empty());
                return Ok(Self {
                    name: name.to_string(),
                    version,
                });
            }
        }
        if spec.is_empty() {
            return Err(SpecError::Empty);
        }
        Ok(Self {
            name: spec.to_string(),
            version: None,
        })
    }
}

/// Read a requirements file and return its package specifiers.
///
/// Blank lines and comment lines are skipped; inline comments are stripped.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_requirements(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading requirements file {}", path.display()))?;
    Ok(parse_requirements(&content))
}

fn parse_requirements(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.split('#').next().unwrap_or(line).trim();
            (!line.is_empty()).then(|| line.to_string())
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
