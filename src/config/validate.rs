// src/config/validate.rs

use std::path::{Component, Path};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{GateError, Result};
use crate::fingerprint::WatchPatterns;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = GateError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let watch = WatchPatterns::new(&raw.watch)?;
        let workspaces = validate_workspaces(&raw.workspaces)?;
        Ok(ConfigFile::new_unchecked(raw.command, watch, workspaces))
    }
}

/// Check workspace paths and return them normalized (`./a/` becomes `a`), so
/// two spellings of one directory are caught as duplicates.
fn validate_workspaces(workspaces: &[String]) -> Result<Vec<String>> {
    let mut normalized: Vec<String> = Vec::with_capacity(workspaces.len());

    for (idx, ws) in workspaces.iter().enumerate() {
        let path = Path::new(ws);
        let escapes = path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(GateError::ConfigError(format!(
                "workspace '{ws}' must be a relative path inside the base directory"
            )));
        }

        let rel = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/");
        if rel.trim().is_empty() {
            return Err(GateError::ConfigError(format!(
                "workspaces[{idx}] must name a sub-directory"
            )));
        }

        if normalized.contains(&rel) {
            return Err(GateError::ConfigError(format!(
                "workspace '{ws}' is listed more than once"
            )));
        }
        normalized.push(rel);
    }
    Ok(normalized)
}
