//! Period roles come from filename keywords.
//!
//! Keywords are tested in a fixed priority order, prior-year (`同期`), then
//! prior-period (`上期`), then current (`当期`). The first keyword contained
//! anywhere in the name wins, regardless of where in the name it occurs.
use crate::types::{PeriodFile, PeriodRole};
use std::collections::BTreeMap;
use tracing::warn;

const ACCEPTED_EXTENSIONS: [&str; 3] = ["xls", "xlsx", "csv"];

pub fn classify_period(file_name: &str) -> Option<PeriodRole> {
    PeriodRole::ALL
        .into_iter()
        .find(|role| file_name.contains(role.keyword()))
}

/// Whether a file should be offered to the pipeline at all.
pub fn is_candidate_file(file_name: &str) -> bool {
    let ext_ok = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ACCEPTED_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false);
    ext_ok && classify_period(file_name).is_some()
}

/// Drop unclassified files and sort the rest prior-year, prior-period, current.
/// Files sharing a role are ordered by name.
pub fn order_period_files(files: Vec<PeriodFile>) -> Vec<PeriodFile> {
    let mut classified: Vec<(PeriodRole, PeriodFile)> = files
        .into_iter()
        .filter_map(|f| f.role.map(|role| (role, f)))
        .collect();
    classified.sort_by(|a, b| {
        a.0.rank()
            .cmp(&b.0.rank())
            .then_with(|| a.1.name.cmp(&b.1.name))
    });
    let ordered: Vec<PeriodFile> = classified.into_iter().map(|(_, f)| f).collect();
    for (role, names) in duplicate_roles(&ordered) {
        warn!(%role, files = ?names, "several files share a period role; the last one is compared");
    }
    ordered
}

/// Roles claimed by more than one file, with the names involved.
pub fn duplicate_roles(files: &[PeriodFile]) -> BTreeMap<PeriodRole, Vec<String>> {
    let mut by_role: BTreeMap<PeriodRole, Vec<String>> = BTreeMap::new();
    for f in files {
        if let Some(role) = f.role {
            by_role.entry(role).or_default().push(f.name.clone());
        }
    }
    by_role.retain(|_, names| names.len() > 1);
    by_role
}
