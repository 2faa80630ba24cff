pub mod adgm;

use docreview_core::types::{ProcessChecklist, ReviewProfile};

/// Return all built-in review profiles.
pub fn all_profiles() -> Vec<ReviewProfile> {
    vec![adgm::adgm_profile()]
}

/// Look up a built-in profile by name (with aliases).
pub fn get_profile(name: &str) -> Option<ReviewProfile> {
    match name {
        "adgm-corporate" => get_profile("adgm"),
        _ => all_profiles().into_iter().find(|p| p.name == name),
    }
}

/// Build a checklist from a process name and its required document types.
pub(crate) fn checklist(process: &str, required: &[&str]) -> ProcessChecklist {
    ProcessChecklist {
        process: process.into(),
        required: required.iter().map(|d| d.to_string()).collect(),
    }
}
