//! Agency Registry — the closed set of valid destination agencies.
//!
//! Loaded once at startup and shared read-only across the process. Every
//! routing decision is cross-checked here: an agency name that does not
//! resolve is never alerted, no matter what the oracle proposed.

use serde::Serialize;

/// Kwara State agencies that can receive routed reports.
///
/// The exact strings matter: the same list is embedded in the oracle's
/// response schema and system instruction, so the registry and the oracle
/// contract stay in lockstep by construction.
const KWARA_AGENCIES: &[&str] = &[
    "Kwara State Fire Service",
    "Kwara State Police Command",
    "Nigeria Security and Civil Defence Corps (NSCDC Kwara)",
    "Kwara State Emergency Management Agency (KW-SEMA)",
    "Ministry of Works and Transport",
    "Kwara Road Maintenance Agency (KWARMA)",
    "Kwara State Water Corporation",
    "RUWASSA (Rural Water Supply and Sanitation Agency)",
    "Kwara State Waste Management Agency (KWASMA)",
    "Kwara Environmental Protection Agency (KWEPA)",
    "Physical Planning Authority / Urban Development",
    "Rural Electrification Board (REB)",
    "Ministry of Energy",
    "Ministry of Health",
    "Primary Health Care Development Agency (PHCDA)",
    "Kwara Health Insurance Agency (KHIA)",
    "Ministry of Education & Human Capital Development",
    "State Universal Basic Education Board (SUBEB)",
    "Teaching Service Commission (TESCOM)",
    "Kwara Internal Revenue Service (KW-IRS)",
    "Bureau of Lands (KW-GIS)",
    "KWASSIP (Social Investment Programmes)",
    "Ministry of Women Affairs and Social Development",
];

/// A validated agency identifier.
///
/// Can only be minted by [`AgencyRegistry::resolve`], so holding one is
/// proof the agency is a registry member. Never built from free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AgencyId(&'static str);

impl AgencyId {
    /// The agency's registered name.
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for AgencyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// The closed, ordered list of destination agencies.
#[derive(Debug)]
pub struct AgencyRegistry {
    agencies: &'static [&'static str],
}

impl AgencyRegistry {
    /// Build the registry with the fixed Kwara State agency list.
    pub fn new() -> Self {
        Self {
            agencies: KWARA_AGENCIES,
        }
    }

    /// Resolve a raw agency name to a validated [`AgencyId`].
    ///
    /// Matching is exact apart from surrounding whitespace. Returns `None`
    /// for anything outside the closed set.
    pub fn resolve(&self, name: &str) -> Option<AgencyId> {
        let trimmed = name.trim();
        self.agencies
            .iter()
            .copied()
            .find(|a| *a == trimmed)
            .map(AgencyId)
    }

    /// Whether a raw name is a registry member.
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// All registered agency names, in routing-list order.
    pub fn names(&self) -> &'static [&'static str] {
        self.agencies
    }
}

impl Default for AgencyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
