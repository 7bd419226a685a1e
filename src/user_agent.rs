//! Shared User-Agent string for search and bucket HTTP clients.
//!
//! NCBI asks E-utilities callers to identify their tool, so both clients
//! send the same project-identifying header.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/pmc-downloader";

/// Default User-Agent for all outgoing requests.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("pmc-downloader/{version} (academic-research-tool; +{PROJECT_UA_URL})")
}
