//! Decoding of E-utilities `esearch` XML result documents.
//!
//! Only the parts the pipeline needs are modeled: the total hit count, the
//! `IdList` of identifiers, and an optional service `ERROR` element. Every
//! other element (`RetMax`, `QueryKey`, `WebEnv`, translation stacks) is
//! skipped by the deserializer.

use serde::Deserialize;

use super::Identifier;
use super::error::SearchError;

#[derive(Debug, Deserialize)]
struct ESearchResult {
    #[serde(rename = "Count")]
    count: Option<u64>,
    #[serde(rename = "IdList")]
    id_list: Option<IdList>,
    #[serde(rename = "ERROR")]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct IdList {
    #[serde(rename = "Id", default)]
    ids: Vec<String>,
}

/// Identifiers extracted from one esearch response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedIdList {
    /// Identifiers in document order.
    pub(crate) ids: Vec<Identifier>,
    /// Total hits reported by the service, when present.
    pub(crate) total: Option<u64>,
}

/// Parses an esearch XML document and extracts `eSearchResult > IdList > Id*`.
///
/// An `IdList` without `Id` children yields an empty list. A document without
/// an `IdList` at all is an error, as is a document carrying an `ERROR`
/// element and no identifiers.
pub(crate) fn parse_id_list(xml: &str) -> Result<ParsedIdList, SearchError> {
    let result: ESearchResult =
        quick_xml::de::from_str(xml).map_err(|source| SearchError::Parse { source })?;

    let Some(id_list) = result.id_list else {
        if let Some(message) = result.error.filter(|m| !m.trim().is_empty()) {
            return Err(SearchError::service(message.trim()));
        }
        return Err(SearchError::MissingIdList);
    };

    let ids = id_list
        .ids
        .into_iter()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(Identifier::new)
        .collect();

    Ok(ParsedIdList {
        ids,
        total: result.count,
    })
}
