//! Cache key derivation.

use std::fmt;

use url::form_urlencoded;

use crate::domain::query::ContentQuery;

/// Canonical key for a content query: operation name plus its encoded parameters sorted by
/// name and value, so queries built in a different order land on the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_query(query: &ContentQuery) -> Self {
        let mut pairs = query.to_query_pairs();
        pairs.sort();
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        Self(format!("{}_{encoded}", query.operation().name()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
