//! Callback query strings. A repeated key keeps its first value.

/// Decoded `key=value` pairs in the order they were sent.
#[derive(Debug, Default)]
pub(crate) struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub(crate) fn parse(query: &str) -> Result<Self, serde_urlencoded::de::Error> {
        serde_urlencoded::from_str(query).map(QueryParams)
    }

    /// First value sent for `key`, if any.
    pub(crate) fn first(&self, key: &str) -> Option<String> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }
}
