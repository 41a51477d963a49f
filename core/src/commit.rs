/// Commit listing returned by `GET /commits`
use serde::Deserialize;

/// A commit of the strings repository. `hash` is opaque; no length is assumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryCommit {
    hash: String,
    message: String,
}

impl RepositoryCommit {
    pub fn new(hash: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            message: message.into(),
        }
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitPage {
    #[serde(default)]
    values: Option<Vec<RawCommit>>,
}

#[derive(Debug, Deserialize)]
struct RawCommit {
    hash: String,
    rendered: Rendered,
}

#[derive(Debug, Deserialize)]
struct Rendered {
    message: RenderedMessage,
}

#[derive(Debug, Deserialize)]
struct RenderedMessage {
    raw: String,
}

impl CommitPage {
    /// The listing is newest first.
    pub(crate) fn into_latest(self) -> Option<RepositoryCommit> {
        self.values
            .and_then(|values| values.into_iter().next())
            .map(|commit| RepositoryCommit::new(commit.hash, commit.rendered.message.raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_first_commit() {
        let page: CommitPage = serde_json::from_str(
            r#"{
                "pagelen": 30,
                "values": [
                    {"hash": "f00d", "rendered": {"message": {"raw": "Newest", "html": "<p>Newest</p>"}}},
                    {"hash": "beef", "rendered": {"message": {"raw": "Older"}}}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(page.into_latest(), Some(RepositoryCommit::new("f00d", "Newest")));
    }

    #[test]
    fn missing_or_empty_values_yield_nothing() {
        let page: CommitPage = serde_json::from_str(r#"{"values": []}"#).unwrap();
        assert!(page.into_latest().is_none());

        let page: CommitPage = serde_json::from_str("{}").unwrap();
        assert!(page.into_latest().is_none());
    }
}
