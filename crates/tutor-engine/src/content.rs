//! Read-only access to the static content documents.
//!
//! Domains, topics and pre-authored questions live as JSON arrays in
//! `domains.json`, `topics.json` and `questions.json` under the configured
//! data directory. Documents are re-read on every call so edits show up
//! without a restart.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TutorError};
use crate::question::AuthoredQuestion;

/// File name of the domain list.
pub const DOMAINS_FILE: &str = "domains.json";

/// File name of the topic list.
pub const TOPICS_FILE: &str = "topics.json";

/// File name of the pre-authored question bank.
pub const QUESTIONS_FILE: &str = "questions.json";

/// A top-level subject area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    /// Display name, also the key used by topics and questions.
    pub name: String,
    /// Any further fields, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A subdivision of a domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    /// Domain this topic belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Display name.
    pub name: String,
    /// Any further fields, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Filter applied to the question bank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct QuestionFilter {
    /// Keep only questions in this domain.
    #[serde(default)]
    pub domain: Option<String>,
    /// Keep only questions in this topic.
    #[serde(default)]
    pub topic: Option<String>,
    /// Keep at most this many; `0` means no limit.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl QuestionFilter {
    /// Filter for every question of one domain and topic.
    #[must_use]
    pub fn for_topic(domain: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            domain: Some(domain.into()),
            topic: Some(topic.into()),
            limit: None,
        }
    }

    /// Applies domain, topic and limit, in that order.
    #[must_use]
    pub fn apply(&self, questions: Vec<AuthoredQuestion>) -> Vec<AuthoredQuestion> {
        let mut results: Vec<AuthoredQuestion> = questions
            .into_iter()
            .filter(|q| matches_field(self.domain.as_deref(), q.domain()))
            .filter(|q| matches_field(self.topic.as_deref(), q.topic()))
            .collect();

        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            results.truncate(limit);
        }
        results
    }
}

/// An absent or empty filter value matches everything.
fn matches_field(wanted: Option<&str>, actual: Option<&str>) -> bool {
    match wanted {
        None | Some("") => true,
        Some(wanted) => actual == Some(wanted),
    }
}

/// Named JSON documents under a data directory.
#[derive(Debug, Clone)]
pub struct ContentStore {
    data_dir: PathBuf,
}

impl ContentStore {
    /// Creates a store rooted at `data_dir`.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Returns the data directory.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Reads and parses the named document.
    ///
    /// # Errors
    ///
    /// Returns `TutorError::ContentNotFound` if the file is missing,
    /// `TutorError::ContentParseError` if it is not the expected JSON, and
    /// `TutorError::Io` for other read failures.
    pub async fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.data_dir.join(name);
        debug!(path = %path.display(), "Reading content document");

        let contents = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TutorError::content_not_found(name)
            } else {
                TutorError::Io(e)
            }
        })?;

        serde_json::from_str(&contents).map_err(|e| TutorError::content_parse(name, e.to_string()))
    }

    /// All domains.
    pub async fn domains(&self) -> Result<Vec<Domain>> {
        self.read_json(DOMAINS_FILE).await
    }

    /// All topics, or only those of `domain`.
    pub async fn topics(&self, domain: Option<&str>) -> Result<Vec<Topic>> {
        let topics: Vec<Topic> = self.read_json(TOPICS_FILE).await?;
        Ok(topics
            .into_iter()
            .filter(|t| matches_field(domain, t.domain.as_deref()))
            .collect())
    }

    /// Questions matching `filter`, in file order, each exactly as stored.
    pub async fn questions(&self, filter: &QuestionFilter) -> Result<Vec<AuthoredQuestion>> {
        let questions: Vec<AuthoredQuestion> = self.read_json(QUESTIONS_FILE).await?;
        Ok(filter.apply(questions))
    }

    /// The question whose id has the string form `id`.
    ///
    /// # Errors
    ///
    /// Returns `TutorError::ContentNotFound` naming the id if no question matches.
    pub async fn question(&self, id: &str) -> Result<AuthoredQuestion> {
        let questions: Vec<AuthoredQuestion> = self.read_json(QUESTIONS_FILE).await?;
        questions
            .into_iter()
            .find(|q| q.id().is_some_and(|qid| qid.matches(id)))
            .ok_or_else(|| TutorError::content_not_found(format!("question {id}")))
    }
}
