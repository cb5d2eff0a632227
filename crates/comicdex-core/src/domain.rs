use serde::{Deserialize, Serialize};

/// One immutable item in the corpus, keyed by its upstream `num`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comic {
    pub num: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub img: String,
}

impl Comic {
    /// The synthetic placeholder the upstream historically 404s on.
    pub fn placeholder(num: i64) -> Self {
        Self {
            num,
            title: String::new(),
            transcript: String::new(),
            alt: String::new(),
            img: String::new(),
        }
    }
}

/// A term and every comic `num` whose stemmed text contains it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComicKeyword {
    pub word: String,
    pub nums: Vec<i64>,
}

/// A user account. The core only ever reads this; provisioning happens
/// outside the HTTP surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub role: i64,
    pub pass_hash: String,
}

impl User {
    pub fn has_role(&self, required: i64) -> bool {
        self.role >= required
    }
}
