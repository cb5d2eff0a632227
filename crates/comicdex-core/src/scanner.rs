use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::domain::Comic;
use crate::error::{Error, Result};
use crate::interfaces::{ComicRepository, KeywordRepository};
use crate::stemmer::Stemmer;

struct NumMatch {
    num: i64,
    count: usize,
}

/// Answers a query string as an ordered list of image URLs.
///
/// Holds no mutable state of its own; every call re-reads the stores.
pub struct Scanner {
    stemmer: Arc<Stemmer>,
    comic_repo: Arc<dyn ComicRepository>,
    keyword_repo: Arc<dyn KeywordRepository>,
}

impl Scanner {
    pub fn new(
        stemmer: Arc<Stemmer>,
        comic_repo: Arc<dyn ComicRepository>,
        keyword_repo: Arc<dyn KeywordRepository>,
    ) -> Self {
        Self {
            stemmer,
            comic_repo,
            keyword_repo,
        }
    }

    /// Returns image URLs ordered by descending match count. Truncation to
    /// `scan_limit` is the HTTP layer's job, not the scanner's.
    pub async fn scan(&self, query: &str, use_index: bool, cancel: &CancellationToken) -> Result<Vec<String>> {
        let words = self.stemmer.stem_string(query);

        if use_index {
            self.scan_index(&words, cancel).await
        } else {
            self.scan_full(&words, cancel).await
        }
    }

    async fn scan_index(&self, words: &[String], cancel: &CancellationToken) -> Result<Vec<String>> {
        let entries = self.keyword_repo.lookup(words, cancel).await?;

        let mut matches: HashMap<i64, usize> = HashMap::new();
        for entry in &entries {
            if cancel.is_cancelled() {
                log::warn!("[ scanner.scan_index ] cancelled mid-scan");
                return Err(Error::Cancelled);
            }

            for &num in &entry.nums {
                *matches.entry(num).or_insert(0) += 1;
            }
        }

        let nums: Vec<i64> = matches.keys().copied().collect();
        let comics = self.comic_repo.by_ids(&nums, cancel).await?;

        let ranked: Vec<NumMatch> = matches
            .into_iter()
            .map(|(num, count)| NumMatch { num, count })
            .collect();

        Ok(finalize(&comics, ranked))
    }

    async fn scan_full(&self, words: &[String], cancel: &CancellationToken) -> Result<Vec<String>> {
        let comics = self.comic_repo.all(cancel).await?;

        let word_set: std::collections::HashSet<&str> = words.iter().map(String::as_str).collect();

        let mut ranked = Vec::new();
        for comic in &comics {
            if cancel.is_cancelled() {
                log::warn!("[ scanner.scan_full ] cancelled mid-scan");
                return Err(Error::Cancelled);
            }

            let count = self
                .stemmer
                .stem_comic(comic)
                .iter()
                .filter(|term| word_set.contains(term.as_str()))
                .count();

            if count > 0 {
                ranked.push(NumMatch { num: comic.num, count });
            }
        }

        Ok(finalize(&comics, ranked))
    }
}

fn finalize(comics: &[Comic], mut matches: Vec<NumMatch>) -> Vec<String> {
    matches.sort_by(|a, b| b.count.cmp(&a.count));

    let by_num: HashMap<i64, &Comic> = comics.iter().map(|c| (c.num, c)).collect();

    matches
        .into_iter()
        .filter_map(|m| by_num.get(&m.num).map(|c| c.img.clone()))
        .collect()
}
