use std::collections::HashMap;

use async_trait::async_trait;
use comicdex_core::domain::ComicKeyword;
use comicdex_core::error::{Error, Result};
use comicdex_core::interfaces::KeywordRepository;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tokio_util::sync::CancellationToken;

use crate::cancellable;

#[derive(sqlx::FromRow)]
struct KeywordRow {
    word: String,
    num: i64,
}

/// `keywords(word, num)` with an index on `word`.
pub struct SqliteKeywordStore {
    pool: SqlitePool,
}

impl SqliteKeywordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeywordRepository for SqliteKeywordStore {
    async fn lookup(&self, words: &[String], cancel: &CancellationToken) -> Result<Vec<ComicKeyword>> {
        if words.is_empty() {
            return Ok(vec![]);
        }

        cancellable(cancel, async {
            log::debug!("[ keyword.lookup ] fetching {} keywords", words.len());

            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT word, num FROM keywords WHERE word IN (");
            let mut separated = builder.separated(", ");
            for word in words {
                separated.push_bind(word);
            }
            builder.push(")");

            let rows: Vec<KeywordRow> = builder.build_query_as().fetch_all(&self.pool).await.map_err(|err| {
                log::error!("[ keyword.lookup ] failed to query keywords: {err}");
                Error::internal(err)
            })?;

            let mut by_word: HashMap<String, Vec<i64>> = HashMap::new();
            for row in rows {
                by_word.entry(row.word).or_default().push(row.num);
            }

            Ok(by_word.into_iter().map(|(word, nums)| ComicKeyword { word, nums }).collect())
        })
        .await
    }

    async fn save(&self, entries: &[ComicKeyword], cancel: &CancellationToken) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        cancellable(cancel, async {
            log::debug!("[ keyword.save ] saving {} keyword entries", entries.len());

            let mut tx = self.pool.begin().await.map_err(|err| {
                log::error!("[ keyword.save ] failed to start transaction: {err}");
                Error::internal(err)
            })?;

            for entry in entries {
                for num in &entry.nums {
                    let result = sqlx::query("INSERT OR REPLACE INTO keywords(word, num) VALUES (?, ?)")
                        .bind(&entry.word)
                        .bind(num)
                        .execute(&mut *tx)
                        .await;

                    if let Err(err) = result {
                        log::error!("[ keyword.save ] failed to insert '{}': {err}", entry.word);
                        if let Err(rollback_err) = tx.rollback().await {
                            log::error!("[ keyword.save ] rollback failed: {rollback_err}");
                        }
                        return Err(Error::internal(err));
                    }
                }
            }

            tx.commit().await.map_err(|err| {
                log::error!("[ keyword.save ] commit failed: {err}");
                Error::internal(err)
            })?;

            log::debug!("[ keyword.save ] save complete");
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connect_with_pool_size;

    #[tokio::test]
    async fn lookup_returns_only_the_subset_present() {
        let pool = connect_with_pool_size("sqlite::memory:", 1).await.unwrap();
        let store = SqliteKeywordStore::new(pool);
        let cancel = CancellationToken::new();

        store
            .save(
                &[
                    ComicKeyword { word: "foo".into(), nums: vec![1, 3] },
                    ComicKeyword { word: "bar".into(), nums: vec![2] },
                ],
                &cancel,
            )
            .await
            .unwrap();

        let entries = store
            .lookup(&["foo".to_string(), "missing".to_string()], &cancel)
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].word, "foo");
        let mut nums = entries[0].nums.clone();
        nums.sort();
        assert_eq!(nums, vec![1, 3]);
    }

    #[tokio::test]
    async fn save_is_insert_or_replace_per_pair() {
        let pool = connect_with_pool_size("sqlite::memory:", 1).await.unwrap();
        let store = SqliteKeywordStore::new(pool);
        let cancel = CancellationToken::new();

        store
            .save(&[ComicKeyword { word: "foo".into(), nums: vec![1] }], &cancel)
            .await
            .unwrap();
        store
            .save(&[ComicKeyword { word: "foo".into(), nums: vec![1, 2] }], &cancel)
            .await
            .unwrap();

        let entries = store.lookup(&["foo".to_string()], &cancel).await.unwrap();
        let mut nums = entries[0].nums.clone();
        nums.sort();
        assert_eq!(nums, vec![1, 2]);
    }
}
