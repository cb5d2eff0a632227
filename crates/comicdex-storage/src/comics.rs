use async_trait::async_trait;
use comicdex_core::domain::Comic;
use comicdex_core::error::{Error, Result};
use comicdex_core::interfaces::ComicRepository;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tokio_util::sync::CancellationToken;

use crate::cancellable;

#[derive(sqlx::FromRow)]
struct ComicRow {
    num: i64,
    title: String,
    transcript: String,
    alt: String,
    img: String,
}

impl From<ComicRow> for Comic {
    fn from(row: ComicRow) -> Self {
        Comic {
            num: row.num,
            title: row.title,
            transcript: row.transcript,
            alt: row.alt,
            img: row.img,
        }
    }
}

/// `comics(num PRIMARY KEY, title, transcript, alt, img)`.
pub struct SqliteComicStore {
    pool: SqlitePool,
}

impl SqliteComicStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ComicRepository for SqliteComicStore {
    async fn all(&self, cancel: &CancellationToken) -> Result<Vec<Comic>> {
        cancellable(cancel, async {
            log::debug!("[ comic.all ] fetching all comics");

            let rows: Vec<ComicRow> = sqlx::query_as("SELECT num, title, transcript, alt, img FROM comics")
                .fetch_all(&self.pool)
                .await
                .map_err(|err| {
                    log::error!("[ comic.all ] failed to query all comics: {err}");
                    Error::internal(err)
                })?;

            Ok(rows.into_iter().map(Comic::from).collect())
        })
        .await
    }

    async fn by_ids(&self, nums: &[i64], cancel: &CancellationToken) -> Result<Vec<Comic>> {
        if nums.is_empty() {
            return Ok(vec![]);
        }

        cancellable(cancel, async {
            log::debug!("[ comic.by_ids ] fetching comics");

            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("SELECT num, title, transcript, alt, img FROM comics WHERE num IN (");
            let mut separated = builder.separated(", ");
            for num in nums {
                separated.push_bind(num);
            }
            builder.push(")");

            let rows: Vec<ComicRow> = builder.build_query_as().fetch_all(&self.pool).await.map_err(|err| {
                log::error!("[ comic.by_ids ] failed to query comics: {err}");
                Error::internal(err)
            })?;

            Ok(rows.into_iter().map(Comic::from).collect())
        })
        .await
    }

    async fn save(&self, comics: &[Comic], cancel: &CancellationToken) -> Result<()> {
        if comics.is_empty() {
            return Ok(());
        }

        cancellable(cancel, async {
            log::debug!("[ comic.save ] saving {} comics", comics.len());

            let mut tx = self.pool.begin().await.map_err(|err| {
                log::error!("[ comic.save ] failed to start transaction: {err}");
                Error::internal(err)
            })?;

            for comic in comics {
                let result = sqlx::query(
                    "INSERT OR REPLACE INTO comics(num, title, transcript, alt, img) VALUES (?, ?, ?, ?, ?)",
                )
                .bind(comic.num)
                .bind(&comic.title)
                .bind(&comic.transcript)
                .bind(&comic.alt)
                .bind(&comic.img)
                .execute(&mut *tx)
                .await;

                if let Err(err) = result {
                    log::error!("[ comic.save ] failed to insert comic {}: {err}", comic.num);
                    if let Err(rollback_err) = tx.rollback().await {
                        log::error!("[ comic.save ] rollback failed: {rollback_err}");
                    }
                    return Err(Error::internal(err));
                }
            }

            tx.commit().await.map_err(|err| {
                log::error!("[ comic.save ] commit failed: {err}");
                Error::internal(err)
            })?;

            log::debug!("[ comic.save ] save complete");
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connect_with_pool_size;

    fn comic(num: i64, title: &str) -> Comic {
        Comic {
            num,
            title: title.to_string(),
            alt: String::new(),
            transcript: String::new(),
            img: format!("https://example.com/{num}.png"),
        }
    }

    #[tokio::test]
    async fn save_is_insert_or_replace() {
        let pool = connect_with_pool_size("sqlite::memory:", 1).await.unwrap();
        let store = SqliteComicStore::new(pool);
        let cancel = CancellationToken::new();

        store.save(&[comic(1, "first")], &cancel).await.unwrap();
        store.save(&[comic(1, "second"), comic(2, "other")], &cancel).await.unwrap();

        let all = store.all(&cancel).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|c| c.num == 1 && c.title == "second"));
    }

    #[tokio::test]
    async fn by_ids_selects_the_requested_subset() {
        let pool = connect_with_pool_size("sqlite::memory:", 1).await.unwrap();
        let store = SqliteComicStore::new(pool);
        let cancel = CancellationToken::new();

        store
            .save(&[comic(1, "a"), comic(2, "b"), comic(3, "c")], &cancel)
            .await
            .unwrap();

        let mut selected = store.by_ids(&[1, 3], &cancel).await.unwrap();
        selected.sort_by_key(|c| c.num);
        assert_eq!(selected.iter().map(|c| c.num).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let pool = connect_with_pool_size("sqlite::memory:", 1).await.unwrap();
        let store = SqliteComicStore::new(pool);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = store.all(&cancel).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
