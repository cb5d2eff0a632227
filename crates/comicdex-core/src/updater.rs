use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::domain::{Comic, ComicKeyword};
use crate::error::{Error, Result};
use crate::interfaces::{ComicProvider, ComicRepository, KeywordRepository};
use crate::stemmer::Stemmer;

/// Brings the local store into sync with the upstream corpus up to
/// `fetch_limit`, then rebuilds the keyword index over every stored comic.
///
/// Guarantees single-flight: at most one `update` runs in this process at
/// any time. A second caller observes [`Error::UpdateInProgress`]
/// immediately, without waiting on the first to finish.
pub struct Updater {
    stemmer: Arc<Stemmer>,
    comic_repo: Arc<dyn ComicRepository>,
    keyword_repo: Arc<dyn KeywordRepository>,
    provider: Arc<dyn ComicProvider>,
    fetch_limit: i64,
    parallel: usize,
    in_progress: AtomicBool,
}

/// The upstream historically 404s on this id; rather than stalling the
/// cursor on a known gap we synthesize an empty placeholder for it.
const KNOWN_GAP_ID: i64 = 404;

impl Updater {
    pub fn new(
        stemmer: Arc<Stemmer>,
        comic_repo: Arc<dyn ComicRepository>,
        keyword_repo: Arc<dyn KeywordRepository>,
        provider: Arc<dyn ComicProvider>,
        fetch_limit: i64,
        parallel: usize,
    ) -> Self {
        Self {
            stemmer,
            comic_repo,
            keyword_repo,
            provider,
            fetch_limit,
            parallel: parallel.max(1),
            in_progress: AtomicBool::new(false),
        }
    }

    /// Runs one ingestion cycle. Returns the final stored comic count.
    pub async fn update(&self, cancel: &CancellationToken) -> Result<i64> {
        if self.in_progress.swap(true, Ordering::SeqCst) {
            log::warn!("[ updater.update ] update already in progress");
            return Err(Error::UpdateInProgress);
        }

        let result = self.run(cancel).await;
        self.in_progress.store(false, Ordering::SeqCst);
        result
    }

    async fn run(&self, cancel: &CancellationToken) -> Result<i64> {
        log::debug!("[ updater.update ] updating");

        let existing = self.comic_repo.all(cancel).await.map_err(|err| {
            log::error!("[ updater.update ] failed to get all comics: {err:?}");
            Error::internal(err)
        })?;

        let mut comics: HashMap<i64, Comic> = existing.into_iter().map(|c| (c.num, c)).collect();
        log::debug!("[ updater.update ] starting fetch with initial size {}", comics.len());

        let job_cancel = cancel.child_token();

        let (id_tx, id_rx) = async_channel::bounded::<i64>(self.parallel);
        let (res_tx, mut res_rx) = mpsc::channel::<Comic>(self.parallel);
        let (err_tx, mut err_rx) = mpsc::channel::<Error>(self.parallel);

        let mut cursor = 1i64;
        let limit = self.fetch_limit;
        let mut push_next = move |comics: &HashMap<i64, Comic>, id_tx: &async_channel::Sender<i64>| -> bool {
            while cursor <= limit {
                let candidate = cursor;
                cursor += 1;
                if !comics.contains_key(&candidate) {
                    let _ = id_tx.try_send(candidate);
                    return true;
                }
            }
            false
        };

        let mut workers = Vec::with_capacity(self.parallel);
        let mut anything_to_fetch = false;
        for i in 0..self.parallel {
            if !push_next(&comics, &id_tx) {
                if i == 0 {
                    log::debug!("[ updater.update ] nothing to fetch");
                    job_cancel.cancel();
                    return Ok(comics.len() as i64);
                }
                break;
            }
            anything_to_fetch = true;

            let provider = self.provider.clone();
            let ids = id_rx.clone();
            let res = res_tx.clone();
            let errs = err_tx.clone();
            let worker_cancel = job_cancel.clone();
            workers.push(tokio::spawn(async move {
                fetch_job(worker_cancel, provider, ids, res, errs).await;
            }));
        }
        debug_assert!(anything_to_fetch);
        drop(res_tx);
        drop(err_tx);

        let mut new_count = 0i64;
        let mut fatal: Option<Error> = None;

        loop {
            tokio::select! {
                Some(comic) = res_rx.recv() => {
                    new_count += 1;
                    comics.insert(comic.num, comic);
                    if !push_next(&comics, &id_tx) {
                        break;
                    }
                }
                Some(err) = err_rx.recv() => {
                    if !matches!(err, Error::NotFound) {
                        log::error!("[ updater.update ] worker error: {err:?}");
                        fatal = Some(err);
                    }
                    break;
                }
                _ = cancel.cancelled() => {
                    log::debug!("[ updater.update ] cancelled");
                    break;
                }
                else => break,
            }
        }

        job_cancel.cancel();
        id_rx.close();
        for worker in workers {
            let _ = worker.await;
        }

        while let Ok(comic) = res_rx.try_recv() {
            new_count += 1;
            comics.insert(comic.num, comic);
        }

        if let Some(err) = fatal {
            return Err(Error::internal(err));
        }

        if new_count == 0 {
            log::debug!("[ updater.update ] finished, no new records");
            return Ok(comics.len() as i64);
        }

        let batch: Vec<Comic> = comics.values().cloned().collect();
        self.comic_repo.save(&batch, cancel).await.map_err(|err| {
            log::error!("[ updater.update ] failed to save comics: {err:?}");
            Error::internal(err)
        })?;

        self.rebuild_index(&batch, cancel).await?;

        log::debug!("[ updater.update ] finished: {new_count} new comics");
        Ok(batch.len() as i64)
    }

    async fn rebuild_index(&self, comics: &[Comic], cancel: &CancellationToken) -> Result<()> {
        log::debug!("[ updater.rebuild_index ] updating keywords");

        let mut by_word: HashMap<String, Vec<i64>> = HashMap::new();
        for comic in comics {
            for word in self.stemmer.stem_comic(comic) {
                by_word.entry(word).or_default().push(comic.num);
            }
        }

        let entries: Vec<ComicKeyword> = by_word
            .into_iter()
            .map(|(word, nums)| ComicKeyword { word, nums })
            .collect();

        self.keyword_repo.save(&entries, cancel).await.map_err(|err| {
            log::error!("[ updater.rebuild_index ] failed to save keywords: {err:?}");
            Error::internal(err)
        })?;

        log::debug!("[ updater.rebuild_index ] keywords updated");
        Ok(())
    }
}

async fn fetch_job(
    cancel: CancellationToken,
    provider: Arc<dyn ComicProvider>,
    ids: async_channel::Receiver<i64>,
    results: mpsc::Sender<Comic>,
    errors: mpsc::Sender<Error>,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            id = ids.recv() => {
                let id = match id {
                    Ok(id) => id,
                    Err(_) => return,
                };

                if id == KNOWN_GAP_ID {
                    if results.send(Comic::placeholder(id)).await.is_err() {
                        return;
                    }
                    continue;
                }

                match provider.get_by_id(id).await {
                    Ok(comic) => {
                        if results.send(comic).await.is_err() {
                            return;
                        }
                    }
                    Err(err) => {
                        let _ = errors.send(err).await;
                        return;
                    }
                }
            }
        }
    }
}
