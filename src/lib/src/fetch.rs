//! # Artifact Fetcher
//!
//! Downloads every pending crate artifact, verifies it against the catalog
//! checksum, and persists it under `<crates>/<name>/<name>-<version>.crate`.
//!
//! The pool is a bounded work queue consumed by `3 x num_cpus` async
//! workers. Workers never touch the catalog; each publishes its
//! `(downloaded, forbidden)` outcome to a results channel that a single
//! writer task drains, serializing all catalog writes on its own
//! connection. One `None` sentinel per worker closes the queue; the channel
//! closes once every worker has exited, and the writer completes after
//! draining.
//!

pub mod client;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::catalog::Catalog;
use crate::error::MirrorError;
use crate::model::PendingCrate;
use crate::sweep;
use crate::util;

type TaskQueue = deadqueue::limited::Queue<Option<PendingCrate>>;

/// What one worker reports back for one crate version.
#[derive(Debug, Clone)]
struct FetchResult {
    name: String,
    version: String,
    downloaded: bool,
    forbidden: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub downloaded: usize,
    pub failed: usize,
    pub forbidden: usize,
}

#[derive(Clone, Debug)]
pub struct FetchOpts {
    pub crates_dir: PathBuf,
    /// Endpoint template with `{name}` and `{version}` placeholders.
    pub download_url: String,
}

/// Substitute `{name}` and `{version}` into the download endpoint template.
pub fn format_download_url(template: &str, name: &str, version: &str) -> String {
    template
        .replace("{name}", name)
        .replace("{version}", version)
}

/// Download every pending catalog row.
///
/// Bare mode is inferred here: when the artifact root is empty there is
/// nothing on disk worth checking per item, and an integrity sweep after the
/// pool drains stamps everything that landed. Per-item failures are
/// recorded, never propagated; the rows stay pending for the next run.
pub async fn fetch_pending(
    catalog: &Catalog,
    opts: &FetchOpts,
) -> Result<FetchSummary, MirrorError> {
    util::fs::create_dir_all(&opts.crates_dir)?;
    let bare = util::fs::is_missing_or_empty_dir(&opts.crates_dir)?;

    let pending = catalog.pending_downloads()?;
    if pending.is_empty() {
        log::debug!("No pending downloads");
        return Ok(FetchSummary::default());
    }

    log::info!("Fetching {} pending crates", pending.len());

    let worker_count = util::concurrency::num_workers_for_items(pending.len());
    log::debug!(
        "worker_count {} pending len {}",
        worker_count,
        pending.len()
    );

    let queue = Arc::new(TaskQueue::new(pending.len() + worker_count));
    for item in pending {
        queue.try_push(Some(item)).unwrap();
    }
    for _ in 0..worker_count {
        queue.try_push(None).unwrap();
    }

    let http_client = client::new()?;
    let (tx, mut rx) = mpsc::unbounded_channel::<FetchResult>();

    let mut workers = Vec::with_capacity(worker_count);
    for worker in 0..worker_count {
        let queue = queue.clone();
        let tx = tx.clone();
        let http_client = http_client.clone();
        let opts = opts.clone();
        workers.push(tokio::spawn(async move {
            while let Some(item) = queue.pop().await {
                log::debug!("worker[{}] processing {}", worker, item);

                if item.checksum.is_empty() {
                    // Nothing to verify against; leave the row untouched
                    log::error!("Empty checksum in database: {}-{}", item.name, item.version);
                    continue;
                }

                let (downloaded, forbidden) =
                    process_item(&http_client, &item, &opts, bare).await;
                let result = FetchResult {
                    name: item.name,
                    version: item.version,
                    downloaded,
                    forbidden,
                };
                if tx.send(result).is_err() {
                    break;
                }
            }
        }));
    }
    drop(tx);

    // The single writer owns its own connection; workers only ever talk to
    // the channel
    let writer_catalog = Catalog::open(catalog.path())?;
    let writer = tokio::spawn(async move {
        let mut summary = FetchSummary::default();
        while let Some(result) = rx.recv().await {
            apply_result(&writer_catalog, &result, &mut summary);
        }
        summary
    });

    for worker in workers {
        worker
            .await
            .map_err(|e| MirrorError::basic_str(format!("Download worker panicked: {e}")))?;
    }
    let summary = writer
        .await
        .map_err(|e| MirrorError::basic_str(format!("Catalog writer panicked: {e}")))?;

    log::info!(
        "Fetch complete: {} downloaded, {} failed, {} forbidden",
        summary.downloaded,
        summary.failed,
        summary.forbidden
    );

    if bare {
        sweep::mark_downloaded_crates(catalog, &opts.crates_dir)?;
    }

    Ok(summary)
}

fn apply_result(catalog: &Catalog, result: &FetchResult, summary: &mut FetchSummary) {
    if result.forbidden {
        summary.forbidden += 1;
        log::warn!("{}-{} is forbidden", result.name, result.version);
        if let Err(err) = catalog.mark_forbidden(&result.name, &result.version) {
            log::error!(
                "Could not record forbidden {}-{}: {}",
                result.name,
                result.version,
                err
            );
        }
        return;
    }

    if result.downloaded {
        summary.downloaded += 1;
        log::info!("Successfully downloaded {}-{}", result.name, result.version);
    } else {
        summary.failed += 1;
        log::info!("Failed to download {}-{}", result.name, result.version);
    }
    if let Err(err) = catalog.mark_downloaded(&result.name, &result.version, result.downloaded) {
        log::error!(
            "Could not record download of {}-{}: {}",
            result.name,
            result.version,
            err
        );
    }
}

/// Ensure `<crates>/<name>/<name>-<version>.crate` exists with the right
/// hash. Returns `(downloaded, forbidden)`.
async fn process_item(
    http_client: &reqwest::Client,
    item: &PendingCrate,
    opts: &FetchOpts,
    bare: bool,
) -> (bool, bool) {
    let crate_dir = opts.crates_dir.join(&item.name);
    if let Err(err) = util::fs::create_dir_all(&crate_dir) {
        log::error!("{err}");
        return (false, false);
    }
    let target = crate_dir.join(item.filename());

    // On a cold start there is nothing on disk yet, skip the stat+hash
    if !bare && target.is_file() {
        match util::hasher::hash_file_contents(&target) {
            Ok(hash) if hash == item.checksum => return (true, false),
            Ok(_) => {
                log::debug!("Stale artifact on disk for {}, re-downloading", item);
                if let Err(err) = util::fs::remove_file(&target) {
                    log::error!("{err}");
                    return (false, false);
                }
            }
            Err(err) => {
                log::error!("{err}");
                return (false, false);
            }
        }
    }

    let url = format_download_url(&opts.download_url, &item.name, &item.version);
    let response = match http_client.get(&url).send().await {
        Ok(response) => response,
        Err(err) => {
            log::error!("Could not download {}: {}", item, err);
            return (false, false);
        }
    };

    let status = response.status();
    if status == reqwest::StatusCode::FORBIDDEN {
        // The CDN refuses to serve this version; tombstone it until the
        // index advertises a new checksum
        return (false, true);
    }
    if !status.is_success() {
        log::error!("Could not download {} status: {}", item, status);
        return (false, false);
    }

    let body = match response.bytes().await {
        Ok(body) => body,
        Err(err) => {
            log::error!("Could not read body of {}: {}", item, err);
            return (false, false);
        }
    };

    if util::hasher::hash_buffer(&body) != item.checksum {
        log::error!("Checksum mismatch for {}", item);
        return (false, false);
    }

    // Write to a temp path and rename so an interrupted run never leaves a
    // partial artifact behind
    let tmp = target.with_extension("crate.part");
    if let Err(err) = util::fs::write(&tmp, &body) {
        log::error!("{err}");
        return (false, false);
    }
    if let Err(err) = util::fs::rename(&tmp, &target) {
        log::error!("{err}");
        let _ = util::fs::remove_file(&tmp);
        return (false, false);
    }

    (true, false)
}
