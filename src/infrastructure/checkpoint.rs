//! Checkpoint store
//!
//! Each stage persists its records as a pretty-printed JSON array under
//! `<output_root>/<stage directory>/`. Artifacts are immutable: the JSON is
//! written to a hidden staging file and hard-linked under its final name,
//! which fails instead of overwriting, so a second run on the same date gets
//! a `_run<N>` sibling and an interrupted write never leaves a truncated
//! artifact behind.
//!
//! ```text
//! category_result/categories.json
//! category_result/subcategory.json
//! product_initial/initial_products_2025-03-14.json
//! product_initial/initial_products_2025-03-14_run2.json
//! results/product_2025-03-14.json
//! product_fail/product_fail_2025-03-14.json
//! ```

#![allow(clippy::uninlined_format_args)]

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::CrawlStage;
use crate::infrastructure::config::CheckpointConfig;
use crate::infrastructure::crawl_error::{CrawlError, CrawlResult};

/// Upper bound on same-day artifacts per stage
const MAX_RUNS_PER_DAY: u32 = 999;

/// Sort key of an artifact: run date (dated stages only), then run number
type ArtifactKey = (Option<NaiveDate>, u32);

#[derive(Debug, Clone)]
pub struct CheckpointStore {
    root: PathBuf,
}

impl CheckpointStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &CheckpointConfig) -> Self {
        Self::new(&config.output_root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stage_dir(&self, stage: CrawlStage) -> PathBuf {
        self.root.join(stage.directory())
    }

    /// Write `records` as a new artifact for `stage`.
    ///
    /// Returns `None` when the stage skips empty output (the failure log).
    pub async fn write_stage<T: Serialize>(
        &self,
        stage: CrawlStage,
        date: NaiveDate,
        records: &[T],
    ) -> CrawlResult<Option<PathBuf>> {
        if records.is_empty() && !stage.writes_when_empty() {
            debug!("No {} to checkpoint", stage);
            return Ok(None);
        }

        let dir = self.stage_dir(stage);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| CrawlError::checkpoint(&dir, e))?;

        let json = serde_json::to_vec_pretty(records)
            .map_err(|e| CrawlError::checkpoint(&dir, format!("serialization failed: {}", e)))?;

        let base_name = artifact_base_name(stage, date);
        let staging = dir.join(format!(".{}.{}.tmp", base_name, Uuid::new_v4()));
        let published = stage_and_publish(&staging, &dir, &base_name, &json).await;
        if let Err(e) = fs::remove_file(&staging).await {
            if e.kind() != ErrorKind::NotFound {
                warn!("Failed to remove staging file {:?}: {}", staging, e);
            }
        }

        let path = published?;
        info!("Saved {} {} to {:?}", records.len(), stage, path);
        Ok(Some(path))
    }

    /// Most recent artifact of `stage`, by run date and then run number
    pub async fn find_latest(&self, stage: CrawlStage) -> CrawlResult<PathBuf> {
        let dir = self.stage_dir(stage);
        let missing = || CrawlError::CheckpointMissing {
            directory: dir.clone(),
            prefix: format!("{}_", stage.file_stem()),
        };

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(missing()),
            Err(e) => return Err(CrawlError::checkpoint(&dir, e)),
        };

        let pattern = artifact_pattern(stage)?;
        let mut latest: Option<(ArtifactKey, PathBuf)> = None;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CrawlError::checkpoint(&dir, e))?
        {
            let file_name = entry.file_name();
            let Some(key) = file_name
                .to_str()
                .and_then(|name| parse_artifact_key(&pattern, name))
            else {
                continue;
            };

            if latest.as_ref().is_none_or(|(best, _)| key > *best) {
                latest = Some((key, entry.path()));
            }
        }

        let (_, path) = latest.ok_or_else(missing)?;
        debug!("Latest {} checkpoint: {:?}", stage, path);
        Ok(path)
    }

    pub async fn read_stage<T: DeserializeOwned>(&self, path: &Path) -> CrawlResult<Vec<T>> {
        let bytes = fs::read(path)
            .await
            .map_err(|e| CrawlError::checkpoint(path, e))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| CrawlError::checkpoint(path, format!("invalid checkpoint JSON: {}", e)))
    }

    /// `find_latest` then `read_stage`
    pub async fn read_latest<T: DeserializeOwned>(
        &self,
        stage: CrawlStage,
    ) -> CrawlResult<(PathBuf, Vec<T>)> {
        let path = self.find_latest(stage).await?;
        let records = self.read_stage(&path).await?;
        Ok((path, records))
    }
}

/// Write the artifact to a staging file, then link it under the first free
/// run name. The final name only ever refers to a complete file.
async fn stage_and_publish(
    staging: &Path,
    dir: &Path,
    base_name: &str,
    json: &[u8],
) -> CrawlResult<PathBuf> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(staging)
        .await
        .map_err(|e| CrawlError::checkpoint(staging, e))?;
    file.write_all(json)
        .await
        .map_err(|e| CrawlError::checkpoint(staging, e))?;
    file.sync_all()
        .await
        .map_err(|e| CrawlError::checkpoint(staging, e))?;
    drop(file);

    for run in 1..=MAX_RUNS_PER_DAY {
        let path = dir.join(artifact_file_name(base_name, run));
        match fs::hard_link(staging, &path).await {
            Ok(()) => return Ok(path),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(CrawlError::checkpoint(&path, e)),
        }
    }

    Err(CrawlError::checkpoint(
        dir,
        format!("more than {} artifacts named {}", MAX_RUNS_PER_DAY, base_name),
    ))
}

fn artifact_base_name(stage: CrawlStage, date: NaiveDate) -> String {
    if stage.is_dated() {
        format!("{}_{}", stage.file_stem(), date.format("%Y-%m-%d"))
    } else {
        stage.file_stem().to_string()
    }
}

fn artifact_file_name(base_name: &str, run: u32) -> String {
    if run <= 1 {
        format!("{}.json", base_name)
    } else {
        format!("{}_run{}.json", base_name, run)
    }
}

fn artifact_pattern(stage: CrawlStage) -> CrawlResult<Regex> {
    let stem = regex::escape(stage.file_stem());
    let pattern = if stage.is_dated() {
        format!(r"^{}_(?P<date>\d{{4}}-\d{{2}}-\d{{2}})(?:_run(?P<run>\d+))?\.json$", stem)
    } else {
        format!(r"^{}(?:_run(?P<run>\d+))?\.json$", stem)
    };
    Regex::new(&pattern).map_err(|e| CrawlError::checkpoint(stage.directory(), e))
}

fn parse_artifact_key(pattern: &Regex, file_name: &str) -> Option<ArtifactKey> {
    let captures = pattern.captures(file_name)?;

    let date = match captures.name("date") {
        Some(raw) => Some(NaiveDate::parse_from_str(raw.as_str(), "%Y-%m-%d").ok()?),
        None => None,
    };
    let run = match captures.name("run") {
        Some(raw) => raw.as_str().parse().ok()?,
        None => 1,
    };

    Some((date, run))
}
