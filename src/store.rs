use crate::models::{AnalyticsData, DailyVisitCounter};
use chrono::{NaiveDate, Utc};
use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use tokio::{fs, sync::Mutex};
use tracing::error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to encode analytics data: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Counters are keyed by the server's UTC calendar date.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Document id of a day's counter within the analytics collection.
pub fn counter_id(date: NaiveDate) -> String {
    format!("daily_visits_{}", date_key(date))
}

/// Owner of the per-day visit counters. All mutation goes through
/// [`VisitStore::record_visit`], which increments under the store lock so
/// concurrent callers never lose an update.
#[derive(Clone)]
pub struct VisitStore {
    path: PathBuf,
    data: Arc<Mutex<AnalyticsData>>,
}

impl VisitStore {
    pub async fn open(path: PathBuf) -> Self {
        let data = load_data(&path).await;
        Self {
            path,
            data: Arc::new(Mutex::new(data)),
        }
    }

    /// Increment-or-create for the given day's counter.
    ///
    /// Creates the document with `count = 1` on a day's first visit,
    /// otherwise increments `count` and rewrites `date`. The in-memory
    /// increment is rolled back when the collection cannot be persisted, so
    /// the count always equals the number of successfully recorded visits.
    pub async fn record_visit(&self, date: NaiveDate) -> Result<DailyVisitCounter, StoreError> {
        let id = counter_id(date);
        let mut data = self.data.lock().await;
        let created = !data.counters.contains_key(&id);
        let updated = {
            let entry = data
                .counters
                .entry(id.clone())
                .or_insert_with(|| DailyVisitCounter {
                    date: date_key(date),
                    count: 0,
                });
            entry.count = entry.count.saturating_add(1);
            entry.date = date_key(date);
            entry.clone()
        };

        if let Err(err) = persist_data(&self.path, &data).await {
            if created {
                data.counters.remove(&id);
            } else if let Some(entry) = data.counters.get_mut(&id) {
                entry.count = entry.count.saturating_sub(1);
            }
            return Err(err);
        }

        Ok(updated)
    }

    /// Read-only lookup; absent days report a zero counter.
    pub async fn counter_for(&self, date: NaiveDate) -> DailyVisitCounter {
        let data = self.data.lock().await;
        data.counters
            .get(&counter_id(date))
            .cloned()
            .unwrap_or_else(|| DailyVisitCounter {
                date: date_key(date),
                count: 0,
            })
    }

    pub async fn snapshot(&self) -> AnalyticsData {
        self.data.lock().await.clone()
    }
}

async fn load_data(path: &Path) -> AnalyticsData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse analytics file: {err}");
                AnalyticsData::default()
            }
        },
        Err(err) if err.kind() == io::ErrorKind::NotFound => AnalyticsData::default(),
        Err(err) => {
            error!("failed to read analytics file: {err}");
            AnalyticsData::default()
        }
    }
}

async fn persist_data(path: &Path, data: &AnalyticsData) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(data)?;
    fs::write(path, payload)
        .await
        .map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(())
}
