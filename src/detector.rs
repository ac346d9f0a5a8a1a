//! Client-resident visit detection.
//!
//! A [`VisitDetector`] runs once per client activation: it compares the
//! locally persisted last-visit marker against today's UTC date and, only
//! when they differ, pushes one record call through a [`VisitRecorder`]. The
//! marker advances only after the service confirms the visit, so a failed
//! call is retried on the next activation.

use crate::models::RecordVisitResponse;
use crate::store::{date_key, today_utc};
use chrono::NaiveDate;
use std::{env, fs, io, path::PathBuf};
use tracing::warn;

/// Name of the persisted last-visit marker.
pub const MARKER_KEY: &str = "last_visit_date";

/// Persistent client-local storage for the last-visit marker.
pub trait MarkerStore {
    fn last_visit(&self) -> Option<String>;
    fn set_last_visit(&self, date: &str) -> io::Result<()>;
}

/// Transport to the record-visit operation. Implementations should bound the
/// call with a timeout and report it as a failed response rather than hang.
#[allow(async_fn_in_trait)]
pub trait VisitRecorder {
    async fn record_visit(&self) -> RecordVisitResponse;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The marker already holds today's date; no call was made.
    AlreadyRecorded,
    Recorded,
    Failed(String),
}

pub struct VisitDetector<M, R> {
    marker: M,
    recorder: R,
}

impl<M: MarkerStore, R: VisitRecorder> VisitDetector<M, R> {
    pub fn new(marker: M, recorder: R) -> Self {
        Self { marker, recorder }
    }

    /// Runs the once-per-day check against the current UTC date.
    pub async fn activate(&self) -> Activation {
        self.activate_on(today_utc()).await
    }

    pub async fn activate_on(&self, today: NaiveDate) -> Activation {
        let today = date_key(today);
        if self.marker.last_visit().as_deref() == Some(today.as_str()) {
            return Activation::AlreadyRecorded;
        }

        let response = self.recorder.record_visit().await;
        if !response.success {
            return Activation::Failed(
                response
                    .error
                    .unwrap_or_else(|| "visit was not recorded".to_string()),
            );
        }

        // The visit is already counted; losing the marker write only risks a
        // duplicate record on the next activation.
        if let Err(err) = self.marker.set_last_visit(&today) {
            warn!("failed to persist visit marker: {err}");
        }
        Activation::Recorded
    }
}

/// File-backed marker store for native clients.
pub struct FileMarker {
    path: PathBuf,
}

impl FileMarker {
    /// Resolves the marker location (`VISIT_MARKER_PATH`, else
    /// `data/last_visit_date`). Returns `None` when the location cannot be
    /// prepared; callers skip visit detection entirely in that case.
    pub fn discover() -> Option<Self> {
        let path = env::var("VISIT_MARKER_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data").join(MARKER_KEY));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok()?;
        }
        Some(Self { path })
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }
}

impl MarkerStore for FileMarker {
    fn last_visit(&self) -> Option<String> {
        let value = fs::read_to_string(&self.path).ok()?;
        let value = value.trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    fn set_last_visit(&self, date: &str) -> io::Result<()> {
        fs::write(&self.path, date)
    }
}
