use crate::models::{DailyVisitCounter, RecordVisitResponse, StatsResponse};
use crate::state::AppState;
use crate::stats::build_stats;
use crate::store::today_utc;
use crate::ui::render_index;
use axum::{extract::State, response::Html, Json};
use tracing::error;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let counter = state.store.counter_for(today_utc()).await;
    Html(render_index(&counter))
}

/// Records one visit against the server's current UTC date.
///
/// Always answers 200 with a structured body; storage failures are reported
/// as `success: false` so the client can retry on its next activation.
pub async fn record_visit(State(state): State<AppState>) -> Json<RecordVisitResponse> {
    match state.store.record_visit(today_utc()).await {
        Ok(_) => Json(RecordVisitResponse::recorded()),
        Err(err) => {
            error!("failed to record visit: {err}");
            Json(RecordVisitResponse::failed(err.to_string()))
        }
    }
}

pub async fn get_today(State(state): State<AppState>) -> Json<DailyVisitCounter> {
    Json(state.store.counter_for(today_utc()).await)
}

pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let data = state.store.snapshot().await;
    Json(build_stats(&data))
}
