use crate::error::ApiError;
use crate::state::AppState;
use axum::{extract::State, Json};
use demeter_types::{DailyAverage, Snapshot};

const NO_DATA: &str = "No data available";

fn require<T>(data: Option<T>) -> Result<Json<T>, ApiError> {
    data.map(Json)
        .ok_or_else(|| ApiError::NotFound(NO_DATA.to_string()))
}

/// 最近 24 小时的历史
pub async fn get_history_24h(
    State(state): State<AppState>,
) -> Result<Json<Vec<Snapshot>>, ApiError> {
    require(state.history.last_24h().await?)
}

/// 全部历史
pub async fn get_history_all(
    State(state): State<AppState>,
) -> Result<Json<Vec<Snapshot>>, ApiError> {
    require(state.history.all().await?)
}

/// 最近 7 天的每日平均值
pub async fn get_history_7d_avg(
    State(state): State<AppState>,
) -> Result<Json<Vec<DailyAverage>>, ApiError> {
    require(state.history.daily_average_7d().await?)
}
