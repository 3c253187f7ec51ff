use crate::error::ApiError;
use crate::state::AppState;
use axum::{extract::State, Json};
use demeter_types::Role;
use std::collections::BTreeMap;

/// 实时采集一次传感器读数
///
/// 会占用总线，与后台采集和投加串行执行。
pub async fn get_sensor_data(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<Role, Option<f64>>>, ApiError> {
    let snapshot = state.acquirer.acquire().await?;
    Ok(Json(snapshot.readings().clone()))
}
