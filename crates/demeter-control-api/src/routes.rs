use crate::handlers::{
    get_history_24h, get_history_7d_avg, get_history_all, get_sensor_data, get_target_values,
    set_target_values,
};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// 创建 API 路由
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // 健康检查
        .route("/health", get(health_check))
        // 实时读数
        .route("/api/sensor", get(get_sensor_data))
        .route("/sensor", get(get_sensor_data))
        // 历史
        .route("/api/history/24h", get(get_history_24h))
        .route("/api/history/all", get(get_history_all))
        .route("/api/history/7d_avg", get(get_history_7d_avg))
        // 目标值
        .route("/api/set-target-values", post(set_target_values))
        .route("/api/target-values", get(get_target_values))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 健康检查
async fn health_check() -> &'static str {
    "OK"
}
