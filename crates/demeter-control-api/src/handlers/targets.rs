use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use demeter_types::TargetValues;
use serde::{de::Error as _, Deserialize, Deserializer};
use serde_json::{json, Value};

/// 设置目标值请求
///
/// 数值字段也接受数字字符串，例如 `"5.8"`。
#[derive(Debug, Deserialize)]
pub struct SetTargetValuesRequest {
    #[serde(rename = "low_pH", deserialize_with = "number_or_string")]
    pub low_ph: f64,
    #[serde(rename = "high_pH", deserialize_with = "number_or_string")]
    pub high_ph: f64,
    #[serde(rename = "low_EC", deserialize_with = "number_or_string")]
    pub low_ec: f64,
}

impl From<SetTargetValuesRequest> for TargetValues {
    fn from(req: SetTargetValuesRequest) -> Self {
        TargetValues::new(req.low_ph, req.high_ph, req.low_ec)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Numeric::deserialize(deserializer)? {
        Numeric::Number(n) => Ok(n),
        Numeric::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid number: {s:?}"))),
    }
}

/// 更新目标值
///
/// 任何字段缺失或不是数值时整体拒绝，不做部分更新。
pub async fn set_target_values(
    State(state): State<AppState>,
    payload: Result<Json<SetTargetValuesRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload?;
    let targets = TargetValues::from(req);

    state.targets.save(&targets).await?;

    Ok(Json(json!({
        "message": "Target values updated successfully",
    })))
}

/// 当前目标值
pub async fn get_target_values(State(state): State<AppState>) -> Json<TargetValues> {
    Json(state.targets.load().await)
}
