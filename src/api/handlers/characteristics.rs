//! Characteristic read/write handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::api::BridgeState;
use crate::error::AppError;
use crate::models::{CharacteristicWriteRequest, CharacteristicsQuery, CharacteristicsResponse};

/// GET /characteristics?id=2.10,2.11 - Read cached values
pub async fn get_characteristics(
    State(state): State<BridgeState>,
    Query(query): Query<CharacteristicsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ids = parse_characteristic_ids(&query.id)?;

    let mut characteristics = Vec::with_capacity(ids.len());
    for (aid, iid) in ids {
        let characteristic = state.container.characteristic(aid, iid)?;
        characteristics.push(characteristic.view(Some(aid)).await);
    }

    Ok(Json(CharacteristicsResponse { characteristics }))
}

/// PUT /characteristics - Remote writes from a controller
///
/// Every write is validated before any is dispatched. Proxy failures are
/// handled by the sync engine and never reach the controller.
pub async fn put_characteristics(
    State(state): State<BridgeState>,
    Json(payload): Json<CharacteristicWriteRequest>,
) -> Result<impl IntoResponse, AppError> {
    for write in &payload.characteristics {
        let characteristic = state.container.characteristic(write.aid, write.iid)?;
        if !characteristic.kind().accepts(&write.value) {
            return Err(AppError::BadRequest(format!(
                "Invalid value {:?} for {}.{}",
                write.value, write.aid, write.iid
            )));
        }
    }

    for write in payload.characteristics {
        tracing::debug!("Remote write {}.{} = {:?}", write.aid, write.iid, write.value);
        state
            .container
            .dispatch_write(write.aid, write.iid, write.value)
            .await?;
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Parse `aid.iid[,aid.iid...]`
fn parse_characteristic_ids(raw: &str) -> Result<Vec<(u64, u64)>, AppError> {
    raw.split(',')
        .map(|pair| {
            let (aid, iid) = pair
                .trim()
                .split_once('.')
                .ok_or_else(|| AppError::BadRequest(format!("Malformed id {:?}", pair)))?;
            let aid = aid
                .parse::<u64>()
                .map_err(|_| AppError::BadRequest(format!("Malformed aid {:?}", aid)))?;
            let iid = iid
                .parse::<u64>()
                .map_err(|_| AppError::BadRequest(format!("Malformed iid {:?}", iid)))?;
            Ok((aid, iid))
        })
        .collect()
}
