// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::{
    body::Bytes,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::{
    application::dto::payment_request::PaymentConfirmationDto,
    config::settings::Settings,
    domain::services::ledger_service::LedgerService,
    presentation::errors::AppError,
};

/// 支付确认签名请求头
pub const PAYMENT_SIGNATURE_HEADER: &str = "x-payment-signature";

/// 支付确认回调
///
/// 支付处理器在扣款成功后回调此端点；信用点只在这里入账。
/// 回调按原始请求体的 HMAC-SHA256 签名验证，按确认号去重，
/// 至少一次送达下的重复确认是无变更的成功。
pub async fn payment_confirmation(
    Extension(settings): Extension<Arc<Settings>>,
    Extension(ledger): Extension<Arc<LedgerService>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let signature = headers
        .get(PAYMENT_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if !verify_signature(&settings.payment.webhook_secret, &body, signature) {
        warn!("Payment confirmation with invalid signature rejected");
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "success": false,
                "error": "Invalid payment signature"
            })),
        )
            .into_response());
    }

    let payload: PaymentConfirmationDto =
        serde_json::from_slice(&body).map_err(anyhow::Error::from)?;
    payload.validate()?;

    let new_balance = ledger
        .confirm_top_up(payload.account_id, payload.amount, payload.payment_ref)
        .await?;

    info!(
        "Payment confirmation {} processed for account {}",
        payload.payment_ref, payload.account_id
    );

    Ok(Json(serde_json::json!({
        "success": true,
        "account_id": payload.account_id,
        "balance": new_balance,
    }))
    .into_response())
}

/// 校验回调签名（十六进制 HMAC-SHA256）
fn verify_signature(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(body);

    let Ok(expected) = hex::decode(signature_hex) else {
        return false;
    };
    mac.verify_slice(&expected).is_ok()
}
