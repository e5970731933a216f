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

use crate::domain::models::account::Account;
use crate::infrastructure::database::entities::account;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

use std::sync::Arc;

/// 账户标识请求头
///
/// 由上游认证网关在验证会话后注入；核心信任该标识，
/// 自身不做任何凭证检查
pub const ACCOUNT_ID_HEADER: &str = "x-account-id";

/// 身份状态
#[derive(Clone)]
pub struct IdentityState {
    /// 数据库连接
    pub db: Arc<DatabaseConnection>,
}

/// 身份中间件
///
/// 读取上游认证提供方注入的账户标识，加载账户行并放入请求
/// 扩展；未知或已停用的账户被拒绝
///
/// # 参数
///
/// * `state` - 身份状态
/// * `req` - HTTP请求
/// * `next` - 下一个中间件
///
/// # 返回值
///
/// * `Ok(Response)` - 验证成功的响应
/// * `Err(StatusCode)` - 验证失败的状态码
pub async fn identity_middleware(
    State(state): State<IdentityState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let account_id = {
        let header = req
            .headers()
            .get(ACCOUNT_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Uuid::parse_str(header).map_err(|_| StatusCode::UNAUTHORIZED)?
    };

    match account::Entity::find_by_id(account_id)
        .one(state.db.as_ref())
        .await
    {
        Ok(Some(model)) => {
            let account: Account = model.into();
            if !account.active {
                tracing::warn!("Rejected request from deactivated account {}", account_id);
                return Err(StatusCode::FORBIDDEN);
            }
            req.extensions_mut().insert(account);
            Ok(next.run(req).await)
        }
        Ok(None) => {
            tracing::warn!("Unknown account id in request: {}", account_id);
            Err(StatusCode::UNAUTHORIZED)
        }
        Err(e) => {
            tracing::error!("Database error resolving account {}: {}", account_id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
