use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use common::time::now_millis;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

struct Session {
    user_id: String,
    expires_at_millis: i64,
}

/// Bearer-token stub: tokens are opaque UUIDs mapped to a user id in
/// memory with a configured TTL, and no refresh -- a real auth/session
/// lifecycle is out of scope here. `login` treats the caller-supplied
/// `email` as the user's id directly -- this system has no user directory
/// beyond the store's `users` table, and password verification is
/// intentionally not implemented.
pub struct AuthStore {
    tokens: RwLock<HashMap<String, Session>>,
    ttl_millis: i64,
}

impl AuthStore {
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
            ttl_millis: ttl_seconds.saturating_mul(1000),
        }
    }

    pub fn issue(&self, user_id: &str) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        let session = Session {
            user_id: user_id.to_string(),
            expires_at_millis: now_millis() + self.ttl_millis,
        };
        self.tokens.write().unwrap().insert(token.clone(), session);
        token
    }

    pub fn revoke(&self, token: &str) {
        self.tokens.write().unwrap().remove(token);
    }

    pub fn user_id_for(&self, token: &str) -> Option<String> {
        let mut tokens = self.tokens.write().unwrap();
        let session = tokens.get(token)?;
        if session.expires_at_millis <= now_millis() {
            tokens.remove(token);
            return None;
        }
        Some(session.user_id.clone())
    }
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let user_id = state
        .auth
        .user_id_for(token)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(AuthUser { user_id });
    Ok(next.run(request).await)
}
