use std::sync::Arc;

use engine::OrderService;
use store::PgStore;

use crate::auth::AuthStore;

pub struct AppState {
    pub store: Arc<PgStore>,
    pub orders: OrderService<PgStore>,
    pub auth: AuthStore,
}

impl AppState {
    pub fn new(store: Arc<PgStore>, auth_token_ttl_seconds: i64) -> Self {
        Self {
            orders: OrderService::new(store.clone()),
            store,
            auth: AuthStore::new(auth_token_ttl_seconds),
        }
    }
}
