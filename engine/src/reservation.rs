use bigdecimal::BigDecimal;
use common::time::MonotonicClock;
use common::EngineError;
use std::sync::Arc;
use store::{Order, Side, Store};

/// Reserves funds/inventory and mutates order lifecycle state through the
/// store, mirroring the shape of a wallet service that only ever talks to
/// its persistence layer -- no matching logic lives here.
#[derive(Clone)]
pub struct ReservationService<S: Store> {
    store: Arc<S>,
    clock: Arc<MonotonicClock>,
}

impl<S: Store> ReservationService<S> {
    pub fn new(store: Arc<S>, clock: Arc<MonotonicClock>) -> Self {
        Self { store, clock }
    }

    /// Reserves the order's cost (buy) or inventory (sell) and persists it
    /// as `OPEN`.
    #[tracing::instrument(skip(self))]
    pub fn submit(
        &self,
        user_id: &str,
        symbol: &str,
        side: Side,
        price: BigDecimal,
        amount: BigDecimal,
    ) -> Result<Order, EngineError> {
        self.store
            .submit_order(user_id, symbol, side, price, amount, self.clock.next())
    }

    /// Verifies ownership and `OPEN` status, refunds the remaining
    /// reservation, transitions to `CANCELLED`.
    #[tracing::instrument(skip(self))]
    pub fn cancel(&self, user_id: &str, order_id: &str) -> Result<Order, EngineError> {
        self.store.cancel_order(user_id, order_id)
    }
}
