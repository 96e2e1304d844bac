use crate::events::{EngineEvent, EventBus};
use crate::matching::MatchingEngine;
use crate::reservation::ReservationService;
use crate::validation;
use common::time::MonotonicClock;
use common::EngineError;
use std::sync::Arc;
use store::{Asset, BookSnapshot, Order, Store, User};

/// The engine's external surface: everything the HTTP layer needs, with no
/// knowledge of HTTP itself.
pub struct OrderService<S: Store> {
    store: Arc<S>,
    events: Arc<EventBus>,
    clock: Arc<MonotonicClock>,
    reservation: ReservationService<S>,
    matching: MatchingEngine<S>,
}

impl<S: Store> OrderService<S> {
    pub fn new(store: Arc<S>) -> Self {
        let clock = Arc::new(MonotonicClock::new());
        let events = Arc::new(EventBus::new());
        let reservation = ReservationService::new(store.clone(), clock.clone());
        let matching = MatchingEngine::new(store.clone(), events.clone(), clock.clone());
        Self {
            store,
            events,
            clock,
            reservation,
            matching,
        }
    }

    pub fn events(&self) -> Arc<EventBus> {
        self.events.clone()
    }

    /// Validates, reserves, persists as `OPEN`, then runs the match, and
    /// returns the order in its post-match state.
    #[tracing::instrument(skip(self))]
    pub fn submit_order(
        &self,
        user_id: &str,
        symbol: &str,
        side: &str,
        price: &str,
        amount: &str,
    ) -> Result<Order, EngineError> {
        let input = validation::validate_submit_order(symbol, side, price, amount)?;

        let order = self.reservation.submit(
            user_id,
            &input.symbol,
            input.side,
            input.price,
            input.amount,
        )?;

        let report = self.matching.match_order(&order.id, &input.symbol)?;
        Ok(report.taker_order.unwrap_or(order))
    }

    #[tracing::instrument(skip(self))]
    pub fn cancel_order(&self, user_id: &str, order_id: &str) -> Result<Order, EngineError> {
        let order = self.reservation.cancel(user_id, order_id)?;
        let now = self.clock.next();
        self.events
            .publish(&order.user_id, EngineEvent::order_status_updated(&order, now));
        Ok(order)
    }

    pub fn list_orders(&self, user_id: &str) -> Result<Vec<Order>, EngineError> {
        self.store.list_orders(user_id)
    }

    pub fn book(&self, symbol: &str) -> Result<BookSnapshot, EngineError> {
        self.store.book(symbol)
    }

    pub fn profile(&self, user_id: &str) -> Result<(User, Vec<Asset>), EngineError> {
        let user = self.store.get_user(user_id)?.ok_or(EngineError::NotFound)?;
        let assets = self.store.list_assets(user_id)?;
        Ok((user, assets))
    }
}
