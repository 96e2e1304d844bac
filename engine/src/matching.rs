use crate::events::{EngineEvent, EventBus};
use common::money;
use common::time::MonotonicClock;
use common::EngineError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use store::{MatchReport, Side, Store};

/// Walks the book for one taker order, executing fills in price-time
/// priority until the taker is exhausted or no eligible counter-order
/// remains.
///
/// Each `match_order` call takes an in-process lock scoped to the order's
/// symbol before touching the store; this is the engine's substitute for
/// spanning the whole walk in a single database transaction, relying on a
/// single-writer in-memory book instead. Every individual store call still
/// runs its own `FOR UPDATE` transaction, so the lock is about serializing
/// the multi-step walk in-process, not about row-level correctness.
pub struct MatchingEngine<S: Store> {
    store: Arc<S>,
    events: Arc<EventBus>,
    clock: Arc<MonotonicClock>,
    symbol_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: Store> MatchingEngine<S> {
    pub fn new(store: Arc<S>, events: Arc<EventBus>, clock: Arc<MonotonicClock>) -> Self {
        Self {
            store,
            events,
            clock,
            symbol_locks: Mutex::new(HashMap::new()),
        }
    }

    fn lock_for_symbol(&self, symbol: &str) -> Arc<Mutex<()>> {
        let mut locks = self.symbol_locks.lock().unwrap();
        locks
            .entry(symbol.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    #[tracing::instrument(skip(self))]
    pub fn match_order(&self, taker_order_id: &str, symbol: &str) -> Result<MatchReport, EngineError> {
        let symbol_lock = self.lock_for_symbol(symbol);
        let _guard = symbol_lock.lock().unwrap();

        let mut report = MatchReport::default();

        let mut taker = match self.store.reload_open_order(taker_order_id)? {
            Some(order) => order,
            None => {
                tracing::debug!("order no longer open at match time, skipping");
                return Ok(report);
            }
        };

        loop {
            // Re-check on every pass, not just once: a cancel can land on
            // the taker itself between iterations.
            taker = match self.store.reload_open_order(&taker.id)? {
                Some(order) => order,
                None => {
                    tracing::debug!("taker no longer open mid-walk, stopping");
                    break;
                }
            };

            let remaining = taker.remaining_amount();
            if !money::is_positive(&remaining) {
                break;
            }

            let counters = self.store.counter_orders(
                &taker.symbol,
                &taker.user_id,
                &taker.id,
                taker.get_side(),
                &taker.price,
            )?;
            let maker = match counters.into_iter().next() {
                Some(maker) => maker,
                None => break,
            };

            let maker_remaining = maker.remaining_amount();
            let match_amount = std::cmp::min(remaining, maker_remaining);
            if !money::is_positive(&match_amount) {
                break;
            }
            let match_price = maker.price.clone();

            let (buy_order_id, sell_order_id) = match taker.get_side() {
                Side::Buy => (taker.id.clone(), maker.id.clone()),
                Side::Sell => (maker.id.clone(), taker.id.clone()),
            };

            let fill = match self.store.settle(
                &buy_order_id,
                &sell_order_id,
                &match_amount,
                &match_price,
                self.clock.next(),
            )? {
                Some(fill) => fill,
                None => {
                    // Either side was cancelled between `counter_orders`
                    // reading it as OPEN and `settle` locking it. Loop
                    // around: the re-check above and a fresh `counter_orders`
                    // call will naturally skip whichever order raced.
                    tracing::debug!("fill skipped, order became non-open mid-walk");
                    continue;
                }
            };

            self.events
                .publish(&fill.trade.buyer_id, EngineEvent::order_matched(&fill.trade));
            self.events
                .publish(&fill.trade.seller_id, EngineEvent::order_matched(&fill.trade));

            if fill.buy_order_became_terminal {
                let now = self.clock.next();
                self.events.publish(
                    &fill.buy_order.user_id,
                    EngineEvent::order_status_updated(&fill.buy_order, now),
                );
            }
            if fill.sell_order_became_terminal {
                let now = self.clock.next();
                self.events.publish(
                    &fill.sell_order.user_id,
                    EngineEvent::order_status_updated(&fill.sell_order, now),
                );
            }

            taker = match taker.get_side() {
                Side::Buy => fill.buy_order.clone(),
                Side::Sell => fill.sell_order.clone(),
            };

            let taker_terminal = match taker.get_side() {
                Side::Buy => fill.buy_order_became_terminal,
                Side::Sell => fill.sell_order_became_terminal,
            };

            report.fills.push(fill);

            if taker_terminal {
                break;
            }
        }

        tracing::info!(fills = report.fills.len(), "match pass complete");
        report.taker_order = Some(taker);
        Ok(report)
    }
}
