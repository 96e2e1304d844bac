use crate::models::{Asset, BookSnapshot, Fill, Order, Side, User};
use bigdecimal::BigDecimal;
use common::EngineError;

/// The ledger store's external contract, implemented once against Postgres
/// (`store::pg::PgStore`) and once in-memory (`store::mock::MockStore`) for
/// tests. Every method that mutates state runs in its own transaction with
/// `SELECT ... FOR UPDATE` on the rows it touches; the caller (the matching
/// engine) is responsible for the higher-level serialization a multi-step
/// match requires — see `engine::matching` and DESIGN.md for why that
/// responsibility sits there rather than inside a single giant transaction.
pub trait Store: Send + Sync {
    fn get_user(&self, user_id: &str) -> Result<Option<User>, EngineError>;
    fn get_asset(&self, user_id: &str, symbol: &str) -> Result<Option<Asset>, EngineError>;
    fn list_assets(&self, user_id: &str) -> Result<Vec<Asset>, EngineError>;

    /// Reserves funds/inventory and persists the new order as `OPEN`, all in
    /// one transaction.
    fn submit_order(
        &self,
        user_id: &str,
        symbol: &str,
        side: Side,
        price: BigDecimal,
        amount: BigDecimal,
        created_at: i64,
    ) -> Result<Order, EngineError>;

    /// Verifies ownership and `OPEN` status, refunds the reservation for
    /// `remaining_amount`, transitions to `CANCELLED`.
    fn cancel_order(&self, user_id: &str, order_id: &str) -> Result<Order, EngineError>;

    /// Reloads the triggering order under an exclusive lock; `Ok(None)` if
    /// it is no longer `OPEN`.
    fn reload_open_order(&self, order_id: &str) -> Result<Option<Order>, EngineError>;

    /// Eligible resting counter-orders for `taker`, in price-time priority,
    /// excluding `taker`'s own orders.
    fn counter_orders(
        &self,
        symbol: &str,
        taker_user_id: &str,
        taker_order_id: &str,
        taker_side: Side,
        taker_price: &BigDecimal,
    ) -> Result<Vec<Order>, EngineError>;

    /// Executes one fill between a buy and a sell order at `match_price`
    /// for `match_amount`, transferring balances/inventory, updating both
    /// orders' `filled_amount`/`status`, and appending a `Trade` — all in
    /// one transaction. Returns `Ok(None)` without mutating anything if
    /// either order is no longer `OPEN` by the time both are locked (a
    /// cancel can race in between `counter_orders` and this call); the
    /// caller is expected to re-fetch and retry rather than treat that as
    /// an error.
    fn settle(
        &self,
        buy_order_id: &str,
        sell_order_id: &str,
        match_amount: &BigDecimal,
        match_price: &BigDecimal,
        executed_at: i64,
    ) -> Result<Option<Fill>, EngineError>;

    /// The caller's orders, newest first.
    fn list_orders(&self, user_id: &str) -> Result<Vec<Order>, EngineError>;

    /// All `OPEN` orders on `symbol`, both sides in book priority order.
    fn book(&self, symbol: &str) -> Result<BookSnapshot, EngineError>;
}
