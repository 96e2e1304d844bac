use crate::models::*;
use crate::traits::Store;
use bigdecimal::BigDecimal;
use common::money;
use common::EngineError;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory `Store`, used by engine unit/integration tests that don't want
/// a live Postgres instance. Mirrors the shape of the pg-backed store one
/// `HashMap` per table, guarded by a single `Mutex` rather than per-row
/// locks -- acceptable here because tests never need real concurrency,
/// only the same observable state transitions.
#[derive(Default)]
pub struct MockStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<String, User>,
    assets: HashMap<(String, String), Asset>,
    orders: HashMap<String, Order>,
    trades: Vec<Trade>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_user(&self, user: User) {
        self.inner.lock().unwrap().users.insert(user.id.clone(), user);
    }

    pub fn seed_asset(&self, asset: Asset) {
        self.inner
            .lock()
            .unwrap()
            .assets
            .insert((asset.user_id.clone(), asset.symbol.clone()), asset);
    }
}

impl Store for MockStore {
    fn get_user(&self, user_id: &str) -> Result<Option<User>, EngineError> {
        Ok(self.inner.lock().unwrap().users.get(user_id).cloned())
    }

    fn get_asset(&self, user_id: &str, symbol: &str) -> Result<Option<Asset>, EngineError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .assets
            .get(&(user_id.to_string(), symbol.to_string()))
            .cloned())
    }

    fn list_assets(&self, user_id: &str) -> Result<Vec<Asset>, EngineError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .assets
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    fn submit_order(
        &self,
        user_id: &str,
        symbol: &str,
        side: Side,
        price: BigDecimal,
        amount: BigDecimal,
        created_at: i64,
    ) -> Result<Order, EngineError> {
        let mut inner = self.inner.lock().unwrap();
        let notional = money::mul_trunc8(&price, &amount);
        let commission = money::commission_on(&notional);

        match side {
            Side::Buy => {
                let required = money::truncate8(&(&notional + &commission));
                let buyer = inner
                    .users
                    .get_mut(user_id)
                    .ok_or(EngineError::NotFound)?;
                if buyer.balance < required {
                    return Err(EngineError::InsufficientBalance);
                }
                buyer.balance = money::truncate8(&(&buyer.balance - &required));
            }
            Side::Sell => {
                if !inner.users.contains_key(user_id) {
                    return Err(EngineError::NotFound);
                }
                let asset = inner
                    .assets
                    .get_mut(&(user_id.to_string(), symbol.to_string()))
                    .ok_or(EngineError::AssetNotFound)?;
                if asset.available_amount() < amount {
                    return Err(EngineError::InsufficientAsset);
                }
                asset.locked_amount = money::truncate8(&(&asset.locked_amount + &amount));
            }
        }

        let order = Order {
            id: common::ids::new_id(),
            user_id: user_id.to_string(),
            symbol: symbol.to_string(),
            side: side.as_str().to_string(),
            price,
            amount,
            filled_amount: money::zero(),
            status: OrderStatus::Open.as_i16(),
            created_at,
        };
        inner.orders.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    fn cancel_order(&self, user_id: &str, order_id: &str) -> Result<Order, EngineError> {
        let mut inner = self.inner.lock().unwrap();
        let order = inner.orders.get(order_id).cloned().ok_or(EngineError::NotFound)?;
        if order.user_id != user_id {
            return Err(EngineError::NotFound);
        }
        if !order.is_open() {
            return Err(EngineError::CannotCancel);
        }

        let remaining = order.remaining_amount();
        match order.get_side() {
            Side::Buy => {
                let notional = money::mul_trunc8(&remaining, &order.price);
                let commission = money::commission_on(&notional);
                let refund = money::truncate8(&(&notional + &commission));
                let buyer = inner
                    .users
                    .get_mut(&order.user_id)
                    .ok_or(EngineError::NotFound)?;
                buyer.balance = money::truncate8(&(&buyer.balance + &refund));
            }
            Side::Sell => {
                if let Some(asset) = inner
                    .assets
                    .get_mut(&(order.user_id.clone(), order.symbol.clone()))
                {
                    asset.locked_amount = money::truncate8(&(&asset.locked_amount - &remaining));
                }
            }
        }

        let stored = inner.orders.get_mut(order_id).expect("checked above");
        stored.status = OrderStatus::Cancelled.as_i16();
        Ok(stored.clone())
    }

    fn reload_open_order(&self, order_id: &str) -> Result<Option<Order>, EngineError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .orders
            .get(order_id)
            .filter(|o| o.is_open())
            .cloned())
    }

    fn counter_orders(
        &self,
        symbol: &str,
        taker_user_id: &str,
        taker_order_id: &str,
        taker_side: Side,
        taker_price: &BigDecimal,
    ) -> Result<Vec<Order>, EngineError> {
        let inner = self.inner.lock().unwrap();
        let counter_side = taker_side.opposite();
        let mut matches: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| {
                o.symbol == symbol
                    && o.is_open()
                    && o.side == counter_side.as_str()
                    && o.user_id != taker_user_id
                    && o.id != taker_order_id
                    && match taker_side {
                        Side::Buy => o.price <= *taker_price,
                        Side::Sell => o.price >= *taker_price,
                    }
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            let price_order = match taker_side {
                Side::Buy => a.price.cmp(&b.price),
                Side::Sell => b.price.cmp(&a.price),
            };
            price_order
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        Ok(matches)
    }

    fn settle(
        &self,
        buy_order_id: &str,
        sell_order_id: &str,
        match_amount: &BigDecimal,
        match_price: &BigDecimal,
        executed_at: i64,
    ) -> Result<Option<Fill>, EngineError> {
        let mut inner = self.inner.lock().unwrap();

        let mut buy_order = inner
            .orders
            .get(buy_order_id)
            .cloned()
            .ok_or(EngineError::NotFound)?;
        let mut sell_order = inner
            .orders
            .get(sell_order_id)
            .cloned()
            .ok_or(EngineError::NotFound)?;

        // A cancel can race in between `counter_orders` reading this order
        // as OPEN and this call locking it under `inner`. Skip the fill
        // rather than re-fill a terminal order; the caller re-fetches.
        if !buy_order.is_open() || !sell_order.is_open() {
            return Ok(None);
        }

        let executed_total = money::mul_trunc8(match_price, match_amount);
        let executed_commission = money::commission_on(&executed_total);
        let executed_cost = money::truncate8(&(&executed_total + &executed_commission));

        let reserved_total = money::mul_trunc8(&buy_order.price, match_amount);
        let reserved_commission = money::commission_on(&reserved_total);
        let reserved_cost = money::truncate8(&(&reserved_total + &reserved_commission));

        let buyer_asset = inner
            .assets
            .entry((buy_order.user_id.clone(), buy_order.symbol.clone()))
            .or_insert_with(|| Asset {
                user_id: buy_order.user_id.clone(),
                symbol: buy_order.symbol.clone(),
                amount: money::zero(),
                locked_amount: money::zero(),
            });
        buyer_asset.amount = money::truncate8(&(&buyer_asset.amount + match_amount));

        let buyer = inner
            .users
            .get_mut(&buy_order.user_id)
            .ok_or(EngineError::NotFound)?;
        buyer.balance = money::truncate8(&(&buyer.balance + &reserved_cost - &executed_cost));

        let seller_asset = inner
            .assets
            .get_mut(&(sell_order.user_id.clone(), sell_order.symbol.clone()))
            .ok_or(EngineError::AssetNotFound)?;
        seller_asset.amount = money::truncate8(&(&seller_asset.amount - match_amount));
        seller_asset.locked_amount = money::truncate8(&(&seller_asset.locked_amount - match_amount));

        let seller = inner
            .users
            .get_mut(&sell_order.user_id)
            .ok_or(EngineError::NotFound)?;
        seller.balance = money::truncate8(&(&seller.balance + &executed_total));

        buy_order.filled_amount = money::truncate8(&(&buy_order.filled_amount + match_amount));
        let buy_terminal = buy_order.filled_amount >= buy_order.amount;
        if buy_terminal {
            buy_order.status = OrderStatus::Filled.as_i16();
        }
        inner.orders.insert(buy_order_id.to_string(), buy_order.clone());

        sell_order.filled_amount = money::truncate8(&(&sell_order.filled_amount + match_amount));
        let sell_terminal = sell_order.filled_amount >= sell_order.amount;
        if sell_terminal {
            sell_order.status = OrderStatus::Filled.as_i16();
        }
        inner.orders.insert(sell_order_id.to_string(), sell_order.clone());

        let trade = Trade {
            id: common::ids::new_id(),
            buy_order_id: buy_order_id.to_string(),
            sell_order_id: sell_order_id.to_string(),
            buyer_id: buy_order.user_id.clone(),
            seller_id: sell_order.user_id.clone(),
            symbol: buy_order.symbol.clone(),
            price: match_price.clone(),
            amount: match_amount.clone(),
            executed_at,
        };
        inner.trades.push(trade.clone());

        Ok(Some(Fill {
            trade,
            buy_order,
            sell_order,
            buy_order_became_terminal: buy_terminal,
            sell_order_became_terminal: sell_terminal,
        }))
    }

    fn list_orders(&self, user_id: &str) -> Result<Vec<Order>, EngineError> {
        let inner = self.inner.lock().unwrap();
        let mut orders: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    fn book(&self, symbol: &str) -> Result<BookSnapshot, EngineError> {
        let inner = self.inner.lock().unwrap();
        let mut buys: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| o.symbol == symbol && o.is_open() && o.side == Side::Buy.as_str())
            .cloned()
            .collect();
        buys.sort_by(|a, b| {
            b.price
                .cmp(&a.price)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });

        let mut sells: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| o.symbol == symbol && o.is_open() && o.side == Side::Sell.as_str())
            .cloned()
            .collect();
        sells.sort_by(|a, b| {
            a.price
                .cmp(&b.price)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });

        Ok(BookSnapshot { buys, sells })
    }
}
