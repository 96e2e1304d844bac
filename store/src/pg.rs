use crate::db::DbPool;
use crate::models::*;
use crate::schema::{assets, orders, trades, users};
use crate::traits::Store;
use bigdecimal::BigDecimal;
use common::money;
use common::EngineError;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Seeds a user for demos/tests; not part of the `Store` contract since
    /// user provisioning has no public entry point.
    pub fn seed_user(&self, new_user: NewUser) -> Result<User, EngineError> {
        run_tx(&self.pool, |conn| {
            diesel::insert_into(users::table)
                .values(&new_user)
                .get_result(conn)
                .map_err(Into::into)
        })
    }
}

fn is_serialization_failure(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<DieselError>(),
        Some(DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _))
    )
}

/// Runs `f` in one transaction, retrying up to 3 attempts on a Postgres
/// serialization failure before surfacing `StoreConflict`.
fn run_tx<T>(
    pool: &DbPool,
    f: impl Fn(&mut PgConnection) -> Result<T, anyhow::Error>,
) -> Result<T, EngineError> {
    let mut conn = pool
        .get()
        .map_err(|e| EngineError::Internal(anyhow::anyhow!(e)))?;

    let mut attempt = 0;
    loop {
        attempt += 1;
        match conn.transaction(|c| f(c)) {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt < 3 && is_serialization_failure(&err) {
                    continue;
                }
                return Err(match err.downcast::<EngineError>() {
                    Ok(engine_err) => engine_err,
                    Err(other) => {
                        if is_serialization_failure(&other) {
                            EngineError::StoreConflict
                        } else {
                            EngineError::Internal(other)
                        }
                    }
                });
            }
        }
    }
}

fn lock_user(conn: &mut PgConnection, user_id: &str) -> Result<User, anyhow::Error> {
    users::table
        .find(user_id)
        .for_update()
        .first::<User>(conn)
        .optional()?
        .ok_or_else(|| EngineError::NotFound.into())
}

fn lock_asset(
    conn: &mut PgConnection,
    user_id: &str,
    symbol: &str,
) -> Result<Option<Asset>, anyhow::Error> {
    Ok(assets::table
        .find((user_id, symbol))
        .for_update()
        .first::<Asset>(conn)
        .optional()?)
}

fn lock_or_create_asset(
    conn: &mut PgConnection,
    user_id: &str,
    symbol: &str,
) -> Result<Asset, anyhow::Error> {
    if let Some(asset) = lock_asset(conn, user_id, symbol)? {
        return Ok(asset);
    }
    let new_asset = NewAsset {
        user_id: user_id.to_string(),
        symbol: symbol.to_string(),
        amount: money::zero(),
        locked_amount: money::zero(),
    };
    Ok(diesel::insert_into(assets::table)
        .values(&new_asset)
        .get_result(conn)?)
}

fn lock_order(conn: &mut PgConnection, order_id: &str) -> Result<Option<Order>, anyhow::Error> {
    Ok(orders::table
        .find(order_id)
        .for_update()
        .first::<Order>(conn)
        .optional()?)
}

/// Locks a buyer's asset row (creating it if this is their first trade on
/// the symbol) and their user row, in that order.
fn lock_buyer(
    conn: &mut PgConnection,
    user_id: &str,
    symbol: &str,
) -> Result<(Asset, User), anyhow::Error> {
    let asset = lock_or_create_asset(conn, user_id, symbol)?;
    let user = lock_user(conn, user_id)?;
    Ok((asset, user))
}

/// Locks a seller's asset row (must already exist -- sell orders reserve
/// inventory at submit time) and their user row, in that order.
fn lock_seller(
    conn: &mut PgConnection,
    user_id: &str,
    symbol: &str,
) -> Result<(Asset, User), anyhow::Error> {
    let asset = lock_asset(conn, user_id, symbol)?
        .ok_or::<anyhow::Error>(EngineError::AssetNotFound.into())?;
    let user = lock_user(conn, user_id)?;
    Ok((asset, user))
}

impl Store for PgStore {
    fn get_user(&self, user_id: &str) -> Result<Option<User>, EngineError> {
        run_tx(&self.pool, |conn| {
            Ok(users::table.find(user_id).first::<User>(conn).optional()?)
        })
    }

    fn get_asset(&self, user_id: &str, symbol: &str) -> Result<Option<Asset>, EngineError> {
        run_tx(&self.pool, |conn| lock_asset_read(conn, user_id, symbol))
    }

    fn list_assets(&self, user_id: &str) -> Result<Vec<Asset>, EngineError> {
        run_tx(&self.pool, |conn| {
            Ok(assets::table
                .filter(assets::user_id.eq(user_id))
                .load::<Asset>(conn)?)
        })
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
        run_tx(&self.pool, |conn| {
            let notional = money::mul_trunc8(&price, &amount);
            let commission = money::commission_on(&notional);

            match side {
                Side::Buy => {
                    let required = &notional + &commission;
                    let mut buyer = lock_user(conn, user_id)?;
                    if buyer.balance < required {
                        return Err(EngineError::InsufficientBalance.into());
                    }
                    buyer.balance = money::truncate8(&(&buyer.balance - &required));
                    diesel::update(users::table.find(user_id))
                        .set(users::balance.eq(&buyer.balance))
                        .execute(conn)?;
                }
                Side::Sell => {
                    // user must exist even though selling doesn't touch cash.
                    lock_user(conn, user_id)?;
                    let asset = lock_asset(conn, user_id, symbol)?
                        .ok_or::<anyhow::Error>(EngineError::AssetNotFound.into())?;
                    let available = asset.available_amount();
                    if available < amount {
                        return Err(EngineError::InsufficientAsset.into());
                    }
                    let new_locked = money::truncate8(&(&asset.locked_amount + &amount));
                    diesel::update(assets::table.find((user_id, symbol)))
                        .set(assets::locked_amount.eq(new_locked))
                        .execute(conn)?;
                }
            }

            let new_order = NewOrder {
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
            Ok(diesel::insert_into(orders::table)
                .values(&new_order)
                .get_result::<Order>(conn)?)
        })
    }

    fn cancel_order(&self, user_id: &str, order_id: &str) -> Result<Order, EngineError> {
        run_tx(&self.pool, |conn| {
            let order = lock_order(conn, order_id)?
                .ok_or::<anyhow::Error>(EngineError::NotFound.into())?;
            if order.user_id != user_id {
                return Err(EngineError::NotFound.into());
            }
            if !order.is_open() {
                return Err(EngineError::CannotCancel.into());
            }

            let remaining = order.remaining_amount();
            match order.get_side() {
                Side::Buy => {
                    let notional = money::mul_trunc8(&remaining, &order.price);
                    let commission = money::commission_on(&notional);
                    let refund = money::truncate8(&(&notional + &commission));
                    let mut buyer = lock_user(conn, &order.user_id)?;
                    buyer.balance = money::truncate8(&(&buyer.balance + &refund));
                    diesel::update(users::table.find(&order.user_id))
                        .set(users::balance.eq(&buyer.balance))
                        .execute(conn)?;
                }
                Side::Sell => {
                    if let Some(asset) = lock_asset(conn, &order.user_id, &order.symbol)? {
                        let new_locked = money::truncate8(&(&asset.locked_amount - &remaining));
                        diesel::update(assets::table.find((&order.user_id, &order.symbol)))
                            .set(assets::locked_amount.eq(new_locked))
                            .execute(conn)?;
                    }
                    // A missing row is tolerated silently.
                }
            }

            Ok(diesel::update(orders::table.find(order_id))
                .set(orders::status.eq(OrderStatus::Cancelled.as_i16()))
                .get_result::<Order>(conn)?)
        })
    }

    fn reload_open_order(&self, order_id: &str) -> Result<Option<Order>, EngineError> {
        run_tx(&self.pool, |conn| {
            let order = lock_order(conn, order_id)?;
            Ok(order.filter(|o| o.is_open()))
        })
    }

    fn counter_orders(
        &self,
        symbol: &str,
        taker_user_id: &str,
        taker_order_id: &str,
        taker_side: Side,
        taker_price: &BigDecimal,
    ) -> Result<Vec<Order>, EngineError> {
        run_tx(&self.pool, |conn| {
            let counter_side = taker_side.opposite();
            let mut query = orders::table
                .filter(orders::symbol.eq(symbol))
                .filter(orders::status.eq(OrderStatus::Open.as_i16()))
                .filter(orders::side.eq(counter_side.as_str()))
                .filter(orders::user_id.ne(taker_user_id))
                .filter(orders::id.ne(taker_order_id))
                .into_boxed();

            query = match taker_side {
                Side::Buy => query
                    .filter(orders::price.le(taker_price.clone()))
                    .order((orders::price.asc(), orders::created_at.asc(), orders::id.asc())),
                Side::Sell => query
                    .filter(orders::price.ge(taker_price.clone()))
                    .order((orders::price.desc(), orders::created_at.asc(), orders::id.asc())),
            };

            Ok(query.for_update().load::<Order>(conn)?)
        })
    }

    fn settle(
        &self,
        buy_order_id: &str,
        sell_order_id: &str,
        match_amount: &BigDecimal,
        match_price: &BigDecimal,
        executed_at: i64,
    ) -> Result<Option<Fill>, EngineError> {
        run_tx(&self.pool, |conn| {
            let mut buy_order = lock_order(conn, buy_order_id)?
                .ok_or::<anyhow::Error>(EngineError::NotFound.into())?;
            let mut sell_order = lock_order(conn, sell_order_id)?
                .ok_or::<anyhow::Error>(EngineError::NotFound.into())?;

            // A cancel can race in between `counter_orders` reading this
            // order as OPEN and this transaction locking it. Skip the fill
            // rather than re-fill a terminal order; the caller re-fetches.
            if !buy_order.is_open() || !sell_order.is_open() {
                return Ok(None);
            }

            let executed_total = money::mul_trunc8(match_price, match_amount);
            let executed_commission = money::commission_on(&executed_total);
            let executed_cost = money::truncate8(&(&executed_total + &executed_commission));

            // Release the buyer's reservation for this slice (made at the
            // taker's own limit price) and charge the true execution cost:
            // reservations over-collect whenever the maker price improves
            // on the taker's limit.
            let reserved_total = money::mul_trunc8(&buy_order.price, match_amount);
            let reserved_commission = money::commission_on(&reserved_total);
            let reserved_cost = money::truncate8(&(&reserved_total + &reserved_commission));

            // Lock the buyer's and seller's asset/user rows in a fixed
            // order keyed on the lower user id, not on buy/sell role, so
            // two concurrent cross-symbol matches sharing the same pair of
            // users can never lock-order-invert on the `users` table.
            let symbol = buy_order.symbol.clone();
            let (buyer_asset, buyer_before, seller_asset, seller_before) =
                if buy_order.user_id <= sell_order.user_id {
                    let (ba, bu) = lock_buyer(conn, &buy_order.user_id, &symbol)?;
                    let (sa, su) = lock_seller(conn, &sell_order.user_id, &symbol)?;
                    (ba, bu, sa, su)
                } else {
                    let (sa, su) = lock_seller(conn, &sell_order.user_id, &symbol)?;
                    let (ba, bu) = lock_buyer(conn, &buy_order.user_id, &symbol)?;
                    (ba, bu, sa, su)
                };

            diesel::update(assets::table.find((&buy_order.user_id, &symbol)))
                .set(assets::amount.eq(money::truncate8(&(&buyer_asset.amount + match_amount))))
                .execute(conn)?;

            let mut buyer = buyer_before;
            buyer.balance = money::truncate8(&(&buyer.balance + &reserved_cost - &executed_cost));
            diesel::update(users::table.find(&buy_order.user_id))
                .set(users::balance.eq(&buyer.balance))
                .execute(conn)?;

            diesel::update(assets::table.find((&sell_order.user_id, &symbol)))
                .set((
                    assets::amount.eq(money::truncate8(&(&seller_asset.amount - match_amount))),
                    assets::locked_amount
                        .eq(money::truncate8(&(&seller_asset.locked_amount - match_amount))),
                ))
                .execute(conn)?;

            let mut seller = seller_before;
            seller.balance = money::truncate8(&(&seller.balance + &executed_total));
            diesel::update(users::table.find(&sell_order.user_id))
                .set(users::balance.eq(&seller.balance))
                .execute(conn)?;

            buy_order.filled_amount = money::truncate8(&(&buy_order.filled_amount + match_amount));
            let buy_terminal = buy_order.filled_amount >= buy_order.amount;
            if buy_terminal {
                buy_order.status = OrderStatus::Filled.as_i16();
            }
            buy_order = diesel::update(orders::table.find(buy_order_id))
                .set((
                    orders::filled_amount.eq(&buy_order.filled_amount),
                    orders::status.eq(buy_order.status),
                ))
                .get_result::<Order>(conn)?;

            sell_order.filled_amount =
                money::truncate8(&(&sell_order.filled_amount + match_amount));
            let sell_terminal = sell_order.filled_amount >= sell_order.amount;
            if sell_terminal {
                sell_order.status = OrderStatus::Filled.as_i16();
            }
            sell_order = diesel::update(orders::table.find(sell_order_id))
                .set((
                    orders::filled_amount.eq(&sell_order.filled_amount),
                    orders::status.eq(sell_order.status),
                ))
                .get_result::<Order>(conn)?;

            let new_trade = NewTrade {
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
            let trade = diesel::insert_into(trades::table)
                .values(&new_trade)
                .get_result::<Trade>(conn)?;

            Ok(Some(Fill {
                trade,
                buy_order,
                sell_order,
                buy_order_became_terminal: buy_terminal,
                sell_order_became_terminal: sell_terminal,
            }))
        })
    }

    fn list_orders(&self, user_id: &str) -> Result<Vec<Order>, EngineError> {
        run_tx(&self.pool, |conn| {
            Ok(orders::table
                .filter(orders::user_id.eq(user_id))
                .order(orders::created_at.desc())
                .load::<Order>(conn)?)
        })
    }

    fn book(&self, symbol: &str) -> Result<BookSnapshot, EngineError> {
        run_tx(&self.pool, |conn| {
            let buys = orders::table
                .filter(orders::symbol.eq(symbol))
                .filter(orders::status.eq(OrderStatus::Open.as_i16()))
                .filter(orders::side.eq(Side::Buy.as_str()))
                .order((orders::price.desc(), orders::created_at.asc(), orders::id.asc()))
                .load::<Order>(conn)?;
            let sells = orders::table
                .filter(orders::symbol.eq(symbol))
                .filter(orders::status.eq(OrderStatus::Open.as_i16()))
                .filter(orders::side.eq(Side::Sell.as_str()))
                .order((orders::price.asc(), orders::created_at.asc(), orders::id.asc()))
                .load::<Order>(conn)?;
            Ok(BookSnapshot { buys, sells })
        })
    }
}

fn lock_asset_read(
    conn: &mut PgConnection,
    user_id: &str,
    symbol: &str,
) -> Result<Option<Asset>, anyhow::Error> {
    Ok(assets::table
        .find((user_id, symbol))
        .first::<Asset>(conn)
        .optional()?)
}
