use crate::schema::*;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other => Err(format!("unknown side '{other}'")),
        }
    }

    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Persisted as `SMALLINT`: `1=OPEN, 2=FILLED, 3=CANCELLED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Open,
    Filled,
    Cancelled,
}

impl OrderStatus {
    pub fn as_i16(&self) -> i16 {
        match self {
            OrderStatus::Open => 1,
            OrderStatus::Filled => 2,
            OrderStatus::Cancelled => 3,
        }
    }

    pub fn from_i16(v: i16) -> Result<Self, String> {
        match v {
            1 => Ok(OrderStatus::Open),
            2 => Ok(OrderStatus::Filled),
            3 => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status code {other}")),
        }
    }

    pub fn status_text(&self) -> &'static str {
        match self {
            OrderStatus::Open => "open",
            OrderStatus::Filled => "filled",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = users)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub balance: BigDecimal,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub balance: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = assets)]
#[diesel(primary_key(user_id, symbol))]
pub struct Asset {
    pub user_id: String,
    pub symbol: String,
    pub amount: BigDecimal,
    pub locked_amount: BigDecimal,
}

impl Asset {
    pub fn available_amount(&self) -> BigDecimal {
        &self.amount - &self.locked_amount
    }
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = assets)]
pub struct NewAsset {
    pub user_id: String,
    pub symbol: String,
    pub amount: BigDecimal,
    pub locked_amount: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = orders)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub symbol: String,
    pub side: String,
    pub price: BigDecimal,
    pub amount: BigDecimal,
    pub filled_amount: BigDecimal,
    pub status: i16,
    pub created_at: i64,
}

impl Order {
    pub fn remaining_amount(&self) -> BigDecimal {
        &self.amount - &self.filled_amount
    }

    pub fn get_side(&self) -> Side {
        Side::from_str(&self.side).expect("persisted side is always valid")
    }

    pub fn get_status(&self) -> OrderStatus {
        OrderStatus::from_i16(self.status).expect("persisted status is always valid")
    }

    pub fn is_open(&self) -> bool {
        matches!(self.get_status(), OrderStatus::Open)
    }
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = orders)]
pub struct NewOrder {
    pub id: String,
    pub user_id: String,
    pub symbol: String,
    pub side: String,
    pub price: BigDecimal,
    pub amount: BigDecimal,
    pub filled_amount: BigDecimal,
    pub status: i16,
    pub created_at: i64,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = trades)]
pub struct Trade {
    pub id: String,
    pub buy_order_id: String,
    pub sell_order_id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub symbol: String,
    pub price: BigDecimal,
    pub amount: BigDecimal,
    pub executed_at: i64,
}

impl Trade {
    pub fn total(&self) -> BigDecimal {
        common::money::mul_trunc8(&self.price, &self.amount)
    }
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = trades)]
pub struct NewTrade {
    pub id: String,
    pub buy_order_id: String,
    pub sell_order_id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub symbol: String,
    pub price: BigDecimal,
    pub amount: BigDecimal,
    pub executed_at: i64,
}

/// Outcome of a single settlement step inside a match, and of the overall
/// match call (zero or more fills against the book).
#[derive(Debug, Clone)]
pub struct Fill {
    pub trade: Trade,
    pub buy_order: Order,
    pub sell_order: Order,
    /// Whether this fill transitioned the buy/sell order into a terminal
    /// state (drives `OrderStatusUpdated` emission).
    pub buy_order_became_terminal: bool,
    pub sell_order_became_terminal: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MatchReport {
    pub taker_order: Option<Order>,
    pub fills: Vec<Fill>,
}

#[derive(Debug, Clone, Default)]
pub struct BookSnapshot {
    pub buys: Vec<Order>,
    pub sells: Vec<Order>,
}
