use common::money;
use serde::Serialize;
use store::{Asset, BookSnapshot, Order, User};

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub balance: String,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            balance: money::format8(&user.balance),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AssetDto {
    pub symbol: String,
    pub amount: String,
    pub locked_amount: String,
    pub available_amount: String,
}

impl From<&Asset> for AssetDto {
    fn from(asset: &Asset) -> Self {
        Self {
            symbol: asset.symbol.clone(),
            amount: money::format8(&asset.amount),
            locked_amount: money::format8(&asset.locked_amount),
            available_amount: money::format8(&asset.available_amount()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderDto {
    pub id: String,
    pub user_id: String,
    pub symbol: String,
    pub side: String,
    pub price: String,
    pub amount: String,
    pub filled_amount: String,
    pub remaining_amount: String,
    pub status: i16,
    pub status_text: &'static str,
    pub created_at: i64,
}

impl From<&Order> for OrderDto {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.clone(),
            user_id: order.user_id.clone(),
            symbol: order.symbol.clone(),
            side: order.side.clone(),
            price: money::format8(&order.price),
            amount: money::format8(&order.amount),
            filled_amount: money::format8(&order.filled_amount),
            remaining_amount: money::format8(&order.remaining_amount()),
            status: order.status,
            status_text: order.get_status().status_text(),
            created_at: order.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookDto {
    pub symbol: String,
    pub buy_orders: Vec<OrderDto>,
    pub sell_orders: Vec<OrderDto>,
}

impl BookDto {
    pub fn new(symbol: &str, snapshot: &BookSnapshot) -> Self {
        Self {
            symbol: symbol.to_string(),
            buy_orders: snapshot.buys.iter().map(OrderDto::from).collect(),
            sell_orders: snapshot.sells.iter().map(OrderDto::from).collect(),
        }
    }
}
