use common::money;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use store::{Order, Trade};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize)]
pub struct TradeEventBody {
    pub id: String,
    pub buy_order_id: String,
    pub sell_order_id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub symbol: String,
    pub price: String,
    pub amount: String,
    pub total: String,
    pub executed_at: i64,
}

impl From<&Trade> for TradeEventBody {
    fn from(trade: &Trade) -> Self {
        Self {
            id: trade.id.clone(),
            buy_order_id: trade.buy_order_id.clone(),
            sell_order_id: trade.sell_order_id.clone(),
            buyer_id: trade.buyer_id.clone(),
            seller_id: trade.seller_id.clone(),
            symbol: trade.symbol.clone(),
            price: money::format8(&trade.price),
            amount: money::format8(&trade.amount),
            total: money::format8(&trade.total()),
            executed_at: trade.executed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderEventBody {
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
    pub updated_at: i64,
}

impl OrderEventBody {
    pub fn new(order: &Order, updated_at: i64) -> Self {
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
            updated_at,
        }
    }
}

/// The two event shapes the core emits. `OrderStatusUpdated` fires
/// on both `FILLED` and `CANCELLED` transitions (§9 decision 2).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum EngineEvent {
    #[serde(rename = "order.matched")]
    OrderMatched { trade: TradeEventBody },
    #[serde(rename = "order.status.updated")]
    OrderStatusUpdated { order: OrderEventBody },
}

impl EngineEvent {
    pub fn order_matched(trade: &Trade) -> Self {
        EngineEvent::OrderMatched {
            trade: trade.into(),
        }
    }

    pub fn order_status_updated(order: &Order, updated_at: i64) -> Self {
        EngineEvent::OrderStatusUpdated {
            order: OrderEventBody::new(order, updated_at),
        }
    }
}

/// Fans events out to one broadcast channel per user (`user.<id>` in the
/// wire naming), staged during a transaction and published only once the
/// underlying store commit returns. Losing a
/// subscriber with no readers is not an error -- nobody is listening yet.
#[derive(Default)]
pub struct EventBus {
    channels: Mutex<HashMap<String, broadcast::Sender<EngineEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, user_id: &str) -> broadcast::Receiver<EngineEvent> {
        let mut channels = self.channels.lock().unwrap();
        channels
            .entry(user_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    pub fn publish(&self, user_id: &str, event: EngineEvent) {
        let channels = self.channels.lock().unwrap();
        if let Some(sender) = channels.get(user_id) {
            let _ = sender.send(event);
        }
    }
}
