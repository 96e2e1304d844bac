use bigdecimal::BigDecimal;
use std::str::FromStr;
use std::sync::Arc;
use store::{Asset, MockStore, Order, OrderStatus, User};

use engine::OrderService;

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

fn seed_user(store: &MockStore, id: &str, balance: &str) {
    store.seed_user(User {
        id: id.to_string(),
        name: id.to_string(),
        email: format!("{id}@example.com"),
        balance: dec(balance),
    });
}

fn seed_asset(store: &MockStore, user_id: &str, symbol: &str, amount: &str) {
    store.seed_asset(Asset {
        user_id: user_id.to_string(),
        symbol: symbol.to_string(),
        amount: dec(amount),
        locked_amount: dec("0"),
    });
}

fn order(service: &OrderService<MockStore>, user: &str, symbol: &str, side: &str, price: &str, amount: &str) -> Order {
    service
        .submit_order(user, symbol, side, price, amount)
        .unwrap_or_else(|e| panic!("submit failed for {user}: {e}"))
}

#[test]
fn full_match_at_equal_price() {
    let store = Arc::new(MockStore::new());
    seed_user(&store, "seller", "0");
    seed_asset(&store, "seller", "BTC", "2");
    seed_user(&store, "buyer", "100000");

    let service = OrderService::new(store.clone());

    order(&service, "seller", "BTC", "sell", "50000", "1");
    let buy = order(&service, "buyer", "BTC", "buy", "50000", "1");

    assert_eq!(buy.status, OrderStatus::Filled.as_i16());

    let buyer = store.get_user("buyer").unwrap().unwrap();
    assert_eq!(buyer.balance, dec("49250"));
    let seller = store.get_user("seller").unwrap().unwrap();
    assert_eq!(seller.balance, dec("50000"));

    let buyer_btc = store.get_asset("buyer", "BTC").unwrap().unwrap();
    assert_eq!(buyer_btc.amount, dec("1"));
    let seller_btc = store.get_asset("seller", "BTC").unwrap().unwrap();
    assert_eq!(seller_btc.amount, dec("1"));
    assert_eq!(seller_btc.locked_amount, dec("0"));
}

#[test]
fn price_improvement_passes_through_to_the_buyer() {
    let store = Arc::new(MockStore::new());
    seed_user(&store, "seller", "0");
    seed_asset(&store, "seller", "BTC", "2");
    seed_user(&store, "buyer", "100000");

    let service = OrderService::new(store.clone());

    order(&service, "seller", "BTC", "sell", "48000", "1");
    order(&service, "buyer", "BTC", "buy", "50000", "1");

    let buyer = store.get_user("buyer").unwrap().unwrap();
    // Reservation at submit debits 50000*1.015 = 50750; settlement refunds
    // that reservation and charges the true 48000*1.015 = 48720 execution
    // cost, netting 100000 - 48720 = 51280. Price improvement passes
    // through to the buyer rather than being pocketed as extra fee.
    assert_eq!(buyer.balance, dec("51280"));
}

#[test]
fn partial_fill_taker_larger_than_maker() {
    let store = Arc::new(MockStore::new());
    seed_user(&store, "seller", "0");
    seed_asset(&store, "seller", "BTC", "1");
    seed_user(&store, "buyer", "100000");

    let service = OrderService::new(store.clone());

    let sell = order(&service, "seller", "BTC", "sell", "50000", "0.5");
    let buy = order(&service, "buyer", "BTC", "buy", "50000", "1");

    let sell_after = store.list_orders("seller").unwrap().into_iter().find(|o| o.id == sell.id).unwrap();
    assert_eq!(sell_after.status, OrderStatus::Filled.as_i16());

    assert_eq!(buy.filled_amount, dec("0.5"));
    assert_eq!(buy.remaining_amount(), dec("0.5"));
    assert_eq!(buy.status, OrderStatus::Open.as_i16());
}

#[test]
fn walk_the_book_in_time_priority_at_equal_price() {
    let store = Arc::new(MockStore::new());
    seed_user(&store, "s1", "0");
    seed_asset(&store, "s1", "BTC", "1");
    seed_user(&store, "s2", "0");
    seed_asset(&store, "s2", "BTC", "1");
    seed_user(&store, "buyer", "1000000");

    let service = OrderService::new(store.clone());

    order(&service, "s1", "BTC", "sell", "50000", "0.4");
    order(&service, "s2", "BTC", "sell", "50000", "0.6");
    let buy = order(&service, "buyer", "BTC", "buy", "50000", "1");

    assert_eq!(buy.status, OrderStatus::Filled.as_i16());

    let trades_by_seller = |seller: &str| {
        store
            .list_orders(seller)
            .unwrap()
            .into_iter()
            .next()
            .unwrap()
    };
    assert_eq!(trades_by_seller("s1").status, OrderStatus::Filled.as_i16());
    assert_eq!(trades_by_seller("s2").status, OrderStatus::Filled.as_i16());
}

#[test]
fn no_cross_leaves_both_orders_open() {
    let store = Arc::new(MockStore::new());
    seed_user(&store, "buyer", "100000");
    seed_user(&store, "seller", "0");
    seed_asset(&store, "seller", "BTC", "1");

    let service = OrderService::new(store.clone());

    let buy = order(&service, "buyer", "BTC", "buy", "48000", "1");
    let sell = order(&service, "seller", "BTC", "sell", "50000", "1");

    assert_eq!(buy.status, OrderStatus::Open.as_i16());
    assert_eq!(sell.status, OrderStatus::Open.as_i16());
}

#[test]
fn cheapest_seller_wins_over_time_priority() {
    let store = Arc::new(MockStore::new());
    seed_user(&store, "early_seller", "0");
    seed_asset(&store, "early_seller", "BTC", "1");
    seed_user(&store, "cheap_seller", "0");
    seed_asset(&store, "cheap_seller", "BTC", "1");
    seed_user(&store, "buyer", "1000000");

    let service = OrderService::new(store.clone());

    order(&service, "early_seller", "BTC", "sell", "51000", "1");
    order(&service, "cheap_seller", "BTC", "sell", "49000", "1");
    order(&service, "buyer", "BTC", "buy", "52000", "1");

    let early = store.list_orders("early_seller").unwrap().into_iter().next().unwrap();
    let cheap = store.list_orders("cheap_seller").unwrap().into_iter().next().unwrap();

    assert_eq!(early.status, OrderStatus::Open.as_i16());
    assert_eq!(cheap.status, OrderStatus::Filled.as_i16());
}

#[test]
fn reservation_and_refund_round_trip_on_cancel() {
    let store = Arc::new(MockStore::new());
    seed_user(&store, "buyer", "100000");
    let service = OrderService::new(store.clone());

    let buy = order(&service, "buyer", "BTC", "buy", "50000", "1");
    service.cancel_order("buyer", &buy.id).unwrap();

    let buyer = store.get_user("buyer").unwrap().unwrap();
    assert_eq!(buyer.balance, dec("100000"));
}

#[test]
fn sell_reservation_and_refund_round_trip_on_cancel() {
    let store = Arc::new(MockStore::new());
    seed_user(&store, "seller", "0");
    seed_asset(&store, "seller", "BTC", "2");
    let service = OrderService::new(store.clone());

    let sell = order(&service, "seller", "BTC", "sell", "50000", "1");
    service.cancel_order("seller", &sell.id).unwrap();

    let asset = store.get_asset("seller", "BTC").unwrap().unwrap();
    assert_eq!(asset.amount, dec("2"));
    assert_eq!(asset.locked_amount, dec("0"));
}

#[test]
fn cancelling_twice_is_not_idempotent() {
    let store = Arc::new(MockStore::new());
    seed_user(&store, "buyer", "100000");
    let service = OrderService::new(store.clone());

    let buy = order(&service, "buyer", "BTC", "buy", "50000", "1");
    service.cancel_order("buyer", &buy.id).unwrap();
    let second = service.cancel_order("buyer", &buy.id);
    assert!(second.is_err());
}

#[test]
fn a_user_never_trades_against_their_own_order() {
    let store = Arc::new(MockStore::new());
    seed_user(&store, "trader", "100000");
    seed_asset(&store, "trader", "BTC", "1");
    let service = OrderService::new(store.clone());

    let sell = order(&service, "trader", "BTC", "sell", "50000", "1");
    let buy = order(&service, "trader", "BTC", "buy", "50000", "1");

    assert_eq!(sell.status, OrderStatus::Open.as_i16());
    assert_eq!(buy.status, OrderStatus::Open.as_i16());
}
