// @generated manually, mirroring diesel CLI output for the tables below.

diesel::table! {
    users (id) {
        #[max_length = 36]
        id -> Varchar,
        #[max_length = 120]
        name -> Varchar,
        #[max_length = 255]
        email -> Varchar,
        balance -> Numeric,
    }
}

diesel::table! {
    assets (user_id, symbol) {
        #[max_length = 36]
        user_id -> Varchar,
        #[max_length = 10]
        symbol -> Varchar,
        amount -> Numeric,
        locked_amount -> Numeric,
    }
}

diesel::table! {
    orders (id) {
        #[max_length = 36]
        id -> Varchar,
        #[max_length = 36]
        user_id -> Varchar,
        #[max_length = 10]
        symbol -> Varchar,
        #[max_length = 4]
        side -> Varchar,
        price -> Numeric,
        amount -> Numeric,
        filled_amount -> Numeric,
        status -> SmallInt,
        created_at -> Int8,
    }
}

diesel::table! {
    trades (id) {
        #[max_length = 36]
        id -> Varchar,
        #[max_length = 36]
        buy_order_id -> Varchar,
        #[max_length = 36]
        sell_order_id -> Varchar,
        #[max_length = 36]
        buyer_id -> Varchar,
        #[max_length = 36]
        seller_id -> Varchar,
        #[max_length = 10]
        symbol -> Varchar,
        price -> Numeric,
        amount -> Numeric,
        executed_at -> Int8,
    }
}

diesel::allow_tables_to_appear_in_same_query!(users, assets, orders, trades,);
