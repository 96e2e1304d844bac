pub mod db;
pub mod mock;
pub mod models;
pub mod pg;
pub mod schema;
pub mod traits;

pub use db::{establish_connection_pool, run_migrations, DbConnection, DbPool};
pub use mock::MockStore;
pub use models::{Asset, BookSnapshot, Fill, MatchReport, NewAsset, NewOrder, NewTrade, NewUser, Order, OrderStatus, Side, Trade, User};
pub use pg::PgStore;
pub use traits::Store;
