mod admin_service;
mod glp_service;
mod market_service;
mod order_book_service;
mod price_feed_service;
mod vault_service;
mod wallet_service;

pub use admin_service::AdminService;
pub use glp_service::GlpService;
pub use market_service::MarketService;
pub use order_book_service::OrderBookService;
pub use price_feed_service::PriceFeedService;
pub use vault_service::VaultService;
pub use wallet_service::WalletService;
