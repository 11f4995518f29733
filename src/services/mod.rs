pub mod accounts;
pub mod auth;
pub mod catalog;
pub mod collection;
pub mod recommendations;

pub use accounts::AccountService;
pub use auth::AuthGateway;
pub use catalog::CatalogClient;
pub use collection::CollectionManager;
pub use recommendations::RecommendationAggregator;
