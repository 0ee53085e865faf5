pub mod http;
pub mod traits;
pub mod types;

pub use http::HttpApi;
pub use traits::MarketplaceApi;
pub use types::{Registration, ReservationRequest, ReviewSubmission, SearchFilters};
