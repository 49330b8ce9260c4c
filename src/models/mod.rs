//! Domain models shared by the fetchers and the presenters
//!
//! Wire-format structs mirroring provider responses live next to the API
//! client in `api::coingecko::models`; these are the types the rest of the
//! program works with.

pub mod chart;
pub mod quote;

// Re-export commonly used types for convenience
pub use chart::PricePoint;
pub use quote::PriceSnapshot;
