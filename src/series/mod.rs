pub mod generator;
pub mod store;
pub mod trend;

pub use generator::{ExtendReason, GeneratorPolicy, PriceGenerator};
pub use store::SeriesStore;
