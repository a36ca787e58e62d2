pub mod driver;
pub mod state;
pub mod sync;

pub use driver::{lock_engine, spawn_driver, EngineCommand, EngineHandle, SharedEngine};
pub use state::{EngineState, PublishReason};
pub use sync::{EngineSettings, Publication, SubscriptionToken, SyncEngine};
