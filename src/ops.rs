pub mod flat_map;
pub mod flatten;
pub mod into_future;
pub mod subscribe_on;

pub use flat_map::FlatMapSource;
pub use flatten::{FlattenOp, FlattenStats, FlattenSubscription};
pub use into_future::{CollectFuture, CollectObserver};
pub use subscribe_on::{SubscribeOnOp, SubscribeOnSubscription};
