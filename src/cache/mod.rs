pub mod backend;
pub mod facade;
pub mod invalidation;
pub mod key;
pub mod memory;
pub mod redis;

pub use backend::{CacheError, KeyValueCache};
pub use facade::{CacheValue, QueryCache};
pub use invalidation::{plan_invalidation, ChangeKind, EntityMutation};
pub use key::{CacheKey, FilterSignature};
pub use memory::MemoryCache;
pub use redis::RedisCache;
