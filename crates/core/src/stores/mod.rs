pub mod elasticsearch;

pub use elasticsearch::{ElasticsearchStore, StoreConfig};
