pub mod feeds;
pub mod settings;

pub use feeds::{load_catalog_default, load_catalog_from, FeedCatalog, FeedSource};
pub use settings::{AggregatorSettings, EntryFilter};
