pub mod csv_source;
pub mod ml;
pub mod mock;
pub mod observability;
pub mod persistence;

pub use csv_source::CsvDataSource;
pub use mock::SyntheticDataSource;
pub use persistence::{InMemoryModelStore, JsonModelStore};
