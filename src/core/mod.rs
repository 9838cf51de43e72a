pub mod arbitrator;
pub mod catalog;
pub mod materializer;
pub mod normalizer;
pub mod resolver;
pub mod row_parser;
pub mod workbook;

pub use arbitrator::{decide, Decision, FetchOutcome, SourceArbitrator};
pub use catalog::{CarQuery, SortOrder};
pub use resolver::I18nContext;
