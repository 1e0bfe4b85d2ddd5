/// Category lookups and creation
pub mod category;

/// Storage port used by the sale writer, with its `SeaORM` implementation
pub mod ledger;

/// Product catalog management and seeding
pub mod product;

/// Sales summaries, aggregations and formatting
pub mod report;

/// Recording sales and querying sale history
pub mod sale;
