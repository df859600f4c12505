//! Row queries: request parameters, filter handling and SQL construction

pub mod builder;
pub mod engine;
pub mod filter;
pub mod params;

pub use builder::SelectBuilder;
pub use engine::TableQueryEngine;
pub use filter::{AdvancedFilter, FilterOperator};
pub use params::{AppliedParams, QueryParams, SortDirection};
