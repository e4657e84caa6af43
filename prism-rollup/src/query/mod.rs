//! Query-side types: the aggregation tree and its Elasticsearch DSL adapter

pub mod node;
pub mod translator;
pub mod types;

pub use node::{AggregationKind, AggregationNode, PreOrder};
pub use translator::AggregationTranslator;
