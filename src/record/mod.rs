//! Flat records produced from tagged benchmark logs
//!
//! ## Shape
//!
//! ```text
//! log file ──parse──> metrics  (normalized name -> Value)
//! filename ──split──> metadata (field name -> string)
//!                         │
//!                         └──> FlatRecord (metadata wins on collision)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use expout_tables::record::{FlatRecord, Value};
//!
//! let record = FlatRecord::builder("bubble-8.txt")
//!     .metric("throughput", Value::Scalar(12.5))
//!     .meta("work", "bubble")
//!     .meta("threads", "8")
//!     .build();
//!
//! assert_eq!(record.metric("throughput"), Some(&Value::Scalar(12.5)));
//! assert_eq!(record.metadata("threads"), Some("8"));
//! ```

mod flat_record;
mod schema;
mod value;

pub use flat_record::{Field, FlatRecord, FlatRecordBuilder};
pub use schema::MetricSchema;
pub use value::Value;
