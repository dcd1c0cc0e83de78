//! # Crosswalk: Metadata Normalization Engine
//!
//! Crosswalk turns heterogeneous archival source records into one canonical
//! JSON-LD envelope and then cleans that envelope up in small, composable
//! enrichment passes.
//!
//! ## Features
//!
//! - **Path access**: read, write and delete deep fields by path (`selector`)
//! - **Group extraction**: undo the singleton collapse of XML-derived records (`group`)
//! - **Date normalization**: fuzzy single dates and ranges to ISO-8601 (`temporal`)
//! - **Transform registries**: per-schema field → fragment rules
//!   (`transform_registry`, `convert`)
//! - **Enrichment filters**: rights propagation, media-type and type cleanup,
//!   subject cleanup, date relocation, shredding, preview location (`enrich`)
//! - **Services**: every conversion and filter under a stable name, for the
//!   `crosswalk` CLI and the `crosswalk-api` HTTP host (`service`)
//!
//! ## Example: OAI record
//!
//! ```
//! use crosswalk::convert::{convert_record, ConvertOptions, Schema};
//! use serde_json::json;
//!
//! let record = json!({"id": "kdl--1", "title": "Main Street", "date": ["1928", "1406"]});
//! let envelope = convert_record(Schema::Oai, &record, &ConvertOptions::default());
//!
//! assert_eq!(envelope["@id"], json!("http://dp.la/api/items/kdl--1"));
//! assert_eq!(
//!     envelope["aggregatedCHO"]["temporal"],
//!     json!([{"start": "1928", "end": "1928"}, {"start": "1406", "end": "1406"}])
//! );
//! ```

// Core modules
pub mod selector;
pub mod group;
pub mod temporal;
pub mod transform_registry;

// Source schema conversion
pub mod convert;

// Post-conversion filters
pub mod enrich;

// Hosting
pub mod config;
pub mod serialization;
pub mod service;

// Re-export key types
pub use config::{ConfigError, CrosswalkConfig};
pub use convert::{convert_record, ConvertOptions, Schema};
pub use enrich::Enrichment;
pub use group::extract_group;
pub use selector::{FieldPath, SelectorError};
pub use service::{Dispatcher, Service, ServiceError, ServiceRequest};
pub use temporal::{DateRange, DateValue, TemporalNormalizer};
pub use transform_registry::{Fragment, TransformContext, TransformError, TransformRegistry};
