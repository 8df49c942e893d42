//! Domain Layer
//!
//! Records, resource schemas and the error taxonomy.
//! This layer has NO network dependencies.

mod entity;
mod error;
mod record;
mod schema;

pub use entity::Entity;
pub use error::{ClientError, ClientResult};
pub use record::{FieldMap, FieldValue, Record, RecordId};
pub use schema::{FieldKind, FieldSpec, FilterSpec, ResourceSchema, TabSpec, ALL_SENTINELS};
