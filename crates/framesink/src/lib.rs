//! Framesink: schema-driven validation and bulk persistence for columnar
//! data.
//!
//! Framesink takes a declarative approach to batch ingestion: a schema
//! declares typed, constrained fields once; each incoming frame is
//! validated column-by-column with full error accumulation, then committed
//! to a backing store through an abstract persistence adapter.
//!
//! # Core Principles
//!
//! - **Columns, not rows**: validation and coercion run over whole columns
//! - **Accumulate, never short-circuit**: one report names every failing
//!   row and column
//! - **Validate before use**: the coerced frame and `save` are gated behind
//!   a successful `is_valid`
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use framesink::{FieldDescriptor, Frame, FrameSerializer, MemoryAdapter, Schema};
//!
//! # fn main() -> framesink::Result<()> {
//! let schema = Arc::new(
//!     Schema::builder("products")
//!         .field(FieldDescriptor::char("product_id"))
//!         .field(FieldDescriptor::integer("category_id").allow_null(true))
//!         .unique_key(["product_id"])
//!         .build()?,
//! );
//!
//! let frame = Frame::from_columns([
//!     ("product_id", vec![Some("234556"), Some("456454")]),
//!     ("category_id", vec![None, Some("7")]),
//! ])?;
//!
//! let mut serializer = FrameSerializer::new(schema, frame);
//! assert!(serializer.is_valid()?);
//! serializer.save(&MemoryAdapter::new())?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod frame;
pub mod persist;
pub mod schema;
pub mod validation;

mod serializer;

pub use error::{FrameError, Result};
pub use frame::{Column, CsvOptions, Frame, Value};
pub use persist::{
    ConflictPolicy, MemoryAdapter, PersistOutcome, PersistRequest, PersistenceAdapter,
};
pub use schema::{FieldDescriptor, FieldKind, OverrideError, Schema, SchemaBuilder};
pub use serializer::{FrameSerializer, SerializerState};
pub use validation::{ErrorReport, TableValidator, UniqueTogetherValidator};
