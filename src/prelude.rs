//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types of the diaflow crate: the canonical
//! graph model, the format converters, and their error types.
//!
//! # Example
//!
//! ```rust,no_run
//! use diaflow::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let text = std::fs::read_to_string("workflow.yaml")?;
//! let format = DiagramFormat::detect(&text).unwrap_or(DiagramFormat::Reduced);
//! let diagram = format.converter().deserialize(&text)?;
//! println!("{} nodes, {} arrows", diagram.nodes.len(), diagram.arrows.len());
//! # Ok(())
//! # }
//! ```

// The canonical graph model
pub use crate::model::{
    ApiKey, Arrow, ContentType, DataType, Diagram, DiagramMetadata, Handle, HandleDirection,
    HandlePosition, LlmService, Node, NodeType, Person, Vec2,
};
pub use crate::model::{ApiKeyId, ArrowId, HandleId, NodeId, PersonId};

// Format converters
pub use crate::convert::{
    DiagramConverter, DiagramFormat, NativeJsonConverter, ReadableYamlConverter,
    ReducedYamlConverter, convert,
};

// Error types
pub use crate::error::{ConvertError, ExportError, ImportError, IntegrityError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
