//! # Diaflow - Workflow Diagram Model and Format Engine
//!
//! **Diaflow** is the graph model and text serialization engine behind a
//! visual editor for LLM-agent workflows. A workflow is a diagram of typed
//! nodes joined by directed arrows between named handles, plus the agent
//! ("person") and credential declarations the nodes refer to.
//!
//! ## Core Workflow
//!
//! The engine is format-agnostic at its center: every text dialect converts
//! to and from the same canonical [`model::Diagram`]. The primary workflow is:
//!
//! 1.  **Parse**: Pick a [`convert::DiagramFormat`] (or let
//!     [`convert::DiagramFormat::detect`] probe the document's `version` tag)
//!     and call `deserialize` on its converter to obtain a validated
//!     [`model::Diagram`].
//! 2.  **Inspect or edit**: The diagram is plain data; walk its nodes, arrows
//!     and handles, or run [`model::Diagram::check_integrity`] after edits.
//! 3.  **Serialize**: Call `serialize` on any converter to write the diagram
//!     back out, in the same dialect or a different one. The one-call
//!     [`convert::convert`] helper chains both steps.
//!
//! Two of the dialects are label-keyed YAML meant for humans: the *reduced*
//! form keeps a flat connection list, the *readable* form embeds each node's
//! outgoing connections inline. The third, *native* JSON, preserves raw
//! identifiers for machine-to-machine transfer.
//!
//! ## Quick Start
//!
//! ```rust
//! use diaflow::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let source = r#"
//! version: reduced
//! nodes:
//!   Start:
//!     type: start
//!     position: {x: 0, y: 0}
//!   Done:
//!     type: endpoint
//!     position: {x: 300, y: 0}
//! connections:
//!   - from: Start:output
//!     to: Done:input
//! "#;
//!
//!     // Parse the compact YAML dialect into the canonical model.
//!     let diagram = DiagramFormat::Reduced.converter().deserialize(source)?;
//!     assert_eq!(diagram.nodes.len(), 2);
//!     assert_eq!(diagram.arrows.len(), 1);
//!
//!     // Re-emit it as identifier-preserving JSON.
//!     let json = DiagramFormat::Native.converter().serialize(&diagram)?;
//!     println!("{json}");
//!     Ok(())
//! }
//! ```

pub mod convert;
pub mod error;
pub mod handles;
pub mod model;
pub mod prelude;
pub mod registry;
