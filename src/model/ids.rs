use serde::{Deserialize, Serialize};
use std::fmt;

/// The separator between the node id and the handle label inside a handle id.
pub const HANDLE_SEPARATOR: char = ':';

/// Master macro to define the opaque, type-branded identifier strings used
/// throughout the graph model.
macro_rules! entity_id {
    ( $( $(#[$meta:meta])* $name:ident ),* $(,)? ) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(String);

            impl $name {
                pub fn new(raw: impl Into<String>) -> Self {
                    Self(raw.into())
                }

                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl From<&str> for $name {
                fn from(raw: &str) -> Self {
                    Self(raw.to_string())
                }
            }

            impl From<String> for $name {
                fn from(raw: String) -> Self {
                    Self(raw)
                }
            }
        )*
    };
}

entity_id! {
    /// Identifier of a node in a diagram.
    NodeId,
    /// Identifier of a connection between two handles.
    ArrowId,
    /// Identifier of an agent definition.
    PersonId,
    /// Identifier of a credential reference.
    ApiKeyId,
    /// Identifier of a connection point on a node.
    ///
    /// Handle ids are never free-form: they are always derived from the owning
    /// node id and the handle label via [`HandleId::compose`].
    HandleId,
}

impl HandleId {
    /// Derives the handle id for `(node_id, label)`. The inverse of [`HandleId::split`].
    pub fn compose(node_id: &NodeId, label: &str) -> Self {
        Self(format!("{}{}{}", node_id, HANDLE_SEPARATOR, label))
    }

    /// Splits a handle id back into its owning node id and handle label.
    ///
    /// Returns `None` for ids that were not produced by [`HandleId::compose`],
    /// i.e. ids missing the separator.
    pub fn split(&self) -> Option<(NodeId, &str)> {
        self.0
            .split_once(HANDLE_SEPARATOR)
            .map(|(node, label)| (NodeId::new(node), label))
    }
}
