//! The converter contract and the three dialect implementations.
//!
//! Every converter exposes the same two total-per-contract operations:
//! `serialize` turns a [`Diagram`] into text, `deserialize` validates text
//! and reconstructs a diagram. Converters are stateless values; all label
//! resolution state lives in a per-call [`LabelContext`].

use crate::error::{ConvertError, ExportError, ImportError};
use crate::model::Diagram;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

pub mod context;
pub mod docs;
mod native;
mod readable;
mod reduced;

pub use context::LabelContext;
pub use native::NativeJsonConverter;
pub use readable::ReadableYamlConverter;
pub use reduced::ReducedYamlConverter;

/// The contract every format converter implements.
///
/// `deserialize(serialize(d))` is structurally equivalent to `d`: same node
/// count, types, positions and data, same arrow topology by handle label
/// pairs, same person and credential fields. Identifiers, declaration order
/// and metadata timestamps are not preserved by the label-keyed dialects.
pub trait DiagramConverter {
    fn format(&self) -> DiagramFormat;

    fn serialize(&self, diagram: &Diagram) -> Result<String, ExportError>;

    fn deserialize(&self, text: &str) -> Result<Diagram, ImportError>;
}

/// The three supported text dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramFormat {
    /// Compact label-keyed YAML with a flat connection list.
    Reduced,
    /// Label-keyed YAML with connections embedded in each node.
    Readable,
    /// Identifier-preserving JSON for machine-to-machine transfer.
    Native,
}

impl DiagramFormat {
    /// The `version` tag carried by documents of this dialect.
    pub fn version_tag(self) -> &'static str {
        match self {
            DiagramFormat::Reduced => "reduced",
            DiagramFormat::Readable => "readable",
            DiagramFormat::Native => "native",
        }
    }

    pub fn converter(self) -> &'static dyn DiagramConverter {
        match self {
            DiagramFormat::Reduced => &ReducedYamlConverter,
            DiagramFormat::Readable => &ReadableYamlConverter,
            DiagramFormat::Native => &NativeJsonConverter,
        }
    }

    /// Detects the dialect of a document by probing its required `version`
    /// tag, without performing a full parse.
    pub fn detect(text: &str) -> Option<Self> {
        #[derive(Deserialize)]
        struct Probe {
            #[serde(default)]
            version: Option<String>,
        }

        let version = serde_json::from_str::<Probe>(text)
            .ok()
            .or_else(|| serde_yaml::from_str::<Probe>(text).ok())
            .and_then(|probe| probe.version)?;
        let format = version.parse().ok();
        debug!(version = %version, detected = format.is_some(), "probed document version tag");
        format
    }
}

impl FromStr for DiagramFormat {
    type Err = ();

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "reduced" => Ok(DiagramFormat::Reduced),
            "readable" => Ok(DiagramFormat::Readable),
            "native" => Ok(DiagramFormat::Native),
            _ => Err(()),
        }
    }
}

impl fmt::Display for DiagramFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.version_tag())
    }
}

/// Parses a YAML document into a typed doc, going through [`serde_yaml::Value`]
/// so that duplicate map keys (e.g. two nodes under the same label) are
/// rejected instead of silently resolved last-wins.
pub(crate) fn parse_yaml<T: DeserializeOwned>(text: &str) -> Result<T, ImportError> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|err| ImportError::Syntax(err.to_string()))?;
    serde_yaml::from_value(value).map_err(|err| ImportError::Syntax(err.to_string()))
}

/// Checks a parsed document's version tag against the dialect being imported.
pub(crate) fn check_version(
    found: Option<&str>,
    expected: DiagramFormat,
) -> Result<(), ImportError> {
    match found {
        None => Err(ImportError::MissingVersion),
        Some(tag) if tag == expected.version_tag() => Ok(()),
        Some(tag) => Err(ImportError::UnsupportedVersion {
            found: tag.to_string(),
            expected: expected.version_tag(),
        }),
    }
}

/// Re-serializes a document from one dialect into another.
pub fn convert(text: &str, from: DiagramFormat, to: DiagramFormat) -> Result<String, ConvertError> {
    let diagram = from.converter().deserialize(text)?;
    Ok(to.converter().serialize(&diagram)?)
}
