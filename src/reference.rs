//! Static reference documentation fed to the generation prompt

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File names looked up by [`ReferenceDocs::from_dir`]
pub mod files {
    pub const CAPABILITIES: &str = "capabilities.js";
    pub const USAGE: &str = "usage.js";
    pub const TOKENS: &str = "tokens.yaml";
    pub const PREDEFINED: &str = "predefined.md";
    pub const BASELINE: &str = "baseline.js";
}

/// The documentation strings embedded into the generation prompt.
///
/// All five are opaque text. They describe the chain the generated code
/// will run against: callable functions, worked examples, token registry,
/// names provided by the runtime, and the template whose marked region the
/// model fills in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDocs {
    /// Signatures and docstrings of the predefined trading functions
    pub capabilities: String,
    /// Example calls of those functions
    pub usage: String,
    /// Known tokens and their on-chain identifiers
    pub tokens: String,
    /// Variables available without declaration
    pub predefined: String,
    /// Template around the generated region
    pub baseline: String,
}

impl ReferenceDocs {
    /// Bundled documentation for the Kadena trader
    pub fn kadena() -> Self {
        Self {
            capabilities: include_str!("../assets/kadena/capabilities.js").to_string(),
            usage: include_str!("../assets/kadena/usage.js").to_string(),
            tokens: include_str!("../assets/kadena/tokens.yaml").to_string(),
            predefined: include_str!("../assets/kadena/predefined.md").to_string(),
            baseline: include_str!("../assets/kadena/baseline.js").to_string(),
        }
    }

    /// Load a documentation bundle from a directory holding the five
    /// files named in [`files`]
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let read = |name: &str| -> Result<String> {
            let path = dir.join(name);
            std::fs::read_to_string(&path).map_err(|e| {
                Error::Config(format!("reference doc {}: {}", path.display(), e))
            })
        };

        let docs = Self {
            capabilities: read(files::CAPABILITIES)?,
            usage: read(files::USAGE)?,
            tokens: read(files::TOKENS)?,
            predefined: read(files::PREDEFINED)?,
            baseline: read(files::BASELINE)?,
        };
        tracing::info!(dir = %dir.display(), "Loaded reference documentation");
        Ok(docs)
    }
}

impl Default for ReferenceDocs {
    fn default() -> Self {
        Self::kadena()
    }
}
