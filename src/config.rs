//! Configuration for a node budget, read from YAML or JSON.
//!
//! ```yaml
//! label: expr-parser
//! max_live_nodes: 100000
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diagnostics::{to_error_source, SourceArc, Span};
use crate::{err_ctx, err_msg, GssError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GssConfig {
    /// Name attached to log events from budgets built with this config.
    pub label: String,
    /// Ceiling on simultaneously live nodes; `None` is unlimited.
    pub max_live_nodes: Option<usize>,
}

impl GssConfig {
    pub const DEFAULT_LABEL: &'static str = "gss";

    pub fn from_yaml_str(text: &str) -> Result<Self, GssError> {
        Self::parse_yaml("config.yaml", text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, GssError> {
        Self::parse_json("config.json", text)
    }

    /// Reads a config file; `.json` files are parsed as JSON, anything else
    /// as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GssError> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let text = std::fs::read_to_string(path)
            .map_err(|e| err_msg!(Config, "cannot read '{}': {}", name, e).with_source(e))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::parse_json(&name, &text)?
        } else {
            Self::parse_yaml(&name, &text)?
        };
        debug!(path = %name, label = %config.label, max_live_nodes = ?config.max_live_nodes, "loaded gss config");
        Ok(config)
    }

    fn parse_yaml(name: &str, text: &str) -> Result<Self, GssError> {
        let src = to_error_source(name, text);
        let config: Self = serde_yaml::from_str(text).map_err(|e| {
            let span = e
                .location()
                .map(|loc| Span::point(loc.index()))
                .unwrap_or_default();
            err_ctx!(Config, e.to_string(), &src, span).with_source(e)
        })?;
        config.validate(&src, text)
    }

    fn parse_json(name: &str, text: &str) -> Result<Self, GssError> {
        let src = to_error_source(name, text);
        let config: Self = serde_json::from_str(text).map_err(|e| {
            let span = Span::point(line_col_offset(text, e.line(), e.column()));
            err_ctx!(Config, e.to_string(), &src, span).with_source(e)
        })?;
        config.validate(&src, text)
    }

    fn validate(self, src: &SourceArc, text: &str) -> Result<Self, GssError> {
        if self.max_live_nodes == Some(0) {
            let start = text.find("max_live_nodes").unwrap_or(0);
            let span = Span::new(start, start + "max_live_nodes".len());
            return Err(err_ctx!(
                Config,
                "max_live_nodes must be at least 1",
                src,
                span,
                "omit the key for an unlimited budget"
            ));
        }
        Ok(self)
    }
}

impl Default for GssConfig {
    fn default() -> Self {
        Self {
            label: Self::DEFAULT_LABEL.to_string(),
            max_live_nodes: None,
        }
    }
}

/// Byte offset of a 1-based line and column, clamped to the text.
fn line_col_offset(text: &str, line: usize, column: usize) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(text.len().saturating_sub(1))
}
