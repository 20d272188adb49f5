//! API URL templating
//!
//! The endpoint URL is configured as a Go-style text template, e.g.
//! `https://example.com/api/v1/pull_requests/{{.Id}}`. The only field bound
//! when rendering is `Id`, the pull request id.
//!
//! Supported syntax:
//! - field actions `{{.Name}}`, with optional surrounding spaces
//! - trim markers `{{- ` and ` -}}`, which drop whitespace in the adjacent text
//! - comments `{{/* ... */}}`
//!
//! Anything else inside `{{ }}` is rejected when the template is parsed, and a
//! field other than `Id` is rejected when it is rendered.

use regex::Regex;
use reqwest::Url;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

static FIELD_ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\.([A-Za-z_][A-Za-z0-9_]*)$").expect("field action pattern is a valid regex")
});

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unclosed action starting at byte {offset}")]
    Unclosed { offset: usize },

    #[error("empty action at byte {offset}")]
    EmptyAction { offset: usize },

    #[error("unsupported action \"{{{{{action}}}}}\" at byte {offset}; only fields like {{{{.Id}}}} are allowed")]
    UnsupportedAction { action: String, offset: usize },

    #[error("can't evaluate field {name}: the only field available is Id")]
    UnknownField { name: String },

    #[error("rendered URL \"{url}\" is not valid: {reason}")]
    InvalidUrl { url: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Text(String),
    Field(String),
}

/// A parsed API URL template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    source: String,
    nodes: Vec<Node>,
}

impl UrlTemplate {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut nodes = Vec::new();
        let mut rest = source;
        let mut offset = 0;
        let mut trim_next_text = false;

        while let Some(open) = rest.find("{{") {
            let mut text = &rest[..open];
            if trim_next_text {
                text = text.trim_start();
            }

            let body_start = open + 2;
            let close = rest[body_start..]
                .find("}}")
                .ok_or(TemplateError::Unclosed { offset: offset + open })?;
            let mut action = &rest[body_start..body_start + close];

            if starts_with_trim_marker(action) {
                action = &action[1..];
                text = text.trim_end();
            }
            trim_next_text = ends_with_trim_marker(action);
            if trim_next_text {
                action = &action[..action.len() - 1];
            }

            if !text.is_empty() {
                nodes.push(Node::Text(text.to_string()));
            }

            let action = action.trim();
            if action.is_empty() {
                return Err(TemplateError::EmptyAction { offset: offset + open });
            }
            if action.starts_with("/*") && action.ends_with("*/") {
                // comment
            } else if let Some(caps) = FIELD_ACTION.captures(action) {
                nodes.push(Node::Field(caps[1].to_string()));
            } else {
                return Err(TemplateError::UnsupportedAction {
                    action: action.to_string(),
                    offset: offset + open,
                });
            }

            let consumed = body_start + close + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }

        let tail = if trim_next_text { rest.trim_start() } else { rest };
        if !tail.is_empty() {
            nodes.push(Node::Text(tail.to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            nodes,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render the template with `Id` bound to `pr_id`.
    pub fn render(&self, pr_id: &str) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.source.len() + pr_id.len());
        for node in &self.nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Field(name) if name == "Id" => out.push_str(pr_id),
                Node::Field(name) => {
                    return Err(TemplateError::UnknownField { name: name.clone() });
                }
            }
        }
        Ok(out)
    }

    /// Render and parse the result as an absolute URL.
    pub fn resolve(&self, pr_id: &str) -> Result<Url, TemplateError> {
        let rendered = self.render(pr_id)?;
        Url::parse(&rendered).map_err(|e| TemplateError::InvalidUrl {
            url: rendered.clone(),
            reason: e.to_string(),
        })
    }
}

impl FromStr for UrlTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn starts_with_trim_marker(action: &str) -> bool {
    let mut chars = action.chars();
    chars.next() == Some('-') && chars.next().is_some_and(|c| c.is_ascii_whitespace())
}

fn ends_with_trim_marker(action: &str) -> bool {
    let mut chars = action.chars().rev();
    chars.next() == Some('-') && chars.next().is_some_and(|c| c.is_ascii_whitespace())
}
