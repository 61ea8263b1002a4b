//! Node-level types of the information model.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

static NODE_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(?:ns=(\d+);)?([isgb])=(.+)$").expect("node id pattern compiles")
});

/// A node id string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid node id '{0}'")]
pub struct NodeIdError(pub String);

/// How the identifier part of a [`NodeId`] is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentifierKind {
    Numeric,
    String,
    Guid,
    Opaque,
}

impl IdentifierKind {
    /// The lowercase tag used in the canonical form.
    pub fn tag(&self) -> &'static str {
        match self {
            IdentifierKind::Numeric => "i",
            IdentifierKind::String => "s",
            IdentifierKind::Guid => "g",
            IdentifierKind::Opaque => "b",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "i" => Some(IdentifierKind::Numeric),
            "s" => Some(IdentifierKind::String),
            "g" => Some(IdentifierKind::Guid),
            "b" => Some(IdentifierKind::Opaque),
            _ => None,
        }
    }
}

/// Composite node identifier.
///
/// The canonical string `ns=<index>;<kind>=<identifier>` is the lookup key
/// everywhere (graph index, reference targets, cache keys). The namespace
/// index is always spelled out, so `i=85` and `ns=0;i=85` are the same node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId {
    pub namespace_index: u16,
    pub kind: IdentifierKind,
    pub identifier: String,
}

impl NodeId {
    pub fn new(namespace_index: u16, kind: IdentifierKind, identifier: impl Into<String>) -> Self {
        Self {
            namespace_index,
            kind,
            identifier: identifier.into(),
        }
    }

    /// Numeric identifier shorthand.
    pub fn numeric(namespace_index: u16, value: u32) -> Self {
        Self::new(namespace_index, IdentifierKind::Numeric, value.to_string())
    }

    /// The canonical string form.
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ns={};{}={}",
            self.namespace_index,
            self.kind.tag(),
            self.identifier
        )
    }
}

impl FromStr for NodeId {
    type Err = NodeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let caps = NODE_ID_PATTERN
            .captures(trimmed)
            .ok_or_else(|| NodeIdError(s.to_string()))?;

        let namespace_index = match caps.get(1) {
            Some(ns) => ns
                .as_str()
                .parse::<u16>()
                .map_err(|_| NodeIdError(s.to_string()))?,
            None => 0,
        };
        let kind = IdentifierKind::from_tag(&caps[2]).ok_or_else(|| NodeIdError(s.to_string()))?;
        let identifier = match kind {
            IdentifierKind::Numeric => caps[3]
                .parse::<u32>()
                .map_err(|_| NodeIdError(s.to_string()))?
                .to_string(),
            _ => caps[3].to_string(),
        };

        Ok(Self {
            namespace_index,
            kind,
            identifier,
        })
    }
}

impl TryFrom<String> for NodeId {
    type Error = NodeIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.to_string()
    }
}

/// A typed, directed edge to another node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Reference type name, e.g. `HasComponent`.
    pub reference_type: String,
    /// Direction as declared in the source document.
    pub is_forward: bool,
    /// Node on the other end.
    pub target: NodeId,
}

impl Reference {
    pub fn forward(reference_type: impl Into<String>, target: NodeId) -> Self {
        Self {
            reference_type: reference_type.into(),
            is_forward: true,
            target,
        }
    }

    pub fn inverse(reference_type: impl Into<String>, target: NodeId) -> Self {
        Self {
            reference_type: reference_type.into(),
            is_forward: false,
            target,
        }
    }
}

/// Text with an optional locale tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    pub text: String,
}

impl LocalizedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            locale: None,
            text: text.into(),
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }
}

/// The class of a node, taken from the section it was declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeClass {
    Object,
    Variable,
    Method,
    ObjectType,
    VariableType,
    ReferenceType,
    DataType,
    View,
}

impl NodeClass {
    /// Map a document section tag to its node class.
    pub fn from_section(tag: &str) -> Option<Self> {
        match tag {
            "UAObject" => Some(NodeClass::Object),
            "UAVariable" => Some(NodeClass::Variable),
            "UAMethod" => Some(NodeClass::Method),
            "UAObjectType" => Some(NodeClass::ObjectType),
            "UAVariableType" => Some(NodeClass::VariableType),
            "UAReferenceType" => Some(NodeClass::ReferenceType),
            "UADataType" => Some(NodeClass::DataType),
            "UAView" => Some(NodeClass::View),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeClass::Object => "Object",
            NodeClass::Variable => "Variable",
            NodeClass::Method => "Method",
            NodeClass::ObjectType => "ObjectType",
            NodeClass::VariableType => "VariableType",
            NodeClass::ReferenceType => "ReferenceType",
            NodeClass::DataType => "DataType",
            NodeClass::View => "View",
        }
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single parsed node. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub node_id: NodeId,
    pub node_class: NodeClass,
    pub browse_name: String,
    pub display_name: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_uri: Option<String>,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_rank: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_abstract: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symmetric: Option<bool>,
}

impl NodeRecord {
    /// Create a node with the display name set to the browse name.
    pub fn new(node_id: NodeId, node_class: NodeClass, browse_name: impl Into<String>) -> Self {
        let browse_name = browse_name.into();
        Self {
            node_id,
            node_class,
            display_name: LocalizedText::new(browse_name.clone()),
            browse_name,
            description: None,
            namespace_uri: None,
            references: Vec::new(),
            data_type: None,
            value_rank: None,
            is_abstract: None,
            symmetric: None,
        }
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.references.push(reference);
        self
    }

    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(LocalizedText::new(text));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shorthand_defaults_to_namespace_zero() {
        let id: NodeId = "i=85".parse().unwrap();
        assert_eq!(id, NodeId::numeric(0, 85));
        assert_eq!(id.canonical(), "ns=0;i=85");
    }

    #[test]
    fn test_numeric_identifier_is_normalized() {
        let padded: NodeId = "ns=0;i=085".parse().unwrap();
        assert_eq!(padded, "i=85".parse::<NodeId>().unwrap());
        assert_eq!(padded.canonical(), "ns=0;i=85");
    }

    #[test]
    fn test_parse_string_identifier() {
        let id: NodeId = "ns=2;s=Line1.Motor;Speed".parse().unwrap();
        assert_eq!(id.namespace_index, 2);
        assert_eq!(id.kind, IdentifierKind::String);
        assert_eq!(id.identifier, "Line1.Motor;Speed");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<NodeId>().is_err());
        assert!("ns=1;x=5".parse::<NodeId>().is_err());
        assert!("ns=1;i=abc".parse::<NodeId>().is_err());
        assert!("ns=70000;i=1".parse::<NodeId>().is_err());
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let id = NodeId::new(1, IdentifierKind::Guid, "09087e75-8e5e-499b-954f-f2a9603db28a");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"ns=1;g=09087e75-8e5e-499b-954f-f2a9603db28a\"");
        let back: NodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_node_class_from_section() {
        assert_eq!(NodeClass::from_section("UAVariableType"), Some(NodeClass::VariableType));
        assert_eq!(NodeClass::from_section("Aliases"), None);
    }
}
