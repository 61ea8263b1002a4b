//! NodeSet XML parsing.
//!
//! The reader walks a fixed document shape and fails on anything that does
//! not fit it:
//!
//! ```text
//! UANodeSet
//!   NamespaceUris/Uri*
//!   Models/Model*              (ModelUri, Version, PublicationDate)
//!   Aliases/Alias*             (Alias attribute, node id text)
//!   UAObject | UAVariable | UAMethod | UAObjectType | UAVariableType
//!   | UAReferenceType | UADataType | UAView
//!       @NodeId @BrowseName    (required)
//!       DisplayName            (required)
//!       Description?
//!       References/Reference*  (@ReferenceType, @IsForward, target text)
//! ```
//!
//! Elements outside this shape (values, definitions, extensions) are skipped
//! whole. Malformed XML, a foreign root, missing required attributes or
//! unparseable node ids fail the whole document.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;
use std::collections::HashMap;

use super::error::ParseError;
use crate::model::{
    CatalogEntry, Document, LocalizedText, NamespaceInfo, NodeClass, NodeId, NodeRecord,
    Reference,
};

/// Standard reference types, for documents that reference them by id
/// without declaring aliases.
const WELL_KNOWN_REFERENCE_TYPES: &[(&str, &str)] = &[
    ("ns=0;i=31", "References"),
    ("ns=0;i=32", "NonHierarchicalReferences"),
    ("ns=0;i=33", "HierarchicalReferences"),
    ("ns=0;i=34", "HasChild"),
    ("ns=0;i=35", "Organizes"),
    ("ns=0;i=36", "HasEventSource"),
    ("ns=0;i=37", "HasModellingRule"),
    ("ns=0;i=38", "HasEncoding"),
    ("ns=0;i=39", "HasDescription"),
    ("ns=0;i=40", "HasTypeDefinition"),
    ("ns=0;i=41", "GeneratesEvent"),
    ("ns=0;i=44", "Aggregates"),
    ("ns=0;i=45", "HasSubtype"),
    ("ns=0;i=46", "HasProperty"),
    ("ns=0;i=47", "HasComponent"),
    ("ns=0;i=48", "HasNotifier"),
    ("ns=0;i=49", "HasOrderedComponent"),
    ("ns=0;i=17603", "HasInterface"),
    ("ns=0;i=17604", "HasAddIn"),
];

type Result<T> = std::result::Result<T, String>;

#[derive(Debug, Default)]
struct RawNodeSet {
    namespace_uris: Vec<String>,
    models: Vec<NamespaceInfo>,
    aliases: HashMap<String, String>,
    nodes: Vec<RawNode>,
}

#[derive(Debug)]
struct RawNode {
    node_class: NodeClass,
    node_id: String,
    browse_name: String,
    display_name: Option<LocalizedText>,
    description: Option<LocalizedText>,
    references: Vec<RawReference>,
    data_type: Option<String>,
    value_rank: Option<i32>,
    is_abstract: Option<bool>,
    symmetric: Option<bool>,
}

#[derive(Debug)]
struct RawReference {
    reference_type: String,
    is_forward: bool,
    target: String,
}

/// Parse a NodeSet document fetched for `entry`.
pub fn parse_nodeset(xml: &str, entry: &CatalogEntry) -> std::result::Result<Document, ParseError> {
    let raw = NodeSetReader::new(xml)
        .read()
        .map_err(|cause| ParseError::new(&entry.source_url, cause))?;
    build_document(raw, entry).map_err(|cause| ParseError::new(&entry.source_url, cause))
}

struct NodeSetReader<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> NodeSetReader<'a> {
    fn new(xml: &'a str) -> Self {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);
        Self { reader }
    }

    fn next(&mut self) -> Result<Event<'a>> {
        self.reader.read_event().map_err(|e| {
            format!(
                "malformed XML at byte {}: {}",
                self.reader.buffer_position(),
                e
            )
        })
    }

    fn skip(&mut self, name: QName<'_>) -> Result<()> {
        self.reader
            .read_to_end(name)
            .map(|_| ())
            .map_err(|e| format!("malformed XML: {}", e))
    }

    fn read(mut self) -> Result<RawNodeSet> {
        loop {
            match self.next()? {
                Event::Start(e) => {
                    expect_root(&e)?;
                    break;
                }
                Event::Empty(e) => {
                    expect_root(&e)?;
                    return Ok(RawNodeSet::default());
                }
                Event::Eof => return Err("document has no root element".to_string()),
                _ => {}
            }
        }

        let mut set = RawNodeSet::default();
        loop {
            match self.next()? {
                Event::Start(e) => {
                    let tag = local_name(&e);
                    match tag.as_str() {
                        "NamespaceUris" => set.namespace_uris = self.read_uris()?,
                        "Models" => set.models = self.read_models()?,
                        "Aliases" => self.read_aliases(&mut set.aliases)?,
                        _ => match NodeClass::from_section(&tag) {
                            Some(class) => set.nodes.push(self.read_node(&e, class, false)?),
                            None => self.skip(e.name())?,
                        },
                    }
                }
                Event::Empty(e) => {
                    if let Some(class) = NodeClass::from_section(&local_name(&e)) {
                        set.nodes.push(self.read_node(&e, class, true)?);
                    }
                }
                Event::End(_) => break,
                Event::Eof => return Err("unexpected end of document inside <UANodeSet>".to_string()),
                _ => {}
            }
        }

        Ok(set)
    }

    /// Text content of the current element, up to its end tag.
    fn read_text(&mut self) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.next()? {
                Event::Text(t) => {
                    let chunk = t.unescape().map_err(|e| format!("bad text content: {}", e))?;
                    text.push_str(&chunk);
                }
                Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
                Event::Start(e) => self.skip(e.name())?,
                Event::End(_) => return Ok(text.trim().to_string()),
                Event::Eof => return Err("unexpected end of document in text content".to_string()),
                _ => {}
            }
        }
    }

    fn read_uris(&mut self) -> Result<Vec<String>> {
        let mut uris = Vec::new();
        loop {
            match self.next()? {
                Event::Start(e) if e.local_name().as_ref() == b"Uri" => uris.push(self.read_text()?),
                Event::Start(e) => self.skip(e.name())?,
                Event::End(_) => return Ok(uris),
                Event::Eof => return Err("unexpected end of document in <NamespaceUris>".to_string()),
                _ => {}
            }
        }
    }

    fn read_models(&mut self) -> Result<Vec<NamespaceInfo>> {
        let mut models = Vec::new();
        loop {
            match self.next()? {
                Event::Start(e) if e.local_name().as_ref() == b"Model" => {
                    models.push(model_info(&e)?);
                    self.skip(e.name())?;
                }
                Event::Empty(e) if e.local_name().as_ref() == b"Model" => {
                    models.push(model_info(&e)?);
                }
                Event::Start(e) => self.skip(e.name())?,
                Event::End(_) => return Ok(models),
                Event::Eof => return Err("unexpected end of document in <Models>".to_string()),
                _ => {}
            }
        }
    }

    fn read_aliases(&mut self, aliases: &mut HashMap<String, String>) -> Result<()> {
        loop {
            match self.next()? {
                Event::Start(e) if e.local_name().as_ref() == b"Alias" => {
                    let mut attrs = attributes(&e)?;
                    let alias = attrs
                        .remove("Alias")
                        .ok_or_else(|| "<Alias> without Alias attribute".to_string())?;
                    let target = self.read_text()?;
                    aliases.insert(alias, target);
                }
                Event::Start(e) => self.skip(e.name())?,
                Event::End(_) => return Ok(()),
                Event::Eof => return Err("unexpected end of document in <Aliases>".to_string()),
                _ => {}
            }
        }
    }

    fn read_node(&mut self, start: &BytesStart<'_>, node_class: NodeClass, empty: bool) -> Result<RawNode> {
        let section = local_name(start);
        let mut attrs = attributes(start)?;
        let node_id = attrs
            .remove("NodeId")
            .ok_or_else(|| format!("<{}> without NodeId", section))?;
        let browse_name = attrs
            .remove("BrowseName")
            .ok_or_else(|| format!("<{}> {} without BrowseName", section, node_id))?;

        let mut node = RawNode {
            node_class,
            browse_name: strip_namespace_prefix(&browse_name).to_string(),
            display_name: None,
            description: None,
            references: Vec::new(),
            data_type: attrs.remove("DataType"),
            value_rank: parse_attr(&mut attrs, "ValueRank", &node_id)?,
            is_abstract: parse_bool_attr(&mut attrs, "IsAbstract", &node_id)?,
            symmetric: parse_bool_attr(&mut attrs, "Symmetric", &node_id)?,
            node_id,
        };

        if !empty {
            loop {
                match self.next()? {
                    Event::Start(e) => match e.local_name().as_ref() {
                        b"DisplayName" => {
                            let text = self.read_localized(&e)?;
                            node.display_name.get_or_insert(text);
                        }
                        b"Description" => {
                            let text = self.read_localized(&e)?;
                            node.description.get_or_insert(text);
                        }
                        b"References" => node.references = self.read_references(&node.node_id)?,
                        _ => self.skip(e.name())?,
                    },
                    Event::End(_) => break,
                    Event::Eof => {
                        return Err(format!("unexpected end of document in node {}", node.node_id))
                    }
                    _ => {}
                }
            }
        }

        if node.display_name.is_none() {
            return Err(format!("node {} has no DisplayName", node.node_id));
        }
        Ok(node)
    }

    fn read_localized(&mut self, start: &BytesStart<'_>) -> Result<LocalizedText> {
        let locale = attributes(start)?.remove("Locale").filter(|l| !l.is_empty());
        let text = self.read_text()?;
        Ok(LocalizedText { locale, text })
    }

    fn read_references(&mut self, node_id: &str) -> Result<Vec<RawReference>> {
        let mut references = Vec::new();
        loop {
            match self.next()? {
                Event::Start(e) if e.local_name().as_ref() == b"Reference" => {
                    let mut attrs = attributes(&e)?;
                    let reference_type = attrs
                        .remove("ReferenceType")
                        .ok_or_else(|| format!("reference in node {} without ReferenceType", node_id))?;
                    let is_forward = parse_bool_attr(&mut attrs, "IsForward", node_id)?.unwrap_or(true);
                    let target = self.read_text()?;
                    if target.is_empty() {
                        return Err(format!("reference in node {} without target", node_id));
                    }
                    references.push(RawReference {
                        reference_type,
                        is_forward,
                        target,
                    });
                }
                Event::Empty(e) if e.local_name().as_ref() == b"Reference" => {
                    return Err(format!("reference in node {} without target", node_id));
                }
                Event::Start(e) => self.skip(e.name())?,
                Event::End(_) => return Ok(references),
                Event::Eof => return Err(format!("unexpected end of document in node {}", node_id)),
                _ => {}
            }
        }
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn expect_root(e: &BytesStart<'_>) -> Result<()> {
    if e.local_name().as_ref() == b"UANodeSet" {
        Ok(())
    } else {
        Err(format!("expected <UANodeSet> root, found <{}>", local_name(e)))
    }
}

fn attributes(e: &BytesStart<'_>) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| format!("malformed attribute in <{}>: {}", local_name(e), err))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| format!("malformed attribute value in <{}>: {}", local_name(e), err))?
            .into_owned();
        map.insert(key, value);
    }
    Ok(map)
}

fn parse_attr(attrs: &mut HashMap<String, String>, name: &str, node_id: &str) -> Result<Option<i32>> {
    match attrs.remove(name) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| format!("invalid {} '{}' on node {}", name, value, node_id)),
        None => Ok(None),
    }
}

fn parse_bool_attr(attrs: &mut HashMap<String, String>, name: &str, node_id: &str) -> Result<Option<bool>> {
    match attrs.remove(name).as_deref().map(str::trim) {
        Some("true") | Some("1") => Ok(Some(true)),
        Some("false") | Some("0") => Ok(Some(false)),
        Some(other) => Err(format!("invalid {} '{}' on node {}", name, other, node_id)),
        None => Ok(None),
    }
}

fn model_info(e: &BytesStart<'_>) -> Result<NamespaceInfo> {
    let mut attrs = attributes(e)?;
    let uri = attrs
        .remove("ModelUri")
        .ok_or_else(|| "<Model> without ModelUri".to_string())?;
    Ok(NamespaceInfo {
        uri,
        publication_date: attrs.remove("PublicationDate"),
        version: attrs.remove("Version"),
    })
}

/// `1:DeviceSet` -> `DeviceSet`. Names without a numeric prefix are kept.
fn strip_namespace_prefix(name: &str) -> &str {
    match name.split_once(':') {
        Some((prefix, rest)) if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) => rest,
        _ => name,
    }
}

/// Build the per-document namespace table.
///
/// Index 0 onwards is seeded with the entry's declared URIs; URIs declared in
/// the document body then take indexes 1.. in declaration order. Indexes the
/// body does not cover keep the entry's URI.
fn namespace_table(entry: &CatalogEntry, body_uris: &[String]) -> Vec<Option<String>> {
    let mut table: Vec<Option<String>> = entry.namespace_uris.iter().cloned().map(Some).collect();
    for (i, uri) in body_uris.iter().enumerate() {
        let index = i + 1;
        if table.len() <= index {
            table.resize(index + 1, None);
        }
        table[index] = Some(uri.clone());
    }
    table
}

fn document_namespaces(raw: &RawNodeSet, entry: &CatalogEntry) -> Vec<NamespaceInfo> {
    if raw.namespace_uris.is_empty() && raw.models.is_empty() {
        return entry.namespace_uris.iter().map(NamespaceInfo::new).collect();
    }

    let mut namespaces: Vec<NamespaceInfo> = raw
        .namespace_uris
        .iter()
        .map(|uri| {
            raw.models
                .iter()
                .find(|m| &m.uri == uri)
                .cloned()
                .unwrap_or_else(|| NamespaceInfo::new(uri))
        })
        .collect();

    for model in &raw.models {
        if !namespaces.iter().any(|ns| ns.uri == model.uri) {
            namespaces.push(model.clone());
        }
    }
    namespaces
}

struct NameResolver {
    by_id: HashMap<String, String>,
}

impl NameResolver {
    fn new(aliases: &HashMap<String, String>) -> Self {
        let mut by_id: HashMap<String, String> = WELL_KNOWN_REFERENCE_TYPES
            .iter()
            .map(|(id, name)| (id.to_string(), name.to_string()))
            .collect();
        for (alias, target) in aliases {
            if let Ok(id) = target.parse::<NodeId>() {
                by_id.insert(id.canonical(), alias.clone());
            }
        }
        Self { by_id }
    }

    /// Name for a type written either as a name or as a node id.
    fn resolve(&self, raw: &str) -> String {
        raw.parse::<NodeId>()
            .ok()
            .and_then(|id| self.by_id.get(&id.canonical()).cloned())
            .unwrap_or_else(|| raw.to_string())
    }
}

fn build_document(raw: RawNodeSet, entry: &CatalogEntry) -> Result<Document> {
    let table = namespace_table(entry, &raw.namespace_uris);
    let names = NameResolver::new(&raw.aliases);
    let namespaces = document_namespaces(&raw, entry);

    let mut nodes = Vec::with_capacity(raw.nodes.len());
    for node in raw.nodes {
        let node_id: NodeId = node
            .node_id
            .parse()
            .map_err(|e| format!("{} in <UA{}>", e, node.node_class))?;

        let references = node
            .references
            .into_iter()
            .map(|r| {
                let target: NodeId = r
                    .target
                    .parse()
                    .map_err(|e| format!("{} in reference of node {}", e, node_id))?;
                Ok(Reference {
                    reference_type: names.resolve(&r.reference_type),
                    is_forward: r.is_forward,
                    target,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let namespace_uri = table
            .get(node_id.namespace_index as usize)
            .cloned()
            .flatten();

        nodes.push(NodeRecord {
            namespace_uri,
            node_class: node.node_class,
            browse_name: node.browse_name,
            display_name: node.display_name.unwrap_or_else(|| LocalizedText::new(String::new())),
            description: node.description,
            references,
            data_type: node.data_type.map(|dt| names.resolve(&dt)),
            value_rank: node.value_rank,
            is_abstract: node.is_abstract,
            symmetric: node.symmetric,
            node_id,
        });
    }

    Ok(Document::new(namespaces, nodes))
}
