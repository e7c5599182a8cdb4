//! XML tree adapter for KML and GPX documents
//!
//! Reads a document with quick-xml into an owned [`XmlNode`] tree. Element
//! prefixes are resolved against the `xmlns` declarations in scope, so the
//! extractors can look children up by local name without caring whether the
//! source declared a default namespace, a prefixed one, or none at all.

use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Deepest element nesting accepted, root included
pub const MAX_DEPTH: usize = 256;

/// Prefix → URI bindings currently in scope, innermost last
type NamespaceScope = Vec<(String, String)>;

/// A parsed XML element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlNode {
    /// Local name of the element (prefix stripped)
    pub name: String,
    /// Prefix as written in the source
    pub prefix: Option<String>,
    /// Namespace URI the element resolved to
    pub namespace: Option<String>,
    /// Attribute names (as written) to unescaped values, xmlns declarations excluded
    pub attributes: IndexMap<String, String>,
    /// Namespace declarations made on this element; the default namespace uses the key ""
    pub namespace_declarations: IndexMap<String, String>,
    /// Direct text and CDATA content of this element, whitespace kept as written
    pub text_content: String,
    /// Child elements in document order
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    /// First child element with the given local name in this element's namespace
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.element_children().find(|child| child.name == name)
    }

    /// All child elements with the given local name in this element's namespace
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.element_children().filter(move |child| child.name == name)
    }

    /// Child elements sharing this element's namespace, in document order
    pub fn element_children(&self) -> impl Iterator<Item = &XmlNode> + '_ {
        self.children
            .iter()
            .filter(move |child| child.namespace == self.namespace)
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    /// Text of the named child, or "" when the child is missing
    pub fn child_text(&self, name: &str) -> &str {
        self.child(name).map(XmlNode::text).unwrap_or("")
    }

    /// Concatenated direct text of this element, including whitespace-only runs
    pub fn text(&self) -> &str {
        &self.text_content
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Every element (this one included) with the given namespace and local
    /// name, in document order. Equivalent to the XPath `//ns:name`.
    pub fn descendants<'a>(&'a self, namespace: Option<&str>, name: &str) -> Vec<&'a XmlNode> {
        let mut found = Vec::new();
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            if node.name == name && node.namespace.as_deref() == namespace {
                found.push(node);
            }
            pending.extend(node.children.iter().rev());
        }
        found
    }
}

/// Parses an XML document held in memory and returns its root element
///
/// # Example
/// ```
/// let root = geojson_converter::parse_xml_str("<gpx><wpt lat=\"1\" lon=\"2\"/></gpx>").unwrap();
/// assert_eq!(root.name, "gpx");
/// assert_eq!(root.child("wpt").and_then(|w| w.attribute("lat")), Some("1"));
/// ```
pub fn parse_xml_str(text: &str) -> anyhow::Result<XmlNode> {
    parse_xml_reader(text.as_bytes())
}

/// Parses an XML document from any buffered source and returns its root element
///
/// Fails when the input is not well-formed: mismatched or unclosed tags,
/// an empty document, content outside the root element, broken attribute
/// and entity syntax, or nesting deeper than [`MAX_DEPTH`].
pub fn parse_xml_reader<R: BufRead>(source: R) -> anyhow::Result<XmlNode> {
    let mut reader = Reader::from_reader(source);
    let mut buf = Vec::new();
    let mut scope = NamespaceScope::new();
    let mut root = None;

    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf)?;
        let maybe_root = match event {
            Event::Start(start) => Some((start.into_owned(), false)),
            Event::Empty(start) => Some((start.into_owned(), true)),
            Event::Text(text) => {
                let value = text.unescape()?;
                anyhow::ensure!(value.trim().is_empty(), "text content outside the root element");
                None
            }
            Event::CData(_) => anyhow::bail!("CDATA section outside the root element"),
            Event::End(end) => anyhow::bail!(
                "unexpected closing tag '</{}>' outside the root element",
                String::from_utf8_lossy(end.name().as_ref())
            ),
            Event::Eof => break,
            _ => None,
        };

        if let Some((start, self_closing)) = maybe_root {
            anyhow::ensure!(root.is_none(), "document has more than one root element");
            let mut node_buf = Vec::new();
            root = Some(parse_node(&mut reader, &mut node_buf, start, self_closing, 1, &mut scope)?);
        }
    }

    root.ok_or_else(|| anyhow::anyhow!("XML document is empty"))
}

fn parse_node<R: BufRead>(
    reader: &mut Reader<R>,
    buf: &mut Vec<u8>,
    start: BytesStart<'static>,
    self_closing: bool,
    depth: usize,
    scope: &mut NamespaceScope,
) -> anyhow::Result<XmlNode> {
    let qualified_name = String::from_utf8_lossy(start.name().as_ref()).to_string();
    anyhow::ensure!(
        depth <= MAX_DEPTH,
        "element '{}' is nested deeper than {} levels",
        qualified_name,
        MAX_DEPTH
    );
    let (prefix, name) = split_qualified_name(&qualified_name);
    let (attributes, namespace_declarations) = collect_attributes(&start)?;

    let outer_scope_len = scope.len();
    scope.extend(
        namespace_declarations
            .iter()
            .map(|(declared, uri)| (declared.clone(), uri.clone())),
    );

    let mut node = XmlNode {
        namespace: resolve_prefix(scope, prefix.as_deref()),
        name,
        prefix,
        attributes,
        namespace_declarations,
        text_content: String::new(),
        children: Vec::new(),
    };

    if self_closing {
        scope.truncate(outer_scope_len);
        return Ok(node);
    }

    loop {
        buf.clear();
        let event = reader.read_event_into(buf)?;
        match event {
            Event::Start(child_start) => {
                let mut child_buf = Vec::new();
                let child = parse_node(reader, &mut child_buf, child_start.into_owned(), false, depth + 1, scope)?;
                node.children.push(child);
            }
            Event::Empty(child_start) => {
                let mut child_buf = Vec::new();
                let child = parse_node(reader, &mut child_buf, child_start.into_owned(), true, depth + 1, scope)?;
                node.children.push(child);
            }
            Event::Text(text) => node.text_content.push_str(&text.unescape()?),
            Event::CData(text) => node.text_content.push_str(&String::from_utf8_lossy(text.as_ref())),
            Event::End(end) => {
                anyhow::ensure!(
                    end.name().as_ref() == qualified_name.as_bytes(),
                    "unexpected closing tag '</{}>' while parsing '<{}>'",
                    String::from_utf8_lossy(end.name().as_ref()),
                    qualified_name
                );
                scope.truncate(outer_scope_len);
                return Ok(node);
            }
            Event::Eof => {
                anyhow::bail!("unexpected end of file while parsing element '{}'", qualified_name);
            }
            _ => {}
        }
    }
}

/// Splits element attributes into plain attributes and xmlns declarations
fn collect_attributes(
    start: &BytesStart<'_>,
) -> anyhow::Result<(IndexMap<String, String>, IndexMap<String, String>)> {
    let mut attributes = IndexMap::new();
    let mut declarations = IndexMap::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value()?.to_string();
        if key == "xmlns" {
            declarations.insert(String::new(), value);
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            declarations.insert(prefix.to_string(), value);
        } else {
            attributes.insert(key, value);
        }
    }
    Ok((attributes, declarations))
}

fn split_qualified_name(qualified: &str) -> (Option<String>, String) {
    match qualified.split_once(':') {
        Some((prefix, local)) => (Some(prefix.to_string()), local.to_string()),
        None => (None, qualified.to_string()),
    }
}

/// Unbound prefixes resolve to no namespace rather than failing the parse.
/// `xmlns=""` un-declares the default namespace.
fn resolve_prefix(scope: &[(String, String)], prefix: Option<&str>) -> Option<String> {
    let prefix = prefix.unwrap_or("");
    if prefix == "xml" {
        return Some(XML_NAMESPACE.to_string());
    }
    scope
        .iter()
        .rev()
        .find(|(bound, _)| bound.as_str() == prefix)
        .map(|(_, uri)| uri.clone())
        .filter(|uri| !uri.is_empty())
}
