//! Mutable XML element tree backing config documents and plugin fragments

use quick_xml::events::{
    BytesCData,
    BytesDecl,
    BytesEnd,
    BytesPI,
    BytesStart,
    BytesText,
    Event,
};
use quick_xml::{
    Reader,
    Writer,
};

use crate::error::{
    JenkinsError,
    JenkinsResult,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlContent {
    Element(XmlNode),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
}

/// A single element with its attributes and ordered children.
///
/// Children keep their original order, including whitespace text and
/// comments, so an untouched subtree serializes back to equivalent XML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNode {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlContent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct XmlDeclaration {
    version: String,
    encoding: Option<String>,
    standalone: Option<String>,
}

/// A whole document: the root element plus the comments and processing
/// instructions around it
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct XmlTree {
    pub(crate) declaration: Option<XmlDeclaration>,
    pub(crate) prolog: Vec<XmlContent>,
    pub(crate) root: XmlNode,
    pub(crate) epilog: Vec<XmlContent>,
}

impl XmlTree {
    pub(crate) fn from_root(root: XmlNode) -> Self {
        Self {
            declaration: None,
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }
}

impl XmlNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        let mut node = Self::new(tag);
        node.set_text(text);
        node
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.append_child(child);
        self
    }

    /// Parses a standalone fragment such as a builder or publisher snippet
    pub fn parse(xml: &str) -> JenkinsResult<Self> {
        Ok(parse_tree(xml)?.root)
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = tag.into();
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let idx = self.attributes.iter().position(|(k, _)| k == name)?;
        Some(self.attributes.remove(idx).1)
    }

    /// Concatenated text and CDATA of the direct children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                XmlContent::Text(t) | XmlContent::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replaces all direct text content, leaving child elements in place
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children
            .retain(|c| !matches!(c, XmlContent::Text(_) | XmlContent::CData(_)));
        let text = text.into();
        if !text.is_empty() {
            self.children.insert(0, XmlContent::Text(text));
        }
    }

    pub fn content(&self) -> &[XmlContent] {
        &self.children
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlNode> {
        self.children.iter().filter_map(|c| match c {
            XmlContent::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlNode> {
        self.children.iter_mut().filter_map(|c| match c {
            XmlContent::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn child(&self, tag: &str) -> Option<&XmlNode> {
        self.elements().find(|e| e.tag == tag)
    }

    pub fn child_mut(&mut self, tag: &str) -> Option<&mut XmlNode> {
        self.elements_mut().find(|e| e.tag == tag)
    }

    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.elements().filter(move |e| e.tag == tag)
    }

    /// Element at a `/`-separated path of child tags; the empty path is `self`
    pub fn find(&self, path: &str) -> Option<&XmlNode> {
        split_path(path).try_fold(self, |node, tag| node.child(tag))
    }

    pub fn find_mut(&mut self, path: &str) -> Option<&mut XmlNode> {
        let mut node = self;
        for tag in split_path(path) {
            node = node.child_mut(tag)?;
        }
        Some(node)
    }

    /// Like [`find_mut`](Self::find_mut) but appends missing elements
    pub fn ensure_path(&mut self, path: &str) -> &mut XmlNode {
        let mut node = self;
        for tag in split_path(path) {
            let idx = match node.element_index(tag) {
                Some(idx) => idx,
                None => {
                    node.children.push(XmlContent::Element(XmlNode::new(tag)));
                    node.children.len() - 1
                }
            };
            node = match &mut node.children[idx] {
                XmlContent::Element(e) => e,
                _ => unreachable!("element_index only returns element positions"),
            };
        }
        node
    }

    pub fn append_child(&mut self, child: XmlNode) {
        self.children.push(XmlContent::Element(child));
    }

    /// Replaces the `index`-th child element, returning the previous one
    pub fn replace_element(&mut self, index: usize, node: XmlNode) -> Option<XmlNode> {
        let slot = self
            .children
            .iter_mut()
            .filter_map(|c| match c {
                XmlContent::Element(e) => Some(e),
                _ => None,
            })
            .nth(index)?;
        Some(std::mem::replace(slot, node))
    }

    /// Removes every direct child element with the given tag
    pub fn remove_children(&mut self, tag: &str) -> usize {
        let before = self.children.len();
        self.children
            .retain(|c| !matches!(c, XmlContent::Element(e) if e.tag == tag));
        before - self.children.len()
    }

    /// Plugin type token: the `class` attribute when present, else the tag
    pub fn type_token(&self) -> &str {
        self.attribute("class").unwrap_or(&self.tag)
    }

    /// Short plugin name from a `plugin="name@version"` attribute
    pub fn plugin_short_name(&self) -> Option<&str> {
        self.attribute("plugin")
            .map(|p| p.split('@').next().unwrap_or(p))
            .filter(|p| !p.is_empty())
    }

    pub fn to_xml_string(&self) -> JenkinsResult<String> {
        let mut writer = Writer::new(Vec::new());
        write_node(&mut writer, self)?;
        into_string(writer)
    }

    /// Serialized form for a plugin template; failures are logged and yield `None`
    pub fn to_template_xml(&self) -> Option<String> {
        match self.to_xml_string() {
            Ok(xml) => Some(xml),
            Err(e) => {
                tracing::warn!(tag = %self.tag, error = %e, "Failed to serialize plugin template");
                None
            }
        }
    }

    fn element_index(&self, tag: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|c| matches!(c, XmlContent::Element(e) if e.tag == tag))
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

pub(crate) fn parse_tree(xml: &str) -> JenkinsResult<XmlTree> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut declaration = None;
    let mut prolog = Vec::new();
    let mut epilog = Vec::new();
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        let misc = match reader.read_event()? {
            Event::Decl(decl) => {
                declaration = Some(XmlDeclaration::from_event(&decl)?);
                continue;
            }
            Event::Start(start) => {
                stack.push(element_from(&start)?);
                continue;
            }
            Event::Empty(start) => {
                let node = element_from(&start)?;
                attach(&mut stack, &mut root, node)?;
                continue;
            }
            Event::End(_) => {
                let node = stack.pop().ok_or_else(|| {
                    JenkinsError::MalformedConfig("unexpected closing tag".to_string())
                })?;
                attach(&mut stack, &mut root, node)?;
                continue;
            }
            Event::Text(text) => {
                if let Some(parent) = stack.last_mut() {
                    let value = text.unescape().map_err(xml_error)?.into_owned();
                    parent.children.push(XmlContent::Text(value));
                }
                continue;
            }
            Event::CData(data) => {
                if let Some(parent) = stack.last_mut() {
                    let value = utf8(data.into_inner().into_owned())?;
                    parent.children.push(XmlContent::CData(value));
                }
                continue;
            }
            Event::Comment(comment) => {
                XmlContent::Comment(utf8(comment.into_inner().into_owned())?)
            }
            Event::PI(pi) => {
                XmlContent::ProcessingInstruction(utf8(pi.to_vec())?)
            }
            Event::Eof => break,
            _ => continue,
        };

        match (stack.last_mut(), &root) {
            (Some(parent), _) => parent.children.push(misc),
            (None, None) => prolog.push(misc),
            (None, Some(_)) => epilog.push(misc),
        }
    }

    if let Some(open) = stack.last() {
        return Err(JenkinsError::MalformedConfig(format!(
            "element <{}> is never closed",
            open.tag
        )));
    }

    let root = root.ok_or_else(|| {
        JenkinsError::MalformedConfig("document has no root element".to_string())
    })?;
    Ok(XmlTree {
        declaration,
        prolog,
        root,
        epilog,
    })
}

/// Serializes a whole document; nodes outside the root go on their own lines
pub(crate) fn serialize_tree(tree: &XmlTree) -> JenkinsResult<String> {
    let mut writer = Writer::new(Vec::new());
    if let Some(decl) = &tree.declaration {
        writer
            .write_event(Event::Decl(BytesDecl::new(
                &decl.version,
                decl.encoding.as_deref(),
                decl.standalone.as_deref(),
            )))
            .map_err(write_error)?;
        write_newline(&mut writer)?;
    }
    for misc in &tree.prolog {
        write_content(&mut writer, misc)?;
        write_newline(&mut writer)?;
    }
    write_node(&mut writer, &tree.root)?;
    for misc in &tree.epilog {
        write_newline(&mut writer)?;
        write_content(&mut writer, misc)?;
    }
    into_string(writer)
}

fn write_newline(writer: &mut Writer<Vec<u8>>) -> JenkinsResult<()> {
    writer
        .write_event(Event::Text(BytesText::new("\n")))
        .map_err(write_error)?;
    Ok(())
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) -> JenkinsResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlContent::Element(node));
    } else if root.is_some() {
        return Err(JenkinsError::MalformedConfig(
            "document has more than one root element".to_string(),
        ));
    } else {
        *root = Some(node);
    }
    Ok(())
}

fn element_from(start: &BytesStart<'_>) -> JenkinsResult<XmlNode> {
    let tag = utf8(start.name().as_ref().to_vec())?;
    let mut node = XmlNode::new(tag);
    for attr in start.attributes() {
        let attr = attr.map_err(xml_error)?;
        let key = utf8(attr.key.as_ref().to_vec())?;
        let value = attr.unescape_value().map_err(xml_error)?.into_owned();
        node.attributes.push((key, value));
    }
    Ok(node)
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> JenkinsResult<()> {
    let mut start = BytesStart::new(node.tag.as_str());
    for (k, v) in &node.attributes {
        start.push_attribute((k.as_str(), v.as_str()));
    }

    if node.children.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(write_error)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(write_error)?;
    for child in &node.children {
        write_content(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(node.tag.as_str())))
        .map_err(write_error)?;
    Ok(())
}

fn write_content(writer: &mut Writer<Vec<u8>>, content: &XmlContent) -> JenkinsResult<()> {
    let event = match content {
        XmlContent::Element(e) => return write_node(writer, e),
        XmlContent::Text(t) => Event::Text(BytesText::new(t)),
        XmlContent::CData(t) => Event::CData(BytesCData::new(t.as_str())),
        XmlContent::Comment(t) => Event::Comment(BytesText::from_escaped(t.as_str())),
        XmlContent::ProcessingInstruction(t) => Event::PI(BytesPI::new(t.as_str())),
    };
    writer.write_event(event).map_err(write_error)?;
    Ok(())
}

impl XmlDeclaration {
    fn from_event(decl: &BytesDecl<'_>) -> JenkinsResult<Self> {
        let version = utf8(decl.version().map_err(xml_error)?.into_owned())?;
        let encoding = match decl.encoding() {
            Some(enc) => Some(utf8(enc.map_err(xml_error)?.into_owned())?),
            None => None,
        };
        let standalone = match decl.standalone() {
            Some(sa) => Some(utf8(sa.map_err(xml_error)?.into_owned())?),
            None => None,
        };
        Ok(Self {
            version,
            encoding,
            standalone,
        })
    }
}

fn utf8(bytes: Vec<u8>) -> JenkinsResult<String> {
    String::from_utf8(bytes).map_err(|e| JenkinsError::MalformedConfig(e.to_string()))
}

fn into_string(writer: Writer<Vec<u8>>) -> JenkinsResult<String> {
    utf8(writer.into_inner())
}

fn xml_error(err: impl std::fmt::Display) -> JenkinsError {
    JenkinsError::MalformedConfig(err.to_string())
}

fn write_error(err: impl std::fmt::Display) -> JenkinsError {
    JenkinsError::MalformedConfig(format!("failed to serialize XML: {err}"))
}
