//! A small owned DOM tree for building block markup.
//!
//! Text nodes hold raw text and are escaped only when the tree is serialized,
//! so index data can never be interpreted as markup.

use std::fmt::{self, Write as _};

use scraper::{ElementRef, Html};

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            Self::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Self::Element(el) => Some(el),
            Self::Text(_) => None,
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        match self {
            Self::Element(el) => el.text_content(),
            Self::Text(t) => t.clone(),
        }
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Self::Element(el) => el.write_html(out),
            Self::Text(t) => escape_into(t, out, false),
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Self::Element(el)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

// ---------------------------------------------------------------------------
// Element
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            classes: Vec::new(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    // -- builder-style ------------------------------------------------------

    /// Add one or more space-separated classes.
    pub fn class(mut self, classes: &str) -> Self {
        self.add_class(classes);
        self
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children_from<I, N>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    /// Append a text node.
    pub fn text(self, value: impl Into<String>) -> Self {
        self.child(Node::Text(value.into()))
    }

    // -- accessors ----------------------------------------------------------

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Classes joined the way `className` reads.
    pub fn class_name(&self) -> String {
        self.classes.join(" ")
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, classes: &str) {
        for class in classes.split_whitespace() {
            if !self.has_class(class) {
                self.classes.push(class.to_string());
            }
        }
    }

    pub fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }

    pub fn toggle_class(&mut self, class: &str, on: bool) {
        if on {
            self.add_class(class);
        } else {
            self.remove_class(class);
        }
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        if name == "class" {
            return None;
        }
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        if name == "class" {
            self.classes.clear();
            self.add_class(&value.into());
            return;
        }
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(n, _)| n != name);
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    /// Child elements, skipping text nodes.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(Node::as_element_mut)
    }

    pub fn push(&mut self, node: impl Into<Node>) {
        self.children.push(node.into());
    }

    pub fn prepend(&mut self, node: impl Into<Node>) {
        self.children.insert(0, node.into());
    }

    pub fn clear_children(&mut self) {
        self.children.clear();
    }

    /// Take the element children, dropping text between them.
    pub fn into_child_elements(self) -> Vec<Element> {
        self.children
            .into_iter()
            .filter_map(|node| match node {
                Node::Element(el) => Some(el),
                Node::Text(_) => None,
            })
            .collect()
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            out.push_str(&child.text_content());
        }
        out
    }

    // -- queries ------------------------------------------------------------

    /// First descendant (depth-first, self included) matching `pred`.
    pub fn find(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        if pred(self) {
            return Some(self);
        }
        self.child_elements().find_map(|c| c.find(pred))
    }

    pub fn find_mut(&mut self, pred: &dyn Fn(&Element) -> bool) -> Option<&mut Element> {
        if pred(self) {
            return Some(self);
        }
        self.child_elements_mut().find_map(|c| c.find_mut(pred))
    }

    /// Every descendant (self included) matching `pred`, in document order.
    pub fn find_all(&self, pred: &dyn Fn(&Element) -> bool) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect(pred, &mut found);
        found
    }

    fn collect<'a>(&'a self, pred: &dyn Fn(&Element) -> bool, found: &mut Vec<&'a Element>) {
        if pred(self) {
            found.push(self);
        }
        for child in self.child_elements() {
            child.collect(pred, found);
        }
    }

    pub fn find_by_class(&self, class: &str) -> Option<&Element> {
        self.find(&|el| el.has_class(class))
    }

    pub fn find_all_by_class(&self, class: &str) -> Vec<&Element> {
        self.find_all(&|el| el.has_class(class))
    }

    pub fn find_by_tag(&self, tag: &str) -> Option<&Element> {
        self.find(&|el| el.tag == tag)
    }

    /// Apply `f` to this element and every descendant element.
    pub fn walk_mut(&mut self, f: &mut dyn FnMut(&mut Element)) {
        f(self);
        for child in self.child_elements_mut() {
            child.walk_mut(f);
        }
    }

    // -- serialization ------------------------------------------------------

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    /// Serialized children, like `innerHTML`.
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_html(&mut out);
        }
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        if !self.classes.is_empty() {
            out.push_str(" class=\"");
            escape_into(&self.class_name(), out, true);
            out.push('"');
        }
        for (name, value) in &self.attrs {
            let _ = write!(out, " {name}=\"");
            escape_into(value, out, true);
            out.push('"');
        }
        out.push('>');

        if VOID_ELEMENTS.contains(&self.tag.as_str()) {
            return;
        }
        for child in &self.children {
            child.write_html(out);
        }
        let _ = write!(out, "</{}>", self.tag);
    }

    // -- parsing ------------------------------------------------------------

    /// Parse an HTML fragment (authored block markup) into nodes.
    pub fn parse_fragment(html: &str) -> Vec<Node> {
        let fragment = Html::parse_fragment(html);
        convert_children(fragment.root_element())
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

fn convert_children(parent: ElementRef<'_>) -> Vec<Node> {
    let mut nodes = Vec::new();
    for child in parent.children() {
        if let Some(el) = ElementRef::wrap(child) {
            let mut element = Element::new(el.value().name());
            for (name, value) in el.value().attrs() {
                element.set_attr(name, value);
            }
            element.children = convert_children(el);
            nodes.push(Node::Element(element));
        } else if let Some(text) = child.value().as_text() {
            nodes.push(Node::Text(String::from(&**text)));
        }
    }
    nodes
}

/// Escape text for an HTML text node or a double-quoted attribute value.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_into(text, &mut out, true);
    out
}

fn escape_into(text: &str, out: &mut String, attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_escaping() {
        let el = Element::new("a")
            .class("link  active")
            .attr("href", "/x?a=1&b=\"2\"")
            .text("<b>bold</b> & more");

        assert_eq!(
            el.to_html(),
            r#"<a class="link active" href="/x?a=1&amp;b=&quot;2&quot;">&lt;b&gt;bold&lt;/b&gt; &amp; more</a>"#
        );
    }

    #[test]
    fn void_elements_have_no_closing_tag() {
        let el = Element::new("input").attr("name", "s");
        assert_eq!(el.to_html(), r#"<input name="s">"#);
    }

    #[test]
    fn class_helpers() {
        let mut el = Element::new("li").class("page prev");
        el.add_class("disabled prev");
        assert_eq!(el.class_name(), "page prev disabled");
        el.toggle_class("disabled", false);
        assert!(!el.has_class("disabled"));
        el.set_attr("class", "one two");
        assert_eq!(el.classes(), ["one", "two"]);
        assert_eq!(el.get_attr("class"), None);
    }

    #[test]
    fn parses_fragments() {
        let nodes = Element::parse_fragment(
            r#"<div><div><picture><img src="/a.png" alt="A"></picture></div><div><p>Hello <em>there</em></p></div></div>"#,
        );
        assert_eq!(nodes.len(), 1);
        let root = nodes[0].as_element().unwrap();
        assert_eq!(root.child_elements().count(), 2);
        assert_eq!(root.find_by_tag("img").and_then(|i| i.get_attr("src")), Some("/a.png"));
        assert_eq!(root.text_content(), "Hello there");
    }

    #[test]
    fn find_all_in_document_order() {
        let el = Element::new("ul")
            .child(Element::new("li").class("x").text("1"))
            .child(Element::new("li").child(Element::new("span").class("x").text("2")));

        let found: Vec<String> = el
            .find_all_by_class("x")
            .iter()
            .map(|e| e.text_content())
            .collect();
        assert_eq!(found, ["1", "2"]);
    }
}
