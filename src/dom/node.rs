use crate::dom::text::collapse_whitespace;
use scraper::{ElementRef, Node, Selector};

/// The kind of a node in the document tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
}

/// A borrowed view of one node in a [`DomTree`](crate::dom::DomTree)
///
/// Doctypes and processing instructions are not surfaced; every other node
/// is an element, a text node, or a comment.
#[derive(Debug, Clone, Copy)]
pub enum DomNode<'a> {
    Element(ElementRef<'a>),
    Text(&'a str),
    Comment(&'a str),
}

impl<'a> DomNode<'a> {
    /// Wraps a raw tree node; `element` is the same node viewed as an element
    fn from_tree(node: &'a Node, element: Option<ElementRef<'a>>) -> Option<Self> {
        match node {
            Node::Element(_) => element.map(DomNode::Element),
            Node::Text(text) => Some(DomNode::Text(&**text)),
            Node::Comment(comment) => Some(DomNode::Comment(&**comment)),
            _ => None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Element(_) => NodeKind::Element,
            Self::Text(_) => NodeKind::Text,
            Self::Comment(_) => NodeKind::Comment,
        }
    }

    pub fn as_element(&self) -> Option<ElementRef<'a>> {
        match self {
            Self::Element(element) => Some(*element),
            _ => None,
        }
    }

    /// Lowercase tag name for elements, `None` otherwise
    pub fn tag_name(&self) -> Option<&'a str> {
        self.as_element().map(|element| element.value().name())
    }

    /// Returns true if this is an element with the given tag name
    pub fn is_tag(&self, name: &str) -> bool {
        self.tag_name() == Some(name)
    }

    /// Attribute lookup; `None` for missing attributes and non-elements
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.as_element().and_then(|element| element.value().attr(name))
    }

    /// Returns true if the element's class list contains `class`
    pub fn has_class(&self, class: &str) -> bool {
        self.as_element()
            .map(|element| element.value().classes().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Direct children, in document order
    pub fn children(&self) -> impl Iterator<Item = DomNode<'a>> + 'a {
        self.as_element()
            .into_iter()
            .flat_map(|element| element.children())
            .filter_map(|child| DomNode::from_tree(child.value(), ElementRef::wrap(child)))
    }

    /// Pre-order traversal starting with this node
    pub fn descendants(&self) -> impl Iterator<Item = DomNode<'a>> + 'a {
        let own = match self {
            Self::Element(_) => None,
            other => Some(*other),
        };

        own.into_iter().chain(
            self.as_element()
                .into_iter()
                .flat_map(|element| element.descendants())
                .filter_map(|node| DomNode::from_tree(node.value(), ElementRef::wrap(node))),
        )
    }

    /// Descendant elements matching a CSS selector
    pub fn select(&self, selector: &'a Selector) -> impl Iterator<Item = DomNode<'a>> + 'a {
        self.as_element()
            .into_iter()
            .flat_map(move |element| element.select(selector))
            .map(DomNode::Element)
    }

    /// First descendant element matching a CSS selector
    pub fn select_first(&self, selector: &'a Selector) -> Option<DomNode<'a>> {
        self.select(selector).next()
    }

    /// Concatenated descendant text, exactly as in the source
    pub fn raw_text(&self) -> String {
        match self {
            Self::Element(element) => element.text().collect(),
            Self::Text(text) => (*text).to_string(),
            Self::Comment(_) => String::new(),
        }
    }

    /// Concatenated descendant text with whitespace runs collapsed and trimmed
    pub fn text(&self) -> String {
        collapse_whitespace(&self.raw_text())
    }

    /// Returns true if the element is not rendered by a browser
    ///
    /// Checks the `hidden` attribute, `aria-hidden="true"`, hidden inputs,
    /// and inline `display: none` / `visibility: hidden` styles.
    pub fn is_hidden(&self) -> bool {
        let Some(element) = self.as_element() else {
            return false;
        };
        let value = element.value();

        if value.attr("hidden").is_some() {
            return true;
        }

        if value
            .attr("aria-hidden")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
        {
            return true;
        }

        if value.name() == "input"
            && value
                .attr("type")
                .is_some_and(|t| t.trim().eq_ignore_ascii_case("hidden"))
        {
            return true;
        }

        if let Some(style) = value.attr("style") {
            let style: String = style
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_ascii_lowercase();
            if style.contains("display:none") || style.contains("visibility:hidden") {
                return true;
            }
        }

        false
    }

    /// Serialized outer HTML, used in diagnostics
    pub fn html(&self) -> String {
        match self {
            Self::Element(element) => element.html(),
            Self::Text(text) => (*text).to_string(),
            Self::Comment(comment) => format!("<!--{}-->", comment),
        }
    }
}
