//! HTML to markdown conversion
//!
//! A recursive walk over the [`DomTree`]. Block elements end the current
//! block, inline elements wrap their rendered children in markers, and
//! anything unrecognised renders its children without markers. Below
//! [`MAX_RENDER_DEPTH`] subtrees are flattened to their text without
//! recursing further.

use crate::dom::{collapse_whitespace, DomNode, DomTree};
use crate::scrape::writer::MarkdownWriter;
use crate::url::{is_navigable_href, is_web_url, resolve};
use std::cell::Cell;
use url::Url;

/// Elements whose content a browser never displays
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "head", "iframe"];

/// Nesting depth beyond which subtrees render as plain text
const MAX_RENDER_DEPTH: usize = 128;

/// Elements that only separate blocks
const CONTAINER_TAGS: &[&str] = &[
    "html", "body", "div", "section", "article", "main", "header", "footer", "nav", "aside",
    "figure", "figcaption", "form", "fieldset", "details", "summary", "address", "dl", "dt",
    "dd", "center", "li", "caption", "hgroup", "search",
];

/// Converts a parsed page to markdown
///
/// Never fails, and never returns an empty string for a document with any
/// non-whitespace text: when structured conversion yields nothing, the
/// visible text is used, then all text.
///
/// # Arguments
///
/// * `dom` - The parsed page
/// * `base_url` - Base URL for link and image targets
///
/// # Example
///
/// ```
/// use nanoserp::dom::DomTree;
/// use nanoserp::scrape::to_markdown;
/// use url::Url;
///
/// let dom = DomTree::from_html("<h1>Hi</h1><p>Read the <a href='/docs'>docs</a>.</p>").unwrap();
/// let base = Url::parse("https://example.com/").unwrap();
/// assert_eq!(
///     to_markdown(&dom, &base),
///     "# Hi\n\nRead the [docs](https://example.com/docs)."
/// );
/// ```
pub fn to_markdown(dom: &DomTree, base_url: &Url) -> String {
    let converter = Converter {
        base_url,
        depth: Cell::new(0),
    };
    let mut writer = MarkdownWriter::new();
    converter.render_node(dom.root(), &mut writer);

    let markdown = writer.finish();
    if !markdown.is_empty() {
        return markdown;
    }

    let visible = collapse_whitespace(&visible_text(dom.root()));
    if !visible.is_empty() {
        tracing::debug!("Markdown conversion produced nothing; using visible text");
        return visible;
    }

    dom.root().text()
}

/// Text of every node that would be rendered, in document order
///
/// Walks with an explicit stack so arbitrarily deep documents are safe.
fn visible_text(node: DomNode<'_>) -> String {
    let mut out = String::new();
    let mut stack = vec![node];

    while let Some(node) = stack.pop() {
        match node {
            DomNode::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            DomNode::Comment(_) => {}
            DomNode::Element(_) => {
                if is_excluded(&node) {
                    continue;
                }
                let children: Vec<DomNode<'_>> = node.children().collect();
                stack.extend(children.into_iter().rev());
            }
        }
    }

    out
}

fn is_excluded(node: &DomNode<'_>) -> bool {
    node.tag_name()
        .is_some_and(|tag| SKIPPED_TAGS.contains(&tag))
        || node.is_hidden()
}

struct Converter<'u> {
    base_url: &'u Url,
    /// Current element nesting, shared by every recursive path
    depth: Cell<usize>,
}

impl Converter<'_> {
    fn too_deep(&self) -> bool {
        self.depth.get() >= MAX_RENDER_DEPTH
    }

    /// Runs `render` one nesting level down
    fn descend<T>(&self, render: impl FnOnce() -> T) -> T {
        self.depth.set(self.depth.get() + 1);
        let out = render();
        self.depth.set(self.depth.get() - 1);
        out
    }

    fn render_node(&self, node: DomNode<'_>, writer: &mut MarkdownWriter) {
        let tag = match node {
            DomNode::Text(text) => {
                writer.text(text);
                return;
            }
            DomNode::Comment(_) => return,
            DomNode::Element(_) => match node.tag_name() {
                Some(tag) => tag,
                None => return,
            },
        };

        if is_excluded(&node) {
            return;
        }

        if self.too_deep() {
            tracing::trace!("Flattening <{}> below depth {}", tag, MAX_RENDER_DEPTH);
            writer.text(&visible_text(node));
            return;
        }

        self.descend(|| self.render_element(node, tag, writer));
    }

    fn render_element(&self, node: DomNode<'_>, tag: &str, writer: &mut MarkdownWriter) {
        match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => self.render_heading(node, tag, writer),
            "p" => {
                writer.block_break();
                self.render_children(node, writer);
                writer.block_break();
            }
            "blockquote" => self.render_blockquote(node, writer),
            "ul" | "ol" => {
                let lines = self.render_list(node, 0);
                if !lines.is_empty() {
                    writer.block_break();
                    writer.raw(&lines.join("\n"));
                    writer.block_break();
                }
            }
            "pre" => render_preformatted(node, writer),
            "table" => self.render_table(node, writer),
            "hr" => {
                writer.block_break();
                writer.raw("---");
                writer.block_break();
            }
            "br" => writer.line_break(),
            "em" | "i" => self.render_inline(node, "*", writer),
            "strong" | "b" => self.render_inline(node, "**", writer),
            "del" | "s" | "strike" => self.render_inline(node, "~~", writer),
            "code" | "kbd" | "samp" => render_inline_code(node, writer),
            "a" => self.render_anchor(node, writer),
            "img" => self.render_image(node, writer),
            tag if CONTAINER_TAGS.contains(&tag) => {
                writer.block_break();
                self.render_children(node, writer);
                writer.block_break();
            }
            _ => self.render_children(node, writer),
        }
    }

    fn render_children(&self, node: DomNode<'_>, writer: &mut MarkdownWriter) {
        for child in node.children() {
            self.render_node(child, writer);
        }
    }

    /// Renders the children into a fresh buffer
    fn render_fragment(&self, node: DomNode<'_>) -> String {
        let mut writer = MarkdownWriter::new();
        self.render_children(node, &mut writer);
        writer.into_inner()
    }

    fn render_heading(&self, node: DomNode<'_>, tag: &str, writer: &mut MarkdownWriter) {
        let level = tag[1..].parse::<usize>().unwrap_or(1);
        let content = collapse_whitespace(&self.render_fragment(node));
        if content.is_empty() {
            return;
        }

        writer.block_break();
        writer.raw(&format!("{} {}", "#".repeat(level), content));
        writer.block_break();
    }

    fn render_blockquote(&self, node: DomNode<'_>, writer: &mut MarkdownWriter) {
        let mut inner = MarkdownWriter::new();
        self.render_children(node, &mut inner);
        let content = inner.finish();
        if content.is_empty() {
            return;
        }

        let quoted: Vec<String> = content
            .lines()
            .map(|line| {
                if line.trim().is_empty() {
                    ">".to_string()
                } else {
                    format!("> {}", line)
                }
            })
            .collect();

        writer.block_break();
        writer.raw(&quoted.join("\n"));
        writer.block_break();
    }

    /// Renders a list as lines, indenting two spaces per nesting level
    fn render_list(&self, list: DomNode<'_>, depth: usize) -> Vec<String> {
        if self.too_deep() {
            let text = collapse_whitespace(&visible_text(list));
            return if text.is_empty() {
                Vec::new()
            } else {
                vec![format!("{}- {}", "  ".repeat(depth), text)]
            };
        }

        self.descend(|| self.render_list_items(list, depth))
    }

    fn render_list_items(&self, list: DomNode<'_>, depth: usize) -> Vec<String> {
        let ordered = list.is_tag("ol");
        let mut number: i64 = list
            .attr("start")
            .and_then(|start| start.trim().parse().ok())
            .unwrap_or(1);
        let indent = "  ".repeat(depth);
        let mut lines = Vec::new();

        for child in list.children() {
            match child {
                DomNode::Text(text) if text.trim().is_empty() => continue,
                DomNode::Comment(_) => continue,
                _ => {}
            }
            if is_excluded(&child) {
                continue;
            }

            // Lists nested directly in a list, without an <li>
            if child.is_tag("ul") || child.is_tag("ol") {
                lines.extend(self.render_list(child, depth + 1));
                continue;
            }

            let (content, nested) = self.render_list_item(child, depth);
            if content.is_empty() && nested.is_empty() {
                continue;
            }

            let marker = if ordered {
                let marker = format!("{}.", number);
                number += 1;
                marker
            } else {
                "-".to_string()
            };

            lines.push(format!("{}{} {}", indent, marker, content).trim_end().to_string());
            lines.extend(nested);
        }

        lines
    }

    /// Returns an item's single-line content and its nested list lines
    fn render_list_item(&self, item: DomNode<'_>, depth: usize) -> (String, Vec<String>) {
        let mut writer = MarkdownWriter::new();
        let mut nested = Vec::new();

        if item.is_tag("li") {
            for child in item.children() {
                if (child.is_tag("ul") || child.is_tag("ol")) && !is_excluded(&child) {
                    nested.extend(self.render_list(child, depth + 1));
                } else {
                    self.render_node(child, &mut writer);
                }
            }
        } else {
            self.render_node(item, &mut writer);
        }

        (collapse_whitespace(&writer.into_inner()), nested)
    }

    fn render_table(&self, table: DomNode<'_>, writer: &mut MarkdownWriter) {
        let mut caption = None;
        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut has_header = false;

        for child in table.children() {
            match child.tag_name() {
                Some("caption") => caption = Some(collapse_whitespace(&self.render_fragment(child))),
                Some("tr") => rows.push(self.render_row(child)),
                Some(section @ ("thead" | "tbody" | "tfoot")) => {
                    for row in child.children().filter(|row| row.is_tag("tr")) {
                        if section == "thead" && rows.is_empty() {
                            has_header = true;
                        }
                        rows.push(self.render_row(row));
                    }
                }
                _ => {}
            }
        }

        rows.retain(|row| !row.is_empty());

        writer.block_break();
        if let Some(caption) = caption.filter(|caption| !caption.is_empty()) {
            writer.raw(&caption);
            writer.block_break();
        }

        if rows.is_empty() {
            return;
        }

        if !has_header {
            tracing::trace!("Table without <thead>; using first row as header");
        }

        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(columns, String::new());
        }

        let mut lines = Vec::with_capacity(rows.len() + 1);
        lines.push(format_row(&rows[0]));
        lines.push(format_row(&vec!["---".to_string(); columns]));
        lines.extend(rows[1..].iter().map(|row| format_row(row)));

        writer.raw(&lines.join("\n"));
        writer.block_break();
    }

    fn render_row(&self, row: DomNode<'_>) -> Vec<String> {
        row.children()
            .filter(|cell| cell.is_tag("td") || cell.is_tag("th"))
            .map(|cell| collapse_whitespace(&self.render_fragment(cell)).replace('|', "\\|"))
            .collect()
    }

    /// Wraps rendered children in `marker`, keeping edge spaces outside it
    fn render_inline(&self, node: DomNode<'_>, marker: &str, writer: &mut MarkdownWriter) {
        let content = self.render_fragment(node);
        let core = content.trim();

        if core.is_empty() {
            if !content.is_empty() {
                writer.text(" ");
            }
            return;
        }

        if content.starts_with(char::is_whitespace) {
            writer.text(" ");
        }
        writer.raw(&format!("{}{}{}", marker, core, marker));
        if content.ends_with(char::is_whitespace) {
            writer.text(" ");
        }
    }

    fn render_anchor(&self, anchor: DomNode<'_>, writer: &mut MarkdownWriter) {
        let content = self.render_fragment(anchor);
        let text = collapse_whitespace(&content);

        let Some(target) = anchor.attr("href").and_then(|href| self.web_target(href)) else {
            writer.text(&content);
            return;
        };

        if text.is_empty() {
            return;
        }

        if content.starts_with(char::is_whitespace) {
            writer.text(" ");
        }
        writer.raw(&format!("[{}]({})", text, target));
        if content.ends_with(char::is_whitespace) {
            writer.text(" ");
        }
    }

    fn render_image(&self, image: DomNode<'_>, writer: &mut MarkdownWriter) {
        let Some(target) = image.attr("src").and_then(|src| self.web_target(src)) else {
            return;
        };
        let alt = image.attr("alt").map(collapse_whitespace).unwrap_or_default();
        writer.raw(&format!("![{}]({})", alt, target));
    }

    /// Resolves a link or image reference to an absolute web URL
    fn web_target(&self, reference: &str) -> Option<Url> {
        if !is_navigable_href(reference) {
            return None;
        }
        resolve(self.base_url, reference).ok().filter(is_web_url)
    }
}

fn render_preformatted(pre: DomNode<'_>, writer: &mut MarkdownWriter) {
    let raw = pre.raw_text();
    let code = raw.strip_prefix('\n').unwrap_or(&raw).trim_end();
    if code.is_empty() {
        return;
    }

    let fence = if code.contains("```") { "````" } else { "```" };
    let language = code_language(pre).unwrap_or_default();

    writer.block_break();
    writer.raw(&format!("{}{}\n{}\n{}", fence, language, code, fence));
    writer.block_break();
}

/// Language named by a `language-*` or `lang-*` class on the block or its code
fn code_language(pre: DomNode<'_>) -> Option<String> {
    std::iter::once(pre)
        .chain(pre.children().filter(|child| child.is_tag("code")))
        .filter_map(|node| node.attr("class"))
        .flat_map(str::split_whitespace)
        .find_map(|class| {
            class
                .strip_prefix("language-")
                .or_else(|| class.strip_prefix("lang-"))
                .filter(|language| !language.is_empty())
                .map(str::to_string)
        })
}

fn render_inline_code(code: DomNode<'_>, writer: &mut MarkdownWriter) {
    let content = collapse_whitespace(&code.raw_text());
    if content.is_empty() {
        return;
    }

    if content.contains('`') {
        writer.raw(&format!("`` {} ``", content));
    } else {
        writer.raw(&format!("`{}`", content));
    }
}

fn format_row(cells: &[String]) -> String {
    format!("| {} |", cells.join(" | "))
}
