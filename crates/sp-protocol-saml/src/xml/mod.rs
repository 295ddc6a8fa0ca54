//! Namespace-aware XML helpers over `roxmltree`.
//!
//! Elements are always matched by `(namespace URI, local name)`. Matching on
//! the local name alone would let a decoy element from a foreign namespace be
//! read in place of the real one.

pub mod c14n;

use std::borrow::Cow;

use roxmltree::{Document, Node, ParsingOptions};

pub use c14n::{canonicalize, C14nOptions};

/// Parses untrusted XML. DTDs are refused, which rules out entity expansion.
///
/// # Errors
///
/// Returns the parser error for malformed input or any DOCTYPE.
pub fn parse(xml: &str) -> Result<Document<'_>, roxmltree::Error> {
    Document::parse_with_options(
        xml,
        ParsingOptions {
            allow_dtd: false,
            ..ParsingOptions::default()
        },
    )
}

/// Returns whether `node` is the element `{ns}local`.
#[must_use]
pub fn is_element(node: Node<'_, '_>, ns: &str, local: &str) -> bool {
    node.is_element() && node.tag_name().namespace() == Some(ns) && node.tag_name().name() == local
}

/// First child element `{ns}local`.
#[must_use]
pub fn child<'a, 'input>(node: Node<'a, 'input>, ns: &str, local: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| is_element(*c, ns, local))
}

/// All child elements `{ns}local`, in document order.
pub fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    ns: &'a str,
    local: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |c| is_element(*c, ns, local))
}

/// Concatenated descendant text, trimmed.
#[must_use]
pub fn text_content(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Non-empty trimmed text of the child element `{ns}local`.
#[must_use]
pub fn child_text(node: Node<'_, '_>, ns: &str, local: &str) -> Option<String> {
    child(node, ns, local)
        .map(text_content)
        .filter(|t| !t.is_empty())
}

/// Value of the `ID`-type attribute of an element, if any.
#[must_use]
pub fn id_attribute<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    node.attribute("ID")
        .or_else(|| node.attribute("Id"))
        .or_else(|| node.attribute("id"))
}

/// The qualified name of an element exactly as written in the source.
///
/// `roxmltree` resolves prefixes away, but canonical output must reproduce
/// them.
#[must_use]
pub fn element_qname<'a>(node: Node<'a, '_>) -> Cow<'a, str> {
    let input = node.document().input_text();
    let written = input
        .get(node.range().start + 1..)
        .map(|rest| {
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
                .unwrap_or(rest.len());
            &rest[..end]
        })
        .filter(|qname| qname.rsplit(':').next() == Some(node.tag_name().name()));

    match written {
        Some(qname) => Cow::Borrowed(qname),
        None => {
            let local = node.tag_name().name();
            match node
                .tag_name()
                .namespace()
                .and_then(|ns| node.lookup_prefix(ns))
                .filter(|p| !p.is_empty())
            {
                Some(prefix) => Cow::Owned(format!("{prefix}:{local}")),
                None => Cow::Borrowed(local),
            }
        }
    }
}

/// Escapes text for use in element content of generated documents.
#[must_use]
pub fn escape_text(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>']) {
        return Cow::Borrowed(value);
    }
    Cow::Owned(
        value
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    )
}

/// Escapes text for use in a double-quoted attribute of generated documents.
#[must_use]
pub fn escape_attr(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }
    Cow::Owned(
        value
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#39;"),
    )
}
