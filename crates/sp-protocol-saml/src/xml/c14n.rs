//! XML canonicalization over `roxmltree` subtrees.
//!
//! Implements Canonical XML 1.0 and Exclusive XML Canonicalization 1.0, each
//! with or without comments. One node (normally the enveloped `ds:Signature`)
//! can be left out of the output.
//!
//! Output rules shared by both modes:
//! - empty elements are written as start/end tag pairs
//! - namespace declarations come first, default namespace before prefixes
//! - attributes follow, unqualified ones by local name, then qualified ones by
//!   `(namespace URI, local name)`
//!
//! Exclusive mode only declares namespaces that are visibly used by the element
//! or its attributes (plus the `InclusiveNamespaces` prefix list), and only when
//! the nearest rendered ancestor did not already declare the same binding.

use std::collections::BTreeMap;

use roxmltree::{Attribute, Node, NodeId, NodeType};

use super::element_qname;

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Canonicalization parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct C14nOptions<'a> {
    /// Exclusive (`true`) or inclusive C14N.
    pub exclusive: bool,
    /// Keep comment nodes.
    pub with_comments: bool,
    /// Exclusive mode `PrefixList`; `#default` names the default namespace.
    pub inclusive_prefixes: &'a [String],
    /// Node omitted from the output together with its subtree.
    pub exclude: Option<NodeId>,
}

/// prefix ("" for the default namespace) -> namespace URI
type NsScope = BTreeMap<String, String>;

/// Canonicalizes the subtree rooted at `node`.
///
/// A document node is treated as its root element.
#[must_use]
pub fn canonicalize(node: Node<'_, '_>, options: &C14nOptions<'_>) -> String {
    let mut out = String::new();
    let apex = if node.node_type() == NodeType::Root {
        node.document().root_element()
    } else {
        node
    };
    write_node(apex, options, &NsScope::new(), true, &mut out);
    out
}

fn write_node(node: Node<'_, '_>, opts: &C14nOptions<'_>, rendered: &NsScope, apex: bool, out: &mut String) {
    if Some(node.id()) == opts.exclude {
        return;
    }

    match node.node_type() {
        NodeType::Element => write_element(node, opts, rendered, apex, out),
        NodeType::Text => escape_text_into(node.text().unwrap_or_default(), out),
        NodeType::Comment => {
            if opts.with_comments {
                out.push_str("<!--");
                out.push_str(node.text().unwrap_or_default());
                out.push_str("-->");
            }
        }
        NodeType::PI => {
            if let Some(pi) = node.pi() {
                out.push_str("<?");
                out.push_str(pi.target);
                if let Some(value) = pi.value.filter(|v| !v.is_empty()) {
                    out.push(' ');
                    out.push_str(value);
                }
                out.push_str("?>");
            }
        }
        NodeType::Root => {}
    }
}

fn write_element(node: Node<'_, '_>, opts: &C14nOptions<'_>, rendered: &NsScope, apex: bool, out: &mut String) {
    let qname = element_qname(node);
    let prefix = qname.split_once(':').map_or("", |(p, _)| p);

    let decls = if opts.exclusive {
        exclusive_declarations(node, prefix, opts.inclusive_prefixes, rendered)
    } else {
        inclusive_declarations(node, rendered)
    };

    out.push('<');
    out.push_str(&qname);
    for (ns_prefix, uri) in &decls {
        if ns_prefix.is_empty() {
            out.push_str(" xmlns=\"");
        } else {
            out.push_str(" xmlns:");
            out.push_str(ns_prefix);
            out.push_str("=\"");
        }
        escape_attr_into(uri, out);
        out.push('"');
    }

    let mut attrs: Vec<(Option<&str>, &str, String, &str)> = node
        .attributes()
        .map(|a| (a.namespace(), a.name(), attribute_qname(node, &a), a.value()))
        .collect();

    // Canonical XML (not exclusive) carries xml:* attributes down to a subset apex.
    if apex && !opts.exclusive {
        for ancestor in node.ancestors().skip(1) {
            for a in ancestor.attributes().filter(|a| a.namespace() == Some(XML_NS)) {
                if !attrs.iter().any(|(ns, local, _, _)| *ns == Some(XML_NS) && *local == a.name()) {
                    attrs.push((Some(XML_NS), a.name(), format!("xml:{}", a.name()), a.value()));
                }
            }
        }
    }

    attrs.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
    for (_, _, name, value) in &attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attr_into(value, out);
        out.push('"');
    }
    out.push('>');

    let mut scope = rendered.clone();
    scope.extend(decls);
    for child in node.children() {
        write_node(child, opts, &scope, false, out);
    }

    out.push_str("</");
    out.push_str(&qname);
    out.push('>');
}

fn exclusive_declarations(
    node: Node<'_, '_>,
    element_prefix: &str,
    inclusive_prefixes: &[String],
    rendered: &NsScope,
) -> NsScope {
    let mut needed = NsScope::new();

    let element_ns = node.tag_name().namespace().unwrap_or_default();
    needed.insert(element_prefix.to_string(), element_ns.to_string());

    for attr in node.attributes() {
        if let Some(ns) = attr.namespace().filter(|ns| *ns != XML_NS) {
            let qname = attribute_qname(node, &attr);
            if let Some((p, _)) = qname.split_once(':') {
                needed.insert(p.to_string(), ns.to_string());
            }
        }
    }

    for listed in inclusive_prefixes {
        if listed == "#default" {
            let uri = node.lookup_namespace_uri(None).unwrap_or_default();
            needed.entry(String::new()).or_insert_with(|| uri.to_string());
        } else if listed != "xml" {
            if let Some(uri) = node.lookup_namespace_uri(Some(listed.as_str())) {
                needed.entry(listed.clone()).or_insert_with(|| uri.to_string());
            }
        }
    }

    needed
        .into_iter()
        .filter(|(p, uri)| differs_from_rendered(rendered, p, uri))
        .collect()
}

fn inclusive_declarations(node: Node<'_, '_>, rendered: &NsScope) -> NsScope {
    let mut in_scope = NsScope::new();
    for ns in node.namespaces() {
        let p = ns.name().unwrap_or_default();
        if p == "xml" {
            continue;
        }
        in_scope.insert(p.to_string(), ns.uri().to_string());
    }
    in_scope.entry(String::new()).or_default();

    in_scope
        .into_iter()
        .filter(|(p, uri)| differs_from_rendered(rendered, p, uri))
        .collect()
}

fn differs_from_rendered(rendered: &NsScope, prefix: &str, uri: &str) -> bool {
    match rendered.get(prefix) {
        Some(existing) => existing != uri,
        // An empty default namespace is the initial state and needs no xmlns="".
        None => !(prefix.is_empty() && uri.is_empty()),
    }
}

/// The attribute's qualified name as written, so prefixes sharing a URI stay distinct.
fn attribute_qname(node: Node<'_, '_>, attr: &Attribute<'_, '_>) -> String {
    let local = attr.name();
    let Some(ns) = attr.namespace() else {
        return local.to_string();
    };
    if ns == XML_NS {
        return format!("xml:{local}");
    }

    let written = node
        .document()
        .input_text()
        .get(attr.range_qname())
        .filter(|qname| qname.split_once(':').is_some_and(|(_, l)| l == local));
    if let Some(qname) = written {
        return qname.to_string();
    }

    match node
        .namespaces()
        .find(|n| n.uri() == ns && n.name().is_some())
        .and_then(|n| n.name())
    {
        Some(p) => format!("{p}:{local}"),
        None => local.to_string(),
    }
}

fn escape_text_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr_into(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(c),
        }
    }
}
