// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Helpers shared by the integration tests.

#![allow(dead_code)]

use roxmltree::{Document, Node};

/// Structural XML comparison: tags, attribute names, element children and
/// trimmed text must match. Whitespace-only text is ignored.
pub fn assert_xml_eq(expected: &str, actual: impl AsRef<[u8]>) {
    let actual = std::str::from_utf8(actual.as_ref()).expect("actual XML is not UTF-8");
    let expected_doc = Document::parse(expected.trim()).expect("expected XML does not parse");
    let actual_doc = Document::parse(actual).expect("actual XML does not parse");

    if let Err(msg) = compare(expected_doc.root_element(), actual_doc.root_element()) {
        panic!("{}\nexpected:\n{}\nactual:\n{}", msg, expected.trim(), actual);
    }
}

fn leading_text<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    node.first_child()
        .filter(|n| n.is_text())
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn compare(a: Node<'_, '_>, b: Node<'_, '_>) -> Result<(), String> {
    let tag = a.tag_name().name();
    if tag != b.tag_name().name() {
        return Err(format!("tag mismatch: {} vs {}", tag, b.tag_name().name()));
    }

    let mut attrs_a: Vec<_> = a.attributes().map(|at| at.name()).collect();
    let mut attrs_b: Vec<_> = b.attributes().map(|at| at.name()).collect();
    attrs_a.sort_unstable();
    attrs_b.sort_unstable();
    if attrs_a != attrs_b {
        return Err(format!("attribute mismatch [{}]: {:?} vs {:?}", tag, attrs_a, attrs_b));
    }

    let children_a: Vec<_> = a.children().filter(Node::is_element).collect();
    let children_b: Vec<_> = b.children().filter(Node::is_element).collect();
    if children_a.len() != children_b.len() {
        return Err(format!(
            "children mismatch [{}]: {} vs {}",
            tag,
            children_a.len(),
            children_b.len()
        ));
    }

    if leading_text(a) != leading_text(b) {
        return Err(format!(
            "text mismatch [{}]: {:?} vs {:?}",
            tag,
            leading_text(a),
            leading_text(b)
        ));
    }

    children_a
        .into_iter()
        .zip(children_b)
        .try_for_each(|(ca, cb)| compare(ca, cb))
}
