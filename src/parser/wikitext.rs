//! Tree-based flattening with `parse_wiki_text`.

use std::sync::LazyLock;

use parse_wiki_text::{Configuration, Node};

static CONFIGURATION: LazyLock<Configuration> = LazyLock::new(Configuration::default);

/// Parse `raw` and flatten it to text: templates, tags, tables, media and
/// categories vanish, links become their display text.
pub fn flatten(raw: &str) -> String {
    let output = CONFIGURATION.parse(raw);
    let mut out = String::with_capacity(raw.len());
    push_nodes(&output.nodes, &mut out);
    out
}

fn push_nodes(nodes: &[Node<'_>], out: &mut String) {
    for node in nodes {
        push_node(node, out);
    }
}

fn push_node(node: &Node<'_>, out: &mut String) {
    match node {
        Node::Text { value, .. } => out.push_str(value),
        Node::CharacterEntity { character, .. } => out.push(*character),
        Node::Link { target, text, .. } => {
            if text.is_empty() {
                out.push_str(target);
            } else {
                push_nodes(text, out);
            }
        }
        Node::ExternalLink { nodes, .. } => {
            let mut inner = String::new();
            push_nodes(nodes, &mut inner);
            // "[url label]" keeps the label; a bare "[url]" has nothing to show.
            if let Some((_, label)) = inner.trim().split_once(char::is_whitespace) {
                out.push_str(label.trim());
            }
        }
        Node::Heading { nodes, .. } => {
            out.push('\n');
            push_nodes(nodes, out);
            out.push('\n');
        }
        Node::ParagraphBreak { .. } => out.push_str("\n\n"),
        Node::HorizontalDivider { .. } => out.push('\n'),
        Node::OrderedList { items, .. } | Node::UnorderedList { items, .. } => {
            for item in items {
                out.push('\n');
                push_nodes(&item.nodes, out);
            }
            out.push('\n');
        }
        Node::DefinitionList { items, .. } => {
            for item in items {
                out.push('\n');
                push_nodes(&item.nodes, out);
            }
            out.push('\n');
        }
        Node::Preformatted { nodes, .. } => {
            out.push('\n');
            push_nodes(nodes, out);
            out.push('\n');
        }
        // The parser has already eaten the newlines around a table or gallery.
        Node::Table { .. } => out.push_str("\n\n"),
        Node::Tag { name, .. } if name.eq_ignore_ascii_case("gallery") => out.push('\n'),
        // Templates, other tags, images, categories, comments, redirects,
        // magic words, parameters and bold/italic toggles.
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_display_text_wins() {
        assert_eq!(flatten("Go to [[Lyon Airport|Lyon]].").trim(), "Go to Lyon.");
    }

    #[test]
    fn templates_and_tags_vanish() {
        let flat = flatten("Old fort{{listing|name=Fort}}<ref>Guide</ref> on the hill.");
        assert!(flat.contains("Old fort"), "{flat}");
        assert!(flat.contains("on the hill."), "{flat}");
        assert!(!flat.contains("Guide"), "{flat}");
        assert!(!flat.contains("listing"), "{flat}");
    }

    #[test]
    fn table_leaves_a_break() {
        let flat = flatten("Before.\n{|\n| a || b\n|}\nAfter.");
        let lines: Vec<&str> = flat.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        assert_eq!(lines, ["Before.", "After."], "{flat}");
    }

    #[test]
    fn list_items_on_separate_lines() {
        let flat = flatten("Sights:\n* Fort\n* Harbour\n");
        let lines: Vec<&str> = flat.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        assert!(lines.contains(&"Fort"), "{flat}");
        assert!(lines.contains(&"Harbour"), "{flat}");
    }
}
