//! Markdown rendering and pagination of node details.

use serde::Serialize;
use std::fmt::Write;

use crate::graph::{GraphEntry, ReferenceGroup};

/// One page of rendered text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedPage {
    pub content: String,
    pub page: usize,
    pub total_pages: usize,
}

/// Render a graph entry as Markdown.
pub fn render_entry(entry: &GraphEntry) -> String {
    let node = &entry.node;
    let mut out = String::new();

    let _ = writeln!(out, "# {}", node.browse_name);
    out.push('\n');
    let _ = writeln!(out, "- **Node Class:** {}", node.node_class);
    let _ = writeln!(out, "- **Node Id:** `{}`", node.node_id);
    let _ = writeln!(out, "- **Browse Path:** {}", entry.browse_path);
    let _ = writeln!(out, "- **Display Name:** {}", node.display_name.text);
    if let Some(uri) = &node.namespace_uri {
        let _ = writeln!(out, "- **Namespace:** {}", uri);
    }
    if let Some(data_type) = &node.data_type {
        let _ = writeln!(out, "- **Data Type:** {}", data_type);
    }
    if let Some(value_rank) = node.value_rank {
        let _ = writeln!(out, "- **Value Rank:** {}", value_rank);
    }
    if let Some(is_abstract) = node.is_abstract {
        let _ = writeln!(out, "- **Abstract:** {}", is_abstract);
    }
    if let Some(symmetric) = node.symmetric {
        let _ = writeln!(out, "- **Symmetric:** {}", symmetric);
    }

    if let Some(description) = node.description.as_ref().filter(|d| !d.text.is_empty()) {
        out.push('\n');
        out.push_str("## Description\n\n");
        let _ = writeln!(out, "{}", description.text);
    }

    render_groups(&mut out, "Forward References", &entry.forward_references);
    render_groups(&mut out, "Inverse References", &entry.inverse_references);

    out
}

fn render_groups(out: &mut String, title: &str, groups: &[ReferenceGroup]) {
    out.push('\n');
    let _ = writeln!(out, "## {}", title);
    out.push('\n');

    if groups.is_empty() {
        out.push_str("_None_\n");
        return;
    }

    for (i, group) in groups.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "### {}", group.reference_type);
        for target in &group.targets {
            let _ = writeln!(out, "- {}", target);
        }
    }
}

/// Text shown for a node id that is not in the graph.
pub fn render_not_found(node_id: &str) -> String {
    format!(
        "# Not Found\n\nNode `{}` is not present in the loaded graph.\n",
        node_id
    )
}

/// Text shown for a document id that was never indexed.
pub fn render_unknown_document(id: usize) -> String {
    format!("# Not Found\n\nNo indexed document has id {}.\n", id)
}

/// Page `page` (1-based) of `text`, `page_size` lines per page.
///
/// Lines are split on `\n` and pages are joined back with `\n`, so the
/// pages of a text always reassemble into it. A final `\n` terminates the
/// last line instead of starting an empty one, and stays on the last page.
/// Pages outside `1..=total_pages` come back empty.
pub fn paginate(text: &str, page: usize, page_size: usize) -> RenderedPage {
    let page_size = page_size.max(1);
    let (body, terminated) = match text.strip_suffix('\n') {
        Some(body) => (body, true),
        None => (text, false),
    };
    let lines: Vec<&str> = body.split('\n').collect();
    let total_pages = lines.len().div_ceil(page_size);

    let content = if page == 0 || page > total_pages {
        String::new()
    } else {
        let start = (page - 1) * page_size;
        let end = (start + page_size).min(lines.len());
        let mut content = lines[start..end].join("\n");
        if terminated && page == total_pages {
            content.push('\n');
        }
        content
    };

    RenderedPage {
        content,
        page,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LocalizedText, NodeClass, NodeId, NodeRecord};

    fn entry() -> GraphEntry {
        let mut node = NodeRecord::new(NodeId::numeric(1, 101), NodeClass::Variable, "SerialNumber");
        node.data_type = Some("String".to_string());
        node.value_rank = Some(-1);
        node.description = Some(LocalizedText::new("Serial number of the motor"));
        GraphEntry {
            node,
            forward_references: Vec::new(),
            inverse_references: vec![ReferenceGroup {
                reference_type: "HasComponent".to_string(),
                targets: vec!["ns=1;i=100".to_string()],
            }],
            browse_path: "Motor1/SerialNumber".to_string(),
        }
    }

    #[test]
    fn test_render_entry() {
        let text = render_entry(&entry());
        assert!(text.starts_with("# SerialNumber\n"));
        assert!(text.contains("- **Node Class:** Variable\n"));
        assert!(text.contains("- **Node Id:** `ns=1;i=101`\n"));
        assert!(text.contains("- **Browse Path:** Motor1/SerialNumber\n"));
        assert!(text.contains("- **Data Type:** String\n"));
        assert!(text.contains("- **Value Rank:** -1\n"));
        assert!(!text.contains("Abstract"));
        assert!(text.contains("## Description\n\nSerial number of the motor\n"));
        assert!(text.contains("## Forward References\n\n_None_\n"));
        assert!(text.contains("## Inverse References\n\n### HasComponent\n- ns=1;i=100\n"));
    }

    #[test]
    fn test_paginate_reassembles() {
        let text = (1..=25).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n") + "\n";
        let first = paginate(&text, 1, 10);
        assert_eq!(first.total_pages, 3);

        let pages: Vec<String> = (1..=first.total_pages)
            .map(|p| paginate(&text, p, 10).content)
            .collect();
        assert_eq!(pages.join("\n"), text);
    }

    #[test]
    fn test_paginate_out_of_range() {
        let page = paginate("a\nb", 5, 10);
        assert_eq!(page.content, "");
        assert_eq!(page.total_pages, 1);
        assert_eq!(paginate("a\nb", 0, 10).content, "");
    }

    #[test]
    fn test_trailing_newline_adds_no_page() {
        let text = (1..=10).map(|i| format!("line {}\n", i)).collect::<String>();
        let page = paginate(&text, 1, 10);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.content, text);
        assert_eq!(paginate(&text, 2, 10).content, "");
    }

    #[test]
    fn test_single_page() {
        let page = paginate("short", 1, 1000);
        assert_eq!(page.content, "short");
        assert_eq!(page.total_pages, 1);
    }
}
