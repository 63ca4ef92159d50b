//! Tests for tree construction, mutation, and the source interchange format.

use marten_dom::{DomTree, ElementData, NodeId, NodeType, SourceNode};

/// Helper to create an element node and return its `NodeId`.
fn alloc_element(tree: &mut DomTree, tag: &str) -> NodeId {
    tree.alloc(NodeType::Element(ElementData::new(tag, &[])))
}

#[test]
fn test_append_links_siblings() {
    let mut tree = DomTree::new();
    let parent = alloc_element(&mut tree, "div");
    tree.append_child(NodeId::ROOT, parent);

    let a = alloc_element(&mut tree, "a");
    let b = alloc_element(&mut tree, "b");
    tree.append_child(parent, a);
    tree.append_child(parent, b);

    assert_eq!(tree.children(parent), &[a, b]);
    assert_eq!(tree.next_sibling(a), Some(b));
    assert_eq!(tree.prev_sibling(b), Some(a));
    assert_eq!(tree.parent(b), Some(parent));
}

#[test]
fn test_remove_child_middle_of_three() {
    let mut tree = DomTree::new();
    let parent = alloc_element(&mut tree, "div");
    tree.append_child(NodeId::ROOT, parent);

    let a = alloc_element(&mut tree, "a");
    let b = alloc_element(&mut tree, "b");
    let c = alloc_element(&mut tree, "c");
    tree.append_child(parent, a);
    tree.append_child(parent, b);
    tree.append_child(parent, c);

    tree.remove_child(parent, b);

    assert_eq!(tree.children(parent), &[a, c]);
    assert_eq!(tree.next_sibling(a), Some(c));
    assert_eq!(tree.prev_sibling(c), Some(a));
    assert_eq!(tree.parent(b), None);
}

#[test]
fn test_set_text_content_replaces_children() {
    let mut tree = DomTree::new();
    let p = alloc_element(&mut tree, "p");
    tree.append_child(NodeId::ROOT, p);
    let _ = tree.append(p, NodeType::Text("old".to_string()));
    let em = tree.append(p, NodeType::Element(ElementData::new("em", &[])));

    let text = tree.set_text_content(p, "new");

    assert_eq!(tree.children(p), &[text]);
    assert_eq!(tree.as_text(text), Some("new"));
    assert_eq!(tree.parent(em), None);
}

#[test]
fn test_body_lookup() {
    let source = SourceNode::element(
        "html",
        vec![
            SourceNode::element("head", vec![]),
            SourceNode::element("body", vec![SourceNode::text("hi")]),
        ],
    );
    let tree = DomTree::from_source(&source);

    let html = tree.document_element().unwrap();
    let body = tree.body().unwrap();
    assert_eq!(tree.as_element(html).unwrap().tag_name, "html");
    assert_eq!(tree.as_element(body).unwrap().tag_name, "body");
    assert_eq!(tree.parent(body), Some(html));
}

#[test]
fn test_source_from_json_keeps_attribute_order() {
    let json = r##"{
        "type": "document",
        "children": [
            { "type": "element", "tag": "div",
              "attrs": [["id", "main"], ["class", "a b"], ["bgcolor", "#ff0000"]],
              "children": [
                { "type": "comment", "text": "skip me" },
                { "type": "text", "text": "hello" }
              ] }
        ]
    }"##;
    let source: SourceNode = serde_json::from_str(json).unwrap();
    let tree = DomTree::from_source(&source);

    let div = tree.document_element().unwrap();
    let data = tree.as_element(div).unwrap();
    let names: Vec<&str> = data.attrs.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(names, ["id", "class", "bgcolor"]);
    assert_eq!(data.id(), Some("main"));
    assert_eq!(data.classes().collect::<Vec<_>>(), ["a", "b"]);
    assert_eq!(tree.children(div).len(), 2);
}

#[test]
fn test_descendants_in_document_order() {
    let source = SourceNode::element(
        "body",
        vec![
            SourceNode::element("p", vec![SourceNode::element("span", vec![])]),
            SourceNode::element("p", vec![]),
        ],
    );
    let tree = DomTree::from_source(&source);
    let tags: Vec<String> = tree
        .descendants_inclusive(NodeId::ROOT)
        .into_iter()
        .filter_map(|id| tree.as_element(id).map(|e| e.tag_name.clone()))
        .collect();
    assert_eq!(tags, ["body", "p", "span", "p"]);
}
