//! Tests for tree traversal, text content and `query_selector_all`.

use fontsieve_dom::{DomTree, NodeId, NodeType, SelectorParseError, query_selector_all};

/// Builds:
///
/// ```text
/// <html>
///   <body class="page">
///     <h1 id="title">Hi</h1>
///     <!--note-->
///     <p class="lead intro" data-x="1,2">Hello <b>bold</b></p>
///     <p lang="en-US">Second</p>
///     <input placeholder="Search">
///   </body>
/// </html>
/// ```
struct Fixture {
    tree: DomTree,
    body: NodeId,
    h1: NodeId,
    lead: NodeId,
    bold: NodeId,
    second: NodeId,
    input: NodeId,
}

fn fixture() -> Fixture {
    let mut tree = DomTree::new();
    let html = tree.append_element(NodeId::ROOT, "html", &[]);
    let body = tree.append_element(html, "body", &[("class", "page")]);
    let h1 = tree.append_element(body, "h1", &[("id", "title")]);
    let _ = tree.append_text(h1, "Hi");
    let comment = tree.alloc(NodeType::Comment("note".to_string()));
    tree.append_child(body, comment);
    let lead = tree.append_element(body, "p", &[("class", "lead intro"), ("data-x", "1,2")]);
    let _ = tree.append_text(lead, "Hello ");
    let bold = tree.append_element(lead, "b", &[]);
    let _ = tree.append_text(bold, "bold");
    let second = tree.append_element(body, "p", &[("lang", "en-US")]);
    let _ = tree.append_text(second, "Second");
    let input = tree.append_element(body, "input", &[("placeholder", "Search")]);

    Fixture {
        tree,
        body,
        h1,
        lead,
        bold,
        second,
        input,
    }
}

#[test]
fn test_text_content_concatenates_descendants() {
    let f = fixture();
    assert_eq!(f.tree.text_content(f.lead).as_deref(), Some("Hello bold"));
    assert_eq!(f.tree.text_content(f.input).as_deref(), Some(""));
    assert_eq!(f.tree.text_content(NodeId::ROOT), None);
    // Comments are not part of an element's text.
    assert_eq!(f.tree.text_content(f.body).as_deref(), Some("HiHello boldSecond"));
}

#[test]
fn test_node_names() {
    let f = fixture();
    assert_eq!(f.tree.node_name(NodeId::ROOT), Some("#document"));
    assert_eq!(f.tree.node_name(f.h1), Some("h1"));
    let text = f.tree.children(f.h1)[0];
    assert_eq!(f.tree.node_name(text), Some("#text"));
}

#[test]
fn test_type_class_id_queries() {
    let f = fixture();
    assert_eq!(query_selector_all(&f.tree, "p").unwrap(), vec![f.lead, f.second]);
    assert_eq!(query_selector_all(&f.tree, ".intro").unwrap(), vec![f.lead]);
    assert_eq!(query_selector_all(&f.tree, "#title").unwrap(), vec![f.h1]);
    assert_eq!(query_selector_all(&f.tree, "H1").unwrap(), vec![f.h1]);
}

#[test]
fn test_combinators() {
    let f = fixture();
    assert_eq!(query_selector_all(&f.tree, "body b").unwrap(), vec![f.bold]);
    assert_eq!(query_selector_all(&f.tree, "body > b").unwrap(), vec![]);
    assert_eq!(query_selector_all(&f.tree, "h1 + p").unwrap(), vec![f.lead]);
    assert_eq!(query_selector_all(&f.tree, "h1 ~ p").unwrap(), vec![f.lead, f.second]);
    assert_eq!(query_selector_all(&f.tree, ".page p > b").unwrap(), vec![f.bold]);
}

#[test]
fn test_attribute_selectors() {
    let f = fixture();
    assert_eq!(query_selector_all(&f.tree, r#"[data-x="1,2"]"#).unwrap(), vec![f.lead]);
    assert_eq!(query_selector_all(&f.tree, "[lang|=en]").unwrap(), vec![f.second]);
    assert_eq!(query_selector_all(&f.tree, "[class~=lead]").unwrap(), vec![f.lead]);
    assert_eq!(query_selector_all(&f.tree, "[placeholder^=Sea]").unwrap(), vec![f.input]);
    assert_eq!(query_selector_all(&f.tree, "[placeholder$=rch]").unwrap(), vec![f.input]);
    assert_eq!(query_selector_all(&f.tree, "[class*=ntr]").unwrap(), vec![f.lead]);
    assert_eq!(query_selector_all(&f.tree, "[class*='']").unwrap(), vec![]);
}

#[test]
fn test_selector_list_is_deduplicated_in_tree_order() {
    let f = fixture();
    assert_eq!(
        query_selector_all(&f.tree, "p, h1, .lead").unwrap(),
        vec![f.h1, f.lead, f.second]
    );
}

#[test]
fn test_universal_matches_every_element() {
    let f = fixture();
    let all = query_selector_all(&f.tree, "*").unwrap();
    assert_eq!(all.len(), 7);
    assert!(all.contains(&f.body));
}

#[test]
fn test_invalid_selectors_are_errors() {
    let f = fixture();
    assert!(matches!(
        query_selector_all(&f.tree, "a:hover"),
        Err(SelectorParseError::UnsupportedPseudo(_))
    ));
    assert!(query_selector_all(&f.tree, "p, ").is_err());
    assert!(query_selector_all(&f.tree, "p ! q").is_err());
}
