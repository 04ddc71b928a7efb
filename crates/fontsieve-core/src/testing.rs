//! In-memory declaration blocks and documents for unit tests.

use std::collections::HashMap;

use crate::model::{CssRule, DocumentModel, SelectorError, StyleDeclaration};

/// A declaration block built from `(name, value)` pairs. A trailing
/// `!important` in a value sets the priority flag.
#[derive(Debug, Clone, Default)]
pub struct Declarations {
    entries: Vec<(String, String, bool)>,
}

impl Declarations {
    #[must_use]
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        let mut block = Self::default();
        for (name, value) in pairs {
            let trimmed = value.trim_end();
            let (value, important) = match trimmed.strip_suffix("!important") {
                Some(rest) => (rest.trim_end(), true),
                None => (trimmed, false),
            };
            let existing = block.entries.iter().position(|(n, _, _)| n == name);
            if let Some(index) = existing {
                if block.entries[index].2 && !important {
                    continue;
                }
                let _ = block.entries.remove(index);
            }
            block
                .entries
                .push(((*name).to_string(), value.to_string(), important));
        }
        block
    }
}

impl StyleDeclaration for Declarations {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn item(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|(name, _, _)| name.as_str())
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, value, _)| value.as_str())
    }

    fn is_important(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _, important)| n == name && *important)
    }
}

/// One element of a [`TestDocument`].
#[derive(Debug, Clone, Default)]
pub struct TestNode {
    pub name: Option<String>,
    pub text: String,
    pub attributes: HashMap<String, String>,
    pub children: Vec<usize>,
    pub inline: Option<Declarations>,
}

/// A tiny document whose selector engine is a lookup table from selector
/// text to node indices.
#[derive(Debug, Default)]
pub struct TestDocument {
    pub nodes: Vec<TestNode>,
    pub font_faces: Vec<Declarations>,
    pub style_rules: Vec<(String, Declarations)>,
    pub selections: HashMap<String, Vec<usize>>,
}

impl TestDocument {
    /// A document holding only its root node (index 0).
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![TestNode {
                name: Some("#document".into()),
                ..TestNode::default()
            }],
            ..Self::default()
        }
    }

    /// Append an element with direct text content.
    pub fn element(&mut self, parent: usize, tag: &str, text: &str) -> usize {
        let id = self.nodes.len();
        self.nodes.push(TestNode {
            name: Some(tag.into()),
            text: text.into(),
            ..TestNode::default()
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Append a `#text` node.
    pub fn text(&mut self, parent: usize, text: &str) -> usize {
        self.element(parent, "#text", text)
    }

    /// Make `selector` select `nodes`.
    pub fn select(&mut self, selector: &str, nodes: &[usize]) {
        let _ = self.selections.insert(selector.into(), nodes.to_vec());
    }
}

impl DocumentModel for TestDocument {
    type Node = usize;
    type Declaration = Declarations;

    fn rules(&self) -> Vec<CssRule<'_, Declarations>> {
        self.font_faces
            .iter()
            .map(|style| CssRule::FontFace { style, base_url: None })
            .chain(self.style_rules.iter().map(|(selector_text, style)| CssRule::Style {
                selector_text,
                style,
            }))
            .collect()
    }

    fn root(&self) -> usize {
        0
    }

    fn query_selector_all(&self, selector: &str) -> Result<Vec<usize>, SelectorError> {
        if selector.contains('!') {
            return Err(SelectorError::Unsupported(selector.into()));
        }
        Ok(self.selections.get(selector).cloned().unwrap_or_default())
    }

    fn node_name(&self, node: usize) -> Option<&str> {
        self.nodes[node].name.as_deref()
    }

    fn children(&self, node: usize) -> &[usize] {
        &self.nodes[node].children
    }

    fn text_content(&self, node: usize) -> String {
        let mut text = self.nodes[node].text.clone();
        for &child in &self.nodes[node].children {
            text.push_str(&self.text_content(child));
        }
        text
    }

    fn attribute(&self, node: usize, name: &str) -> Option<&str> {
        self.nodes[node].attributes.get(name).map(String::as_str)
    }

    fn inline_style(&self, node: usize) -> Option<Declarations> {
        self.nodes[node].inline.clone()
    }
}
