//! Declaration blocks.
//!
//! [CSSOM § 6.6.1 CSS declaration blocks](https://www.w3.org/TR/cssom-1/#css-declaration-blocks)

use fontsieve_core::StyleDeclaration;

/// [CSS Syntax 3 § 5.4.6 Consume a declaration](https://www.w3.org/TR/css-syntax-3/#consume-declaration)
///
/// A single `name: value` pair. The value is kept as written, minus the
/// surrounding whitespace and the `!important` annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Property name, ASCII-lowercased unless it is a custom property.
    pub name: String,
    /// Value text.
    pub value: String,
    /// Whether the declaration carries `!important`.
    pub important: bool,
}

impl Declaration {
    /// Build a declaration, normalizing the property name.
    #[must_use]
    pub fn new(name: &str, value: &str, important: bool) -> Self {
        let name = name.trim();
        // [CSS Variables § 2](https://www.w3.org/TR/css-variables-1/#defining-variables)
        // "Custom properties are ... case-sensitive."
        let name = if name.starts_with("--") {
            name.to_string()
        } else {
            name.to_ascii_lowercase()
        };
        Self {
            name,
            value: value.trim().to_string(),
            important,
        }
    }
}

/// An ordered set of declarations, one per property name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationBlock {
    declarations: Vec<Declaration>,
}

impl DeclarationBlock {
    /// An empty block.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            declarations: Vec::new(),
        }
    }

    /// [CSSOM § 6.6.1](https://www.w3.org/TR/cssom-1/#css-declaration-blocks)
    ///
    /// Add a declaration the way parsing a block does: a later declaration of
    /// the same property replaces the earlier one and moves to the end,
    /// unless the earlier one is `!important` and the later one is not.
    pub fn push(&mut self, declaration: Declaration) {
        if let Some(index) = self
            .declarations
            .iter()
            .position(|existing| existing.name == declaration.name)
        {
            if self.declarations[index].important && !declaration.important {
                return;
            }
            let _ = self.declarations.remove(index);
        }
        self.declarations.push(declaration);
    }

    /// The declarations in order.
    #[must_use]
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    fn find(&self, name: &str) -> Option<&Declaration> {
        self.declarations
            .iter()
            .find(|declaration| {
                if name.starts_with("--") {
                    declaration.name == name
                } else {
                    declaration.name.eq_ignore_ascii_case(name)
                }
            })
    }
}

impl FromIterator<Declaration> for DeclarationBlock {
    fn from_iter<I: IntoIterator<Item = Declaration>>(iter: I) -> Self {
        let mut block = Self::new();
        for declaration in iter {
            block.push(declaration);
        }
        block
    }
}

impl StyleDeclaration for DeclarationBlock {
    fn len(&self) -> usize {
        self.declarations.len()
    }

    fn item(&self, index: usize) -> Option<&str> {
        self.declarations
            .get(index)
            .map(|declaration| declaration.name.as_str())
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.find(name).map(|declaration| declaration.value.as_str())
    }

    fn is_important(&self, name: &str) -> bool {
        self.find(name).is_some_and(|declaration| declaration.important)
    }
}
