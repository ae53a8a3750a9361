//! Text assembly helpers for generated TypeScript.

use std::collections::{BTreeMap, BTreeSet};

/// Statement lines with indentation relative to wherever the block lands.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Block {
    lines: Vec<(usize, String)>,
}

impl Block {
    pub fn line(&mut self, text: impl Into<String>) -> &mut Self {
        self.indented(0, text)
    }

    pub fn indented(&mut self, depth: usize, text: impl Into<String>) -> &mut Self {
        self.lines.push((depth, text.into()));
        self
    }
}

/// Indentation-aware string builder.
pub(crate) struct SourceWriter {
    out: String,
    unit: String,
    depth: usize,
}

impl SourceWriter {
    pub fn new(unit: &str) -> Self {
        Self {
            out: String::new(),
            unit: unit.to_owned(),
            depth: 0,
        }
    }

    pub fn line(&mut self, text: &str) {
        self.write_at(self.depth, text);
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// Write `text` and indent everything after it.
    pub fn open(&mut self, text: &str) {
        self.line(text);
        self.depth += 1;
    }

    /// Dedent, then write `text`.
    pub fn close(&mut self, text: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(text);
    }

    pub fn block(&mut self, block: &Block) {
        for (depth, text) in &block.lines {
            self.write_at(self.depth + depth, text);
        }
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn write_at(&mut self, depth: usize, text: &str) {
        if !text.is_empty() {
            for _ in 0..depth {
                self.out.push_str(&self.unit);
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }
}

/// Named imports, grouped per module.
///
/// Both levels are ordered, so rendering is deterministic regardless of the
/// order in which rules ask for imports.
#[derive(Debug, Default, Clone)]
pub(crate) struct ImportSet {
    modules: BTreeMap<String, BTreeSet<String>>,
}

impl ImportSet {
    pub fn add(&mut self, module: &str, name: &str) {
        self.modules
            .entry(module.to_owned())
            .or_default()
            .insert(name.to_owned());
    }

    pub fn contains(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    pub fn modules(&self) -> BTreeSet<String> {
        self.modules.keys().cloned().collect()
    }

    pub fn render(&self) -> Vec<String> {
        self.modules
            .iter()
            .map(|(module, names)| {
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                format!("import {{ {} }} from {};", names.join(", "), ts_string(module))
            })
            .collect()
    }
}

/// A double-quoted TypeScript string literal.
pub(crate) fn ts_string(text: &str) -> String {
    serde_json::Value::String(text.to_owned()).to_string()
}

/// Collapse `text` onto one line so it is safe inside a `//` comment.
pub(crate) fn comment_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
