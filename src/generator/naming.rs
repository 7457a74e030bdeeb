use std::collections::HashSet;

use heck::ToSnakeCase;

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub",
    "ref", "return", "self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Turn an arbitrary test or file name into a snake_case identifier.
pub fn ident(raw: &str) -> String {
    let snake = raw.to_snake_case();
    let mut out = String::with_capacity(snake.len());
    for c in snake.chars() {
        let c = if c.is_ascii_alphanumeric() { c } else { '_' };
        if c == '_' && (out.is_empty() || out.ends_with('_')) {
            continue;
        }
        out.push(c);
    }
    while out.ends_with('_') {
        out.pop();
    }

    if out.is_empty() {
        return "test_unnamed".to_string();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) || KEYWORDS.contains(&out.as_str()) {
        out.insert_str(0, "test_");
    }
    out
}

/// Hands out identifiers, suffixing repeats with `_2`, `_3`, ...
#[derive(Debug, Default)]
pub struct UniqueNames {
    used: HashSet<String>,
}

impl UniqueNames {
    /// Start with `names` already taken.
    pub fn with_reserved(names: &[&str]) -> Self {
        Self {
            used: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    pub fn claim(&mut self, raw: &str) -> String {
        let base = ident(raw);
        if self.used.insert(base.clone()) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}_{n}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}
