//! Combined patch validation
//!
//! Applies a patch and syntax-checks the result as one externally-atomic
//! operation, so downstream consumers (the evaluator, the human review UI)
//! only ever see patches that are at least structurally sound, and the
//! generator gets a literal, actionable error string on failure.

use serde::{Deserialize, Serialize};
use tree_sitter::{Node, Parser};

use crate::apply::apply;

/// Languages the structural check understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    /// Python (the default target language)
    #[default]
    Python,
    /// Rust
    Rust,
}

impl Language {
    /// Human-readable name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Rust => "rust",
        }
    }

    fn grammar(&self) -> tree_sitter::Language {
        match self {
            Language::Python => tree_sitter_python::LANGUAGE.into(),
            Language::Rust => tree_sitter_rust::LANGUAGE.into(),
        }
    }
}

/// Structural-correctness check over source text
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntaxCheck {
    language: Language,
}

impl SyntaxCheck {
    /// Create a check for the given language
    #[inline]
    #[must_use]
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    /// Language this check parses
    #[inline]
    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    /// Parse `source` and report the first structural defect, if any
    ///
    /// The returned string is the verbatim diagnostic handed back to the
    /// generator, shaped like `SyntaxError: <detail> at line <n>`.
    pub fn check(&self, source: &str) -> Result<(), String> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language.grammar())
            .map_err(|e| format!("ParserError: {e}"))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| "ParserError: parser produced no tree".to_string())?;

        let root = tree.root_node();
        if !root.has_error() {
            return Ok(());
        }

        match first_defect(root) {
            Some(node) if node.is_missing() => Err(format!(
                "SyntaxError: missing {} at line {}",
                node.kind(),
                node.start_position().row + 1
            )),
            Some(node) => Err(format!(
                "SyntaxError: invalid syntax at line {}",
                node.start_position().row + 1
            )),
            // has_error() without a reachable ERROR/MISSING node should not
            // happen; report the root so the failure is still visible
            None => Err(format!(
                "SyntaxError: invalid syntax at line {}",
                root.start_position().row + 1
            )),
        }
    }
}

/// Depth-first search for the first ERROR or MISSING node
fn first_defect(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if !child.has_error() && !child.is_missing() {
            continue;
        }
        if let Some(found) = first_defect(child) {
            return Some(found);
        }
    }
    None
}

/// Outcome of a single validate call
///
/// `error`, when present, is the verbatim underlying failure message; retry
/// loops feed it straight back to the generator, so it is never summarized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the patch applied and the result parsed
    pub valid: bool,
    /// Patched text, present only on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patched_text: Option<String>,
    /// Verbatim failure diagnostic, present only on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    fn ok(patched_text: String) -> Self {
        Self {
            valid: true,
            patched_text: Some(patched_text),
            error: None,
        }
    }

    fn fail(error: String) -> Self {
        Self {
            valid: false,
            patched_text: None,
            error: Some(error),
        }
    }
}

/// Applies a patch and syntax-checks the result in one step
#[derive(Debug, Clone, Copy, Default)]
pub struct PatchValidator {
    check: SyntaxCheck,
}

impl PatchValidator {
    /// Create a validator for the given language
    #[inline]
    #[must_use]
    pub fn new(language: Language) -> Self {
        Self {
            check: SyntaxCheck::new(language),
        }
    }

    /// Apply `patch` to `original` and verify the result parses
    ///
    /// Never call apply and syntax-check separately; this is the single
    /// validation seam of the workflow.
    pub fn validate(&self, original: &str, patch: &str) -> ValidationResult {
        let patched = match apply(original, patch) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(error = %e, "patch failed to apply");
                return ValidationResult::fail(format!("Failed to apply patch: {e}"));
            }
        };

        match self.check.check(&patched) {
            Ok(()) => ValidationResult::ok(patched),
            Err(diag) => {
                tracing::debug!(
                    language = self.check.language().name(),
                    error = %diag,
                    "patched text failed the structural check"
                );
                ValidationResult::fail(diag)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn syntax_check_accepts_valid_python() {
        let check = SyntaxCheck::new(Language::Python);
        assert!(check.check("def hello():\n    return 'world'\n").is_ok());
    }

    #[test]
    fn syntax_check_rejects_broken_python() {
        let check = SyntaxCheck::new(Language::Python);
        let err = check.check("def hello(:\n    return\n").unwrap_err();
        assert!(err.starts_with("SyntaxError:"), "got: {err}");
        assert!(err.contains("at line"), "got: {err}");
    }

    #[test]
    fn syntax_check_accepts_valid_rust() {
        let check = SyntaxCheck::new(Language::Rust);
        assert!(check.check("fn main() { println!(\"hi\"); }\n").is_ok());
    }

    #[test]
    fn syntax_check_rejects_broken_rust() {
        let check = SyntaxCheck::new(Language::Rust);
        assert!(check.check("fn main( {\n").is_err());
    }

    #[test]
    fn validate_success_returns_patched_text() {
        let validator = PatchValidator::new(Language::Python);
        let original = "def hello():\n    return 'world'";
        let patch = "@@ -1,2 +1,3 @@\n+# comment\n def hello():\n     return 'world'\n";
        let result = validator.validate(original, patch);
        assert!(result.valid);
        assert_eq!(
            result.patched_text.as_deref(),
            Some("# comment\ndef hello():\n    return 'world'")
        );
        assert_eq!(result.error, None);
    }

    #[test]
    fn validate_apply_failure_is_prefixed() {
        let validator = PatchValidator::new(Language::Python);
        let result = validator.validate("a\n", "@@ -9,1 +9,1 @@\n-x\n+y\n");
        assert!(!result.valid);
        assert!(result
            .error
            .as_deref()
            .unwrap()
            .starts_with("Failed to apply patch: "));
        assert_eq!(result.patched_text, None);
    }

    #[test]
    fn validate_syntax_failure_is_verbatim() {
        let validator = PatchValidator::new(Language::Python);
        let original = "def hello():\n    return 1\n";
        // Patch introduces an unterminated def
        let patch = "@@ -1,2 +1,2 @@\n-def hello():\n+def hello(:\n     return 1\n";
        let result = validator.validate(original, patch);
        assert!(!result.valid);
        let err = result.error.unwrap();
        assert!(err.starts_with("SyntaxError:"), "got: {err}");
    }

    #[test]
    fn validate_is_idempotent() {
        let validator = PatchValidator::new(Language::Python);
        let original = "x = 1\n";
        let patch = "@@ -1,1 +1,1 @@\n-x = 1\n+x = 2\n";
        let first = validator.validate(original, patch);
        let second = validator.validate(original, patch);
        assert_eq!(first, second);

        let bad = "@@ -1,1 +1,1 @@\n-x = 1\n+x = = 2\n";
        let first = validator.validate(original, bad);
        let second = validator.validate(original, bad);
        assert_eq!(first, second);
    }
}
