//! Patchflow Diff - unified diff engine and patch validation
//!
//! Pure, synchronous building blocks of the patch workflow:
//! - Parses unified-diff hunks (`@@ -a,b +c,d @@` grammar)
//! - Applies them to text in a single left-to-right pass
//! - Validates a patch end to end: apply, then structural syntax check
//!
//! # Example
//!
//! ```rust
//! use patchflow_diff::{PatchValidator, Language};
//!
//! let validator = PatchValidator::new(Language::Python);
//! let result = validator.validate(
//!     "def hello():\n    return 'world'",
//!     "@@ -1,2 +1,3 @@\n+# comment\n def hello():\n     return 'world'\n",
//! );
//! assert!(result.valid);
//! ```

#![warn(unreachable_pub)]

pub mod apply;
pub mod error;
pub mod hunk;
pub mod validate;

// Re-exports for convenience
pub use apply::{apply, apply_hunks};
pub use error::PatchError;
pub use hunk::{parse_patch, Hunk, HunkLine};
pub use validate::{Language, PatchValidator, SyntaxCheck, ValidationResult};
