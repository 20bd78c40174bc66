#![forbid(unsafe_code)]

//! # Pseudo Grammar Library
//!
//! Structural grammar and translator for the pseudo teaching language.
//!
//! ## Overview
//!
//! Programs are line oriented. Each line is classified once into a
//! [`statement::Statement`]; both consumers below work from that classification.
//!
//! - **Validator** ([`validator::validate`]): checks the `Algorithm`/`EndAlgorithm`
//!   envelope, block nesting and statement shapes, collecting every issue in one pass.
//!   Only errors block translation; indentation findings are warnings.
//! - **Transpiler** ([`transpiler::translate`]): emits the script form executed by
//!   `pseudo-impl`, one generated line per source line, with a line mapping for
//!   error localization.
//!
//! ## Quick Start
//!
//! ```
//! use pseudo_grammar::{translate, validate};
//!
//! let source = "Algorithm Demo\nvar x = 5\nprint x\nEndAlgorithm";
//! assert!(validate(source).is_empty());
//!
//! let program = translate(source);
//! assert_eq!(program.mapping.len(), 4);
//! assert!(program.code.contains("print(x);"));
//! ```
//!
//! ## Modules
//!
//! - [`line`]: numbered source lines and indentation width
//! - [`expr`]: operator rewriting inside expressions
//! - [`statement`]: the statement vocabulary
//! - [`validator`]: structural checks
//! - [`transpiler`]: code generation and line mapping

pub mod expr;
pub mod line;
pub mod statement;
pub mod transpiler;
pub mod validator;

pub use transpiler::{translate, try_translate, MappingEntry, TranslateError, TranslatedProgram};
pub use validator::{has_errors, validate, IssueKind, ValidationIssue};
