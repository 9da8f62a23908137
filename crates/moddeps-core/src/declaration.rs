//! Extraction of a module's self-declaration from its source text
//!
//! Modules announce themselves with a chained call:
//!
//! ```text
//! base.defineModule('timeline_view')
//!     .stylesheet('timeline_view')
//!     .dependsOn('timeline', 'overlay')
//!     .exportsTo('tracing', function() { ... });
//! ```
//!
//! Only the call chain is scanned. Everything around it, including the body
//! passed to `exportsTo`, is ignored. `//` and `/* */` comments are blanked
//! out first, so a declaration quoted in a comment is never picked up.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref COMMENT_OR_STRING: Regex = Regex::new(
        r#"//[^\n]*|/\*(?s:.*?)(?:\*/|\z)|'(?:[^'\\\n]|\\.)*'|"(?:[^"\\\n]|\\.)*""#
    )
    .unwrap();
    static ref DEFINE_MODULE: Regex =
        Regex::new(r#"defineModule\s*\(\s*(?:'([^']*)'|"([^"]*)")\s*\)"#).unwrap();
    static ref CLAUSE_START: Regex = Regex::new(r"^\s*\.\s*([A-Za-z_$][\w$]*)\s*\(").unwrap();
    static ref SINGLE_NAME_ARGS: Regex =
        Regex::new(r#"^\s*(?:'([^']*)'|"([^"]*)")\s*\)"#).unwrap();
    static ref NAME_LIST_ARGS: Regex = Regex::new(r"^([^)]*)\)").unwrap();
    static ref QUOTED_NAME: Regex = Regex::new(r#"'([^']*)'|"([^"]*)""#).unwrap();
}

/// The (name, stylesheets, dependencies) triple declared by a module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub style_sheet_names: Vec<String>,
    pub dependent_module_names: Vec<String>,
}

/// Clauses that may follow `defineModule(...)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clause {
    Stylesheet,
    DependsOn,
    ExportsTo,
}

impl Clause {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "stylesheet" => Some(Clause::Stylesheet),
            "dependsOn" => Some(Clause::DependsOn),
            "exportsTo" => Some(Clause::ExportsTo),
            _ => None,
        }
    }
}

/// Locate and parse the first `defineModule(...)` chain in `text`.
///
/// Returns `None` when the text contains no declaration. Clauses are read
/// until the chain ends, an unknown call is reached, or `exportsTo` begins.
pub fn parse_declaration(text: &str) -> Option<Declaration> {
    let text = blank_comments(text);
    let define = DEFINE_MODULE.captures(&text)?;
    let whole = define.get(0)?;

    let mut declaration = Declaration {
        name: quoted_value(&define),
        ..Declaration::default()
    };

    let mut rest = &text[whole.end()..];
    while let Some(clause) = CLAUSE_START.captures(rest) {
        let Some(kind) = Clause::from_keyword(&clause[1]) else {
            break;
        };
        let after_open = &rest[clause.get(0).map_or(0, |m| m.end())..];

        match kind {
            Clause::Stylesheet => {
                let Some(args) = SINGLE_NAME_ARGS.captures(after_open) else {
                    break;
                };
                declaration.style_sheet_names.push(quoted_value(&args));
                rest = &after_open[args.get(0).map_or(0, |m| m.end())..];
            }
            Clause::DependsOn => {
                let Some(args) = NAME_LIST_ARGS.captures(after_open) else {
                    break;
                };
                declaration.dependent_module_names.extend(
                    QUOTED_NAME
                        .captures_iter(&args[1])
                        .map(|name| quoted_value(&name)),
                );
                rest = &after_open[args.get(0).map_or(0, |m| m.end())..];
            }
            // The exported body is opaque and ends the declaration.
            Clause::ExportsTo => break,
        }
    }

    Some(declaration)
}

/// Replace every comment with whitespace, keeping line breaks.
///
/// String literals are matched too so that `//` inside quotes survives.
fn blank_comments(text: &str) -> Cow<'_, str> {
    COMMENT_OR_STRING.replace_all(text, |caps: &Captures<'_>| {
        let span = &caps[0];
        if span.starts_with('/') {
            span.chars()
                .map(|c| if c == '\n' { '\n' } else { ' ' })
                .collect::<String>()
        } else {
            span.to_string()
        }
    })
}

/// Value of whichever quote alternative matched
fn quoted_value(captures: &Captures<'_>) -> String {
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
