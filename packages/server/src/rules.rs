//! Static validation of source code against a problem's header/function
//! rules.
//!
//! This is a textual scan, not a compile step: `#include` directives are
//! parsed for header names, and call-like identifiers (an identifier followed
//! by `(` that is not a definition site) are collected as function usage.

use sea_orm::prelude::StringLen;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a header/function name list is interpreted.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleMode {
    /// The list is exhaustive: anything detected outside it is a violation.
    #[sea_orm(string_value = "ALLOWED")]
    Allowed,
    /// The list is a deny list: anything detected inside it is a violation.
    #[sea_orm(string_value = "DISALLOWED")]
    Disallowed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    Header,
    Function,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => f.write_str("header"),
            Self::Function => f.write_str("function"),
        }
    }
}

/// A single detected rule violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub name: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}` is not permitted", self.kind, self.name)
    }
}

/// Render violations for a validation error message.
pub fn describe(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check `code` against both rule lists and collect every violation.
pub fn validate_code(
    code: &str,
    header_mode: RuleMode,
    headers: &[String],
    function_mode: RuleMode,
    functions: &[String],
) -> Vec<Violation> {
    let mut violations = Vec::new();

    for header in included_headers(code) {
        let listed = headers.iter().any(|h| *h == header);
        let violated = match header_mode {
            RuleMode::Allowed => !listed,
            RuleMode::Disallowed => listed,
        };
        if violated {
            violations.push(Violation {
                kind: ViolationKind::Header,
                name: header,
            });
        }
    }

    for function in called_functions(code) {
        let listed = functions.iter().any(|f| *f == function);
        let violated = match function_mode {
            RuleMode::Allowed => !listed,
            RuleMode::Disallowed => listed,
        };
        if violated {
            violations.push(Violation {
                kind: ViolationKind::Function,
                name: function,
            });
        }
    }

    violations
}

/// Header names pulled from `#include <...>` / `#include "..."` directives.
fn included_headers(code: &str) -> Vec<String> {
    let mut headers = Vec::new();
    for line in code.lines() {
        let line = line.trim_start();
        let Some(rest) = line.strip_prefix('#') else {
            continue;
        };
        let Some(rest) = rest.trim_start().strip_prefix("include") else {
            continue;
        };
        let rest = rest.trim_start();
        let name = if let Some(inner) = rest.strip_prefix('<') {
            inner.split('>').next()
        } else if let Some(inner) = rest.strip_prefix('"') {
            inner.split('"').next()
        } else {
            None
        };
        if let Some(name) = name {
            let name = name.trim().to_string();
            if !name.is_empty() && !headers.contains(&name) {
                headers.push(name);
            }
        }
    }
    headers
}

/// Keywords that look like calls but never are.
const KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "do", "switch", "return", "sizeof", "defined",
];

/// Call-site identifiers in `code`, excluding functions the code defines
/// itself (a definition has `{` after the matching close paren).
fn called_functions(code: &str) -> Vec<String> {
    let bytes = code.as_bytes();
    let mut calls: Vec<String> = Vec::new();
    let mut defined: Vec<String> = Vec::new();

    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_alphabetic() || c == b'_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            // Not a fresh token if glued to a preceding digit (e.g. `2foo`).
            if start > 0 && bytes[start - 1].is_ascii_digit() {
                continue;
            }
            let ident = &code[start..i];
            let mut j = i;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < bytes.len() && bytes[j] == b'(' && !KEYWORDS.contains(&ident) {
                if is_definition_site(bytes, j) {
                    if !defined.contains(&ident.to_string()) {
                        defined.push(ident.to_string());
                    }
                } else if !calls.contains(&ident.to_string()) {
                    calls.push(ident.to_string());
                }
            }
        } else {
            i += 1;
        }
    }

    calls.retain(|name| !defined.contains(name));
    calls
}

/// `open` points at `(`. A definition site has `{` right after the matching
/// close paren.
fn is_definition_site(bytes: &[u8], open: usize) -> bool {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    let mut j = i + 1;
                    while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                        j += 1;
                    }
                    return j < bytes.len() && bytes[j] == b'{';
                }
            }
            _ => {}
        }
        i += 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(violations: &[Violation]) -> Vec<&str> {
        violations.iter().map(|v| v.name.as_str()).collect()
    }

    const NO_LIST: &[String] = &[];

    #[test]
    fn test_disallowed_header_detected() {
        let code = "#include <stdio.h>\n#include <string.h>\nint main() { return 0; }\n";
        let deny = vec!["string.h".to_string()];
        let violations =
            validate_code(code, RuleMode::Disallowed, &deny, RuleMode::Disallowed, NO_LIST);
        assert_eq!(names(&violations), vec!["string.h"]);
        assert_eq!(violations[0].kind, ViolationKind::Header);
    }

    #[test]
    fn test_allowed_header_complement_detected() {
        let code = "#include <stdio.h>\n#include \"math.h\"\n";
        let allow = vec!["stdio.h".to_string()];
        let violations =
            validate_code(code, RuleMode::Allowed, &allow, RuleMode::Disallowed, NO_LIST);
        assert_eq!(names(&violations), vec!["math.h"]);
    }

    #[test]
    fn test_disallowed_function_call_detected() {
        let code = "#include <stdio.h>\nint main() {\n    char d[8];\n    strcpy(d, \"x\");\n    return 0;\n}\n";
        let deny = vec!["strcpy".to_string()];
        let violations =
            validate_code(code, RuleMode::Disallowed, NO_LIST, RuleMode::Disallowed, &deny);
        assert_eq!(names(&violations), vec!["strcpy"]);
        assert_eq!(violations[0].kind, ViolationKind::Function);
    }

    #[test]
    fn test_definition_is_not_a_call() {
        let code = "int helper(int x) { return x * 2; }\nint main() { return 0; }\n";
        let deny = vec!["helper".to_string()];
        let violations =
            validate_code(code, RuleMode::Disallowed, NO_LIST, RuleMode::Disallowed, &deny);
        assert!(violations.is_empty());
    }

    #[test]
    fn test_own_helpers_exempt_in_allowed_mode() {
        // The candidate defines and calls its own helper; only library calls
        // are held against the allow list.
        let code = "int helper(int x) { return x; }\nint main() { printf(\"%d\", helper(1)); return 0; }\n";
        let allow = vec!["printf".to_string()];
        let violations =
            validate_code(code, RuleMode::Disallowed, NO_LIST, RuleMode::Allowed, &allow);
        assert!(violations.is_empty(), "got {violations:?}");
    }

    #[test]
    fn test_unlisted_call_flagged_in_allowed_mode() {
        let code = "int main() { printf(\"hi\"); system(\"ls\"); return 0; }\n";
        let allow = vec!["printf".to_string()];
        let violations =
            validate_code(code, RuleMode::Disallowed, NO_LIST, RuleMode::Allowed, &allow);
        assert_eq!(names(&violations), vec!["system"]);
    }

    #[test]
    fn test_keywords_never_flagged() {
        let code = "int main() { while (1) { if (0) break; } return 0; }\n";
        let violations =
            validate_code(code, RuleMode::Disallowed, NO_LIST, RuleMode::Allowed, NO_LIST);
        assert!(violations.is_empty());
    }

    #[test]
    fn test_describe_joins_violations() {
        let code = "#include <string.h>\nint main() { strcpy(0, 0); return 0; }\n";
        let headers = vec!["string.h".to_string()];
        let functions = vec!["strcpy".to_string()];
        let violations = validate_code(
            code,
            RuleMode::Disallowed,
            &headers,
            RuleMode::Disallowed,
            &functions,
        );
        assert_eq!(
            describe(&violations),
            "header `string.h` is not permitted; function `strcpy` is not permitted"
        );
    }
}
