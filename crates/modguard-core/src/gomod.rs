//! Minimal `go.mod` reader: the `module` directive and `require` entries.
//!
//! Only what the manifest source needs is understood; `replace`, `exclude`
//! and other directives are skipped.

use std::path::Path;

use modguard_util::errors::ModguardError;

/// A parsed `go.mod` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoMod {
    pub module: String,
    pub requires: Vec<GoRequire>,
}

/// One `require` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoRequire {
    pub path: String,
    pub version: String,
    pub indirect: bool,
}

impl GoMod {
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ModguardError::Scan {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::parse(&content).map_err(|e| {
            ModguardError::Scan {
                message: format!("{}: {e}", path.display()),
            }
            .into()
        })
    }

    pub fn parse(content: &str) -> Result<Self, ModguardError> {
        let mut module = None;
        let mut requires = Vec::new();
        // Name of the directive whose parenthesised block we are inside.
        let mut block: Option<&str> = None;

        for (lineno, raw_line) in content.lines().enumerate() {
            let (line, comment) = split_comment(raw_line);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(directive) = block {
                if line == ")" {
                    block = None;
                    continue;
                }
                if directive == "require" {
                    requires.push(parse_require(line, comment, lineno + 1)?);
                }
                continue;
            }

            let (directive, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            let rest = rest.trim();
            match directive {
                "module" => module = Some(unquote(rest).to_string()),
                "require" if rest == "(" => block = Some("require"),
                "require" => requires.push(parse_require(rest, comment, lineno + 1)?),
                _ if rest == "(" => block = Some("other"),
                _ => {}
            }
        }

        let module = module
            .filter(|m| !m.is_empty())
            .ok_or_else(|| ModguardError::Scan {
                message: "missing module directive".to_string(),
            })?;
        Ok(Self { module, requires })
    }
}

fn split_comment(line: &str) -> (&str, Option<&str>) {
    match line.find("//") {
        Some(idx) => (&line[..idx], Some(line[idx + 2..].trim())),
        None => (line, None),
    }
}

fn unquote(s: &str) -> &str {
    s.trim_matches('"')
}

fn parse_require(spec: &str, comment: Option<&str>, lineno: usize) -> Result<GoRequire, ModguardError> {
    let mut parts = spec.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(path), Some(version)) => Ok(GoRequire {
            path: unquote(path).to_string(),
            version: version.to_string(),
            indirect: comment == Some("indirect"),
        }),
        _ => Err(ModguardError::Scan {
            message: format!("line {lineno}: malformed require entry '{spec}'"),
        }),
    }
}
