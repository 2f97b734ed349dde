//! Pattern scan for inclusion and reference directives.
//!
//! This is deliberately a token scan over raw text rather than a parse of the
//! document language. [`list_directives`] is the only entry point the graph
//! logic uses, so the matching strategy can change without touching traversal.

use std::sync::OnceLock;

use regex::Regex;

use crate::graph::InclusionMode;

/// A directive recognized by the scanner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    /// `\input{file}`.
    Input,
    /// `\include{file}`.
    Include,
    /// `\subfile{file}`.
    Subfile,
    /// `\import{dir}{file}`, `\subimport{dir}{file}`, `\inputfrom`, `\subinputfrom`.
    Import,
    /// `\includefrom{dir}{file}`, `\subincludefrom{dir}{file}`.
    IncludeFrom,
    /// `\bibliography{a,b}`.
    Bibliography,
    /// `\addbibresource{refs.bib}`.
    AddBibResource,
    /// `\includegraphics{image}`.
    IncludeGraphics,
    /// One directory of `\graphicspath{{dir1/}{dir2/}}`.
    GraphicsPath,
    /// `\documentclass{class}`.
    DocumentClass,
}

/// The role a directive plays in dependency discovery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectiveFamily {
    /// Pulls in another source document.
    Subdocument(InclusionMode),
    /// References one or more bibliography databases.
    Bibliography,
    /// References an image file.
    Image,
    /// Adds an image search directory.
    GraphicsPath,
    /// Declares the document as a compilation root.
    DocumentClass,
}

impl DirectiveKind {
    /// Returns the family this directive belongs to.
    pub fn family(self) -> DirectiveFamily {
        match self {
            Self::Input | Self::Import => DirectiveFamily::Subdocument(InclusionMode::Mergeable),
            Self::Include | Self::Subfile | Self::IncludeFrom => {
                DirectiveFamily::Subdocument(InclusionMode::Sectioned)
            }
            Self::Bibliography | Self::AddBibResource => DirectiveFamily::Bibliography,
            Self::IncludeGraphics => DirectiveFamily::Image,
            Self::GraphicsPath => DirectiveFamily::GraphicsPath,
            Self::DocumentClass => DirectiveFamily::DocumentClass,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "input" => Self::Input,
            "include" => Self::Include,
            "subfile" => Self::Subfile,
            "import" | "subimport" | "inputfrom" | "subinputfrom" => Self::Import,
            "includefrom" | "subincludefrom" => Self::IncludeFrom,
            "bibliography" => Self::Bibliography,
            "addbibresource" => Self::AddBibResource,
            "includegraphics" => Self::IncludeGraphics,
            "documentclass" => Self::DocumentClass,
            _ => return None,
        })
    }
}

/// One directive occurrence found in a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Directive {
    /// Which directive matched.
    pub kind: DirectiveKind,
    /// The mandatory braced argument, trimmed.
    pub argument: String,
    /// The directory argument of two-argument import forms.
    pub base_dir: Option<String>,
    /// Byte offset of the directive's backslash in the scanned text.
    pub offset: usize,
}

fn single_arg_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\\(includegraphics|include|input|subfile|bibliography|addbibresource|documentclass)\*?\s*(?:\[[^\]]*\]\s*)*\{([^{}]*)\}",
        )
        .expect("single-argument directive regex must compile")
    })
}

fn two_arg_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\\(subimport|import|subincludefrom|includefrom|subinputfrom|inputfrom)\*?\s*\{([^{}]*)\}\s*\{([^{}]*)\}",
        )
        .expect("two-argument directive regex must compile")
    })
}

fn graphicspath_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\\graphicspath\s*\{((?:\s*\{[^{}]*\})+)\s*\}")
            .expect("graphicspath regex must compile")
    })
}

fn braced_group_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^{}]*)\}").expect("braced group regex must compile"))
}

fn magic_root_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^[ \t]*%[ \t]*!\s*tex\s+root\s*=\s*(\S.*?)[ \t]*\r?$")
            .expect("magic root regex must compile")
    })
}

/// Lists every recognized directive in `text`, ordered by offset.
///
/// Comments are stripped first, so `% \input{old}` is not reported.
pub fn list_directives(text: &str) -> Vec<Directive> {
    let text = strip_comments(text);
    let mut found = Vec::new();

    for caps in single_arg_re().captures_iter(&text) {
        let Some(kind) = DirectiveKind::from_name(&caps[1]) else {
            continue;
        };
        found.push(Directive {
            kind,
            argument: caps[2].trim().to_string(),
            base_dir: None,
            offset: caps.get(0).map_or(0, |m| m.start()),
        });
    }

    for caps in two_arg_re().captures_iter(&text) {
        let Some(kind) = DirectiveKind::from_name(&caps[1]) else {
            continue;
        };
        found.push(Directive {
            kind,
            argument: caps[3].trim().to_string(),
            base_dir: Some(caps[2].trim().to_string()),
            offset: caps.get(0).map_or(0, |m| m.start()),
        });
    }

    for caps in graphicspath_re().captures_iter(&text) {
        let offset = caps.get(0).map_or(0, |m| m.start());
        for inner in braced_group_re().captures_iter(&caps[1]) {
            let dir = inner[1].trim();
            if dir.is_empty() {
                continue;
            }
            found.push(Directive {
                kind: DirectiveKind::GraphicsPath,
                argument: dir.to_string(),
                base_dir: None,
                offset,
            });
        }
    }

    // Stable sort keeps graphicspath entries in declaration order.
    found.sort_by_key(|d| d.offset);
    found
}

/// Returns `true` if `text` declares a top-level document (`\documentclass`).
pub fn declares_document_class(text: &str) -> bool {
    list_directives(text)
        .iter()
        .any(|d| d.kind == DirectiveKind::DocumentClass)
}

/// Extracts the target of a `% !TEX root = <path>` magic comment, if any.
///
/// Only the first such comment counts.
pub fn magic_root(text: &str) -> Option<String> {
    let caps = magic_root_re().captures(text)?;
    let target = caps[1].trim();
    (!target.is_empty()).then(|| target.to_string())
}

/// Blanks out comments, keeping every byte offset stable.
///
/// A `%` starts a comment unless preceded by an odd number of backslashes
/// (`\%` is a literal percent sign, `\\%` is a line break followed by a comment).
pub fn strip_comments(text: &str) -> String {
    let mut bytes = text.as_bytes().to_vec();
    let mut in_comment = false;
    let mut backslashes = 0usize;

    for byte in bytes.iter_mut() {
        if in_comment {
            if *byte == b'\n' {
                in_comment = false;
            } else {
                *byte = b' ';
            }
            continue;
        }
        match *byte {
            b'%' if backslashes % 2 == 0 => {
                in_comment = true;
                *byte = b' ';
                backslashes = 0;
            }
            b'\\' => backslashes += 1,
            _ => backslashes = 0,
        }
    }

    // Comments are blanked from an ASCII '%' up to an ASCII newline, so whole
    // characters are replaced and the buffer stays valid UTF-8.
    String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}
