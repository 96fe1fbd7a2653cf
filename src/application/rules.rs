//! # Tool Rule Table
//!
//! Static argument-completeness rules for the media tools that print a usage banner and
//! exit quietly when called with too few arguments. Lookup is by exact, case-sensitive
//! tool name; a tool without an entry has no rule.

use crate::domain::errors::ErrorKind;

/// A flag that consumes the following `arity` tokens as its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueFlag {
    pub name: &'static str,
    pub arity: usize,
}

const fn flag(name: &'static str) -> ValueFlag {
    ValueFlag { name, arity: 1 }
}

#[derive(Debug, Clone, Copy)]
pub enum Requirement {
    /// At least one of `flags` must appear as a token.
    FlagGroup {
        flags: &'static [&'static str],
        detail: &'static str,
    },
    /// Minimum number of non-flag arguments, after flag values are discounted.
    Positional { min: usize, detail: &'static str },
    /// Tool-specific check over the argument tokens (tool name excluded).
    Predicate {
        check: fn(&[&str]) -> bool,
        reason: ErrorKind,
        detail: &'static str,
    },
}

#[derive(Debug)]
pub struct ToolRule {
    pub tool: &'static str,
    /// Evaluated in order; the first failure wins.
    pub requirements: &'static [Requirement],
    pub value_flags: &'static [ValueFlag],
}

impl ToolRule {
    pub fn value_arity(&self, token: &str) -> usize {
        self.value_flags
            .iter()
            .find(|f| f.name == token)
            .map_or(0, |f| f.arity)
    }
}

pub const PDFTOCAIRO_FORMATS: &[&str] = &["-png", "-jpeg", "-pdf", "-ps", "-eps", "-svg", "-tiff"];

const PDFTOCAIRO_VALUES: &[ValueFlag] = &[
    flag("-f"),
    flag("-l"),
    flag("-r"),
    flag("-rx"),
    flag("-ry"),
    flag("-scale-to"),
    flag("-scale-to-x"),
    flag("-scale-to-y"),
    flag("-x"),
    flag("-y"),
    flag("-W"),
    flag("-H"),
    flag("-sz"),
    flag("-paper"),
    flag("-icc"),
    flag("-opw"),
    flag("-upw"),
];

const PDFTOTEXT_VALUES: &[ValueFlag] = &[
    flag("-f"),
    flag("-l"),
    flag("-r"),
    flag("-x"),
    flag("-y"),
    flag("-W"),
    flag("-H"),
    flag("-enc"),
    flag("-eol"),
    flag("-fixed"),
    flag("-opw"),
    flag("-upw"),
];

const POPPLER_PAGE_VALUES: &[ValueFlag] = &[
    flag("-f"),
    flag("-l"),
    flag("-enc"),
    flag("-opw"),
    flag("-upw"),
];

const IMAGEMAGICK_VALUES: &[ValueFlag] = &[
    ValueFlag {
        name: "-annotate",
        arity: 2,
    },
    flag("-background"),
    flag("-blur"),
    flag("-border"),
    flag("-bordercolor"),
    flag("-colorspace"),
    flag("-compose"),
    flag("-crop"),
    flag("-delay"),
    flag("-density"),
    flag("-depth"),
    flag("-extent"),
    flag("-fill"),
    flag("-font"),
    flag("-format"),
    flag("-fuzz"),
    flag("-geometry"),
    flag("-gravity"),
    flag("-level"),
    flag("-loop"),
    flag("-modulate"),
    flag("-path"),
    flag("-pointsize"),
    flag("-quality"),
    flag("-resize"),
    flag("-rotate"),
    flag("-sample"),
    flag("-scale"),
    flag("-sharpen"),
    flag("-thumbnail"),
    flag("-threshold"),
    flag("-transparent"),
    flag("-type"),
];

const TESSERACT_VALUES: &[ValueFlag] = &[
    flag("-l"),
    flag("-c"),
    flag("--psm"),
    flag("--oem"),
    flag("--dpi"),
    flag("--tessdata-dir"),
    flag("--user-words"),
    flag("--user-patterns"),
];

fn has_input_flag(args: &[&str]) -> bool {
    args.iter().any(|arg| *arg == "-i")
}

const IMAGEMAGICK_REQUIREMENTS: &[Requirement] = &[Requirement::Positional {
    min: 1,
    detail: "is missing its input image argument",
}];

static RULES: &[ToolRule] = &[
    ToolRule {
        tool: "pdftocairo",
        requirements: &[
            Requirement::FlagGroup {
                flags: PDFTOCAIRO_FORMATS,
                detail: "is missing an output format flag (-png, -jpeg, -pdf, -ps, -eps, -svg, -tiff)",
            },
            Requirement::Positional {
                min: 2,
                detail: "is missing the input PDF and/or output file arguments",
            },
        ],
        value_flags: PDFTOCAIRO_VALUES,
    },
    ToolRule {
        tool: "ffmpeg",
        requirements: &[Requirement::Predicate {
            check: has_input_flag,
            reason: ErrorKind::MissingRequiredFlag,
            detail: "is missing the -i input file flag",
        }],
        value_flags: &[],
    },
    ToolRule {
        tool: "convert",
        requirements: IMAGEMAGICK_REQUIREMENTS,
        value_flags: IMAGEMAGICK_VALUES,
    },
    ToolRule {
        tool: "mogrify",
        requirements: IMAGEMAGICK_REQUIREMENTS,
        value_flags: IMAGEMAGICK_VALUES,
    },
    ToolRule {
        tool: "tesseract",
        requirements: &[Requirement::Positional {
            min: 2,
            detail: "is missing the input image and/or output base arguments",
        }],
        value_flags: TESSERACT_VALUES,
    },
    ToolRule {
        tool: "pdftotext",
        requirements: &[Requirement::Positional {
            min: 1,
            detail: "is missing the input PDF argument",
        }],
        value_flags: PDFTOTEXT_VALUES,
    },
    ToolRule {
        tool: "pdfimages",
        requirements: &[Requirement::Positional {
            min: 2,
            detail: "is missing the input PDF and/or image prefix arguments",
        }],
        value_flags: POPPLER_PAGE_VALUES,
    },
    ToolRule {
        tool: "pdfinfo",
        requirements: &[Requirement::Positional {
            min: 1,
            detail: "is missing the input PDF argument",
        }],
        value_flags: POPPLER_PAGE_VALUES,
    },
];

pub fn lookup(tool: &str) -> Option<&'static ToolRule> {
    RULES.iter().find(|rule| rule.tool == tool)
}

pub fn all() -> &'static [ToolRule] {
    RULES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_exact_and_case_sensitive() {
        assert!(lookup("pdftocairo").is_some());
        assert!(lookup("PdfToCairo").is_none());
        assert!(lookup("ffmpeg2").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn test_tool_names_unique() {
        let mut names: Vec<&str> = all().iter().map(|r| r.tool).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), all().len());
    }

    #[test]
    fn test_value_arity() {
        let cairo = lookup("pdftocairo").unwrap();
        assert_eq!(cairo.value_arity("-r"), 1);
        assert_eq!(cairo.value_arity("-png"), 0);

        let convert = lookup("convert").unwrap();
        assert_eq!(convert.value_arity("-annotate"), 2);
        assert_eq!(convert.value_arity("-resize"), 1);
    }

    #[test]
    fn test_ffmpeg_predicate() {
        assert!(has_input_flag(&["-y", "-i", "in.mp4", "out.mp3"]));
        assert!(!has_input_flag(&["-itsoffset", "1", "out.mp3"]));
    }
}
