//! # Argument Validator
//!
//! Decides whether a candidate command is complete enough to run, before any process is
//! spawned. Each simple segment is checked against the rule table; loops and tools without
//! a rule pass unless unknown tools are blocked. This is advisory, not a security boundary.

use tracing::{debug, warn};

use crate::application::rules::{self, Requirement, ToolRule};
use crate::application::splitter;
use crate::domain::config::UnknownToolPolicy;
use crate::domain::errors::ErrorKind;
use crate::domain::types::{CandidateCommand, CommandSegment, ValidationOutcome};
use crate::strings::messages;

#[derive(Debug, Clone, Copy, Default)]
pub struct ArgumentValidator {
    unknown_tools: UnknownToolPolicy,
}

impl ArgumentValidator {
    pub fn new(unknown_tools: UnknownToolPolicy) -> Self {
        Self { unknown_tools }
    }

    /// Conjunction over all segments; the first failing segment's reason is returned.
    pub fn validate(&self, command: &CandidateCommand) -> ValidationOutcome {
        if command.is_blank() {
            return ValidationOutcome::rejected(ErrorKind::EmptyCommand, messages::EMPTY_COMMAND);
        }

        for segment in splitter::split(command.as_str()) {
            let outcome = self.validate_segment(&segment);
            if let ValidationOutcome::Rejected { reason, detail } = &outcome {
                warn!(segment = segment.text, %reason, "Rejected command segment: {detail}");
                return outcome;
            }
        }

        ValidationOutcome::Accepted
    }

    pub fn validate_segment(&self, segment: &CommandSegment<'_>) -> ValidationOutcome {
        if segment.is_opaque() {
            debug!(segment = segment.text, "Opaque control construct, skipping argument checks");
            return ValidationOutcome::Accepted;
        }

        let Some(tool) = segment.tool() else {
            return ValidationOutcome::Accepted;
        };

        let Some(rule) = rules::lookup(tool) else {
            return match self.unknown_tools {
                UnknownToolPolicy::Allow => {
                    debug!(
                        tool,
                        kind = %ErrorKind::UnrecognizedButPermitted,
                        "No rule for tool, permitted"
                    );
                    ValidationOutcome::Accepted
                }
                UnknownToolPolicy::Block => ValidationOutcome::rejected(
                    ErrorKind::UnrecognizedTool,
                    messages::unrecognized_tool(tool),
                ),
            };
        };

        let args: Vec<&str> = segment.tokens().skip(1).collect();
        check_rule(rule, &args)
    }
}

fn check_rule(rule: &ToolRule, args: &[&str]) -> ValidationOutcome {
    for requirement in rule.requirements {
        match requirement {
            Requirement::FlagGroup { flags, detail } => {
                if !args.iter().any(|arg| flags.iter().any(|f| f == arg)) {
                    return ValidationOutcome::rejected(
                        ErrorKind::MissingRequiredFlag,
                        messages::tool_requirement(rule.tool, detail),
                    );
                }
            }
            Requirement::Positional { min, detail } => {
                let found = positional_count(rule, args);
                if found < *min {
                    debug!(tool = rule.tool, found, min, "Too few positional arguments");
                    return ValidationOutcome::rejected(
                        ErrorKind::MissingArgument,
                        messages::tool_requirement(rule.tool, detail),
                    );
                }
            }
            Requirement::Predicate {
                check,
                reason,
                detail,
            } => {
                if !check(args) {
                    return ValidationOutcome::rejected(
                        *reason,
                        messages::tool_requirement(rule.tool, detail),
                    );
                }
            }
        }
    }
    ValidationOutcome::Accepted
}

/// Tokens not starting with `-`, skipping the values that belong to a preceding flag.
fn positional_count(rule: &ToolRule, args: &[&str]) -> usize {
    let mut count = 0;
    let mut i = 0;
    while i < args.len() {
        let arg = args[i];
        if arg.starts_with('-') {
            i += 1 + rule.value_arity(arg);
        } else {
            count += 1;
            i += 1;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(command: &str) -> ValidationOutcome {
        ArgumentValidator::default().validate(&CandidateCommand::new(command))
    }

    fn reason(command: &str) -> Option<ErrorKind> {
        match validate(command) {
            ValidationOutcome::Accepted => None,
            ValidationOutcome::Rejected { reason, .. } => Some(reason),
        }
    }

    #[test]
    fn test_bare_tool_names_rejected() {
        for rule in rules::all() {
            let kind = reason(rule.tool);
            assert!(
                matches!(
                    kind,
                    Some(ErrorKind::MissingRequiredFlag) | Some(ErrorKind::MissingArgument)
                ),
                "{} alone gave {:?}",
                rule.tool,
                kind
            );
        }
        assert_eq!(reason("pdftocairo"), Some(ErrorKind::MissingRequiredFlag));
        assert_eq!(reason("ffmpeg"), Some(ErrorKind::MissingRequiredFlag));
        assert_eq!(reason("convert"), Some(ErrorKind::MissingArgument));
        assert_eq!(reason("mogrify"), Some(ErrorKind::MissingArgument));
        assert_eq!(reason("tesseract"), Some(ErrorKind::MissingArgument));
    }

    #[test]
    fn test_pdftocairo() {
        assert!(validate("pdftocairo -jpeg document.pdf output").is_accepted());
        assert_eq!(reason("pdftocairo -jpeg"), Some(ErrorKind::MissingArgument));
        assert_eq!(
            reason("pdftocairo -jpeg document.pdf"),
            Some(ErrorKind::MissingArgument)
        );
        assert_eq!(
            reason("pdftocairo document.pdf output"),
            Some(ErrorKind::MissingRequiredFlag)
        );
    }

    #[test]
    fn test_flag_value_not_counted_as_positional() {
        assert!(validate("pdftocairo -png -r 300 test.pdf page").is_accepted());
        // `300` belongs to `-r`, so only one real positional remains.
        assert_eq!(
            reason("pdftocairo -png -r 300 test.pdf"),
            Some(ErrorKind::MissingArgument)
        );
        assert_eq!(reason("mogrify -resize 50%"), Some(ErrorKind::MissingArgument));
        assert!(validate("tesseract scan.png out -l eng").is_accepted());
        assert_eq!(
            reason("tesseract scan.png -l eng"),
            Some(ErrorKind::MissingArgument)
        );
    }

    #[test]
    fn test_ffmpeg() {
        assert!(validate("ffmpeg -i in.mp4 out.mp3").is_accepted());
        assert!(validate("ffmpeg -y -ss 5 -i in.mp4 -t 10 out.mp4").is_accepted());
        assert_eq!(reason("ffmpeg out.mp3"), Some(ErrorKind::MissingRequiredFlag));
    }

    #[test]
    fn test_imagemagick() {
        assert!(validate("convert input.jpg output.png").is_accepted());
        assert!(validate("mogrify -colorspace Gray page-*.png").is_accepted());
    }

    #[test]
    fn test_extended_poppler_rules() {
        assert!(validate("pdftotext doc.pdf out.txt").is_accepted());
        assert_eq!(reason("pdftotext -f 1 -l 3"), Some(ErrorKind::MissingArgument));
        assert_eq!(reason("pdfimages doc.pdf"), Some(ErrorKind::MissingArgument));
        assert!(validate("pdfimages -all doc.pdf img").is_accepted());
        assert_eq!(reason("pdfinfo"), Some(ErrorKind::MissingArgument));
    }

    #[test]
    fn test_chained_command() {
        assert!(
            validate("pdftocairo -png input.pdf page && mogrify -colorspace Gray page-*.png")
                .is_accepted()
        );
        // First failing segment is reported.
        match validate("pdftocairo -png in.pdf page && ffmpeg out.mp3 && convert") {
            ValidationOutcome::Rejected { reason, detail } => {
                assert_eq!(reason, ErrorKind::MissingRequiredFlag);
                assert!(detail.starts_with("ffmpeg"));
            }
            ValidationOutcome::Accepted => panic!("expected rejection"),
        }
    }

    #[test]
    fn test_loop_body_not_checked() {
        assert!(
            validate(r#"pdftocairo -png input.pdf page && for f in page-*.png; do convert "$f" -resize 50% "$f"; done"#)
                .is_accepted()
        );
        assert!(validate("for f in *.png; do convert; done").is_accepted());
    }

    #[test]
    fn test_unknown_tools() {
        assert!(validate("pdfunite a.pdf b.pdf merged.pdf").is_accepted());
        assert!(validate("FFMPEG out.mp3").is_accepted());

        let strict = ArgumentValidator::new(UnknownToolPolicy::Block);
        match strict.validate(&CandidateCommand::new("pdfunite a.pdf b.pdf out.pdf")) {
            ValidationOutcome::Rejected { reason, .. } => {
                assert_eq!(reason, ErrorKind::UnrecognizedTool)
            }
            ValidationOutcome::Accepted => panic!("expected rejection"),
        }
        assert!(
            strict
                .validate(&CandidateCommand::new("for f in *; do rm $f; done"))
                .is_accepted()
        );
    }

    #[test]
    fn test_empty_command() {
        assert_eq!(reason(""), Some(ErrorKind::EmptyCommand));
        assert_eq!(reason("  \n "), Some(ErrorKind::EmptyCommand));
    }

    #[test]
    fn test_idempotent() {
        let validator = ArgumentValidator::default();
        let command = CandidateCommand::new("pdftocairo -jpeg document.pdf");
        assert_eq!(validator.validate(&command), validator.validate(&command));
    }
}
