//! `{{placeholder}}` prompt templates.
//!
//! `{{request}}` expands to the run's seed request; any other name expands
//! to the output of the stage with that name.

use crate::pipeline::PipelineContext;

pub const REQUEST_PLACEHOLDER: &str = "request";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Request,
    Stage(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    pub fn parse(source: &str) -> Result<Self, String> {
        let mut segments = Vec::new();
        let mut rest = source;

        while let Some(open) = rest.find("{{") {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 2..];
            let close = after
                .find("}}")
                .ok_or_else(|| format!("unterminated placeholder at byte {}", source.len() - rest.len() + open))?;
            let name = after[..close].trim();
            if name.is_empty() {
                return Err("empty placeholder '{{}}'".to_string());
            }
            if name.contains("{{") {
                return Err(format!("nested placeholder in '{{{{{name}}}}}'"));
            }
            segments.push(if name == REQUEST_PLACEHOLDER {
                Segment::Request
            } else {
                Segment::Stage(name.to_string())
            });
            rest = &after[close + 2..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments })
    }

    /// Stage names referenced, in order of first appearance.
    pub fn stage_references(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Stage(name) = segment
                && !names.contains(&name.as_str())
            {
                names.push(name);
            }
        }
        names
    }

    /// Placeholders for stages without output render as empty text.
    pub fn render(&self, ctx: &PipelineContext) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Request => out.push_str(ctx.request()),
                Segment::Stage(name) => out.push_str(ctx.output(name).unwrap_or_default()),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_request_and_stage_outputs() {
        let template =
            PromptTemplate::parse("Review {{ architecture }} for {{request}}:\n{{development}}").unwrap();

        let mut ctx = PipelineContext::new("tic-tac-toe");
        ctx.insert("architecture", "ARCH");
        ctx.insert("development", "CODE");

        assert_eq!(template.render(&ctx), "Review ARCH for tic-tac-toe:\nCODE");
        assert_eq!(template.stage_references(), vec!["architecture", "development"]);
    }

    #[test]
    fn plain_text_round_trips() {
        let template = PromptTemplate::parse("no placeholders { here }").unwrap();
        assert_eq!(
            template.render(&PipelineContext::new("x")),
            "no placeholders { here }"
        );
        assert!(template.stage_references().is_empty());
    }

    #[test]
    fn repeated_reference_listed_once() {
        let template = PromptTemplate::parse("{{a}} and {{a}} then {{b}}").unwrap();
        assert_eq!(template.stage_references(), vec!["a", "b"]);
    }

    #[test]
    fn rejects_malformed_placeholders() {
        assert!(PromptTemplate::parse("Based on {{architecture").is_err());
        assert!(PromptTemplate::parse("empty {{ }} here").is_err());
        assert!(PromptTemplate::parse("{{ a {{b}} }}").is_err());
    }
}
