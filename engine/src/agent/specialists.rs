//! Role-specific operations
//!
//! Thin wrappers over the shared pipeline that fix the routing profile
//! and post-process the response the way each role's output is consumed:
//! architecture plans are cleaned of stray fencing, developer output is
//! mined for code blocks, reviews are reduced to a verdict.

use super::core::{Agent, RunOptions};
use super::RoleKey;
use crate::error::{EngineError, Result};
use crate::llm::selector::{Complexity, TaskProfile, TaskType};
use regex::Regex;
use std::sync::OnceLock;

/// A fenced code block lifted out of model output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: String,
    pub code: String,
}

/// Outcome of a developer feature request
#[derive(Debug, Clone)]
pub struct FeatureResult {
    pub response: String,
    pub code_blocks: Vec<CodeBlock>,
}

/// Reviewer verdict parsed from the closing marker line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Approved,
    Rejected,
    /// No marker, or contradictory markers
    Ambiguous,
}

/// Outcome of a code review
#[derive(Debug, Clone)]
pub struct ReviewResult {
    pub response: String,
    pub verdict: Verdict,
}

fn code_block_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)```(\w+)?\n(.*?)```").expect("code block pattern is valid")
    })
}

/// Pull all fenced code blocks out of model output.
///
/// Untagged fences get an empty language. Fence content keeps its
/// internal whitespace; only the trailing newline before the closing
/// fence is dropped.
pub fn extract_code_blocks(text: &str) -> Vec<CodeBlock> {
    code_block_pattern()
        .captures_iter(text)
        .map(|cap| CodeBlock {
            language: cap
                .get(1)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            code: cap
                .get(2)
                .map(|m| m.as_str().trim_end_matches('\n').to_string())
                .unwrap_or_default(),
        })
        .collect()
}

/// Reduce review output to a verdict.
///
/// Exactly one marker decides; both present or neither present is
/// ambiguous and left to a human.
pub fn parse_verdict(text: &str) -> Verdict {
    let approve = text.contains("[APPROVE]");
    let reject = text.contains("[REQUEST CHANGES]");
    match (approve, reject) {
        (true, false) => Verdict::Approved,
        (false, true) => Verdict::Rejected,
        _ => Verdict::Ambiguous,
    }
}

/// Strip a whole-response code fence some models wrap plans in.
fn clean_plan_output(text: &str) -> String {
    let trimmed = text.trim();
    if let Some(inner) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    {
        // Drop a language tag on the opening fence line.
        let inner = match inner.split_once('\n') {
            Some((first, rest)) if !first.contains(' ') => rest,
            _ => inner,
        };
        return inner.trim().to_string();
    }
    trimmed.to_string()
}

impl Agent {
    fn require_role(&self, expected: RoleKey) -> Result<()> {
        if self.role() != expected {
            return Err(EngineError::Validation(format!(
                "Operation requires the {} role, agent is {}",
                expected,
                self.role()
            )));
        }
        Ok(())
    }

    /// Produce a cleaned architecture plan for a request.
    pub async fn architecture_plan(
        &self,
        request: &str,
        options: RunOptions<'_>,
    ) -> Result<String> {
        self.require_role(RoleKey::Architect)?;
        let options = RunOptions {
            profile: Some(TaskProfile::new(
                TaskType::Architecture,
                Complexity::High,
                false,
            )),
            ..options
        };
        let prompt = format!(
            "Produce an architecture plan for the following request. Cover components, \
             data flow, technology choices, and the main tradeoffs.\n\nREQUEST:\n{}",
            request
        );
        let response = self.run(&prompt, options).await?;
        Ok(clean_plan_output(&response.text))
    }

    /// Break a request into concrete requirements.
    pub async fn analyze_request(&self, request: &str, options: RunOptions<'_>) -> Result<String> {
        self.require_role(RoleKey::Analyst)?;
        let options = RunOptions {
            profile: Some(TaskProfile::new(
                TaskType::DeepAnalysis,
                Complexity::Medium,
                false,
            )),
            ..options
        };
        let prompt = format!(
            "Analyze this request. List functional requirements, constraints, and open \
             questions that block implementation.\n\nREQUEST:\n{}",
            request
        );
        Ok(self.run(&prompt, options).await?.text)
    }

    /// Turn requirements into user stories.
    pub async fn generate_user_stories(
        &self,
        requirements: &str,
        options: RunOptions<'_>,
    ) -> Result<String> {
        self.require_role(RoleKey::Analyst)?;
        let options = RunOptions {
            profile: Some(TaskProfile::new(
                TaskType::Planning,
                Complexity::Medium,
                false,
            )),
            ..options
        };
        let prompt = format!(
            "Write user stories for these requirements. Use the standard \
              'As a ..., I want ..., so that ...' form with acceptance criteria.\n\n\
             REQUIREMENTS:\n{}",
            requirements
        );
        Ok(self.run(&prompt, options).await?.text)
    }

    /// Implement a feature and return the response with its code blocks.
    pub async fn generate_feature(
        &self,
        description: &str,
        options: RunOptions<'_>,
    ) -> Result<FeatureResult> {
        self.require_role(RoleKey::Developer)?;
        let prompt = format!(
            "Implement the following feature. Put all code in fenced blocks tagged \
             with the language, and explain anything non-obvious.\n\nFEATURE:\n{}",
            description
        );
        let response = self.run(&prompt, options).await?;
        let code_blocks = extract_code_blocks(&response.text);
        Ok(FeatureResult {
            response: response.text,
            code_blocks,
        })
    }

    /// Review code and parse the closing verdict marker.
    pub async fn review_code(&self, code: &str, options: RunOptions<'_>) -> Result<ReviewResult> {
        self.require_role(RoleKey::Reviewer)?;
        let prompt = format!(
            "Review the following code for correctness, safety, and maintainability. \
             End with a line containing exactly [APPROVE] or [REQUEST CHANGES].\n\n\
             CODE:\n{}",
            code
        );
        let response = self.run(&prompt, options).await?;
        let verdict = parse_verdict(&response.text);
        Ok(ReviewResult {
            response: response.text,
            verdict,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_code_blocks_with_language_tags() {
        let text = "Here you go:\n```rust\nfn main() {}\n```\nand a script:\n```bash\nls -la\n```\n";
        let blocks = extract_code_blocks(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].language, "rust");
        assert_eq!(blocks[0].code, "fn main() {}");
        assert_eq!(blocks[1].language, "bash");
        assert_eq!(blocks[1].code, "ls -la");
    }

    #[test]
    fn test_extract_untagged_block() {
        let text = "```\nplain text\n```";
        let blocks = extract_code_blocks(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].language, "");
        assert_eq!(blocks[0].code, "plain text");
    }

    #[test]
    fn test_no_code_blocks() {
        assert!(extract_code_blocks("just prose, no fences").is_empty());
    }

    #[test]
    fn test_multiline_block_keeps_internal_structure() {
        let text = "```python\ndef f():\n    return 1\n\nprint(f())\n```";
        let blocks = extract_code_blocks(text);
        assert_eq!(blocks[0].code, "def f():\n    return 1\n\nprint(f())");
    }

    #[test]
    fn test_parse_verdict_approve() {
        assert_eq!(parse_verdict("Looks good.\n[APPROVE]"), Verdict::Approved);
    }

    #[test]
    fn test_parse_verdict_reject() {
        assert_eq!(
            parse_verdict("Nope.\n[REQUEST CHANGES]"),
            Verdict::Rejected
        );
    }

    #[test]
    fn test_parse_verdict_ambiguous_cases() {
        assert_eq!(parse_verdict("no marker at all"), Verdict::Ambiguous);
        assert_eq!(
            parse_verdict("[APPROVE] but also [REQUEST CHANGES]"),
            Verdict::Ambiguous
        );
    }

    #[test]
    fn test_clean_plan_output_strips_wrapping_fence() {
        assert_eq!(
            clean_plan_output("```markdown\n# Plan\ncontent\n```"),
            "# Plan\ncontent"
        );
        assert_eq!(clean_plan_output("```\nbare fence\n```"), "bare fence");
        assert_eq!(clean_plan_output("  no fence here  "), "no fence here");
    }
}
