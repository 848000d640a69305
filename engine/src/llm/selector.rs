//! Model Selector
//!
//! Pure decision function mapping a task profile to a `ModelChoice`.
//! No I/O, no side effects, trivially reentrant.
//!
//! The rule order below is load-bearing and must not be "simplified":
//! `requires_speed` short-circuits everything, but task-type-only speed
//! routing additionally requires low complexity. Reordering changes
//! observable routing for ambiguous combinations (see the tests).

use super::{BackendId, ModelChoice};
use crate::config::AnthropicConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kind of work a request represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    QuickAnswer,
    SimpleCode,
    Summarization,
    Architecture,
    DeepAnalysis,
    Planning,
    CodeReview,
    SpecializedReasoning,
    ComplexProblemSolving,
    General,
}

impl TaskType {
    /// Task types that route to the fast backend when complexity is low
    fn is_quick(self) -> bool {
        matches!(
            self,
            TaskType::QuickAnswer | TaskType::SimpleCode | TaskType::Summarization
        )
    }

    /// Task types that always deserve the highest-capability variant
    fn is_complex(self) -> bool {
        matches!(
            self,
            TaskType::Architecture
                | TaskType::DeepAnalysis
                | TaskType::Planning
                | TaskType::CodeReview
        )
    }

    /// Task types served by the specialized-reasoning variant
    fn is_specialized(self) -> bool {
        matches!(
            self,
            TaskType::SpecializedReasoning | TaskType::ComplexProblemSolving
        )
    }
}

impl FromStr for TaskType {
    type Err = std::convert::Infallible;

    /// Unrecognized task types fall back to `General`, which routes to the
    /// balanced default, the least surprising outcome for unknown input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "quick_answer" => TaskType::QuickAnswer,
            "simple_code" => TaskType::SimpleCode,
            "summarization" => TaskType::Summarization,
            "architecture" => TaskType::Architecture,
            "deep_analysis" => TaskType::DeepAnalysis,
            "planning" => TaskType::Planning,
            "code_review" => TaskType::CodeReview,
            "specialized_reasoning" => TaskType::SpecializedReasoning,
            "complex_problem_solving" => TaskType::ComplexProblemSolving,
            _ => TaskType::General,
        })
    }
}

/// Task complexity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl FromStr for Complexity {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "low" => Complexity::Low,
            "high" => Complexity::High,
            _ => Complexity::Medium,
        })
    }
}

/// Profile describing one request to the selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskProfile {
    pub task_type: TaskType,
    pub complexity: Complexity,
    pub requires_speed: bool,
}

impl TaskProfile {
    pub fn new(task_type: TaskType, complexity: Complexity, requires_speed: bool) -> Self {
        Self {
            task_type,
            complexity,
            requires_speed,
        }
    }
}

impl Default for TaskProfile {
    fn default() -> Self {
        Self {
            task_type: TaskType::General,
            complexity: Complexity::Medium,
            requires_speed: false,
        }
    }
}

/// Pure model selector.
///
/// Holds the configured Anthropic variant names so the decision table
/// stays free of string literals scattered through the logic.
#[derive(Debug, Clone)]
pub struct Selector {
    smart: String,
    reasoning: String,
    balanced: String,
}

impl Selector {
    pub fn new(anthropic: &AnthropicConfig) -> Self {
        Self {
            smart: anthropic.smart_model.clone(),
            reasoning: anthropic.reasoning_model.clone(),
            balanced: anthropic.balanced_model.clone(),
        }
    }

    /// Map `(task_type, complexity, requires_speed)` to a `ModelChoice`.
    ///
    /// Ordered rules, first match wins:
    /// 1. speed-forced, or a quick task type at low complexity
    ///    -> the fastest backend (Gemini, implicit default model)
    /// 2. high complexity, or an inherently complex task type
    ///    -> the smartest variant
    /// 3. specialized-reasoning task types -> the reasoning variant
    /// 4. everything else -> the balanced default
    pub fn select(&self, profile: &TaskProfile) -> ModelChoice {
        // Rule 1: requires_speed wins unconditionally; task type alone
        // forces speed only when complexity is also low.
        if profile.requires_speed
            || (profile.task_type.is_quick() && profile.complexity == Complexity::Low)
        {
            return ModelChoice::new(BackendId::Gemini, None);
        }

        // Rule 2
        if profile.complexity == Complexity::High || profile.task_type.is_complex() {
            return ModelChoice::new(BackendId::Anthropic, Some(self.smart.clone()));
        }

        // Rule 3
        if profile.task_type.is_specialized() {
            return ModelChoice::new(BackendId::Anthropic, Some(self.reasoning.clone()));
        }

        // Rule 4
        ModelChoice::new(BackendId::Anthropic, Some(self.balanced.clone()))
    }
}
