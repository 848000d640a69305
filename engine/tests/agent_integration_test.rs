//! Agent pipeline integration tests with a scripted backend.
//!
//! Uses a capturing backend double so the full prompt an agent sends,
//! including recalled memory and handoff framing, can be asserted
//! alongside what lands in the database.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use troupe_engine::agent::core::{Agent, RunOptions};
use troupe_engine::agent::specialists::Verdict;
use troupe_engine::agent::{HandoffCoordinator, RoleKey};
use troupe_engine::error::EngineError;
use troupe_engine::config::{Config, LlmConfig};
use troupe_engine::context::ContextAssembler;
use troupe_engine::db::{Database, TurnRole};
use troupe_engine::llm::invoker::Invoker;
use troupe_engine::llm::router::Router;
use troupe_engine::llm::{BackendError, BackendId, Message, MessageRole, ModelBackend};

/// One recorded backend invocation.
#[derive(Clone)]
#[derive(Debug)]
struct RecordedCall {
    variant: Option<String>,
    messages: Vec<Message>,
}

/// Backend double that records every invocation.
#[derive(Debug)]
struct CapturingBackend {
    id: BackendId,
    reply: &'static str,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

#[async_trait]
impl ModelBackend for CapturingBackend {
    fn id(&self) -> BackendId {
        self.id
    }

    fn default_variant(&self) -> &str {
        "captured-default"
    }

    async fn invoke(
        &self,
        variant: Option<&str>,
        messages: &[Message],
    ) -> Result<String, BackendError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                variant: variant.map(String::from),
                messages: messages.to_vec(),
            });
        }
        Ok(self.reply.to_string())
    }
}

struct Harness {
    db: Database,
    router: Arc<Router>,
    assembler: Arc<ContextAssembler>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    _dir: TempDir,
}

async fn harness(reply: &'static str) -> Harness {
    let dir = TempDir::new().expect("temp dir");
    let db = Database::new(&dir.path().join("test.db"))
        .await
        .expect("database opens");

    let calls = Arc::new(Mutex::new(Vec::new()));
    let invoker = Invoker::with_backends(vec![
        Box::new(CapturingBackend {
            id: BackendId::Anthropic,
            reply,
            calls: Arc::clone(&calls),
        }),
        Box::new(CapturingBackend {
            id: BackendId::Gemini,
            reply,
            calls: Arc::clone(&calls),
        }),
    ]);
    let router = Arc::new(Router::new(invoker, &LlmConfig::default()));
    let assembler = Arc::new(ContextAssembler::new(
        db.memory(),
        Config::default().memory,
    ));

    Harness {
        db,
        router,
        assembler,
        calls,
        _dir: dir,
    }
}

fn agent_for(h: &Harness, role: RoleKey) -> Agent {
    Agent::new(
        role,
        format!("You are the {} agent.", role.as_str()),
        Arc::clone(&h.router),
        Arc::clone(&h.assembler),
        Arc::new(h.db.conversations()),
    )
}

fn last_call(h: &Harness) -> RecordedCall {
    h.calls
        .lock()
        .expect("calls lock")
        .last()
        .cloned()
        .expect("at least one call")
}

fn call_count(h: &Harness) -> usize {
    h.calls.lock().expect("calls lock").len()
}

#[tokio::test]
async fn test_agent_run_persists_both_turns_with_attribution() {
    let h = harness("the answer").await;
    let conversation = h
        .db
        .conversations()
        .create_conversation(None, "chat")
        .await
        .expect("conversation");

    let agent = agent_for(&h, RoleKey::Developer);
    let options = RunOptions {
        conversation_id: Some(conversation.id),
        ..RunOptions::default()
    };
    let response = agent.run("write a parser", options).await.expect("run");
    assert_eq!(response.text, "the answer");

    let turns = h
        .db
        .conversations()
        .recent_turns(conversation.id, 10)
        .await
        .expect("turns");
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, TurnRole::User);
    assert_eq!(turns[0].content, "write a parser");
    assert!(turns[0].role_key.is_none());
    assert_eq!(turns[1].role, TurnRole::Assistant);
    assert_eq!(turns[1].role_key.as_deref(), Some("developer"));
    assert_eq!(
        turns[1].model_used.as_deref(),
        Some("anthropic:claude-opus-4-1")
    );
}

#[tokio::test]
async fn test_project_memory_reaches_the_system_instruction() {
    let h = harness("ok").await;
    let project = h.db.projects().create("demo").await.expect("project");
    h.db.memory()
        .add_entry(project.id, "decision", "All APIs speak JSON", 9)
        .await
        .expect("entry");

    let agent = agent_for(&h, RoleKey::Analyst);
    let options = RunOptions {
        project_id: Some(project.id),
        ..RunOptions::default()
    };
    agent.run("what format do we use?", options).await.expect("run");

    let call = last_call(&h);
    let system = call
        .messages
        .iter()
        .find(|m| m.role == MessageRole::System)
        .expect("system message");
    assert!(system.content.contains("analyst agent"));
    assert!(system.content.contains("--- PROJECT CONTEXT ---"));
    assert!(system.content.contains("All APIs speak JSON"));
    assert!(system.content.contains("MANDATORY BEHAVIOR RULES"));
}

#[tokio::test]
async fn test_handoff_truncates_audit_but_carries_full_context() {
    let h = harness("done").await;
    let conversation = h
        .db
        .conversations()
        .create_conversation(None, "relay")
        .await
        .expect("conversation");

    let long_context = "c".repeat(450);
    let coordinator = HandoffCoordinator::new(
        h.db.handoffs(),
        Arc::clone(&h.router),
        Arc::clone(&h.assembler),
        Arc::new(h.db.conversations()),
        h._dir.path().join("prompts"),
    );

    let response = coordinator
        .transfer(
            conversation.id,
            RoleKey::Coordinator,
            "developer",
            "implement the cache",
            &long_context,
            None,
        )
        .await
        .expect("transfer");
    assert_eq!(response, "done");

    // Audit row keeps only the 200-character snippet.
    let records = h
        .db
        .handoffs()
        .list_for_conversation(conversation.id)
        .await
        .expect("records");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].from_role, "coordinator");
    assert_eq!(records[0].to_role, "developer");
    assert_eq!(records[0].context_snippet.chars().count(), 200);

    // The target's prompt carries the framing and the untruncated context.
    let call = last_call(&h);
    let user = call
        .messages
        .iter()
        .find(|m| m.role == MessageRole::User)
        .expect("user message");
    assert!(user.content.contains("[INCOMING HANDOFF FROM COORDINATOR]"));
    assert!(user.content.contains("TASK: implement the cache"));
    assert!(user.content.contains(&long_context));
}

#[tokio::test]
async fn test_architecture_plan_routes_smart_and_strips_wrapping_fence() {
    let h = harness("```markdown\n# Plan\nUse a queue\n```").await;
    let agent = agent_for(&h, RoleKey::Architect);

    let plan = agent
        .architecture_plan("design a job queue", RunOptions::default())
        .await
        .expect("plan");
    assert_eq!(plan, "# Plan\nUse a queue");

    let call = last_call(&h);
    // Architecture at high complexity lands on the smart variant.
    assert_eq!(call.variant.as_deref(), Some("claude-opus-4-5"));
    let user = call
        .messages
        .iter()
        .find(|m| m.role == MessageRole::User)
        .expect("user message");
    assert!(user.content.contains("design a job queue"));
}

#[tokio::test]
async fn test_user_stories_route_smart_and_carry_the_requirements() {
    let h = harness("As a user, I want login, so that my data is private.").await;
    let agent = agent_for(&h, RoleKey::Analyst);

    let stories = agent
        .generate_user_stories("users must authenticate", RunOptions::default())
        .await
        .expect("stories");
    assert!(stories.contains("As a user"));

    let call = last_call(&h);
    assert_eq!(call.variant.as_deref(), Some("claude-opus-4-5"));
    let user = call
        .messages
        .iter()
        .find(|m| m.role == MessageRole::User)
        .expect("user message");
    assert!(user.content.contains("users must authenticate"));
}

#[tokio::test]
async fn test_analyze_request_embeds_the_request_in_the_prompt() {
    let h = harness("Requirements: a list, an add form, persistence.").await;
    let agent = agent_for(&h, RoleKey::Analyst);

    let analysis = agent
        .analyze_request("build a todo app", RunOptions::default())
        .await
        .expect("analysis");
    assert!(analysis.contains("Requirements"));

    let call = last_call(&h);
    assert_eq!(call.variant.as_deref(), Some("claude-opus-4-5"));
    let user = call
        .messages
        .iter()
        .find(|m| m.role == MessageRole::User)
        .expect("user message");
    assert!(user.content.contains("build a todo app"));
}

#[tokio::test]
async fn test_generate_feature_routes_reasoning_and_extracts_blocks() {
    let h = harness("Here:\n```rust\nfn add(a: i32, b: i32) -> i32 { a + b }\n```").await;
    let agent = agent_for(&h, RoleKey::Developer);

    let result = agent
        .generate_feature("an add function", RunOptions::default())
        .await
        .expect("feature");
    assert_eq!(result.code_blocks.len(), 1);
    assert_eq!(result.code_blocks[0].language, "rust");
    assert!(result.code_blocks[0].code.contains("fn add"));

    // The developer's default profile picks the reasoning variant.
    assert_eq!(last_call(&h).variant.as_deref(), Some("claude-opus-4-1"));
}

#[tokio::test]
async fn test_review_code_routes_smart_and_parses_the_verdict() {
    let h = harness("Solid work.\n[APPROVE]").await;
    let agent = agent_for(&h, RoleKey::Reviewer);

    let review = agent
        .review_code("fn main() {}", RunOptions::default())
        .await
        .expect("review");
    assert_eq!(review.verdict, Verdict::Approved);
    assert!(review.response.contains("Solid work"));

    assert_eq!(last_call(&h).variant.as_deref(), Some("claude-opus-4-5"));
}

#[tokio::test]
async fn test_specialist_operations_reject_the_wrong_role() {
    let h = harness("unused").await;

    let developer = agent_for(&h, RoleKey::Developer);
    let err = developer
        .review_code("fn main() {}", RunOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let analyst = agent_for(&h, RoleKey::Analyst);
    let err = analyst
        .architecture_plan("design something", RunOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    // The guard fires before any backend call.
    assert_eq!(call_count(&h), 0);
}

#[tokio::test]
async fn test_unknown_handoff_target_leaves_no_audit_row() {
    let h = harness("unused").await;
    let conversation = h
        .db
        .conversations()
        .create_conversation(None, "relay")
        .await
        .expect("conversation");

    let coordinator = HandoffCoordinator::new(
        h.db.handoffs(),
        Arc::clone(&h.router),
        Arc::clone(&h.assembler),
        Arc::new(h.db.conversations()),
        h._dir.path().join("prompts"),
    );

    let err = coordinator
        .transfer(
            conversation.id,
            RoleKey::Coordinator,
            "magician",
            "do magic",
            "context",
            None,
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("magician"));

    let records = h
        .db
        .handoffs()
        .list_for_conversation(conversation.id)
        .await
        .expect("records");
    assert!(records.is_empty());
}
