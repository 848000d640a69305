//! Database integration tests over a real temporary SQLite file.

use tempfile::TempDir;
use troupe_engine::context::format_memory_block;
use troupe_engine::db::{Database, TurnRole};

async fn open_db(dir: &TempDir) -> Database {
    Database::new(&dir.path().join("test.db"))
        .await
        .expect("database opens")
}

#[tokio::test]
async fn test_memory_importance_filter_and_order() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir).await;

    let project = db.projects().create("demo").await.expect("project");
    let memory = db.memory();
    memory
        .add_entry(project.id, "decision", "Use SQLite", 9)
        .await
        .expect("entry");
    memory
        .add_entry(project.id, "note", "Logo needs work", 2)
        .await
        .expect("entry");
    memory
        .add_entry(project.id, "decision", "Ship CLI first", 10)
        .await
        .expect("entry");

    let critical = memory
        .get_important(project.id, 8, 5)
        .await
        .expect("important entries");

    assert_eq!(critical.len(), 2);
    // Highest importance first.
    assert_eq!(critical[0].content, "Ship CLI first");
    assert_eq!(critical[1].content, "Use SQLite");

    db.close().await.expect("close");
}

#[tokio::test]
async fn test_memory_recall_renders_without_duplicates() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir).await;

    let project = db.projects().create("demo").await.expect("project");
    let memory = db.memory();
    // Critical and recent at once: must appear exactly once in the render.
    memory
        .add_entry(project.id, "decision", "Use SQLite", 9)
        .await
        .expect("entry");
    memory
        .add_entry(project.id, "note", "Benchmarks pending", 3)
        .await
        .expect("entry");

    let critical = memory.get_important(project.id, 8, 5).await.expect("critical");
    let recent = memory.get_recent(project.id, 5).await.expect("recent");
    let block = format_memory_block(&critical, &recent);

    assert_eq!(block.matches("Use SQLite").count(), 1);
    assert!(block.contains("[CRITICAL DECISIONS]"));
    assert!(block.contains("[RECENT UPDATES]"));
    assert!(block.contains("Benchmarks pending"));

    db.close().await.expect("close");
}

#[tokio::test]
async fn test_recent_turns_returns_window_oldest_first() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir).await;

    let conversations = db.conversations();
    let conversation = conversations
        .create_conversation(None, "test chat")
        .await
        .expect("conversation");

    for i in 0..6 {
        conversations
            .add_turn(
                conversation.id,
                if i % 2 == 0 {
                    TurnRole::User
                } else {
                    TurnRole::Assistant
                },
                &format!("turn {}", i),
                None,
                None,
            )
            .await
            .expect("turn");
    }

    let turns = conversations
        .recent_turns(conversation.id, 4)
        .await
        .expect("turns");

    // The last four turns, in chronological order.
    assert_eq!(turns.len(), 4);
    let contents: Vec<&str> = turns.iter().map(|t| t.content.as_str()).collect();
    assert_eq!(contents, vec!["turn 2", "turn 3", "turn 4", "turn 5"]);

    db.close().await.expect("close");
}

#[tokio::test]
async fn test_turn_records_role_key_and_model() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir).await;

    let conversations = db.conversations();
    let conversation = conversations
        .create_conversation(None, "attributed chat")
        .await
        .expect("conversation");

    conversations
        .add_turn(
            conversation.id,
            TurnRole::Assistant,
            "the plan",
            Some("architect"),
            Some("anthropic:claude-opus-4-5"),
        )
        .await
        .expect("turn");

    let turns = conversations
        .recent_turns(conversation.id, 10)
        .await
        .expect("turns");
    assert_eq!(turns[0].role, TurnRole::Assistant);
    assert_eq!(turns[0].role_key.as_deref(), Some("architect"));
    assert_eq!(
        turns[0].model_used.as_deref(),
        Some("anthropic:claude-opus-4-5")
    );

    db.close().await.expect("close");
}

#[tokio::test]
async fn test_project_delete_cascades_memory() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir).await;

    let projects = db.projects();
    let project = projects.create("doomed").await.expect("project");
    db.memory()
        .add_entry(project.id, "note", "soon gone", 5)
        .await
        .expect("entry");

    let deleted = projects.delete(project.id).await.expect("delete");
    assert_eq!(deleted, 1);

    let remaining = db
        .memory()
        .get_recent(project.id, 10)
        .await
        .expect("query after delete");
    assert!(remaining.is_empty());

    db.close().await.expect("close");
}

#[tokio::test]
async fn test_handoff_audit_rows_ordered() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir).await;

    let conversation = db
        .conversations()
        .create_conversation(None, "relay")
        .await
        .expect("conversation");

    let handoffs = db.handoffs();
    handoffs
        .append(
            conversation.id,
            "coordinator",
            "architect",
            "design the cache",
            "requirements so far",
        )
        .await
        .expect("first handoff");
    handoffs
        .append(
            conversation.id,
            "architect",
            "developer",
            "implement the cache",
            "plan excerpt",
        )
        .await
        .expect("second handoff");

    let records = handoffs
        .list_for_conversation(conversation.id)
        .await
        .expect("list");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].to_role, "architect");
    assert_eq!(records[1].from_role, "architect");
    assert_eq!(records[1].to_role, "developer");

    db.close().await.expect("close");
}
