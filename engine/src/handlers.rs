//! Command handlers
//!
//! Wires the configuration, database, and model stack together and
//! executes one CLI command. Output goes to stdout as text or JSON;
//! everything diagnostic goes through tracing.

use crate::agent::{detect_mode, load_instructions, Agent, HandoffCoordinator, Mode, RoleKey};
use crate::cli::{Command, ConfigAction, MemoryAction, ProjectAction};
use crate::config::Config;
use crate::context::{format_memory_block, ContextAssembler};
use crate::db::Database;
use crate::error::{EngineError, Result};
use crate::llm::invoker::Invoker;
use crate::llm::router::Router;
use crate::llm::selector::{Complexity, TaskProfile, TaskType};
use crate::secrets::SecretStore;
use std::sync::Arc;

/// Everything a command needs once the stack is up
struct Services {
    db: Database,
    router: Arc<Router>,
    assembler: Arc<ContextAssembler>,
    config: Config,
}

impl Services {
    async fn start(config: Config) -> Result<Self> {
        let db = Database::new(&config.db_path()).await?;
        let secrets = SecretStore::new();
        let invoker = Invoker::from_config(&config.llm, &secrets);
        let router = Arc::new(Router::new(invoker, &config.llm));
        let assembler = Arc::new(ContextAssembler::new(db.memory(), config.memory.clone()));

        Ok(Self {
            db,
            router,
            assembler,
            config,
        })
    }

    fn agent(&self, role: RoleKey) -> Agent {
        Agent::new(
            role,
            load_instructions(role, &self.config.core.prompt_dir),
            Arc::clone(&self.router),
            Arc::clone(&self.assembler),
            Arc::new(self.db.conversations()),
        )
    }

    async fn shutdown(self) -> Result<()> {
        self.db.close().await?;
        Ok(())
    }
}

/// Execute one parsed command.
pub async fn dispatch(command: Command, config: Config, json: bool) -> Result<()> {
    match command {
        Command::Ask {
            prompt,
            role,
            project,
            conversation,
            new_conversation,
            model,
            task_type,
            complexity,
            fast,
            attach,
        } => {
            let services = Services::start(config).await?;
            let result = handle_ask(
                &services,
                &prompt,
                &role,
                project,
                conversation,
                new_conversation,
                model.as_deref(),
                task_type.as_deref(),
                complexity.as_deref(),
                fast,
                attach.as_deref(),
                json,
            )
            .await;
            services.shutdown().await?;
            result
        }

        Command::Roles => {
            if json {
                let roles: Vec<_> = RoleKey::ALL
                    .iter()
                    .map(|r| {
                        serde_json::json!({
                            "role": r.as_str(),
                            "description": r.description(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&roles)?);
            } else {
                for role in RoleKey::ALL {
                    println!("{:<12} {}", role.as_str(), role.description());
                }
            }
            Ok(())
        }

        Command::Project { action } => {
            let services = Services::start(config).await?;
            let result = handle_project(&services, action, json).await;
            services.shutdown().await?;
            result
        }

        Command::Memory { action } => {
            let services = Services::start(config).await?;
            let result = handle_memory(&services, action, json).await;
            services.shutdown().await?;
            result
        }

        Command::History {
            conversation,
            limit,
        } => {
            let services = Services::start(config).await?;
            let result = handle_history(&services, conversation, limit, json).await;
            services.shutdown().await?;
            result
        }

        Command::Handoff {
            conversation,
            from,
            to,
            task,
            context,
            project,
        } => {
            let services = Services::start(config).await?;
            let result = handle_handoff(
                &services,
                conversation,
                &from,
                &to,
                &task,
                &context,
                project,
                json,
            )
            .await;
            services.shutdown().await?;
            result
        }

        Command::Config { action } => handle_config(action, config, json),
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_ask(
    services: &Services,
    prompt: &str,
    role: &str,
    project: Option<i64>,
    conversation: Option<i64>,
    new_conversation: bool,
    model: Option<&str>,
    task_type: Option<&str>,
    complexity: Option<&str>,
    fast: bool,
    attach: Option<&std::path::Path>,
    json: bool,
) -> Result<()> {
    let mut role: RoleKey = role.parse()?;

    // Actionable work aimed at the coordinator goes to the developer
    // pipeline; the coordinator stays conversational.
    if role == RoleKey::Coordinator && detect_mode(prompt) == Mode::Agent {
        tracing::info!("Actionable request detected, routing to the developer role");
        role = RoleKey::Developer;
    }

    let conversations = services.db.conversations();
    let conversation = if new_conversation {
        let title: String = prompt.chars().take(60).collect();
        let created = conversations.create_conversation(project, &title).await?;
        if !json {
            println!("Conversation {} started", created.id);
        }
        Some(created.id)
    } else {
        if let Some(id) = conversation {
            if conversations.get_conversation(id).await?.is_none() {
                return Err(EngineError::Validation(format!(
                    "No conversation with id {}",
                    id
                )));
            }
        }
        conversation
    };

    let profile = build_profile(task_type, complexity, fast)?;

    let artifacts = match attach {
        Some(path) => Some(std::fs::read_to_string(path).map_err(|e| {
            EngineError::Validation(format!("Cannot read attachment {}: {}", path.display(), e))
        })?),
        None => None,
    };

    let agent = services.agent(role);
    let options = crate::agent::core::RunOptions {
        project_id: project,
        conversation_id: conversation,
        profile,
        model_override: model,
        artifacts: artifacts.as_deref(),
    };
    let response = agent.run(prompt, options).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "role": role.as_str(),
                "model": response.choice.label(),
                "conversation": conversation,
                "response": response.text,
            }))?
        );
    } else {
        println!("{}", response.text);
    }
    Ok(())
}

/// Merge routing hints into a profile; absent hints leave the role's
/// default profile in force.
fn build_profile(
    task_type: Option<&str>,
    complexity: Option<&str>,
    fast: bool,
) -> Result<Option<TaskProfile>> {
    if task_type.is_none() && complexity.is_none() && !fast {
        return Ok(None);
    }

    let task_type = match task_type {
        // Infallible parse; unknown strings become General.
        Some(s) => s.parse().unwrap_or(TaskType::General),
        None => TaskType::General,
    };
    let complexity = match complexity {
        Some(s) => s.parse().unwrap_or(Complexity::Medium),
        None => Complexity::Medium,
    };
    Ok(Some(TaskProfile::new(task_type, complexity, fast)))
}

async fn handle_project(services: &Services, action: ProjectAction, json: bool) -> Result<()> {
    let projects = services.db.projects();
    match action {
        ProjectAction::Create { name } => {
            let project = projects.create(&name).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&project)?);
            } else {
                println!("Created project {} (id {})", project.name, project.id);
            }
        }
        ProjectAction::List => {
            let all = projects.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&all)?);
            } else if all.is_empty() {
                println!("No projects yet");
            } else {
                for p in all {
                    println!("{:<6} {}", p.id, p.name);
                }
            }
        }
        ProjectAction::Delete { id } => {
            let deleted = projects.delete(id).await?;
            if deleted == 0 {
                return Err(EngineError::Validation(format!("No project with id {}", id)));
            }
            println!("Deleted project {}", id);
        }
    }
    Ok(())
}

async fn handle_memory(services: &Services, action: MemoryAction, json: bool) -> Result<()> {
    let memory = services.db.memory();
    match action {
        MemoryAction::Add {
            project,
            category,
            importance,
            content,
        } => {
            if services.db.projects().get(project).await?.is_none() {
                return Err(EngineError::Validation(format!(
                    "No project with id {}",
                    project
                )));
            }
            let entry = memory.add_entry(project, &category, &content, importance).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entry)?);
            } else {
                println!("Remembered entry {} in [{}]", entry.id, entry.category);
            }
        }
        MemoryAction::Show { project } => {
            let cfg = &services.config.memory;
            let critical = memory
                .get_important(project, cfg.critical_min_importance, cfg.critical_limit)
                .await?;
            let recent = memory.get_recent(project, cfg.recent_limit).await?;
            let block = format_memory_block(&critical, &recent);
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "critical": critical,
                        "recent": recent,
                        "rendered": block,
                    }))?
                );
            } else if block.is_empty() {
                println!("No memory for project {}", project);
            } else {
                println!("{}", block);
            }
        }
    }
    Ok(())
}

async fn handle_history(
    services: &Services,
    conversation: i64,
    limit: i64,
    json: bool,
) -> Result<()> {
    let turns = services
        .db
        .conversations()
        .recent_turns(conversation, limit)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&turns)?);
    } else if turns.is_empty() {
        println!("No turns in conversation {}", conversation);
    } else {
        for turn in turns {
            let speaker = match turn.role_key {
                Some(ref key) => format!("{} ({})", turn.role.as_str(), key),
                None => turn.role.as_str().to_string(),
            };
            println!("[{}] {}", speaker, turn.content);
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn handle_handoff(
    services: &Services,
    conversation: i64,
    from: &str,
    to: &str,
    task: &str,
    context: &str,
    project: Option<i64>,
    json: bool,
) -> Result<()> {
    let from: RoleKey = from.parse()?;

    if services
        .db
        .conversations()
        .get_conversation(conversation)
        .await?
        .is_none()
    {
        return Err(EngineError::Validation(format!(
            "No conversation with id {}",
            conversation
        )));
    }

    let coordinator = HandoffCoordinator::new(
        services.db.handoffs(),
        Arc::clone(&services.router),
        Arc::clone(&services.assembler),
        Arc::new(services.db.conversations()),
        services.config.core.prompt_dir.clone(),
    );

    let response = coordinator
        .transfer(conversation, from, to, task, context, project)
        .await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "from": from.as_str(),
                "to": to,
                "response": response,
            }))?
        );
    } else {
        println!("{}", response);
    }
    Ok(())
}

fn handle_config(action: ConfigAction, config: Config, json: bool) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = Config::default_config_path()?;
            Config::load_or_create()?;
            println!("Config ready at {}", path.display());
        }
        ConfigAction::Show => {
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                let rendered = toml::to_string_pretty(&config)
                    .map_err(|e| EngineError::Config(format!("Cannot render config: {}", e)))?;
                println!("{}", rendered);
            }
        }
    }
    Ok(())
}
