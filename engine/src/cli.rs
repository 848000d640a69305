//! Command-line interface definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "troupe")]
#[command(about = "Role-specialized AI agents with model routing and project memory")]
#[command(version)]
pub struct Cli {
    /// Path to a config file (defaults to ~/.troupe/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level override (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log: Option<String>,

    /// Emit machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Send a request to an agent
    Ask {
        /// The request text
        prompt: String,

        /// Agent role to address (coordinator, analyst, architect, developer, reviewer)
        #[arg(long, short, default_value = "coordinator")]
        role: String,

        /// Project whose memory is recalled into the context
        #[arg(long, short)]
        project: Option<i64>,

        /// Conversation to persist the exchange into
        #[arg(long, short)]
        conversation: Option<i64>,

        /// Start a new conversation for this exchange and print its id
        #[arg(long, conflicts_with = "conversation")]
        new_conversation: bool,

        /// Explicit model override (variant name or backend name)
        #[arg(long, short)]
        model: Option<String>,

        /// Task type hint for routing (e.g. quick_answer, architecture)
        #[arg(long)]
        task_type: Option<String>,

        /// Complexity hint for routing (low, medium, high)
        #[arg(long)]
        complexity: Option<String>,

        /// Force the fast backend regardless of task type
        #[arg(long)]
        fast: bool,

        /// File whose contents are attached to the context
        #[arg(long)]
        attach: Option<PathBuf>,
    },

    /// List the available agent roles
    Roles,

    /// Manage projects
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Manage project memory
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },

    /// Show the recent turns of a conversation
    History {
        /// Conversation id
        conversation: i64,

        /// Number of turns to show
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },

    /// Hand a task from one agent role to another
    Handoff {
        /// Conversation the handoff belongs to
        #[arg(long, short)]
        conversation: i64,

        /// Role handing off the task
        #[arg(long, default_value = "coordinator")]
        from: String,

        /// Role receiving the task
        #[arg(long)]
        to: String,

        /// One-line task summary
        #[arg(long)]
        task: String,

        /// Full context carried to the target agent
        #[arg(long, default_value = "")]
        context: String,

        /// Project whose memory is recalled by the target agent
        #[arg(long, short)]
        project: Option<i64>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a new project
    Create {
        /// Project name
        name: String,
    },
    /// List all projects
    List,
    /// Delete a project and its memory
    Delete {
        /// Project id
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum MemoryAction {
    /// Record a memory entry for a project
    Add {
        /// Project id
        #[arg(long, short)]
        project: i64,

        /// Entry category (decision, requirement, note, ...)
        #[arg(long, default_value = "note")]
        category: String,

        /// Importance from 1 to 10; 8+ counts as critical
        #[arg(long, default_value_t = 5)]
        importance: i64,

        /// The content to remember
        content: String,
    },
    /// Show a project's memory as agents will see it
    Show {
        /// Project id
        #[arg(long, short)]
        project: i64,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write a default config file if none exists
    Init,
    /// Print the active configuration
    Show,
}
