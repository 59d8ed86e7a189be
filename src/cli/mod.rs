use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod commands;

use commands::admin::{AdminApproveCommand, AdminPromoteCommand, AdminRejectCommand, AdminRemoveCommand};
use commands::archive::{ArchiveApproveCommand, ArchiveRejectCommand, ArchiveStartCommand};
use commands::init::InitCommand;
use commands::member::MemberAddCommand;
use commands::project::{
    ProjectCreateCommand, ProjectListCommand, ProjectShowCommand, ProjectStatusCommand,
};
use commands::task::{TaskAssignCommand, TaskCreateCommand, TaskListCommand, TaskStatusCommand};
use commands::Command;

#[derive(Parser)]
#[command(name = "boardroom")]
#[command(about = "Quorum-gated project governance over a shared document store")]
#[command(long_about = "Boardroom manages project rosters with owner/admin/member roles, \
                       full-consensus archiving with any-admin veto, and quorum-gated \
                       admin removal. Start with 'boardroom init', then create a project \
                       with 'boardroom project create --name ... --as you'.")]
pub struct Cli {
    /// Principal performing the operation
    #[arg(long = "as", value_name = "PRINCIPAL", global = true)]
    pub acting_as: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the working directory: default config plus store layout
    Init {
        /// Overwrite an existing boardroom.toml
        #[arg(long, help = "Overwrite existing configuration")]
        force: bool,
    },
    /// Create, inspect and update projects
    #[command(subcommand)]
    Project(ProjectAction),
    /// Roster membership operations
    #[command(subcommand)]
    Member(MemberAction),
    /// Admin promotion and quorum-gated removal
    #[command(subcommand)]
    Admin(AdminAction),
    /// Full-consensus project archiving
    #[command(subcommand)]
    Archive(ArchiveAction),
    /// Task operations within a project
    #[command(subcommand)]
    Task(TaskAction),
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a project owned by the acting principal
    Create {
        /// Project name (3 to 100 characters)
        #[arg(long)]
        name: String,
        /// Free-form description (up to 500 characters)
        #[arg(long, default_value = "")]
        description: String,
        /// Optional RFC 3339 deadline, e.g. 2026-12-31T00:00:00Z
        #[arg(long)]
        deadline: Option<String>,
        /// Seed member, repeatable
        #[arg(long = "member", value_name = "PRINCIPAL")]
        members: Vec<String>,
    },
    /// Show one project with roster and pending governance rounds
    Show {
        /// Project id
        project: String,
    },
    /// List all projects in the store
    List,
    /// Move the delivery status (not-started, in-progress, completed, on-hold)
    Status {
        /// Project id
        project: String,
        /// New status
        status: String,
    },
}

#[derive(Subcommand)]
pub enum MemberAction {
    /// Add a principal to the roster as a member
    Add {
        /// Project id
        project: String,
        /// Principal to add
        principal: String,
    },
}

#[derive(Subcommand)]
pub enum AdminAction {
    /// Promote a member to admin (single step, no quorum)
    Promote {
        /// Project id
        project: String,
        /// Member to promote
        target: String,
    },
    /// Start (or rejoin) a removal round against an admin
    Remove {
        /// Project id
        project: String,
        /// Admin to demote
        target: String,
    },
    /// Approve a pending removal round
    Approve {
        /// Project id
        project: String,
        /// Targeted admin
        target: String,
    },
    /// Reject a pending removal round, clearing it
    Reject {
        /// Project id
        project: String,
        /// Targeted admin
        target: String,
    },
}

#[derive(Subcommand)]
pub enum ArchiveAction {
    /// Start an archive round (archives immediately for a sole admin)
    Start {
        /// Project id
        project: String,
    },
    /// Approve the pending archive round
    Approve {
        /// Project id
        project: String,
    },
    /// Veto the pending archive round, restoring the active state
    Reject {
        /// Project id
        project: String,
    },
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a task in a project
    Create {
        /// Project id
        project: String,
        /// Task title (3 to 100 characters)
        #[arg(long)]
        title: String,
        /// Free-form description (up to 500 characters)
        #[arg(long, default_value = "")]
        description: String,
        /// Priority: low, medium or high
        #[arg(long, default_value = "medium")]
        priority: String,
        /// Optional RFC 3339 deadline
        #[arg(long)]
        deadline: Option<String>,
        /// Assignee, repeatable, at least one required
        #[arg(long = "assignee", value_name = "PRINCIPAL")]
        assignees: Vec<String>,
    },
    /// Replace the assignee set of a task
    Assign {
        /// Task id
        task: String,
        /// Assignee, repeatable, at least one required
        #[arg(long = "assignee", value_name = "PRINCIPAL")]
        assignees: Vec<String>,
    },
    /// Move a task's status (not-started, in-progress, completed, blocked)
    Status {
        /// Task id
        task: String,
        /// New status
        status: String,
    },
    /// List the tasks of a project
    List {
        /// Project id
        project: String,
    },
}

/// Dispatch a parsed invocation to its command handler.
pub async fn run(cli: Cli) -> Result<()> {
    let actor = cli.acting_as;
    match cli.command {
        Commands::Init { force } => InitCommand::new(force).execute().await,
        Commands::Project(action) => match action {
            ProjectAction::Create {
                name,
                description,
                deadline,
                members,
            } => {
                ProjectCreateCommand::new(actor, name, description, deadline, members)
                    .execute()
                    .await
            }
            ProjectAction::Show { project } => ProjectShowCommand::new(project).execute().await,
            ProjectAction::List => ProjectListCommand::new().execute().await,
            ProjectAction::Status { project, status } => {
                ProjectStatusCommand::new(actor, project, status).execute().await
            }
        },
        Commands::Member(action) => match action {
            MemberAction::Add { project, principal } => {
                MemberAddCommand::new(actor, project, principal).execute().await
            }
        },
        Commands::Admin(action) => match action {
            AdminAction::Promote { project, target } => {
                AdminPromoteCommand::new(actor, project, target).execute().await
            }
            AdminAction::Remove { project, target } => {
                AdminRemoveCommand::new(actor, project, target).execute().await
            }
            AdminAction::Approve { project, target } => {
                AdminApproveCommand::new(actor, project, target).execute().await
            }
            AdminAction::Reject { project, target } => {
                AdminRejectCommand::new(actor, project, target).execute().await
            }
        },
        Commands::Archive(action) => match action {
            ArchiveAction::Start { project } => {
                ArchiveStartCommand::new(actor, project).execute().await
            }
            ArchiveAction::Approve { project } => {
                ArchiveApproveCommand::new(actor, project).execute().await
            }
            ArchiveAction::Reject { project } => {
                ArchiveRejectCommand::new(actor, project).execute().await
            }
        },
        Commands::Task(action) => match action {
            TaskAction::Create {
                project,
                title,
                description,
                priority,
                deadline,
                assignees,
            } => {
                TaskCreateCommand::new(actor, project, title, description, priority, deadline, assignees)
                    .execute()
                    .await
            }
            TaskAction::Assign { task, assignees } => {
                TaskAssignCommand::new(actor, task, assignees).execute().await
            }
            TaskAction::Status { task, status } => {
                TaskStatusCommand::new(actor, task, status).execute().await
            }
            TaskAction::List { project } => TaskListCommand::new(project).execute().await,
        },
    }
}
