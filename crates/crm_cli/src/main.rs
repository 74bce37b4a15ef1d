//! `crm` command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration from flags, environment and `.env`.
//! - Route subcommands to `crm_core::api` and print JSON results.

use clap::{Args, Parser, Subcommand};
use crm_core::api;
use crm_core::repo::directory_repo::{DirectoryRepository, SqliteDirectoryRepository};
use crm_core::repo::proposal_repo::ProposalListQuery;
use crm_core::repo::task_repo::TaskListQuery;
use crm_core::ListContactsParams;
use log::info;
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use uuid::Uuid;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Debug, Parser)]
#[command(name = "crm")]
#[command(about = "CRM contact store and query engine", long_about = None)]
struct Cli {
    /// SQLite database file.
    #[arg(long, env = "CRM_DB_PATH", default_value = "crm.sqlite3", global = true)]
    db: PathBuf,
    /// trace|debug|info|warn|error
    #[arg(long, env = "CRM_LOG_LEVEL", global = true)]
    log_level: Option<String>,
    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long, env = "CRM_LOG_DIR", global = true)]
    log_dir: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Contact listing and CRUD
    #[command(subcommand)]
    Contacts(ContactCommand),
    /// Activity history
    #[command(subcommand)]
    Activity(ActivityCommand),
    /// Follow-up tasks
    #[command(subcommand)]
    Tasks(TaskCommand),
    /// Proposals and their status history
    #[command(subcommand)]
    Proposals(ProposalCommand),
    /// Saved contact-list views
    #[command(subcommand)]
    Views(ViewCommand),
    /// Users and organizations
    #[command(subcommand)]
    Directory(DirectoryCommand),
}

#[derive(Debug, Subcommand)]
enum ContactCommand {
    /// List contacts (cursor mode when --limit is given)
    List(ListArgs),
    /// Show one contact with owner, recent activities, tasks and proposals
    Show { id: String },
    /// Create a contact from a JSON body
    Add {
        #[arg(long)]
        json: String,
    },
    /// Patch a contact from a JSON body
    Update {
        id: String,
        #[arg(long)]
        json: String,
    },
    /// Delete a contact and its history
    Delete { id: String },
}

#[derive(Debug, Args)]
struct ListArgs {
    #[arg(long)]
    stage: Option<String>,
    #[arg(long)]
    owner: Option<String>,
    #[arg(long)]
    vehicle: Option<String>,
    #[arg(long = "type")]
    contact_type: Option<String>,
    #[arg(long)]
    q: Option<String>,
    /// `<field>_<asc|desc>`
    #[arg(long)]
    sort: Option<String>,
    #[arg(long)]
    limit: Option<String>,
    #[arg(long)]
    cursor: Option<String>,
    #[arg(long)]
    skip: Option<String>,
    #[arg(long)]
    take: Option<String>,
}

impl From<ListArgs> for ListContactsParams {
    fn from(args: ListArgs) -> Self {
        ListContactsParams {
            stage: args.stage,
            owner_user_id: args.owner,
            vehicle: args.vehicle,
            contact_type: args.contact_type,
            q: args.q,
            search: None,
            sort: args.sort,
            limit: args.limit,
            cursor: args.cursor,
            skip: args.skip,
            take: args.take,
        }
    }
}

#[derive(Debug, Subcommand)]
enum ActivityCommand {
    /// List a contact's activities, newest first
    List {
        #[arg(long)]
        contact: String,
    },
    /// Log an activity from a JSON body
    Log {
        #[arg(long)]
        json: String,
    },
}

#[derive(Debug, Subcommand)]
enum TaskCommand {
    List {
        #[arg(long)]
        contact: Option<Uuid>,
        #[arg(long, value_parser = parse_task_status)]
        status: Option<crm_core::model::task::TaskStatus>,
        #[arg(long, default_value_t = 0)]
        skip: u32,
        #[arg(long)]
        take: Option<u32>,
    },
    Add {
        #[arg(long)]
        json: String,
    },
    Update {
        id: String,
        #[arg(long)]
        json: String,
    },
}

#[derive(Debug, Subcommand)]
enum ProposalCommand {
    List {
        #[arg(long)]
        contact: Option<Uuid>,
        #[arg(long, default_value_t = 0)]
        skip: u32,
        #[arg(long)]
        take: Option<u32>,
    },
    Show {
        id: String,
    },
    Add {
        #[arg(long)]
        json: String,
    },
    Update {
        id: String,
        #[arg(long)]
        json: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Subcommand)]
enum ViewCommand {
    List {
        #[arg(long)]
        user: Uuid,
    },
    Add {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        json: String,
    },
    Update {
        id: String,
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        json: String,
    },
    Delete {
        id: String,
        #[arg(long)]
        user: Uuid,
    },
}

#[derive(Debug, Subcommand)]
enum DirectoryCommand {
    AddUser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: Option<String>,
    },
    AddOrg {
        #[arg(long)]
        name: String,
    },
    Users,
    Orgs,
}

fn parse_task_status(raw: &str) -> Result<crm_core::model::task::TaskStatus, String> {
    crm_core::model::task::TaskStatus::parse(&raw.to_ascii_uppercase())
        .ok_or_else(|| format!("unknown task status `{raw}`"))
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli
            .log_level
            .as_deref()
            .unwrap_or(crm_core::default_log_level());
        crm_core::init_logging(level, log_dir)?;
    }

    let conn = crm_core::open_db(&cli.db)?;
    info!(
        "event=cli_command module=cli status=start db={}",
        cli.db.display()
    );

    match cli.command {
        Commands::Contacts(command) => match command {
            ContactCommand::List(args) => {
                print_json(&api::list_contacts(&conn, &args.into())?)
            }
            ContactCommand::Show { id } => print_json(&api::get_contact(&conn, &id)?),
            ContactCommand::Add { json } => {
                print_json(&api::create_contact(&conn, api::parse_body(&json)?)?)
            }
            ContactCommand::Update { id, json } => {
                print_json(&api::update_contact(&conn, &id, api::parse_body(&json)?)?)
            }
            ContactCommand::Delete { id } => print_json(&api::delete_contact(&conn, &id)?),
        },
        Commands::Activity(command) => match command {
            ActivityCommand::List { contact } => {
                print_json(&api::list_activities(&conn, Some(&contact))?)
            }
            ActivityCommand::Log { json } => {
                print_json(&api::create_activity(&conn, api::parse_body(&json)?)?)
            }
        },
        Commands::Tasks(command) => match command {
            TaskCommand::List {
                contact,
                status,
                skip,
                take,
            } => print_json(&api::list_tasks(
                &conn,
                &TaskListQuery {
                    contact_id: contact,
                    status,
                    skip,
                    take,
                },
            )?),
            TaskCommand::Add { json } => {
                print_json(&api::create_task(&conn, api::parse_body(&json)?)?)
            }
            TaskCommand::Update { id, json } => {
                print_json(&api::update_task(&conn, &id, api::parse_body(&json)?)?)
            }
        },
        Commands::Proposals(command) => match command {
            ProposalCommand::List {
                contact,
                skip,
                take,
            } => print_json(&api::list_proposals(
                &conn,
                &ProposalListQuery {
                    contact_id: contact,
                    skip,
                    take,
                },
            )?),
            ProposalCommand::Show { id } => print_json(&api::get_proposal(&conn, &id)?),
            ProposalCommand::Add { json } => {
                print_json(&api::create_proposal(&conn, api::parse_body(&json)?)?)
            }
            ProposalCommand::Update { id, json } => {
                print_json(&api::update_proposal(&conn, &id, api::parse_body(&json)?)?)
            }
            ProposalCommand::Delete { id } => print_json(&api::delete_proposal(&conn, &id)?),
        },
        Commands::Views(command) => match command {
            ViewCommand::List { user } => print_json(&api::list_views(&conn, user)?),
            ViewCommand::Add { user, json } => {
                print_json(&api::create_view(&conn, user, api::parse_body(&json)?)?)
            }
            ViewCommand::Update { id, user, json } => print_json(&api::update_view(
                &conn,
                user,
                &id,
                api::parse_body(&json)?,
            )?),
            ViewCommand::Delete { id, user } => {
                print_json(&api::delete_view(&conn, user, &id)?)
            }
        },
        Commands::Directory(command) => {
            let repo = SqliteDirectoryRepository::new(&conn);
            match command {
                DirectoryCommand::AddUser { email, name } => {
                    print_json(&repo.create_user(&email, name.as_deref())?)
                }
                DirectoryCommand::AddOrg { name } => {
                    print_json(&repo.create_organization(&name)?)
                }
                DirectoryCommand::Users => print_json(&repo.list_users()?),
                DirectoryCommand::Orgs => print_json(&repo.list_organizations()?),
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
