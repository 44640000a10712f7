//! Helpdeck CLI
//!
//! Command-line console for a helpdesk ticketing service: sign in once,
//! then browse, open, and work tickets against the remote API.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use hd_client::{ApiError, HttpApi, ResourceClient};
use hd_core::models::{
    CreateAgentRequest, CreateTicketRequest, Priority, ProblemTypeId, RegisterRequest,
    TicketFilter, TicketId, TicketStatus, UpdateTicketRequest,
};
use hd_core::routes::{admit, Admission, Route};
use hd_core::session::{SessionStore, TokenVault};
use hd_core::{navigation, UserId};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod config;
mod views;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "helpdeck")]
#[command(version)]
#[command(about = "Console client for a helpdesk ticketing service", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// API base URL override
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid output format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and persist the session
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Sign out and discard the persisted session
    Logout,

    /// Show the current identity and the destinations it may open
    Whoami,

    /// Register a new end-user account
    Register {
        /// Display name
        #[arg(long)]
        name: String,

        /// Account email
        #[arg(long)]
        email: String,

        /// Password
        #[arg(long)]
        password: String,
    },

    /// Browse and manage tickets
    Ticket {
        #[command(subcommand)]
        action: TicketCommands,
    },

    /// Manage support agents
    Agent {
        #[command(subcommand)]
        action: AgentCommands,
    },

    /// List problem types
    ProblemTypes,
}

#[derive(Subcommand)]
enum TicketCommands {
    /// List tickets
    List {
        /// Filter by status (open, in-progress, closed)
        #[arg(short, long)]
        status: Option<TicketStatus>,

        /// Filter by priority (low, medium, high)
        #[arg(short, long)]
        priority: Option<Priority>,

        /// Filter by problem type id
        #[arg(long)]
        problem_type: Option<ProblemTypeId>,

        /// Filter by visibility (true = public, false = private)
        #[arg(long)]
        public: Option<bool>,
    },

    /// Show a ticket with its replies
    Show {
        /// Ticket id
        id: TicketId,
    },

    /// Open a new ticket
    Create {
        /// Ticket title
        #[arg(short, long)]
        title: String,

        /// Ticket description
        #[arg(short, long)]
        description: String,

        /// Priority (low, medium, high)
        #[arg(short, long, default_value = "medium")]
        priority: Priority,

        /// Problem type id
        #[arg(long)]
        problem_type: ProblemTypeId,

        /// Keep the ticket visible only to you and assigned agents
        #[arg(long)]
        private: bool,
    },

    /// Update a ticket's status or priority
    Update {
        /// Ticket id
        id: TicketId,

        /// New status
        #[arg(short, long)]
        status: Option<TicketStatus>,

        /// New priority
        #[arg(short, long)]
        priority: Option<Priority>,
    },

    /// Assign a ticket to an agent
    Assign {
        /// Ticket id
        id: TicketId,

        /// Agent id
        #[arg(short, long)]
        agent: UserId,
    },

    /// Delete a ticket
    Delete {
        /// Ticket id
        id: TicketId,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Add a reply to a ticket
    Reply {
        /// Ticket id
        id: TicketId,

        /// Reply content
        #[arg(short, long)]
        message: String,
    },
}

#[derive(Subcommand)]
enum AgentCommands {
    /// List agent accounts
    List,

    /// Provision a new agent account
    Create {
        /// Display name
        #[arg(long)]
        name: String,

        /// Account email
        #[arg(long)]
        email: String,

        /// Password
        #[arg(long)]
        password: String,

        /// Problem type ids the agent specializes in
        #[arg(long = "specialization", value_name = "ID")]
        specializations: Vec<ProblemTypeId>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(config::default_config_path);
    let mut config = if config_path.exists() {
        AppConfig::load(&config_path)?
    } else {
        if cli.verbose {
            eprintln!("Using default configuration (no config file found)");
        }
        AppConfig::default()
    };
    if let Some(api_url) = &cli.api_url {
        config.api.base_url = api_url.clone();
    }

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        config
            .logging
            .level
            .parse()
            .unwrap_or(tracing::Level::INFO)
    };
    hd_observability::init_logging_with_config(hd_observability::LoggingConfig {
        level: log_level,
        json_format: cli.format == OutputFormat::Json || config.logging.json_format,
        ..Default::default()
    });

    let vault = match &config.token_path {
        Some(path) => TokenVault::new(path),
        None => TokenVault::new(TokenVault::default_path()),
    };
    let session = Arc::new(SessionStore::restore(vault)?);
    let api = Arc::new(HttpApi::new(
        &config.api.base_url,
        Duration::from_secs(config.api.timeout_secs),
    )?);
    let client = ResourceClient::new(api, session);

    // Resolve a persisted token before dispatch. Being offline only means
    // the identity stays unresolved; the command itself will surface it.
    match &cli.command {
        Commands::Login { .. } | Commands::Logout | Commands::Register { .. } => {}
        _ => {
            if let Err(e) = client.rehydrate().await {
                tracing::warn!(error = %e, "could not resolve the persisted session");
            }
        }
    }

    if let Err(e) = run(cli.command, &client, cli.format).await {
        if matches!(e.downcast_ref::<ApiError>(), Some(ApiError::SessionExpired)) {
            eprintln!("{}", "Session expired, you have been signed out.".yellow());
            eprintln!("Sign in again with: helpdeck login --email <email>");
        } else {
            eprintln!("{}: {}", "Error".red(), e);
        }
        std::process::exit(1);
    }
    Ok(())
}

/// Maps a command onto the destination the gate must admit.
///
/// `None` means the command is available in every session state.
fn route_for(command: &Commands) -> Option<Route> {
    match command {
        Commands::Login { .. } | Commands::Register { .. } => Some(Route::Login),
        Commands::Logout | Commands::Whoami => None,
        Commands::Ticket { action } => Some(match action {
            TicketCommands::List { .. } => Route::Tickets,
            TicketCommands::Create { .. } => Route::TicketCreate,
            TicketCommands::Show { id }
            | TicketCommands::Update { id, .. }
            | TicketCommands::Assign { id, .. }
            | TicketCommands::Delete { id, .. }
            | TicketCommands::Reply { id, .. } => Route::TicketDetail(*id),
        }),
        Commands::Agent { .. } => Some(Route::Agents),
        Commands::ProblemTypes => Some(Route::Tickets),
    }
}

async fn run(command: Commands, client: &ResourceClient, format: OutputFormat) -> Result<()> {
    if let Some(destination) = route_for(&command) {
        let identity = client.session().current_identity();
        match admit(destination, identity.as_ref()) {
            Admission::Allow => {}
            Admission::Redirect(Route::Login) => {
                println!("{}", "You are not signed in.".yellow());
                println!("Sign in with: helpdeck login --email <email>");
                return Ok(());
            }
            Admission::Redirect(target) => {
                println!(
                    "{} {} needs a role you do not have; showing {} instead.",
                    "Redirected:".yellow(),
                    destination,
                    target
                );
                return cmd_ticket_list(client, format, TicketFilter::default()).await;
            }
        }
    }

    match command {
        Commands::Login { email, password } => cmd_login(client, format, &email, password).await,
        Commands::Logout => cmd_logout(client),
        Commands::Whoami => cmd_whoami(client, format),
        Commands::Register {
            name,
            email,
            password,
        } => cmd_register(client, format, name, email, password).await,
        Commands::Ticket { action } => match action {
            TicketCommands::List {
                status,
                priority,
                problem_type,
                public,
            } => {
                let filter = TicketFilter {
                    status,
                    priority,
                    problem_type_id: problem_type,
                    is_public: public,
                };
                cmd_ticket_list(client, format, filter).await
            }
            TicketCommands::Show { id } => cmd_ticket_show(client, format, id).await,
            TicketCommands::Create {
                title,
                description,
                priority,
                problem_type,
                private,
            } => {
                let request = CreateTicketRequest {
                    title,
                    description,
                    priority,
                    problem_type_id: problem_type,
                    is_public: !private,
                };
                cmd_ticket_create(client, format, request).await
            }
            TicketCommands::Update {
                id,
                status,
                priority,
            } => cmd_ticket_update(client, format, id, status, priority).await,
            TicketCommands::Assign { id, agent } => {
                cmd_ticket_assign(client, format, id, agent).await
            }
            TicketCommands::Delete { id, yes } => cmd_ticket_delete(client, id, yes).await,
            TicketCommands::Reply { id, message } => {
                cmd_ticket_reply(client, format, id, &message).await
            }
        },
        Commands::Agent { action } => match action {
            AgentCommands::List => cmd_agent_list(client, format).await,
            AgentCommands::Create {
                name,
                email,
                password,
                specializations,
            } => {
                let request = CreateAgentRequest {
                    name,
                    email,
                    password,
                    specialization_ids: specializations,
                };
                cmd_agent_create(client, format, request).await
            }
        },
        Commands::ProblemTypes => cmd_problem_types(client, format).await,
    }
}

fn prompt_password() -> Result<String> {
    use std::io::{self, Write};
    print!("Password: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn cmd_login(
    client: &ResourceClient,
    format: OutputFormat,
    email: &str,
    password: Option<String>,
) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => prompt_password()?,
    };

    match client.login(email, &password).await {
        Ok(identity) => {
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&identity)?);
            } else {
                println!("{}", "Signed in.".green());
                views::print_identity(&identity, &navigation::visible_routes(Some(&identity)));
            }
            Ok(())
        }
        Err(ApiError::AuthenticationFailed(reason)) => {
            // Bad credentials stay a local message; any prior session is intact.
            println!("{}: {}", "Sign-in failed".red(), reason);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_logout(client: &ResourceClient) -> Result<()> {
    client.logout();
    println!("Signed out.");
    Ok(())
}

fn cmd_whoami(client: &ResourceClient, format: OutputFormat) -> Result<()> {
    match client.session().current_identity() {
        Some(identity) => {
            let routes = navigation::visible_routes(Some(&identity));
            if format == OutputFormat::Json {
                let destinations: Vec<String> = routes.iter().map(|r| r.to_string()).collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "identity": identity,
                        "destinations": destinations,
                    }))?
                );
            } else {
                views::print_identity(&identity, &routes);
            }
        }
        None => {
            println!("{}", "Not signed in.".yellow());
        }
    }
    Ok(())
}

async fn cmd_register(
    client: &ResourceClient,
    format: OutputFormat,
    name: String,
    email: String,
    password: String,
) -> Result<()> {
    let request = RegisterRequest {
        name,
        email,
        password,
    };
    let identity = client.register(&request).await?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&identity)?);
    } else {
        println!(
            "{} Account {} created; sign in with: helpdeck login --email {}",
            "Registered.".green(),
            identity.email,
            identity.email
        );
    }
    Ok(())
}

async fn cmd_ticket_list(
    client: &ResourceClient,
    format: OutputFormat,
    filter: TicketFilter,
) -> Result<()> {
    let tickets = client.list_tickets(&filter).await?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&tickets)?);
    } else {
        views::print_ticket_list(&tickets);
    }
    Ok(())
}

async fn cmd_ticket_show(client: &ResourceClient, format: OutputFormat, id: TicketId) -> Result<()> {
    let ticket = client.get_ticket(id).await?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&ticket)?);
    } else {
        views::print_ticket(&ticket);
    }
    Ok(())
}

async fn cmd_ticket_create(
    client: &ResourceClient,
    format: OutputFormat,
    request: CreateTicketRequest,
) -> Result<()> {
    let ticket = client.create_ticket(&request).await?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&ticket)?);
    } else {
        println!("{} #{}", "Ticket created:".green(), ticket.id);
        views::print_ticket(&ticket);
    }
    Ok(())
}

async fn cmd_ticket_update(
    client: &ResourceClient,
    format: OutputFormat,
    id: TicketId,
    status: Option<TicketStatus>,
    priority: Option<Priority>,
) -> Result<()> {
    if status.is_none() && priority.is_none() {
        println!("Nothing to update; pass --status and/or --priority.");
        return Ok(());
    }
    let request = UpdateTicketRequest { status, priority };
    let ticket = client.update_ticket(id, &request).await?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&ticket)?);
    } else {
        println!("{} #{}", "Ticket updated:".green(), ticket.id);
        views::print_ticket(&ticket);
    }
    Ok(())
}

async fn cmd_ticket_assign(
    client: &ResourceClient,
    format: OutputFormat,
    id: TicketId,
    agent: UserId,
) -> Result<()> {
    let ticket = client.assign_ticket(id, agent).await?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&ticket)?);
    } else {
        println!(
            "{} #{} assigned to {}",
            "Ticket".green(),
            ticket.id,
            ticket
                .assigned_to
                .as_ref()
                .map(|a| a.name.as_str())
                .unwrap_or("unknown")
        );
    }
    Ok(())
}

async fn cmd_ticket_delete(client: &ResourceClient, id: TicketId, yes: bool) -> Result<()> {
    if !yes {
        println!(
            "{}: Delete ticket #{}? This cannot be undone.",
            "Confirm".yellow(),
            id
        );
        println!("(use --yes to confirm)");
        return Ok(());
    }
    client.delete_ticket(id).await?;
    println!("Ticket #{} deleted.", id);
    Ok(())
}

async fn cmd_ticket_reply(
    client: &ResourceClient,
    format: OutputFormat,
    id: TicketId,
    message: &str,
) -> Result<()> {
    client.post_reply(id, message).await?;
    // Re-fetch so the rendered thread includes the new reply.
    let ticket = client.get_ticket(id).await?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&ticket)?);
    } else {
        println!("{}", "Reply added.".green());
        views::print_ticket(&ticket);
    }
    Ok(())
}

async fn cmd_agent_list(client: &ResourceClient, format: OutputFormat) -> Result<()> {
    let agents = client.list_agents().await?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&agents)?);
    } else {
        views::print_agents(&agents);
    }
    Ok(())
}

async fn cmd_agent_create(
    client: &ResourceClient,
    format: OutputFormat,
    request: CreateAgentRequest,
) -> Result<()> {
    let agent = client.create_agent(&request).await?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&agent)?);
    } else {
        println!(
            "{} #{} {} <{}>",
            "Agent created:".green(),
            agent.id,
            agent.name,
            agent.email
        );
    }
    Ok(())
}

async fn cmd_problem_types(client: &ResourceClient, format: OutputFormat) -> Result<()> {
    let problem_types = client.list_problem_types().await?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&problem_types)?);
    } else {
        views::print_problem_types(&problem_types);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_map_onto_gated_destinations() {
        let show = Commands::Ticket {
            action: TicketCommands::Show { id: 7 },
        };
        assert_eq!(route_for(&show), Some(Route::TicketDetail(7)));

        let create = Commands::Ticket {
            action: TicketCommands::Create {
                title: "T".to_string(),
                description: "D".to_string(),
                priority: Priority::Medium,
                problem_type: 1,
                private: false,
            },
        };
        assert_eq!(route_for(&create), Some(Route::TicketCreate));

        let agents = Commands::Agent {
            action: AgentCommands::List,
        };
        assert_eq!(route_for(&agents), Some(Route::Agents));
    }

    #[test]
    fn session_free_commands_bypass_the_gate() {
        assert_eq!(route_for(&Commands::Whoami), None);
        assert_eq!(route_for(&Commands::Logout), None);
        let login = Commands::Login {
            email: "ada@example.com".to_string(),
            password: None,
        };
        assert_eq!(route_for(&login), Some(Route::Login));
    }
}
