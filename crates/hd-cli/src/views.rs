//! Text rendering for command output.

use colored::{ColoredString, Colorize};
use hd_core::models::{Priority, ProblemType, Ticket, TicketStatus};
use hd_core::routes::Route;
use hd_core::Identity;

fn status_colored(status: TicketStatus) -> ColoredString {
    match status {
        TicketStatus::Open => status.as_str().green(),
        TicketStatus::InProgress => status.as_str().yellow(),
        TicketStatus::Closed => status.as_str().dimmed(),
    }
}

fn priority_colored(priority: Priority) -> ColoredString {
    match priority {
        Priority::High => priority.as_str().red(),
        Priority::Medium => priority.as_str().yellow(),
        Priority::Low => priority.as_str().blue(),
    }
}

/// Renders the ticket list view.
pub fn print_ticket_list(tickets: &[Ticket]) {
    println!("{}", "Tickets".bold());
    println!("───────");
    if tickets.is_empty() {
        println!("No tickets found");
        return;
    }
    for ticket in tickets {
        let visibility = if ticket.is_public { "public" } else { "private" };
        println!(
            "  #{} [{}] [{}] {} ({})",
            ticket.id.to_string().cyan(),
            status_colored(ticket.status),
            priority_colored(ticket.priority),
            ticket.title,
            visibility
        );
        let mut context = format!("      by {}", ticket.created_by.name);
        if let Some(assigned) = &ticket.assigned_to {
            context.push_str(&format!(", assigned to {}", assigned.name));
        }
        if let Some(problem_type) = &ticket.problem_type {
            context.push_str(&format!(" [{}]", problem_type.name));
        }
        println!("{}", context.dimmed());
    }
}

/// Renders the single-ticket view with its replies.
pub fn print_ticket(ticket: &Ticket) {
    println!("{} #{}", "Ticket".bold(), ticket.id);
    println!("─────────────────────────");
    println!("  {} {}", "Title:".cyan(), ticket.title);
    println!("  {} {}", "Status:".cyan(), status_colored(ticket.status));
    println!("  {} {}", "Priority:".cyan(), priority_colored(ticket.priority));
    if let Some(problem_type) = &ticket.problem_type {
        println!("  {} {}", "Problem type:".cyan(), problem_type.name);
    }
    println!(
        "  {} {}",
        "Visibility:".cyan(),
        if ticket.is_public { "public" } else { "private" }
    );
    println!("  {} {}", "Created by:".cyan(), ticket.created_by.name);
    println!(
        "  {} {}",
        "Assigned to:".cyan(),
        ticket
            .assigned_to
            .as_ref()
            .map(|a| a.name.as_str())
            .unwrap_or("unassigned")
    );
    println!(
        "  {} {}",
        "Created at:".cyan(),
        ticket.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!();
    println!("{}", ticket.description);
    println!();
    println!("{} ({})", "Replies".bold(), ticket.replies.len());
    if ticket.replies.is_empty() {
        println!("  No replies yet");
    }
    for reply in &ticket.replies {
        println!(
            "  {} {} ({})",
            reply.created_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            reply.user.name.bold(),
            reply.user.role
        );
        println!("    {}", reply.content);
    }
}

/// Renders the identity header plus the destinations it may open.
pub fn print_identity(identity: &Identity, routes: &[Route]) {
    println!("{} ({})", identity.name.bold(), identity.role);
    println!("  {} {}", "Email:".cyan(), identity.email);
    let destinations: Vec<String> = routes.iter().map(|r| r.to_string()).collect();
    println!("  {} {}", "Destinations:".cyan(), destinations.join(", "));
}

/// Renders the agent administration list.
pub fn print_agents(agents: &[Identity]) {
    println!("{}", "Agents".bold());
    println!("──────");
    if agents.is_empty() {
        println!("No agents found");
        return;
    }
    for agent in agents {
        println!(
            "  #{} {} <{}>",
            agent.id.to_string().cyan(),
            agent.name,
            agent.email
        );
    }
}

/// Renders the problem-type reference list.
pub fn print_problem_types(problem_types: &[ProblemType]) {
    println!("{}", "Problem Types".bold());
    println!("─────────────");
    for problem_type in problem_types {
        match &problem_type.description {
            Some(description) => println!(
                "  #{} {} - {}",
                problem_type.id.to_string().cyan(),
                problem_type.name,
                description.dimmed()
            ),
            None => println!(
                "  #{} {}",
                problem_type.id.to_string().cyan(),
                problem_type.name
            ),
        }
    }
}
