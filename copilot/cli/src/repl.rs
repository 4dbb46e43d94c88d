//! Interactive loop
//!
//! Sign-in prompt first, then a chat loop that waits on two things at once:
//! the next stdin line and the reply of the turn in flight. Lines typed while a
//! reply is pending are not queued; the user is told to wait.

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufRead, Lines};

use copilot_core::{
    AuthError, ChatSession, ConversationId, Copilot, HelpdeskBackend, LoginOutcome, Message,
    MessageRole, SendRejection, SessionStore, TicketSummary, TurnOutcome,
};

const HELP: &str = "\
Type a message to chat with the helpdesk copilot.

Commands:
  /me                 show the signed-in user
  /ticket <id>        look up a ticket
  /history <id>       continue an earlier conversation
  /health             check the backend
  /logout             sign out
  /quit               exit";

/// A parsed input line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Message(String),
    Me,
    Ticket(String),
    History(String),
    Health,
    Logout,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    /// Parse a line; `None` for a blank one
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Some(Self::Message(line.to_string()));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        Some(match (name, arg) {
            ("quit" | "exit", _) => Self::Quit,
            ("logout", _) => Self::Logout,
            ("me", _) => Self::Me,
            ("health", _) => Self::Health,
            ("help", _) => Self::Help,
            ("ticket", id) if !id.is_empty() => Self::Ticket(id.to_string()),
            ("history", id) if !id.is_empty() => Self::History(id.to_string()),
            _ => Self::Unknown(line.to_string()),
        })
    }
}

/// What the chat loop ended with
enum Flow {
    SignedOut,
    Quit,
}

/// Run the terminal session until the user quits or stdin closes
pub async fn run<B, S, R>(
    copilot: &mut Copilot<B, S>,
    lines: &mut Lines<R>,
    mut email: Option<String>,
) -> Result<()>
where
    B: HelpdeskBackend + 'static,
    S: SessionStore,
    R: AsyncBufRead + Unpin,
{
    loop {
        if !copilot.is_authenticated() && !sign_in(copilot, lines, email.take()).await? {
            return Ok(());
        }

        match copilot.profile() {
            Some(profile) => println!(
                "Signed in as {} <{}>. Type /help for commands.",
                profile.name, profile.email
            ),
            None => println!("Signed in. Type /help for commands."),
        }

        match chat_loop(copilot, lines).await? {
            Flow::Quit => return Ok(()),
            Flow::SignedOut => println!("Signed out."),
        }
    }
}

/// Prompt for an email until login succeeds; `false` if the user gave up
async fn sign_in<B, S, R>(
    copilot: &mut Copilot<B, S>,
    lines: &mut Lines<R>,
    mut email: Option<String>,
) -> Result<bool>
where
    B: HelpdeskBackend + 'static,
    S: SessionStore,
    R: AsyncBufRead + Unpin,
{
    loop {
        let address = match email.take() {
            Some(address) => address,
            None => {
                prompt("Email: ")?;
                match lines.next_line().await? {
                    Some(line) if Command::parse(&line) == Some(Command::Quit) => return Ok(false),
                    Some(line) => line,
                    None => return Ok(false),
                }
            }
        };

        match copilot.login(&address).await {
            Ok(LoginOutcome::SignedIn(_)) if copilot.is_authenticated() => return Ok(true),
            Ok(LoginOutcome::SignedIn(_)) => {
                println!("The backend rejected the new session; please sign in again.");
            }
            Ok(LoginOutcome::PendingConfirmation) => {
                println!("Check your email for a login link, then sign in again.");
            }
            Err(AuthError::EmptyEmail) => println!("Please enter your email address."),
            Err(e) => println!("Login failed: {e}"),
        }
    }
}

async fn chat_loop<B, S, R>(copilot: &mut Copilot<B, S>, lines: &mut Lines<R>) -> Result<Flow>
where
    B: HelpdeskBackend + 'static,
    S: SessionStore,
    R: AsyncBufRead + Unpin,
{
    loop {
        let waiting = copilot.chat().is_some_and(ChatSession::is_loading);

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // stdin closed: let the last answer arrive before leaving
                    if wait_for_reply(copilot).await.is_some() {
                        print_reply(copilot);
                    }
                    return Ok(Flow::Quit);
                };
                let Some(command) = Command::parse(&line) else {
                    continue;
                };
                if let Some(flow) = execute(copilot, command, waiting).await {
                    return Ok(flow);
                }
            }
            Some(_) = wait_for_reply(copilot), if waiting => {
                print_reply(copilot);
            }
            _ = tokio::signal::ctrl_c() => {
                return Ok(Flow::Quit);
            }
        }
    }
}

async fn wait_for_reply<B, S>(copilot: &mut Copilot<B, S>) -> Option<TurnOutcome>
where
    B: HelpdeskBackend + 'static,
    S: SessionStore,
{
    copilot.chat_mut()?.wait_reply().await
}

async fn execute<B, S>(
    copilot: &mut Copilot<B, S>,
    command: Command,
    waiting: bool,
) -> Option<Flow>
where
    B: HelpdeskBackend + 'static,
    S: SessionStore,
{
    match command {
        Command::Message(text) => {
            let Some(chat) = copilot.chat_mut() else {
                println!("Not signed in.");
                return None;
            };
            match chat.submit(&text) {
                Ok(()) => println!("..."),
                Err(SendRejection::RequestInFlight) => {
                    println!("Still waiting for the previous answer; message not sent.");
                }
                Err(SendRejection::EmptyMessage) => {}
            }
        }
        Command::Me => match copilot.refresh_profile().await {
            Ok(profile) => println!("{} <{}> ({:?})", profile.name, profile.email, profile.role),
            Err(e) => println!("Could not load profile: {e}"),
        },
        Command::Ticket(id) => match copilot.ticket(&id).await {
            Ok(ticket) => println!("{}", render_ticket(&ticket)),
            Err(e) => println!("Could not load ticket {id}: {e}"),
        },
        Command::History(id) => {
            if waiting {
                println!("Still waiting for the previous answer.");
                return None;
            }
            match copilot.resume(ConversationId(id.clone())).await {
                Ok(()) => {
                    if let Some(chat) = copilot.chat() {
                        for message in chat.log() {
                            println!("{}", render_message(message));
                        }
                    }
                }
                Err(e) => println!("Could not load conversation {id}: {e}"),
            }
        }
        Command::Health => match copilot.health().await {
            Ok(health) if health.is_ok() => println!("Backend is up."),
            Ok(health) => println!("Backend reports status {:?}.", health.status),
            Err(e) => println!("Backend unreachable: {e}"),
        },
        Command::Logout => {
            if let Err(e) = copilot.logout().await {
                tracing::warn!(error = %e, "Failed to remove stored token");
            }
            return Some(Flow::SignedOut);
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => return Some(Flow::Quit),
        Command::Unknown(line) => println!("Unknown command: {line} (try /help)"),
    }
    None
}

fn print_reply<B, S>(copilot: &Copilot<B, S>)
where
    B: HelpdeskBackend + 'static,
    S: SessionStore,
{
    if let Some(message) = copilot.chat().and_then(|chat| chat.log().last()) {
        println!("{}", render_message(message));
    }
}

fn prompt(label: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(label.as_bytes())?;
    stdout.flush()
}

/// One message as printed in the terminal
fn render_message(message: &Message) -> String {
    match message.role {
        MessageRole::User => format!("you> {}", message.text),
        MessageRole::Assistant => {
            let mut out = format!("copilot> {}", message.text);
            for action in &message.actions {
                out.push_str(&format!("\n  Ticket {} created", action.id));
            }
            if !message.sources.is_empty() {
                out.push_str(&format!("\n  {} source(s)", message.sources.len()));
            }
            out
        }
    }
}

fn render_ticket(ticket: &TicketSummary) -> String {
    format!(
        "{}: {}\n  status: {}, priority: {}\n  opened by {}, assigned to {}\n  updated {}",
        ticket.external_id,
        ticket.short_desc,
        ticket.status,
        ticket.priority.as_deref().unwrap_or("-"),
        ticket.opened_by,
        ticket.assigned_to.as_deref().unwrap_or("nobody"),
        ticket.updated_at,
    )
}
