//! Librus CLI - Command-line interface for reading Librus Synergia messages and timetables

mod cache;
mod cli;
mod config;
mod error;
mod logger;
mod output;
mod session;

use cache::TokenCache;
use clap::Parser;
use cli::{Args, Command};
use config::{Config, Login};
use error::CliError;
use librus_client::{LibrusClient, Week};
use output::OutputFormatter;
use session::SessionManager;

fn main() {
    let args = Args::parse();
    logger::init_logging();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let config = Config::from_args(args);
    let client = LibrusClient::new()?;
    let sessions = SessionManager::new(&client, TokenCache::new(&config.cache_dir));
    let formatter = OutputFormatter::new(config.quiet);

    match config.command {
        Command::Login => {
            let (_, token) = sessions.login(&Login::resolve()?)?;
            formatter.print_token(&token);
        }
        Command::Logout => {
            if sessions.logout()? {
                if !config.quiet {
                    println!("Session token removed.");
                }
            } else if !config.quiet {
                println!("No cached session token.");
            }
        }
        Command::Messages { page, all } => {
            let credential = sessions.credential(config.token.as_deref().map(String::as_str))?;
            if all {
                let briefs = client.message_pages(&credential).collect_messages()?;
                formatter.print_messages(None, &briefs);
            } else {
                let listing = client.message_page(&credential, page)?;
                let briefs = listing.messages()?.collect::<Result<Vec<_>, _>>()?;
                formatter.print_messages(Some(listing.info()), &briefs);
            }
        }
        Command::Timetable { week } => {
            let credential = sessions.credential(config.token.as_deref().map(String::as_str))?;
            let week = week.unwrap_or_else(Week::current);
            let lessons = client.lesson_units(&credential, week)?;
            formatter.print_lessons(week, &lessons);
        }
    }

    Ok(())
}
