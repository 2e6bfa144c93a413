//! CLI argument parsing using clap

use clap::{Parser, Subcommand};
use librus_client::Week;
use std::path::PathBuf;

/// Librus Synergia reader
#[derive(Parser, Debug)]
#[command(name = "librus", about = "Read Librus Synergia messages and timetables", version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Cache directory for the session token
    #[arg(long, global = true, default_value = "~/.cache/librus")]
    pub cache_dir: PathBuf,

    /// Quiet mode - only output records
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Log in, cache the session token and print it
    Login,

    /// List received messages
    Messages {
        /// Listing page to show, starting at 0
        #[arg(short, long, default_value_t = 0, conflicts_with = "all")]
        page: usize,

        /// Show every page
        #[arg(short, long)]
        all: bool,
    },

    /// Show the lessons of one week
    Timetable {
        /// Any date in the week (YYYY-MM-DD), current week if omitted
        #[arg(short, long)]
        week: Option<Week>,
    },

    /// Forget the cached session token
    Logout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_defaults() {
        let args = Args::try_parse_from(["librus", "messages"]).unwrap();

        assert_eq!(args.command, Command::Messages { page: 0, all: false });
        assert_eq!(args.cache_dir, PathBuf::from("~/.cache/librus"));
        assert!(!args.quiet);
    }

    #[test]
    fn test_page_conflicts_with_all() {
        let result = Args::try_parse_from(["librus", "messages", "--page", "2", "--all"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_timetable_week() {
        let args = Args::try_parse_from(["librus", "-q", "timetable", "--week", "2020-09-03"]).unwrap();

        let Command::Timetable { week: Some(week) } = args.command else {
            panic!("Expected timetable command with a week");
        };
        assert_eq!(week.to_string(), "2020-08-31_2020-09-06");
        assert!(args.quiet);
    }

    #[test]
    fn test_invalid_week() {
        let result = Args::try_parse_from(["librus", "timetable", "--week", "next"]);
        assert!(result.is_err());
    }
}
