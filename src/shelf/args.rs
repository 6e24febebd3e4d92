use clap::{Parser, Subcommand, ValueEnum};
use shelf::store::SortOrder;

#[derive(Parser, Debug)]
#[command(name = "shelf")]
#[command(about = "Resource stores with swappable storage backends", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show informational logs (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Notes, keyed by id
    Notes {
        #[command(subcommand)]
        action: Action,
    },

    /// Blog posts, keyed by slug
    Blog {
        #[command(subcommand)]
        action: Action,
    },

    /// File records, keyed by filename
    Files {
        #[command(subcommand)]
        action: Action,
    },

    /// Vice bank users
    Users {
        #[command(subcommand)]
        action: Action,
    },

    /// Vice bank deposits
    Deposits {
        #[command(subcommand)]
        action: Action,
    },

    /// Vice bank purchases
    Purchases {
        #[command(subcommand)]
        action: Action,
    },

    /// Back up every collection once
    Backup,

    /// Run scheduled backups and log cycling until interrupted
    Run,
}

#[derive(Subcommand, Debug)]
pub enum Action {
    /// List one page of records
    #[command(alias = "ls")]
    List {
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1, allow_hyphen_values = true)]
        page: i64,

        /// Records per page (defaults per collection)
        #[arg(long, allow_hyphen_values = true)]
        page_size: Option<i64>,

        /// Sort order
        #[arg(long, value_enum, default_value_t = SortArg::Date)]
        sort: SortArg,
    },

    /// Show one record as JSON
    Get { key: String },

    /// Add a record from a JSON object (id and dateAdded are filled in)
    #[command(alias = "new")]
    Add { json: String },

    /// Replace a record with a complete JSON object
    Update { json: String },

    /// Delete a record
    #[command(alias = "rm")]
    Delete { key: String },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortArg {
    /// Newest first
    Date,
    /// Alphabetical
    Name,
    /// Reverse alphabetical
    NameDesc,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Date => SortOrder::DateAddedDesc,
            SortArg::Name => SortOrder::NameAsc,
            SortArg::NameDesc => SortOrder::NameDesc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_list_options() {
        let cli = Cli::parse_from([
            "shelf", "files", "list", "--page", "2", "--page-size", "5", "--sort", "name-desc",
        ]);
        match cli.command {
            Commands::Files {
                action:
                    Action::List {
                        page,
                        page_size,
                        sort,
                    },
            } => {
                assert_eq!(page, 2);
                assert_eq!(page_size, Some(5));
                assert_eq!(SortOrder::from(sort), SortOrder::NameDesc);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_negative_pages_reach_the_store() {
        let cli = Cli::parse_from(["shelf", "notes", "ls", "--page", "-3"]);
        assert!(matches!(
            cli.command,
            Commands::Notes {
                action: Action::List { page: -3, .. }
            }
        ));
    }

    #[test]
    fn test_delete_alias() {
        let cli = Cli::parse_from(["shelf", "blog", "rm", "hello-world"]);
        assert!(matches!(
            cli.command,
            Commands::Blog {
                action: Action::Delete { .. }
            }
        ));
    }
}
