//! Command-line interface definitions and parsing
//!
//! Running `pdesk` with no subcommand opens the terminal UI.

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pdesk")]
#[command(version)]
#[command(about = "promptdesk - browse and manage a shared prompt library")]
#[command(after_help = "EXAMPLES:
  pdesk                                  # Open the interactive UI
  pdesk list --search review --tag rust  # Filter the library
  pdesk show 42                          # Print one prompt
  pdesk copy 42                          # Copy prompt content
  echo \"body\" | pdesk new --title T --category Coding

Run 'pdesk COMMAND --help' for more information on a command.")]
pub struct Cli {
    /// Backend base URL (overrides config and PROMPTDESK_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List prompts, filtered and paginated
    #[command(alias = "ls", alias = "l")]
    List {
        /// Case-insensitive text to look for
        #[arg(short = 's', long)]
        search: Option<String>,
        /// Category id or name
        #[arg(short = 'c', long)]
        category: Option<String>,
        /// Tag name or id
        #[arg(short = 't', long)]
        tag: Option<String>,
        /// Show every match instead of the first page
        #[arg(short = 'a', long)]
        all: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print a prompt with its metadata
    #[command(alias = "s")]
    Show {
        id: String,
        /// Also print comments and saved results
        #[arg(short = 'v', long)]
        verbose: bool,
    },
    /// Create a prompt (content is read from stdin when --content is absent)
    #[command(alias = "n")]
    New(PromptFields),
    /// Change fields of an existing prompt
    #[command(alias = "e")]
    Edit {
        id: String,
        #[command(flatten)]
        fields: PromptFields,
    },
    /// Delete a prompt
    #[command(alias = "d", alias = "rm")]
    Delete {
        id: String,
        /// Skip the confirmation question
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Copy prompt content to the clipboard
    #[command(alias = "c")]
    Copy { id: String },

    /// Manage tags
    #[command(subcommand)]
    Tags(NameCommands),
    /// Manage categories
    #[command(subcommand)]
    Categories(NameCommands),
    /// Comments on a prompt
    #[command(subcommand)]
    Comments(FeedbackCommands),
    /// Saved model outputs for a prompt
    #[command(subcommand)]
    Results(FeedbackCommands),
    /// Inspect settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug, Clone, Default)]
pub struct PromptFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub content: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Category id or name
    #[arg(long)]
    pub category: Option<String>,
    /// Tag id or name; repeat or separate with commas
    #[arg(long = "tag", value_delimiter = ',')]
    pub tags: Vec<String>,
}

impl PromptFields {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.tags.is_empty()
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum NameCommands {
    #[command(alias = "ls")]
    List,
    Add { name: String },
    #[command(alias = "rm")]
    Delete {
        id: String,
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum FeedbackCommands {
    #[command(alias = "ls")]
    List { prompt_id: String },
    Add { prompt_id: String, content: String },
    #[command(alias = "rm")]
    Delete { id: String },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Print the effective settings
    Show,
    /// Print the settings file location
    Path,
    /// Write the effective settings to the settings file
    Init {
        /// Replace an existing file
        #[arg(short = 'f', long)]
        force: bool,
    },
}

impl Commands {
    /// Short name used in command logs
    pub fn name(&self) -> &'static str {
        match self {
            Commands::List { .. } => "list",
            Commands::Show { .. } => "show",
            Commands::New(_) => "new",
            Commands::Edit { .. } => "edit",
            Commands::Delete { .. } => "delete",
            Commands::Copy { .. } => "copy",
            Commands::Tags(_) => "tags",
            Commands::Categories(_) => "categories",
            Commands::Comments(_) => "comments",
            Commands::Results(_) => "results",
            Commands::Config(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["pdesk"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_list_flags() {
        let cli = Cli::try_parse_from(["pdesk", "ls", "-s", "review", "--tag", "rust", "--all"]).unwrap();
        match cli.command {
            Some(Commands::List { search, tag, all, json, category }) => {
                assert_eq!(search.as_deref(), Some("review"));
                assert_eq!(tag.as_deref(), Some("rust"));
                assert!(all);
                assert!(!json);
                assert!(category.is_none());
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_tags_split_on_commas() {
        let cli = Cli::try_parse_from([
            "pdesk", "new", "--title", "T", "--tag", "rust,review", "--tag", "cli",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::New(fields)) => assert_eq!(fields.tags, vec!["rust", "review", "cli"]),
            _ => panic!("expected new"),
        }
    }

    #[test]
    fn test_global_api_url_after_subcommand() {
        let cli = Cli::try_parse_from(["pdesk", "delete", "7", "-y", "--api-url", "http://x"]).unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://x"));
        assert_eq!(cli.command.as_ref().map(|c| c.name()), Some("delete"));
    }
}
