//! CLI module - Command-line interface for recipebox
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use crate::config::Config;
use clap::{Parser, Subcommand};

/// recipebox - recipe catalog maintenance
#[derive(Parser)]
#[command(name = "recipebox")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default recipebox.toml to the current directory
    Init,

    /// Apply schema migrations and seed reference data
    Migrate,

    /// Search recipes by title, text, ingredient or tag
    #[command(alias = "s")]
    Search {
        /// Search term
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// List recipes, newest first
    #[command(alias = "ls", alias = "l")]
    List {
        /// Only recipes carrying this tag id
        #[arg(long)]
        tag: Option<i32>,
    },

    /// Show one recipe with ingredients, tags and images
    #[command(alias = "i")]
    Show {
        /// Recipe ID
        id: i32,

        /// Print the recipe as JSON
        #[arg(long)]
        json: bool,
    },

    /// List shared ingredients
    Ingredients,

    /// List shared tags
    Tags,
}

pub async fn dispatch(command: Option<Commands>, config: &Config) -> anyhow::Result<()> {
    let Some(command) = command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    match command {
        Commands::Init => commands::cmd_init(),
        Commands::Migrate => commands::cmd_migrate(config).await,
        Commands::Search { query } => commands::cmd_search(config, &query.join(" ")).await,
        Commands::List { tag } => commands::cmd_list(config, tag).await,
        Commands::Show { id, json } => commands::cmd_show(config, id, json).await,
        Commands::Ingredients => commands::cmd_ingredients(config).await,
        Commands::Tags => commands::cmd_tags(config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_search_terms_and_tag_filter() {
        let cli = Cli::parse_from(["recipebox", "search", "margherita", "pizza"]);
        match cli.command {
            Some(Commands::Search { query }) => assert_eq!(query.join(" "), "margherita pizza"),
            _ => panic!("expected search"),
        }

        let cli = Cli::parse_from(["recipebox", "ls", "--tag", "3"]);
        assert!(matches!(cli.command, Some(Commands::List { tag: Some(3) })));

        let cli = Cli::parse_from(["recipebox", "show", "7", "--json"]);
        assert!(matches!(cli.command, Some(Commands::Show { id: 7, json: true })));
    }

    #[test]
    fn verifies_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
