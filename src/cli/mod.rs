//! CLI module - Command-line interface for Bookarr
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Bookarr - author and book catalog manager
#[derive(Parser)]
#[command(name = "bookarr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find or add an author by name
    #[command(alias = "a")]
    Add {
        /// Author name, e.g. "Ursula K. Le Guin" or "Le Guin, Ursula K."
        #[arg(required = true)]
        name: Vec<String>,
        /// Add the author without fetching books
        #[arg(long)]
        no_books: bool,
        /// Re-ingest an author already in the catalog
        #[arg(long)]
        refresh: bool,
    },

    /// Add an author by provider id
    AddId {
        /// Provider author id
        id: String,
        /// Add the author without fetching books
        #[arg(long)]
        no_books: bool,
    },

    /// Re-ingest an author and its books
    #[command(alias = "r")]
    Refresh {
        /// Author id
        id: String,
    },

    /// Add a single book as Wanted
    ImportBook {
        /// Provider book id
        id: String,
    },

    /// Search the provider for books
    #[command(alias = "s")]
    Search {
        /// Search term
        #[arg(required = true)]
        term: Vec<String>,
    },

    /// Recompute stored totals for an author
    Totals {
        /// Author id
        id: String,
    },

    /// List authors in the catalog
    #[command(alias = "ls", alias = "l")]
    List,

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

pub use commands::*;
