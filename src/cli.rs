use clap::{Parser, Subcommand};

#[derive(Debug, Parser, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct CLI {
    /// Bypass the release and artifact caches for this run
    #[clap(long, global = true)]
    pub(crate) fresh: bool,
    #[command(subcommand)]
    pub(crate) command: BinupCommand,
}

#[derive(Debug, Subcommand, Clone, PartialEq)]
pub enum BinupCommand {
    /// Install or update GitHub repositories (`owner/repo`). Defaults to every
    /// package already tracked in the database
    Install {
        repos: Vec<String>,
    },
    /// List tracked packages from the package database
    List {
        #[clap(short, long)]
        verbose: bool,
    },
    /// Report the install state of one package and its shared-library needs
    Status {
        name: String,
    },
    /// Remove a package's installed files and its database entry
    Remove {
        name: String,
    },
    /// Wipe the release cache and all cached artifacts
    Clean,
}
