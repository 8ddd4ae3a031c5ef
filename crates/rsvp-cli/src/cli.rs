use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rsvp", about = "RSVP ledger: invite store and API server", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the public and admin APIs
    Serve(ServeArgs),
    /// Load a seed file into a database without starting the server
    Seed(SeedArgs),
    /// Print every invite in a database, audit fields included
    Dump(DumpArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file; environment variables override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct SeedArgs {
    #[arg(long)]
    pub db: PathBuf,
    /// JSON file shaped `{"invites": {...}}`
    pub file: PathBuf,
}

#[derive(Args)]
pub struct DumpArgs {
    #[arg(long)]
    pub db: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serve() {
        let cli = Cli::try_parse_from(["rsvp", "serve"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert!(args.config.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_serve_with_config() {
        let cli = Cli::try_parse_from(["rsvp", "serve", "--config", "/etc/rsvp.toml"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.config, Some(PathBuf::from("/etc/rsvp.toml")));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_seed() {
        let cli =
            Cli::try_parse_from(["rsvp", "seed", "--db", "rsvp.redb", "seed.json"]).unwrap();
        if let Command::Seed(args) = cli.command {
            assert_eq!(args.db, PathBuf::from("rsvp.redb"));
            assert_eq!(args.file, PathBuf::from("seed.json"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn seed_requires_db() {
        assert!(Cli::try_parse_from(["rsvp", "seed", "seed.json"]).is_err());
    }

    #[test]
    fn parse_dump_json() {
        let cli =
            Cli::try_parse_from(["rsvp", "--format", "json", "dump", "--db", "x.redb"]).unwrap();
        assert!(matches!(cli.command, Command::Dump(_)));
        assert!(matches!(cli.format, OutputFormat::Json));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["rsvp", "--verbose", "dump", "--db", "x.redb"]).unwrap();
        assert!(cli.verbose);
    }
}
