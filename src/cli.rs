use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "grabbox")]
#[command(about = "Media download service with progress tracking", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP polling service
    Server(ServerArgs),
    /// Download one URL in the foreground, printing progress
    Get(GetArgs),
}

#[derive(clap::Args, Debug)]
pub struct ServerArgs {
    /// Address to bind the HTTP server to (defaults to `server.bind_addr`)
    #[arg(long)]
    pub address: Option<SocketAddr>,
}

#[derive(clap::Args, Debug)]
pub struct GetArgs {
    /// Media page URL
    pub url: String,

    /// Destination directory (defaults to `download.destination_dir`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Format selector passed to the extractor
    #[arg(short, long)]
    pub format: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_get() {
        let cli = Cli::parse_from(["grabbox", "get", "https://example.com/v", "-o", "/tmp/out", "--format", "bestaudio"]);
        match cli.command {
            Commands::Get(args) => {
                assert_eq!(args.url, "https://example.com/v");
                assert_eq!(args.output, Some(PathBuf::from("/tmp/out")));
                assert_eq!(args.format.as_deref(), Some("bestaudio"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_server_default_address() {
        let cli = Cli::parse_from(["grabbox", "server"]);
        assert!(matches!(cli.command, Commands::Server(ServerArgs { address: None })));
    }
}
