use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dualkv",
    about = "dualkv: key-value datastore over a local index and a remote object store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Datastore configuration (TOML)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Root directory of the object store
    #[arg(long, default_value = "objects")]
    pub object_dir: PathBuf,

    /// Create the remote index if it does not exist
    #[arg(long)]
    pub create: bool,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a value under a key
    Put(PutArgs),
    /// Print the value stored under a key
    Get(KeyArgs),
    /// Check whether a key exists
    Has(KeyArgs),
    /// Print the size of the value stored under a key
    Size(KeyArgs),
    /// Remove a key
    Delete(KeyArgs),
    /// List entries
    Query(QueryArgs),
    /// Show local disk usage
    Du,
    /// Show the object id a key is stored under
    Oid(KeyArgs),
}

#[derive(Args)]
pub struct KeyArgs {
    pub key: String,
}

#[derive(Args)]
pub struct PutArgs {
    pub key: String,
    pub value: String,
    /// Fail if an object already exists under the key's object id
    #[arg(long)]
    pub no_overwrite: bool,
}

#[derive(Args)]
pub struct QueryArgs {
    /// Only list keys below this key
    #[arg(short, long)]
    pub prefix: Option<String>,
    /// Skip fetching values
    #[arg(long)]
    pub keys_only: bool,
    /// Descending key order
    #[arg(long)]
    pub desc: bool,
    /// Maximum number of entries (0 = unlimited)
    #[arg(short = 'n', long, default_value = "0")]
    pub limit: usize,
    #[arg(long, default_value = "0")]
    pub offset: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["dualkv", "--config", "dualkv.toml"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn parse_put() {
        let cli = parse(&["put", "/x", "hello", "--no-overwrite"]);
        if let Command::Put(args) = cli.command {
            assert_eq!(args.key, "/x");
            assert_eq!(args.value, "hello");
            assert!(args.no_overwrite);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_get() {
        let cli = parse(&["get", "/x"]);
        assert!(matches!(cli.command, Command::Get(KeyArgs { ref key }) if key == "/x"));
    }

    #[test]
    fn parse_query() {
        let cli = parse(&[
            "query",
            "--prefix",
            "/a",
            "--keys-only",
            "--desc",
            "-n",
            "5",
            "--offset",
            "2",
        ]);
        if let Command::Query(args) = cli.command {
            assert_eq!(args.prefix.as_deref(), Some("/a"));
            assert!(args.keys_only);
            assert!(args.desc);
            assert_eq!(args.limit, 5);
            assert_eq!(args.offset, 2);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_query_defaults() {
        let cli = parse(&["query"]);
        if let Command::Query(args) = cli.command {
            assert!(args.prefix.is_none());
            assert_eq!(args.limit, 0);
            assert!(!args.desc);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_du() {
        assert!(matches!(parse(&["du"]).command, Command::Du));
    }

    #[test]
    fn parse_store_flags() {
        let cli = parse(&["--object-dir", "/srv/objects", "--create", "has", "/x"]);
        assert_eq!(cli.object_dir, PathBuf::from("/srv/objects"));
        assert!(cli.create);
        assert_eq!(parse(&["has", "/x"]).object_dir, PathBuf::from("objects"));
    }

    #[test]
    fn config_is_required() {
        assert!(Cli::try_parse_from(["dualkv", "get", "/x"]).is_err());
    }

    #[test]
    fn parse_verbose() {
        let cli = parse(&["oid", "/x", "--verbose"]);
        assert!(cli.verbose);
    }

    #[test]
    fn parse_json_format() {
        let cli = parse(&["--format", "json", "size", "/x"]);
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}
