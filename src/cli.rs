use clap::{Args, Parser, Subcommand};
use packdrop_registry::PackChanges;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "packdrop", version, about = "Manage a directory of downloadable packs")]
pub struct Cli {
    /// Configuration file, layered over the platform configuration directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Registry directory, overriding `registry.directory`.
    #[arg(long, global = true)]
    pub directory: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List main packs, oldest version range first.
    List {
        /// Include every pack, not just the main ones.
        #[arg(long)]
        all: bool,
    },
    /// Print a pack's sidecar.
    Show { slug: String },
    /// Print the pack served by default.
    Current,
    /// Upload a new archive for a pack.
    ///
    /// Identical content is left alone. Anything else is stored under a new
    /// slug that takes over as main; the old pack is kept but demoted.
    Upload { slug: String, file: PathBuf },
    /// Publish an archive as a new main pack alongside an existing one,
    /// copying its metadata.
    Duplicate { slug: String, file: PathBuf },
    /// Edit a pack's metadata.
    Update {
        slug: String,
        #[command(flatten)]
        changes: UpdateArgs,
    },
    /// Write a pack's archive to a file.
    Download { slug: String, out: PathBuf },
    /// Check whether a file is byte-identical to a pack's archive.
    Matches { slug: String, file: PathBuf },
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long, conflicts_with = "clear_description")]
    pub description: Option<String>,
    #[arg(long)]
    pub clear_description: bool,
    /// Lowest supported game version.
    #[arg(long)]
    pub min: Option<String>,
    /// Highest supported game version.
    #[arg(long)]
    pub max: Option<String>,
    #[arg(long)]
    pub main: Option<bool>,
}
impl From<UpdateArgs> for PackChanges {
    fn from(args: UpdateArgs) -> Self {
        let description = if args.clear_description { Some(None) } else { args.description.map(Some) };
        Self {
            name: args.name,
            description,
            minimum: args.min,
            maximum: args.max,
            main: args.main,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    fn changes(args: &[&str]) -> PackChanges {
        let cli = Cli::try_parse_from(["packdrop", "update", "0a1b2c3d"].iter().chain(args)).unwrap();
        let Command::Update { slug, changes } = cli.command else {
            panic!("expected update");
        };
        assert_eq!(slug, "0a1b2c3d");
        changes.into()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_update_without_flags_is_empty() {
        assert!(changes(&[]).is_empty());
    }

    #[rstest]
    #[case(&["--description", "Crisp"], Some(Some("Crisp".to_string())))]
    #[case(&["--clear-description"], Some(None))]
    #[case(&["--name", "Crisp"], None)]
    fn test_update_description(#[case] args: &[&str], #[case] expected: Option<Option<String>>) {
        assert_eq!(changes(args).description, expected);
    }

    #[test]
    fn test_update_fields() {
        let changes = changes(&["--name", "Crisp", "--min", "1.19", "--max", "1.21", "--main", "false"]);
        assert_eq!(changes.name.as_deref(), Some("Crisp"));
        assert_eq!(changes.minimum.as_deref(), Some("1.19"));
        assert_eq!(changes.maximum.as_deref(), Some("1.21"));
        assert_eq!(changes.main, Some(false));
    }

    #[test]
    fn test_description_flags_conflict() {
        let parsed = Cli::try_parse_from(["packdrop", "update", "0a1b2c3d", "--description", "x", "--clear-description"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_global_options() {
        let cli = Cli::try_parse_from(["packdrop", "list", "--all", "--directory", "/srv/packs"]).unwrap();
        assert_eq!(cli.directory, Some(PathBuf::from("/srv/packs")));
        assert!(matches!(cli.command, Command::List { all: true }));
    }
}
