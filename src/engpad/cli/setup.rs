use clap::{Parser, Subcommand};

fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_COMMIT_DATE: &str = env!("GIT_COMMIT_DATE");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            VERSION.to_string()
        } else {
            format!("{}@{} {}", VERSION, GIT_HASH, GIT_COMMIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(name = "engpad", bin_name = "engpad", version = get_version())]
#[command(about = "Engineer's Notepad: documents with autosave", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new document
    #[command(alias = "n", display_order = 1)]
    New {
        /// Document kind: text, markdown, code, html, richtext
        #[arg(short, long, default_value = "markdown")]
        kind: String,

        /// Language for code documents
        #[arg(short, long)]
        language: Option<String>,

        /// Title (a numbered default is used when omitted)
        #[arg(short, long)]
        title: Option<String>,

        /// Initial content
        content: Option<String>,
    },

    /// List documents
    #[command(alias = "ls", display_order = 2)]
    List {
        /// Only documents with this tag
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// Search titles and content
    #[command(display_order = 3)]
    Search { term: String },

    /// Print one or more documents
    #[command(alias = "v", display_order = 10)]
    View {
        /// Document ids
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },

    /// Replace a document's content (reads stdin when no content is given)
    #[command(alias = "e", display_order = 11)]
    Edit {
        id: String,

        /// New content
        content: Option<String>,
    },

    /// Change a document's title
    #[command(display_order = 12)]
    Rename {
        id: String,

        /// New title words (joined with spaces)
        #[arg(required = true, trailing_var_arg = true)]
        title: Vec<String>,
    },

    /// Replace a document's tags (no tags clears them)
    #[command(display_order = 13)]
    Tag {
        id: String,

        #[arg(num_args = 0..)]
        tags: Vec<String>,
    },

    /// Delete one or more documents
    #[command(alias = "rm", display_order = 14)]
    Delete {
        /// Document ids
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },

    /// Export documents as files, or as one tar.gz with --archive
    #[command(display_order = 20)]
    Export {
        /// Document ids (all documents when omitted)
        #[arg(num_args = 0..)]
        ids: Vec<String>,

        /// Target directory
        #[arg(short, long, default_value = ".")]
        dir: String,

        /// Write a single tar.gz archive
        #[arg(long)]
        archive: bool,
    },

    /// Get or set autosave configuration
    #[command(display_order = 30)]
    Config {
        /// Configuration key (e.g., short-delay-ms)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },

    /// Get or set editor preferences
    #[command(display_order = 31)]
    Settings {
        /// Setting name (e.g., theme)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_new_with_kind() {
        let cli = Cli::try_parse_from(["engpad", "new", "-k", "code", "-l", "python", "print(1)"])
            .unwrap();
        match cli.command {
            Some(Commands::New {
                kind,
                language,
                title,
                content,
            }) => {
                assert_eq!(kind, "code");
                assert_eq!(language.as_deref(), Some("python"));
                assert_eq!(title, None);
                assert_eq!(content.as_deref(), Some("print(1)"));
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn rename_joins_title_words() {
        let cli = Cli::try_parse_from(["engpad", "rename", "3", "Release", "notes"]).unwrap();
        match cli.command {
            Some(Commands::Rename { id, title }) => {
                assert_eq!(id, "3");
                assert_eq!(title.join(" "), "Release notes");
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn delete_requires_ids() {
        assert!(Cli::try_parse_from(["engpad", "rm"]).is_err());
    }
}
