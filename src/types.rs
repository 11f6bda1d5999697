//! Shared aliases and the command-line subcommands.
use clap::Subcommand;

use crate::{MemoraError, NoteFilter};

/// A specialized Result type for memora operations.
pub type Result<T> = std::result::Result<T, MemoraError>;

/// Available subcommands for the memora application
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new note
    New {
        /// Horizontal window position
        #[clap(long, allow_negative_numbers = true)]
        x: Option<f64>,

        /// Vertical window position
        #[clap(long, allow_negative_numbers = true)]
        y: Option<f64>,
    },

    /// List notes the way the dashboard shows them
    List {
        /// Which view to list
        #[clap(short, long, value_enum, default_value_t = NoteFilter::All)]
        filter: NoteFilter,

        /// Only notes with this palette colour
        #[clap(short, long)]
        color: Option<String>,

        /// Case-insensitive text to look for in title and content
        #[clap(short, long)]
        search: Option<String>,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Show a note by ID
    Show {
        /// ID of the note to show
        id: String,

        /// Format output as raw JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Edit fields of an existing note
    Edit {
        /// ID of the note to edit
        id: String,

        /// New title for the note
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// New content for the note
        #[clap(short, long)]
        content: Option<String>,

        /// New palette colour
        #[clap(long)]
        color: Option<String>,

        /// Tags to associate with the note (comma-separated)
        #[clap(short = 't', long)]
        tags: Option<String>,

        /// Pin or unpin the note
        #[clap(long)]
        pin: Option<bool>,

        /// Lock or unlock the window position
        #[clap(long)]
        lock: Option<bool>,

        /// Show or hide the formatting toolbar
        #[clap(long)]
        toolbar: Option<bool>,

        /// Window opacity, 0.2 to 1.0
        #[clap(long)]
        opacity: Option<f64>,
    },

    /// Show or hide a note's window
    Toggle {
        /// ID of the note
        id: String,
    },

    /// Raise a note above all others
    Front {
        /// ID of the note
        id: String,
    },

    /// Move a note to the trash
    Trash {
        /// ID of the note
        id: String,
    },

    /// Take a note out of the trash
    Restore {
        /// ID of the note
        id: String,
    },

    /// Permanently delete a note
    Purge {
        /// ID of the note
        id: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Remove notes that have been in the trash for 7 days or more
    Cleanup,

    /// Drag a note window by an offset
    Move {
        /// ID of the note
        id: String,

        #[clap(allow_negative_numbers = true)]
        dx: f64,

        #[clap(allow_negative_numbers = true)]
        dy: f64,
    },

    /// Resize a note window by an offset
    Resize {
        /// ID of the note
        id: String,

        #[clap(allow_negative_numbers = true)]
        dw: f64,

        #[clap(allow_negative_numbers = true)]
        dh: f64,
    },

    /// Show or hide the dashboard
    Dashboard,

    /// Keep running and purge expired trash on schedule until interrupted
    Watch,

    /// Show the effective configuration
    Config,
}

impl Commands {
    /// Commands that only report state and must not write it
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Commands::List { .. } | Commands::Show { .. } | Commands::Config
        )
    }
}
