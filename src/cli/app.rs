//! CLI module for the memora application
//!
//! This module maps subcommands onto store actions, dashboard selection and
//! window gestures.
use std::{
    io::{stdin, stdout, Write},
    sync::Arc,
};

use console::style;
use log::{debug, info};
use tokio::sync::Mutex;

use crate::{
    content_preview, days_until_purge, empty_state_message, filter_notes, format_timestamp,
    is_known_color, palette_lookup, parse_tags, Commands, Config, Dashboard, MemoraError, Note,
    NoteFilter, NotePatch, NoteStore, Pointer, Result, TrashScheduler, WindowComposer,
};

/// Which window gesture a `move`/`resize` command replays
#[derive(Debug, Clone, Copy)]
enum Gesture {
    Drag,
    Resize,
}

/// CLI Application handler - processes CLI commands against the note store
pub struct App {
    /// The shared note store
    store: Arc<Mutex<NoteStore>>,

    /// Application configuration
    config: Config,

    /// Whether to display verbose output
    verbose: bool,
}

impl App {
    /// Create a new CLI application with the given store and config
    pub fn new(store: Arc<Mutex<NoteStore>>, config: Config, verbose: bool) -> Self {
        Self {
            store,
            config,
            verbose,
        }
    }

    /// Run the CLI application with the given command
    pub async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::New { x, y } => self.handle_new(x, y).await?,

            Commands::List {
                filter,
                color,
                search,
                json,
            } => self.handle_list(filter, color, search, json).await?,

            Commands::Show { id, json } => self.handle_show(&id, json).await?,

            Commands::Edit {
                id,
                title,
                content,
                color,
                tags,
                pin,
                lock,
                toolbar,
                opacity,
            } => {
                if let Some(color) = &color {
                    if !is_known_color(color) {
                        return Err(MemoraError::ApplicationError {
                            message: format!("Unknown colour: {}", color),
                        });
                    }
                }
                let patch = NotePatch {
                    title,
                    content,
                    color,
                    tags: tags.map(|t| parse_tags(Some(t))),
                    is_pinned: pin,
                    is_locked: lock,
                    opacity,
                    show_toolbar: toolbar,
                    ..Default::default()
                };
                self.handle_edit(&id, patch).await?
            }

            Commands::Toggle { id } => {
                let mut store = self.store.lock().await;
                match store.note(&id) {
                    None => return Err(MemoraError::NoteNotFound { id }),
                    Some(note) if note.is_trashed() => {
                        return Err(MemoraError::ApplicationError {
                            message: format!("Note {} is in the trash, restore it first", id),
                        });
                    }
                    Some(_) => {}
                }
                store.toggle_note_window(&id);
                let open = store.note(&id).is_some_and(|n| n.is_open);
                println!(
                    "Window for note {} is now {}",
                    id,
                    if open { "open" } else { "closed" }
                );
            }

            Commands::Front { id } => {
                let mut store = self.store.lock().await;
                if store.note(&id).is_none() {
                    return Err(MemoraError::NoteNotFound { id });
                }
                if store.bring_to_front(&id) {
                    println!("Note {} brought to front", id);
                } else {
                    println!("Note {} is already in front", id);
                }
            }

            Commands::Trash { id } => {
                let mut store = self.store.lock().await;
                if !store.delete_note(&id) {
                    return Err(MemoraError::NoteNotFound { id });
                }
                println!("Note {} moved to trash. It will be removed in 7 days.", id);
            }

            Commands::Restore { id } => {
                let mut store = self.store.lock().await;
                if store.note(&id).is_none() {
                    return Err(MemoraError::NoteNotFound { id });
                }
                if store.restore_note(&id) {
                    println!("Note {} restored", id);
                } else {
                    println!("Note {} is not in the trash", id);
                }
            }

            Commands::Purge { id, force } => self.handle_purge(id, force).await?,

            Commands::Cleanup => {
                let purged = self.store.lock().await.cleanup_trash();
                println!(
                    "Removed {} expired note{} from the trash",
                    purged,
                    if purged == 1 { "" } else { "s" }
                );
            }

            Commands::Move { id, dx, dy } => {
                self.replay_gesture(&id, Gesture::Drag, dx, dy).await?
            }

            Commands::Resize { id, dw, dh } => {
                self.replay_gesture(&id, Gesture::Resize, dw, dh).await?
            }

            Commands::Dashboard => {
                let mut store = self.store.lock().await;
                store.toggle_dashboard();
                println!(
                    "Dashboard is now {}",
                    if store.settings().show_dashboard {
                        "shown"
                    } else {
                        "hidden"
                    }
                );
            }

            Commands::Watch => self.handle_watch().await?,

            Commands::Config => {
                if let Some(path) = Config::default_path() {
                    println!("Config file: {}", path.display());
                }
                println!("{}", serde_json::to_string_pretty(&self.config)?);
            }
        }

        Ok(())
    }

    async fn handle_new(&self, x: Option<f64>, y: Option<f64>) -> Result<()> {
        let at = match (x, y) {
            (Some(x), Some(y)) => Some((x, y)),
            (None, None) => None,
            _ => {
                return Err(MemoraError::ApplicationError {
                    message: "Specify both --x and --y, or neither".to_string(),
                })
            }
        };

        let id = self.store.lock().await.add_note(at);
        println!("Note created with ID: {}", id);
        Ok(())
    }

    /// List notes the way the dashboard grid would show them
    async fn handle_list(
        &self,
        filter: NoteFilter,
        color: Option<String>,
        search: Option<String>,
        json: bool,
    ) -> Result<()> {
        let store = self.store.lock().await;

        let mut dashboard = Dashboard::new();
        dashboard.select_filter(filter);
        if let Some(color) = &color {
            dashboard.toggle_color(color);
        }
        let mut query = dashboard.query(&store);
        if let Some(search) = search {
            query.search = search;
        }

        let now = store.now();
        let notes = filter_notes(store.notes(), &query, now);

        if json {
            println!("{}", serde_json::to_string_pretty(&notes)?);
            return Ok(());
        }

        let counts = dashboard.counts(&store);
        if notes.is_empty() {
            let (heading, hint) = empty_state_message(filter);
            println!("{}", style(heading).bold());
            println!("{}", style(hint).dim());
        } else {
            self.display_notes_text(&notes, now);
        }

        println!(
            "\n{} active, {} in trash",
            style(counts.active).bold(),
            style(counts.trash).bold()
        );
        Ok(())
    }

    /// Display notes in text format
    fn display_notes_text(&self, notes: &[&Note], now: i64) {
        // Use terminal width for formatting if available
        let term_width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80);
        let preview_len = term_width.saturating_sub(4).clamp(20, 100);

        for (i, note) in notes.iter().enumerate() {
            if i > 0 {
                println!("{}", "-".repeat(term_width.min(50)));
            }

            let mut flags = Vec::new();
            if note.is_pinned {
                flags.push("pinned");
            }
            if note.is_locked {
                flags.push("locked");
            }
            if note.is_open {
                flags.push("open");
            }

            println!(
                "ID: {} | Updated: {} | Colour: {}",
                note.id,
                format_timestamp(note.updated_at),
                note.color
            );
            println!("Title: {}", style(display_title(note)).bold());
            if !flags.is_empty() {
                println!("{}", style(flags.join(", ")).cyan());
            }
            if !note.tags.is_empty() {
                let tags = note
                    .tags
                    .iter()
                    .map(|tag| format!("#{}", tag))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("Tags: {}", style(tags).cyan());
            }
            if let Some(days) = days_until_purge(note, now) {
                println!("{}", style(format!("Removed in {} days", days)).red());
            }

            let preview = content_preview(&note.content, preview_len);
            if !preview.is_empty() {
                println!("\n{}", preview);
            }
        }
    }

    async fn handle_show(&self, id: &str, json: bool) -> Result<()> {
        let store = self.store.lock().await;
        let note = store.note(id).ok_or_else(|| MemoraError::NoteNotFound {
            id: id.to_string(),
        })?;

        if json {
            println!("{}", serde_json::to_string_pretty(note)?);
            return Ok(());
        }

        let palette = palette_lookup(&note.color);
        println!("{}", style(display_title(note)).bold());
        println!("ID:       {}", note.id);
        println!("Colour:   {} ({})", palette.id, palette.background);
        println!("Created:  {}", format_timestamp(note.created_at));
        println!("Updated:  {}", format_timestamp(note.updated_at));
        println!(
            "Window:   {}x{} at ({}, {}), z {}",
            note.position.width,
            note.position.height,
            note.position.x,
            note.position.y,
            note.position.z_index
        );
        println!(
            "State:    {}{}{}",
            if note.is_open { "open" } else { "closed" },
            if note.is_pinned { ", pinned" } else { "" },
            if note.is_locked { ", locked" } else { "" }
        );
        if self.verbose {
            println!("Opacity:  {}", note.opacity);
            println!("Toolbar:  {}", note.show_toolbar);
        }
        if !note.tags.is_empty() {
            println!("Tags:     {}", note.tags.join(", "));
        }
        if let Some(days) = days_until_purge(note, store.now()) {
            println!(
                "{}",
                style(format!("In trash, removed in {} days", days)).red()
            );
        }
        if !note.content.is_empty() {
            println!("\n{}", note.content);
        }
        Ok(())
    }

    async fn handle_edit(&self, id: &str, patch: NotePatch) -> Result<()> {
        if patch.is_empty() {
            println!("Nothing to change.");
            return Ok(());
        }

        let mut store = self.store.lock().await;
        if !store.update_note(id, patch) {
            return Err(MemoraError::NoteNotFound { id: id.to_string() });
        }
        println!("Note {} updated", id);
        Ok(())
    }

    async fn handle_purge(&self, id: String, force: bool) -> Result<()> {
        let note = match self.store.lock().await.note(&id) {
            Some(note) => note.clone(),
            None => return Err(MemoraError::NoteNotFound { id }),
        };

        if !force {
            println!("You are about to permanently delete the following note:");
            println!("ID:      {}", note.id);
            println!("Title:   {}", display_title(&note));
            println!("Created: {}", format_timestamp(note.created_at));

            let preview = content_preview(&note.content, 120);
            if !preview.is_empty() {
                println!("\nContent preview:");
                println!("{}", preview);
            }

            println!("\nThis action cannot be undone!");
            print!("Are you sure you want to delete this note? [y/N]: ");
            stdout().flush()?;

            let mut input = String::new();
            stdin().read_line(&mut input)?;

            let input = input.trim().to_lowercase();
            if input != "y" && input != "yes" {
                println!("Deletion cancelled.");
                return Ok(());
            }
        }

        self.store.lock().await.permanently_delete_note(&id);
        println!(
            "Note '{}' ({}) has been permanently deleted.",
            display_title(&note),
            note.id
        );
        Ok(())
    }

    /// Runs a full pointer gesture on a note window: press at the origin,
    /// one move by the offset, release there. The store is written once.
    async fn replay_gesture(&self, id: &str, gesture: Gesture, dx: f64, dy: f64) -> Result<()> {
        let mut store = self.store.lock().await;
        let note = store.note(id).ok_or_else(|| MemoraError::NoteNotFound {
            id: id.to_string(),
        })?;
        if note.is_locked {
            return Err(MemoraError::ApplicationError {
                message: format!("Note {} is locked", id),
            });
        }
        if !note.is_visible() {
            return Err(MemoraError::ApplicationError {
                message: format!("Note {} has no open window", id),
            });
        }

        let mut composer = WindowComposer::new();
        let origin = Pointer::new(0.0, 0.0);
        let started = match gesture {
            Gesture::Drag => composer.header_pointer_down(&mut store, id, origin),
            Gesture::Resize => composer.resize_pointer_down(&mut store, id, origin),
        };
        if !started {
            return Err(MemoraError::ApplicationError {
                message: format!("Could not start {:?} on note {}", gesture, id),
            });
        }

        let target = Pointer::new(dx, dy);
        if let Some(frame) = composer.pointer_move(target) {
            debug!("Live frame {:?}", frame);
        }
        let position = composer
            .pointer_up(&mut store, target)
            .ok_or_else(|| MemoraError::ApplicationError {
                message: format!("Gesture on note {} was not committed", id),
            })?;

        println!(
            "Note {} now {}x{} at ({}, {})",
            id, position.width, position.height, position.x, position.y
        );
        Ok(())
    }

    /// Stays in the foreground, purging expired trash on the configured
    /// schedule until Ctrl-C.
    async fn handle_watch(&self) -> Result<()> {
        let mut scheduler = TrashScheduler::new(self.config.trash_cleanup_interval());
        scheduler.set_store(&self.store);
        scheduler.start()?;

        println!(
            "Watching {} (Ctrl-C to stop)",
            self.config.data_dir.display()
        );
        tokio::signal::ctrl_c().await?;
        info!("Interrupt received");

        scheduler.stop().await?;
        let status = scheduler.get_status();
        println!(
            "Purged {} note{} while watching",
            status.purged_total,
            if status.purged_total == 1 { "" } else { "s" }
        );
        Ok(())
    }
}

fn display_title(note: &Note) -> &str {
    if note.title.trim().is_empty() {
        "Untitled"
    } else {
        &note.title
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ManualClock, MemorySink, MIN_WIDTH};

    fn app_with_note() -> (App, Arc<Mutex<NoteStore>>, MemorySink, String) {
        let sink = MemorySink::new();
        let mut store =
            NoteStore::new(Arc::new(ManualClock::new(1_000))).with_sink(Box::new(sink.clone()));
        let id = store.add_note(Some((100.0, 100.0)));
        let store = Arc::new(Mutex::new(store));
        let app = App::new(Arc::clone(&store), Config::default(), false);
        (app, store, sink, id)
    }

    #[tokio::test]
    async fn move_commits_once() {
        let (app, store, sink, id) = app_with_note();
        let before = sink.write_count();

        app.run(Commands::Move {
            id: id.clone(),
            dx: 40.0,
            dy: -10.0,
        })
        .await
        .unwrap();

        let store = store.lock().await;
        let position = store.note(&id).unwrap().position;
        assert_eq!((position.x, position.y), (140.0, 90.0));
        assert_eq!(sink.write_count(), before + 1);
    }

    #[tokio::test]
    async fn resize_respects_minimum() {
        let (app, store, _sink, id) = app_with_note();

        app.run(Commands::Resize {
            id: id.clone(),
            dw: -500.0,
            dh: 0.0,
        })
        .await
        .unwrap();

        assert_eq!(store.lock().await.note(&id).unwrap().position.width, MIN_WIDTH);
    }

    #[tokio::test]
    async fn locked_note_refuses_move() {
        let (app, store, _sink, id) = app_with_note();
        store.lock().await.update_note(
            &id,
            NotePatch {
                is_locked: Some(true),
                ..Default::default()
            },
        );

        let result = app
            .run(Commands::Move {
                id: id.clone(),
                dx: 10.0,
                dy: 10.0,
            })
            .await;

        assert!(matches!(result, Err(MemoraError::ApplicationError { .. })));
        assert_eq!(store.lock().await.note(&id).unwrap().position.x, 100.0);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let (app, _store, _sink, _id) = app_with_note();

        for command in [
            Commands::Trash { id: "nope".into() },
            Commands::Toggle { id: "nope".into() },
            Commands::Show {
                id: "nope".into(),
                json: false,
            },
            Commands::Purge {
                id: "nope".into(),
                force: true,
            },
        ] {
            assert!(matches!(
                app.run(command).await,
                Err(MemoraError::NoteNotFound { .. })
            ));
        }
    }

    #[tokio::test]
    async fn edit_rejects_unknown_colour() {
        let (app, store, _sink, id) = app_with_note();

        let result = app
            .run(Commands::Edit {
                id: id.clone(),
                title: None,
                content: None,
                color: Some("chartreuse".into()),
                tags: None,
                pin: None,
                lock: None,
                toolbar: None,
                opacity: None,
            })
            .await;

        assert!(result.is_err());
        assert_eq!(store.lock().await.note(&id).unwrap().color, "slate");
    }

    #[tokio::test]
    async fn trashed_note_window_stays_shut() {
        let (app, store, _sink, id) = app_with_note();
        app.run(Commands::Trash { id: id.clone() }).await.unwrap();

        let result = app.run(Commands::Toggle { id: id.clone() }).await;
        assert!(matches!(result, Err(MemoraError::ApplicationError { .. })));

        app.run(Commands::Edit {
            id: id.clone(),
            title: None,
            content: None,
            color: None,
            tags: None,
            pin: Some(true),
            lock: None,
            toolbar: None,
            opacity: None,
        })
        .await
        .unwrap();

        let store = store.lock().await;
        let note = store.note(&id).unwrap();
        assert!(note.is_trashed());
        assert!(!note.is_open);
        assert!(!note.is_pinned);
    }

    #[tokio::test]
    async fn trash_then_forced_purge() {
        let (app, store, _sink, id) = app_with_note();

        app.run(Commands::Trash { id: id.clone() }).await.unwrap();
        assert!(store.lock().await.note(&id).unwrap().is_trashed());

        app.run(Commands::Purge {
            id: id.clone(),
            force: true,
        })
        .await
        .unwrap();
        assert!(store.lock().await.note(&id).is_none());
    }
}
