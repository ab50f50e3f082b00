use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use crate::config::ExportOptions;
use crate::journal::{Confirm, DeleteOutcome, Draft, JournalStore};
use crate::notify::NotificationKind;
use crate::render::{format_listing, render_page};
use crate::storage::EntryStorage;

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Entry title (prompted if omitted)
    #[arg()]
    pub title: Option<String>,
    /// Entry text. If omitted, prompts on a terminal (end with an empty
    /// line) or reads all of piped stdin.
    #[arg(long)]
    pub content: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ConfirmArgs {
    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Entry identifier
    pub id: i64,
    #[command(flatten)]
    pub confirm: ConfirmArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Directory to write the export into (defaults to the configured directory)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// JSON file previously produced by export
    pub file: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Write the page to this file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Asks on the terminal; declines when stdin is not interactive.
pub struct TerminalConfirm {
    assume_yes: bool,
}

impl TerminalConfirm {
    pub fn new(args: &ConfirmArgs) -> Self {
        Self {
            assume_yes: args.yes,
        }
    }
}

impl Confirm for TerminalConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        if !atty::is(atty::Stream::Stdin) {
            tracing::warn!("stdin is not interactive, pass --yes to confirm");
            return false;
        }
        match ask(&format!("{prompt} [y/N]")) {
            Ok(answer) => is_affirmative(&answer),
            Err(err) => {
                tracing::error!(?err, "failed to read confirmation");
                false
            }
        }
    }
}

pub fn list_entries<S: EntryStorage>(store: &mut JournalStore<S>) -> Result<()> {
    let entries = store.load().context("loading entries")?;
    print!("{}", format_listing(&entries));
    Ok(())
}

pub fn add_entry<S: EntryStorage>(store: &mut JournalStore<S>, args: AddArgs) -> Result<()> {
    let title = match args.title {
        Some(title) => title,
        None => ask("Title")?,
    };
    let interactive = atty::is(atty::Stream::Stdin);
    let content = read_content(args.content, interactive, &mut io::stdin().lock())?;
    let mut draft = Draft::new(title, content);
    let output = run_add(store, &mut draft);
    finish(store, output)
}

pub fn delete_entry<S: EntryStorage>(store: &mut JournalStore<S>, args: DeleteArgs) -> Result<()> {
    let mut confirm = TerminalConfirm::new(&args.confirm);
    let output = run_delete(store, args.id, &mut confirm);
    finish(store, output)
}

pub fn clear_entries<S: EntryStorage>(store: &mut JournalStore<S>, args: ConfirmArgs) -> Result<()> {
    let mut confirm = TerminalConfirm::new(&args);
    let output = run_clear(store, &mut confirm);
    finish(store, output)
}

pub fn export_journal<S: EntryStorage>(
    store: &mut JournalStore<S>,
    options: &ExportOptions,
    args: ExportArgs,
) -> Result<()> {
    let dir = args
        .output_dir
        .unwrap_or_else(|| options.resolve_directory());
    let output = run_export(store, &dir);
    finish(store, output)
}

pub fn import_journal<S: EntryStorage>(store: &mut JournalStore<S>, args: ImportArgs) -> Result<()> {
    let output = run_import(store, &args.file);
    finish(store, output)
}

pub fn render_journal<S: EntryStorage>(store: &mut JournalStore<S>, args: RenderArgs) -> Result<()> {
    let page = render_page(store.render(None).context("rendering journal")?);
    match args.output {
        Some(path) => {
            fs::write(&path, page).with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{page}"),
    }
    Ok(())
}

fn run_add<S: EntryStorage>(store: &mut JournalStore<S>, draft: &mut Draft) -> Result<String> {
    let entry = store.save_entry(draft).context("saving entry")?;
    let mut out = format!("Saved entry #{}\n\n", entry.id);
    out.push_str(&format_listing(&store.load()?));
    Ok(out)
}

fn run_delete<S: EntryStorage>(
    store: &mut JournalStore<S>,
    id: i64,
    confirm: &mut dyn Confirm,
) -> Result<String> {
    let outcome = store
        .delete_entry(id, confirm)
        .with_context(|| format!("deleting entry {id}"))?;
    let headline = match outcome {
        DeleteOutcome::Deleted(entry) => format!("Deleted entry #{} ({})", entry.id, entry.title),
        DeleteOutcome::NotFound => format!("Entry #{id} not found"),
        DeleteOutcome::Cancelled => return Ok("Delete cancelled\n".to_string()),
    };
    Ok(format!("{headline}\n{}", store.view().count_label))
}

fn run_clear<S: EntryStorage>(store: &mut JournalStore<S>, confirm: &mut dyn Confirm) -> Result<String> {
    if store.clear_all(confirm).context("clearing entries")? {
        Ok(format!("Cleared journal\n{}", store.view().count_label))
    } else {
        Ok("Clear cancelled\n".to_string())
    }
}

fn run_export<S: EntryStorage>(store: &mut JournalStore<S>, dir: &Path) -> Result<String> {
    let file = store.export().context("exporting journal")?;
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(&file.file_name);
    fs::write(&path, &file.contents).with_context(|| format!("writing {}", path.display()))?;
    Ok(format!("Exported to {}", path.display()))
}

fn run_import<S: EntryStorage>(store: &mut JournalStore<S>, file: &Path) -> Result<String> {
    let count = store
        .import_path(file)
        .with_context(|| format!("importing {}", file.display()))?;
    Ok(format!(
        "Imported {count} entr{} from {}",
        if count == 1 { "y" } else { "ies" },
        file.display()
    ))
}

/// Prints the command output and the notification the store posted.
fn finish<S: EntryStorage>(store: &mut JournalStore<S>, output: Result<String>) -> Result<()> {
    if let Some(note) = store.notification() {
        let line = notification_line(note.kind, &note.message);
        match note.kind {
            NotificationKind::Error => eprintln!("{line}"),
            _ => println!("{line}"),
        }
    }
    let mut text = output?;
    if !text.ends_with('\n') {
        text.push('\n');
    }
    print!("{text}");
    Ok(())
}

fn notification_line(kind: NotificationKind, message: &str) -> String {
    format!("[{kind}] {message}")
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn ask(label: &str) -> Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{}: ", label)?;
    stdout.flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end().to_owned())
}

/// Content from the flag, else typed lines up to the first empty one, else
/// everything piped in.
fn read_content(arg: Option<String>, interactive: bool, input: &mut dyn BufRead) -> Result<String> {
    if let Some(content) = arg {
        return Ok(content);
    }
    if !interactive {
        let mut buf = String::new();
        input.read_to_string(&mut buf).context("reading content from stdin")?;
        return Ok(buf);
    }
    println!("Content (finish with an empty line):");
    let mut lines = Vec::new();
    for line in input.lines() {
        let line = line.context("reading content")?;
        if line.is_empty() {
            break;
        }
        lines.push(line);
    }
    Ok(lines.join("\n"))
}
