use std::fs;
use std::path::Path;

use time::Duration;

use crate::error::{JournalError, ValidationError};
use crate::journal::entry::{next_id, Clock, DateFormatter, Draft, Entry, SystemClock};
use crate::journal::transfer::{self, ExportFile};
use crate::notify::{Notification, NotificationKind, Notifier};
use crate::render::{self, JournalView};
use crate::storage::{DefaultDataset, EntryStorage};

const CONFIRM_DELETE: &str = "Are you sure you want to delete this entry?";
const CONFIRM_CLEAR: &str = "Are you sure you want to delete ALL entries? This cannot be undone!";

/// Yes/no question put to the user before destructive operations.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(Entry),
    NotFound,
    Cancelled,
}

pub struct JournalStore<S> {
    storage: S,
    dataset: Box<dyn DefaultDataset>,
    clock: Box<dyn Clock>,
    formatter: DateFormatter,
    notifier: Notifier,
    view: JournalView,
}

impl<S: EntryStorage> JournalStore<S> {
    pub fn new(storage: S, dataset: Box<dyn DefaultDataset>) -> Self {
        Self {
            storage,
            dataset,
            clock: Box::new(SystemClock),
            formatter: DateFormatter::default(),
            notifier: Notifier::default(),
            view: JournalView::default(),
        }
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_formatter(mut self, formatter: DateFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_notification_duration(mut self, duration: Duration) -> Self {
        self.notifier = Notifier::new(duration);
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// The notification still on screen, dropping it once it has expired.
    pub fn notification(&mut self) -> Option<&Notification> {
        let now = self.clock.now();
        self.notifier.dismiss_expired(now);
        self.notifier.latest()
    }

    pub fn view(&self) -> &JournalView {
        &self.view
    }

    /// Stored entries, or the default dataset seeded into storage when
    /// nothing is stored. Dataset failures fall back to an empty list.
    pub fn load(&mut self) -> Result<Vec<Entry>, JournalError> {
        if let Some(entries) = self.storage.load()? {
            return Ok(entries);
        }
        match self.dataset.fetch() {
            Ok(entries) => match self.storage.save(&entries) {
                Ok(()) => {
                    tracing::info!(count = entries.len(), "seeded storage from default dataset");
                    Ok(entries)
                }
                Err(err) => {
                    tracing::warn!(?err, "failed to seed storage from default dataset");
                    Ok(Vec::new())
                }
            },
            Err(err) => {
                tracing::warn!(%err, "default dataset unavailable, starting empty");
                Ok(Vec::new())
            }
        }
    }

    pub fn save_entry(&mut self, draft: &mut Draft) -> Result<Entry, JournalError> {
        let title = draft.title.trim();
        let content = draft.content.trim();
        let missing = if title.is_empty() {
            Some("title")
        } else if content.is_empty() {
            Some("content")
        } else {
            None
        };
        if let Some(field) = missing {
            self.notify(NotificationKind::Error, "Please fill in both title and content!");
            return Err(ValidationError::MissingField(field).into());
        }

        let title = title.to_owned();
        let content = content.to_owned();
        let result = self.load().and_then(|mut entries| {
            let now = self.clock.now();
            let entry = Entry {
                id: next_id(&entries, now),
                date: self.formatter.format(now),
                title,
                content,
            };
            entries.insert(0, entry.clone());
            self.storage.save(&entries)?;
            Ok((entry, entries))
        });
        match result {
            Ok((entry, entries)) => {
                tracing::info!(id = entry.id, "saved entry");
                draft.clear();
                self.notify(NotificationKind::Success, "Entry saved successfully!");
                self.render(Some(&entries))?;
                Ok(entry)
            }
            Err(err) => Err(self.fail("Could not save entry", err)),
        }
    }

    pub fn delete_entry(
        &mut self,
        id: i64,
        confirm: &mut dyn Confirm,
    ) -> Result<DeleteOutcome, JournalError> {
        if !confirm.confirm(CONFIRM_DELETE) {
            return Ok(DeleteOutcome::Cancelled);
        }
        let mut entries = match self.load() {
            Ok(entries) => entries,
            Err(err) => return Err(self.fail("Could not delete entry", err)),
        };
        let Some(position) = entries.iter().position(|entry| entry.id == id) else {
            tracing::debug!(id, "no entry to delete");
            self.notify(NotificationKind::Info, format!("No entry with id {id}"));
            self.render(Some(&entries))?;
            return Ok(DeleteOutcome::NotFound);
        };
        let removed = entries.remove(position);
        if let Err(err) = self.storage.save(&entries) {
            return Err(self.fail("Could not delete entry", err.into()));
        }
        tracing::info!(id, "deleted entry");
        self.render(Some(&entries))?;
        self.notify(NotificationKind::Info, "Entry deleted");
        Ok(DeleteOutcome::Deleted(removed))
    }

    /// Returns whether the journal was cleared.
    pub fn clear_all(&mut self, confirm: &mut dyn Confirm) -> Result<bool, JournalError> {
        if !confirm.confirm(CONFIRM_CLEAR) {
            return Ok(false);
        }
        if let Err(err) = self.storage.clear() {
            return Err(self.fail("Could not clear entries", err.into()));
        }
        tracing::info!("cleared all entries");
        self.render(Some(&[]))?;
        self.notify(NotificationKind::Info, "All entries cleared");
        Ok(true)
    }

    pub fn export(&mut self) -> Result<ExportFile, JournalError> {
        let entries = match self.storage.load() {
            Ok(entries) => entries.unwrap_or_default(),
            Err(err) => return Err(self.fail("Could not export journal", err.into())),
        };
        match transfer::export_entries(&entries, self.clock.now()) {
            Ok(file) => {
                tracing::info!(count = entries.len(), file = %file.file_name, "exported journal");
                self.notify(NotificationKind::Success, "Journal exported successfully!");
                Ok(file)
            }
            Err(err @ JournalError::Validation(ValidationError::NothingToExport)) => {
                self.notify(NotificationKind::Error, "No entries to export!");
                Err(err)
            }
            Err(err) => Err(self.fail("Could not export journal", err)),
        }
    }

    /// Replaces the stored journal with the entries in `raw`. Storage is left
    /// untouched when the data does not validate.
    pub fn import(&mut self, raw: &str) -> Result<usize, JournalError> {
        let entries = match transfer::parse_import(raw, self.clock.now()) {
            Ok(entries) => entries,
            Err(err @ JournalError::Validation(_)) => {
                self.notify(NotificationKind::Error, "Invalid file format!");
                return Err(err);
            }
            Err(err) => return Err(self.fail("Error importing file", err)),
        };
        if let Err(err) = self.storage.save(&entries) {
            return Err(self.fail("Error importing file", err.into()));
        }
        tracing::info!(count = entries.len(), "imported journal");
        self.notify(NotificationKind::Success, "Journal imported successfully!");
        self.render(Some(&entries))?;
        Ok(entries.len())
    }

    pub fn import_path(&mut self, path: &Path) -> Result<usize, JournalError> {
        match fs::read_to_string(path) {
            Ok(raw) => self.import(&raw),
            Err(source) => {
                let err = JournalError::Read {
                    path: path.to_path_buf(),
                    source,
                };
                Err(self.fail("Error importing file", err))
            }
        }
    }

    /// Renders `entries`, or the loaded journal when `None`.
    pub fn render(&mut self, entries: Option<&[Entry]>) -> Result<&JournalView, JournalError> {
        self.view = match entries {
            Some(entries) => render::render_entries(entries),
            None => {
                let loaded = self.load()?;
                render::render_entries(&loaded)
            }
        };
        tracing::debug!(label = %self.view.count_label, "rendered journal");
        Ok(&self.view)
    }

    fn notify(&mut self, kind: NotificationKind, message: impl Into<String>) {
        let now = self.clock.now();
        self.notifier.show(kind, message, now);
    }

    fn fail(&mut self, action: &str, err: JournalError) -> JournalError {
        tracing::error!(%err, "{action}");
        self.notify(NotificationKind::Error, format!("{action}: {err}"));
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BootstrapError;
    use crate::storage::{
        FileStore, KeyValueStore, KeyedStorage, MemoryStore, NoDataset, DEFAULT_STORAGE_KEY,
    };
    use crate::journal::entry::{timestamp_millis, FixedClock};
    use assert_matches::assert_matches;
    use serde_json::json;
    use tempfile::TempDir;
    use time::macros::datetime;
    use time::OffsetDateTime;

    type TestResult<T = ()> = anyhow::Result<T>;

    const NOW: OffsetDateTime = datetime!(2026-10-14 09:05 UTC);

    fn yes() -> impl FnMut(&str) -> bool {
        |_| true
    }

    fn no() -> impl FnMut(&str) -> bool {
        |_| false
    }

    fn store_with(
        backend: MemoryStore,
        dataset: Box<dyn DefaultDataset>,
    ) -> (FixedClock, JournalStore<KeyedStorage<MemoryStore>>) {
        let clock = FixedClock::new(NOW);
        let store = JournalStore::new(KeyedStorage::new(backend, DEFAULT_STORAGE_KEY), dataset)
            .with_clock(Box::new(clock.clone()));
        (clock, store)
    }

    fn empty_store() -> (FixedClock, JournalStore<KeyedStorage<MemoryStore>>) {
        store_with(MemoryStore::new(), Box::new(NoDataset))
    }

    fn seeded(entries: &[Entry]) -> TestResult<JournalStore<KeyedStorage<MemoryStore>>> {
        let (_clock, store) = empty_store();
        store.storage().save(entries)?;
        Ok(store)
    }

    fn entry(id: i64, title: &str) -> Entry {
        Entry {
            id,
            date: "Tuesday, October 13, 2026 at 08:00 PM".into(),
            title: title.into(),
            content: format!("{title} content"),
        }
    }

    fn last_kind<S: EntryStorage>(store: &JournalStore<S>) -> Option<NotificationKind> {
        store.notifier().latest().map(|note| note.kind)
    }

    #[test]
    fn save_prepends_entry_and_clears_draft() -> TestResult {
        let mut store = seeded(&[entry(1, "older")])?;
        let mut draft = Draft::new("Day 1", "Hello\nWorld");

        let saved = store.save_entry(&mut draft)?;

        let entries = store.load()?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], saved);
        assert_eq!(saved.id, timestamp_millis(NOW));
        assert_eq!(saved.date, "Wednesday, October 14, 2026 at 09:05 AM");
        assert_eq!(saved.content, "Hello\nWorld");
        assert_eq!(draft, Draft::default());
        assert_eq!(last_kind(&store), Some(NotificationKind::Success));
        Ok(())
    }

    #[test]
    fn first_save_renders_single_entry_with_line_break() -> TestResult {
        let (_clock, mut store) = empty_store();
        store.save_entry(&mut Draft::new("Day 1", "Hello\nWorld"))?;

        let view = store.view();
        assert_eq!(view.count_label, "1 entry");
        assert!(view.entries_html.contains("Hello<br>World"));
        assert_eq!(store.load()?.len(), 1);
        Ok(())
    }

    #[test]
    fn save_trims_fields() -> TestResult {
        let (_clock, mut store) = empty_store();
        let saved = store.save_entry(&mut Draft::new("  Day 2  ", "\n text \n"))?;
        assert_eq!(saved.title, "Day 2");
        assert_eq!(saved.content, "text");
        Ok(())
    }

    #[test]
    fn save_rejects_blank_fields_and_keeps_list() -> TestResult {
        let mut store = seeded(&[entry(1, "kept")])?;

        let mut draft = Draft::new("   ", "content");
        assert_matches!(
            store.save_entry(&mut draft),
            Err(JournalError::Validation(ValidationError::MissingField("title")))
        );
        assert_eq!(draft.content, "content");

        assert_matches!(
            store.save_entry(&mut Draft::new("title", "")),
            Err(JournalError::Validation(ValidationError::MissingField("content")))
        );

        assert_eq!(store.load()?, vec![entry(1, "kept")]);
        assert_eq!(last_kind(&store), Some(NotificationKind::Error));
        Ok(())
    }

    #[test]
    fn rapid_saves_get_distinct_ids() -> TestResult {
        let (_clock, mut store) = empty_store();
        let first = store.save_entry(&mut Draft::new("a", "b"))?;
        let second = store.save_entry(&mut Draft::new("c", "d"))?;
        assert_ne!(first.id, second.id);
        assert_eq!(store.load()?[0], second);
        Ok(())
    }

    #[test]
    fn delete_removes_only_matching_entry() -> TestResult {
        let mut store = seeded(&[entry(3, "c"), entry(2, "b"), entry(1, "a")])?;

        let outcome = store.delete_entry(2, &mut yes())?;

        assert_eq!(outcome, DeleteOutcome::Deleted(entry(2, "b")));
        assert_eq!(store.load()?, vec![entry(3, "c"), entry(1, "a")]);
        assert_eq!(store.view().count_label, "2 entries");
        Ok(())
    }

    #[test]
    fn delete_of_unknown_id_changes_nothing() -> TestResult {
        let mut store = seeded(&[entry(1, "a")])?;
        assert_eq!(store.delete_entry(99, &mut yes())?, DeleteOutcome::NotFound);
        assert_eq!(store.load()?, vec![entry(1, "a")]);
        Ok(())
    }

    #[test]
    fn declined_delete_changes_nothing() -> TestResult {
        let mut store = seeded(&[entry(1, "a")])?;
        let mut prompts = Vec::new();
        let outcome = store.delete_entry(1, &mut |prompt: &str| {
            prompts.push(prompt.to_owned());
            false
        })?;
        assert_eq!(outcome, DeleteOutcome::Cancelled);
        assert_eq!(prompts, vec![CONFIRM_DELETE.to_owned()]);
        assert_eq!(store.load()?, vec![entry(1, "a")]);
        Ok(())
    }

    #[test]
    fn clear_removes_key_and_renders_empty() -> TestResult {
        let backend = MemoryStore::new();
        let (_clock, mut store) = store_with(backend.clone(), Box::new(NoDataset));
        store.save_entry(&mut Draft::new("a", "b"))?;
        assert!(backend.contains(DEFAULT_STORAGE_KEY));

        assert!(store.clear_all(&mut yes())?);

        assert!(!backend.contains(DEFAULT_STORAGE_KEY));
        assert!(store.view().is_empty);
        assert_eq!(store.view().count_label, "0 entries");
        assert!(store.load()?.is_empty());
        Ok(())
    }

    #[test]
    fn declined_clear_keeps_entries() -> TestResult {
        let mut store = seeded(&[entry(1, "a")])?;
        assert!(!store.clear_all(&mut no())?);
        assert_eq!(store.load()?.len(), 1);
        Ok(())
    }

    #[test]
    fn export_of_empty_journal_fails() {
        let (_clock, mut store) = empty_store();
        assert_matches!(
            store.export(),
            Err(JournalError::Validation(ValidationError::NothingToExport))
        );
        assert_eq!(
            store.notifier().latest().map(|note| note.message.as_str()),
            Some("No entries to export!")
        );
    }

    #[test]
    fn export_then_import_restores_identical_list() -> TestResult {
        let original = vec![entry(2, "second"), entry(1, "first")];
        let mut store = seeded(&original)?;
        let file = store.export()?;
        assert_eq!(file.file_name, "my-journal-2026-10-14.json");

        store.clear_all(&mut yes())?;
        assert_eq!(store.import(&file.contents)?, 2);
        assert_eq!(store.load()?, original);
        assert_eq!(last_kind(&store), Some(NotificationKind::Success));
        Ok(())
    }

    #[test]
    fn rejected_import_leaves_storage_untouched() -> TestResult {
        let before = vec![entry(1, "kept")];
        let mut store = seeded(&before)?;

        let not_array = json!({"title": "a", "content": "b", "date": "c"}).to_string();
        assert_matches!(store.import(&not_array), Err(JournalError::Validation(_)));

        let missing_date = json!([{"title": "a", "content": "b"}]).to_string();
        assert_matches!(store.import(&missing_date), Err(JournalError::Validation(_)));

        assert_matches!(store.import("not json"), Err(JournalError::Parse(_)));

        assert_eq!(store.load()?, before);
        assert_eq!(last_kind(&store), Some(NotificationKind::Error));
        Ok(())
    }

    #[test]
    fn import_accepts_whitespace_title_unlike_save() -> TestResult {
        let (_clock, mut store) = empty_store();
        let raw = json!([{"id": 5, "title": " ", "content": "x", "date": "d"}]).to_string();
        assert_eq!(store.import(&raw)?, 1);
        assert_eq!(store.load()?[0].title, " ");

        assert_matches!(
            store.save_entry(&mut Draft::new(" ", "x")),
            Err(JournalError::Validation(_))
        );
        Ok(())
    }

    #[test]
    fn import_path_reports_unreadable_file() -> TestResult {
        let (_clock, mut store) = empty_store();
        let temp = TempDir::new()?;
        assert_matches!(
            store.import_path(&temp.path().join("missing.json")),
            Err(JournalError::Read { .. })
        );
        Ok(())
    }

    #[test]
    fn first_load_seeds_storage_from_dataset() -> TestResult {
        let backend = MemoryStore::new();
        let dataset = vec![entry(10, "welcome")];
        let seed = dataset.clone();
        let (_clock, mut store) = store_with(
            backend.clone(),
            Box::new(move || -> Result<Vec<Entry>, BootstrapError> { Ok(seed.clone()) }),
        );

        assert_eq!(store.load()?, dataset);
        let stored = KeyedStorage::new(backend, DEFAULT_STORAGE_KEY).load()?;
        assert_eq!(stored, Some(dataset));
        Ok(())
    }

    #[test]
    fn unreachable_dataset_yields_empty_list() -> TestResult {
        let backend = MemoryStore::new();
        let (_clock, mut store) = store_with(
            backend.clone(),
            Box::new(|| -> Result<Vec<Entry>, BootstrapError> {
                Err(BootstrapError::Parse(
                    serde_json::from_str::<Vec<Entry>>("{").unwrap_err(),
                ))
            }),
        );
        assert!(store.load()?.is_empty());
        assert!(!backend.contains(DEFAULT_STORAGE_KEY));
        Ok(())
    }

    #[test]
    fn stored_data_wins_over_dataset() -> TestResult {
        let backend = MemoryStore::new();
        KeyedStorage::new(backend.clone(), DEFAULT_STORAGE_KEY).save(&[entry(1, "mine")])?;
        let (_clock, mut store) = store_with(
            backend,
            Box::new(|| -> Result<Vec<Entry>, BootstrapError> { Ok(vec![entry(2, "default")]) }),
        );
        assert_eq!(store.load()?, vec![entry(1, "mine")]);
        Ok(())
    }

    #[test]
    fn render_without_list_loads_from_storage() -> TestResult {
        let mut store = seeded(&[entry(1, "a"), entry(2, "b")])?;
        let view = store.render(None)?;
        assert_eq!(view.count_label, "2 entries");
        Ok(())
    }

    #[test]
    fn notification_auto_dismisses() -> TestResult {
        let (clock, mut store) = empty_store();
        store.save_entry(&mut Draft::new("a", "b"))?;
        assert!(store.notifier().visible(clock.now()).is_some());
        clock.advance(Duration::seconds(3));
        assert!(store.notifier().visible(clock.now()).is_none());
        Ok(())
    }

    #[test]
    fn expired_notification_is_dropped() -> TestResult {
        let (clock, mut store) = empty_store();
        store.save_entry(&mut Draft::new("a", "b"))?;
        assert_eq!(
            store.notification().map(|note| note.kind),
            Some(NotificationKind::Success)
        );

        clock.advance(Duration::seconds(3));
        assert!(store.notification().is_none());
        assert!(store.notifier().latest().is_none());
        Ok(())
    }

    #[test]
    fn save_after_importing_max_id_keeps_ids_unique() -> TestResult {
        let (_clock, mut store) = empty_store();
        let raw = json!([{"id": i64::MAX, "title": "far future", "content": "x", "date": "d"}])
            .to_string();
        store.import(&raw)?;

        let first = store.save_entry(&mut Draft::new("a", "b"))?;
        let second = store.save_entry(&mut Draft::new("c", "d"))?;

        let ids: Vec<_> = store.load()?.iter().map(|entry| entry.id).collect();
        assert_eq!(ids, vec![second.id, first.id, i64::MAX]);
        assert_ne!(first.id, second.id);
        assert_eq!(first.id, timestamp_millis(NOW));
        Ok(())
    }

    #[test]
    fn shared_backend_is_last_write_wins() -> TestResult {
        let backend = MemoryStore::new();
        let (_a, mut first) = store_with(backend.clone(), Box::new(NoDataset));
        let (_b, mut second) = store_with(backend.clone(), Box::new(NoDataset));

        first.save_entry(&mut Draft::new("from first", "x"))?;
        second.save_entry(&mut Draft::new("from second", "y"))?;

        let titles: Vec<_> = first.load()?.into_iter().map(|entry| entry.title).collect();
        assert_eq!(titles, vec!["from second", "from first"]);
        Ok(())
    }

    #[test]
    fn file_backed_store_persists_across_instances() -> TestResult {
        let temp = TempDir::new()?;
        let open = || -> TestResult<JournalStore<KeyedStorage<FileStore>>> {
            let storage = KeyedStorage::new(FileStore::open(temp.path())?, DEFAULT_STORAGE_KEY);
            Ok(JournalStore::new(storage, Box::new(NoDataset))
                .with_clock(Box::new(FixedClock::new(NOW))))
        };

        open()?.save_entry(&mut Draft::new("persisted", "text"))?;
        let reopened = open()?.load()?;
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened[0].title, "persisted");

        let raw = FileStore::open(temp.path())?.get(DEFAULT_STORAGE_KEY)?;
        assert!(raw.is_some_and(|raw| raw.contains("\"title\":\"persisted\"")));
        Ok(())
    }
}
