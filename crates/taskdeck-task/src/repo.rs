use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use taskdeck_core::{
    categories::CategoryList,
    storage::{KeyValueStore, StoreError},
    tasks::TaskCollection,
    theme::Theme,
};
use tracing::{instrument, warn};

pub const TASKS_KEY: &str = "tasks";
pub const CATEGORIES_KEY: &str = "categories";
pub const THEME_KEY: &str = "theme";

/// Everything read from storage at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub tasks: TaskCollection,
    pub categories: CategoryList,
    pub theme: Theme,
}

/// Task, category and theme persistence on top of any `KeyValueStore`.
///
/// Missing or unreadable blobs fall back to their defaults; only failures of
/// the store itself are reported.
pub struct TaskRepo<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> TaskRepo<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    #[instrument(skip(self))]
    pub fn load(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            tasks: self.load_tasks()?,
            categories: self.load_categories()?,
            theme: self.load_theme()?,
        })
    }

    pub fn load_tasks(&self) -> Result<TaskCollection> {
        Ok(self.load_json(TASKS_KEY)?.unwrap_or_default())
    }

    #[instrument(skip_all, fields(count = tasks.len()))]
    pub fn save_tasks(&self, tasks: &TaskCollection) -> Result<()> {
        self.save_json(TASKS_KEY, tasks)
    }

    pub fn load_categories(&self) -> Result<CategoryList> {
        let names: Option<Vec<String>> = self.load_json(CATEGORIES_KEY)?;
        Ok(names.map(CategoryList::from_names).unwrap_or_default())
    }

    #[instrument(skip_all, fields(count = categories.len()))]
    pub fn save_categories(&self, categories: &CategoryList) -> Result<()> {
        self.save_json(CATEGORIES_KEY, categories)
    }

    pub fn load_theme(&self) -> Result<Theme> {
        let Some(raw) = self.read(THEME_KEY)? else {
            return Ok(Theme::default());
        };
        Ok(raw.parse().unwrap_or_else(|err| {
            warn!(%err, "ignoring stored theme");
            Theme::default()
        }))
    }

    #[instrument(skip(self))]
    pub fn save_theme(&self, theme: Theme) -> Result<()> {
        self.store
            .put(THEME_KEY, theme.as_str())
            .with_context(|| format!("failed to write {THEME_KEY}"))
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        match self.store.get(key) {
            Ok(raw) => Ok(Some(raw)),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err).with_context(|| format!("failed to read {key}")),
        }
    }

    fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.read(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(key, %err, "discarding corrupt blob");
                Ok(None)
            }
        }
    }

    fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.store
            .put(key, &json)
            .with_context(|| format!("failed to write {key}"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use taskdeck_core::{
        storage::InMemoryStore,
        tasks::{Priority, TaskUpdate},
    };

    use super::*;

    #[test]
    fn empty_store_yields_defaults() {
        let repo = TaskRepo::new(InMemoryStore::new());
        let snapshot = repo.load().expect("load");

        assert!(snapshot.tasks.is_empty());
        assert_eq!(snapshot.categories, CategoryList::default());
        assert_eq!(snapshot.theme, Theme::Light);
    }

    #[test]
    fn corrupt_blobs_fall_back_to_defaults() {
        let store = InMemoryStore::new();
        store.put(TASKS_KEY, "{not json").expect("put");
        store.put(CATEGORIES_KEY, "42").expect("put");
        store.put(THEME_KEY, "neon").expect("put");

        let snapshot = TaskRepo::new(store).load().expect("load");
        assert_eq!(snapshot, Snapshot::default());
    }

    #[test]
    fn saved_state_reloads_element_wise_equal() {
        let store = InMemoryStore::new();
        let repo = TaskRepo::new(store.clone());

        let mut tasks = TaskCollection::new();
        let id = tasks.add("Pay rent", Utc::now()).expect("add");
        tasks.add("Buy milk", Utc::now()).expect("add");
        let mut fields = TaskUpdate::from(tasks.get(id).expect("task"));
        fields.priority = Priority::High;
        fields.categories = vec!["Home".into()];
        tasks.update(id, fields);

        let mut categories = CategoryList::default();
        categories.insert("Home");

        repo.save_tasks(&tasks).expect("save tasks");
        repo.save_categories(&categories).expect("save categories");
        repo.save_theme(Theme::Dark).expect("save theme");

        let reloaded = TaskRepo::new(store).load().expect("load");
        assert_eq!(reloaded.tasks, tasks);
        assert_eq!(reloaded.categories, categories);
        assert_eq!(reloaded.theme, Theme::Dark);
    }

    #[test]
    fn theme_is_stored_as_a_bare_string() {
        let store = InMemoryStore::new();
        TaskRepo::new(store.clone())
            .save_theme(Theme::Dark)
            .expect("save theme");
        assert_eq!(store.get(THEME_KEY).expect("get"), "dark");
    }
}
