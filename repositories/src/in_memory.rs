//! Store backed by two `IndexMap`s under one lock, so that theme existence and
//! cascading deletes are checked against a consistent view of both tables.
use bulk_loader::{BulkInsert, InsertError, Violation};
use error_stack::{IntoReport, Report};
use ids::{SetId, ThemeId};
use indexmap::{IndexMap, IndexSet};
use routing::ArwLock;
use sets_core::SetRepository;
use sets_core::list_filter::{SetFilter, SetListCriteria};
use sets_core::model::{NewSet, PatchSet, Set};
use sets_core::result::{self as set_result, SetRepoError};
use themes_core::list_filter::{ThemeFilter, ThemeListCriteria};
use themes_core::model::{NewTheme, PatchTheme, Theme};
use themes_core::result::{OptRepoResult, Reason, RepoResult, ThemeRepoError};
use themes_core::{ThemeImport, ThemeRepository};


#[derive(Debug, Default)]
struct Tables {
    themes: IndexMap<ThemeId, Theme>,
    sets: IndexMap<SetId, Set>,
    last_theme_id: i64,
    last_set_id: i64,
}

impl Tables {
    fn next_theme_id(&mut self) -> ThemeId {
        self.last_theme_id += 1;
        ThemeId::new(self.last_theme_id)
    }

    fn next_set_id(&mut self) -> SetId {
        self.last_set_id += 1;
        SetId::new(self.last_set_id)
    }

    /// Whether `ancestor` is `theme` or sits anywhere above it.
    fn is_ancestor(&self, ancestor: ThemeId, theme: ThemeId) -> bool {
        let mut current = Some(theme);
        let mut seen = IndexSet::new();
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            if !seen.insert(id) {
                return false;
            }
            current = self.themes.get(&id).and_then(|t| t.parent_id);
        }
        false
    }

    fn descendants_of(&self, root: ThemeId) -> IndexSet<ThemeId> {
        let mut found = IndexSet::from([root]);
        let mut i = 0;
        while let Some(&parent) = found.get_index(i) {
            for theme in self.themes.values() {
                if theme.parent_id == Some(parent) {
                    found.insert(theme.id);
                }
            }
            i += 1;
        }
        found
    }

    fn num_taken(&self, num: &str, except: Option<SetId>) -> bool {
        self.sets
            .values()
            .any(|s| s.num == num && Some(s.id) != except)
    }
}

fn page<T: Clone>(mut rows: Vec<&T>, offset: u64, limit: u64, key: impl Fn(&T) -> i64) -> Vec<T> {
    rows.sort_by_key(|r| key(r));
    rows.into_iter()
        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .cloned()
        .collect()
}

/// One set of tables shared by the theme and set repos it hands out.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    db: ArwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn themes(&self) -> InMemoryThemesRepo {
        InMemoryThemesRepo {
            db: self.db.clone(),
        }
    }

    pub fn sets(&self) -> InMemorySetsRepo {
        InMemorySetsRepo {
            db: self.db.clone(),
        }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryThemesRepo {
    db: ArwLock<Tables>,
}

impl ThemeRepository for InMemoryThemesRepo {
    async fn get(&self, id: ThemeId) -> OptRepoResult<Theme> {
        let db = self.db.read().await;

        Ok(db.themes.get(&id).cloned())
    }

    async fn list(&self, list_criteria: ThemeListCriteria) -> RepoResult<Vec<Theme>> {
        let db = self.db.read().await;

        let matching = db
            .themes
            .values()
            .filter(|theme| {
                list_criteria.filters().iter().all(|f| match f {
                    ThemeFilter::Name(n) => theme.name.to_lowercase().contains(&n.to_lowercase()),
                    ThemeFilter::Parent(p) => theme.parent_id == *p,
                })
            })
            .collect();

        Ok(page(
            matching,
            list_criteria.offset(),
            list_criteria.limit(),
            |t: &Theme| *t.id,
        ))
    }

    async fn create(&self, new_theme: NewTheme) -> RepoResult<Theme> {
        let mut db = self.db.write().await;

        if let Some(parent) = new_theme.parent_id
            && !db.themes.contains_key(&parent)
        {
            return Err(ThemeRepoError::Create(Reason::ParentNotFound).into_report());
        }

        let id = db.next_theme_id();
        let theme = Theme::create(id, new_theme.name, new_theme.parent_id);
        db.themes.insert(id, theme.clone());

        Ok(theme)
    }

    async fn patch(&self, id: ThemeId, patch: PatchTheme) -> OptRepoResult<Theme> {
        let mut db = self.db.write().await;

        let Some(theme) = db.themes.get(&id).cloned() else {
            return Ok(None);
        };

        if let Some(parent) = patch.new_parent() {
            if !db.themes.contains_key(&parent) {
                return Err(ThemeRepoError::Patch(Reason::ParentNotFound).into_report());
            }
            if db.is_ancestor(id, parent) {
                return Err(ThemeRepoError::Patch(Reason::CyclicParent).into_report());
            }
        }

        let patched = patch.apply(theme);
        db.themes.insert(id, patched.clone());
        Ok(Some(patched))
    }

    async fn delete(&self, id: ThemeId) -> OptRepoResult<()> {
        let mut db = self.db.write().await;

        if !db.themes.contains_key(&id) {
            return Ok(None);
        }

        let doomed = db.descendants_of(id);
        db.themes.retain(|theme_id, _| !doomed.contains(theme_id));
        db.sets.retain(|_, set| !doomed.contains(&set.theme_id));
        Ok(Some(()))
    }
}

impl BulkInsert<ThemeImport> for InMemoryThemesRepo {
    async fn bulk_insert(&self, batch: Vec<ThemeImport>) -> Result<usize, Report<InsertError>> {
        let mut db = self.db.write().await;

        let mut batch_ids = IndexSet::with_capacity(batch.len());
        for record in &batch {
            if db.themes.contains_key(&record.id) || !batch_ids.insert(record.id) {
                return Err(Report::new(InsertError::Constraint(Violation::DuplicateKey))
                    .attach(format!("theme {} already exists", record.id)));
            }
        }

        for record in &batch {
            if let Some(parent) = record.parent_id
                && !db.themes.contains_key(&parent)
                && !batch_ids.contains(&parent)
            {
                return Err(
                    Report::new(InsertError::Constraint(Violation::MissingReference))
                        .attach(format!("parent theme {parent} does not exist")),
                );
            }
        }

        let inserted = batch.len();
        for record in batch {
            db.last_theme_id = db.last_theme_id.max(*record.id);
            db.themes.insert(
                record.id,
                Theme::create(record.id, record.name, record.parent_id),
            );
        }
        Ok(inserted)
    }
}

#[derive(Clone, Default)]
pub struct InMemorySetsRepo {
    db: ArwLock<Tables>,
}

impl SetRepository for InMemorySetsRepo {
    async fn get(&self, id: SetId) -> set_result::OptRepoResult<Set> {
        let db = self.db.read().await;

        Ok(db.sets.get(&id).cloned())
    }

    async fn list(&self, list_criteria: SetListCriteria) -> set_result::RepoResult<Vec<Set>> {
        let db = self.db.read().await;

        let matching = db
            .sets
            .values()
            .filter(|set| {
                list_criteria.filters().iter().all(|f| match f {
                    SetFilter::Name(n) => set.name.to_lowercase().contains(&n.to_lowercase()),
                    SetFilter::Theme(t) => set.theme_id == *t,
                })
            })
            .collect();

        Ok(page(
            matching,
            list_criteria.offset(),
            list_criteria.limit(),
            |s: &Set| *s.id,
        ))
    }

    async fn create(&self, new_set: NewSet) -> set_result::RepoResult<Set> {
        let mut db = self.db.write().await;

        if !db.themes.contains_key(&new_set.theme_id) {
            return Err(SetRepoError::Create(set_result::Reason::ThemeNotFound).into_report());
        }
        if db.num_taken(&new_set.num, None) {
            return Err(SetRepoError::Create(set_result::Reason::DuplicateNum).into_report());
        }

        let id = db.next_set_id();
        let set = Set::create(id, new_set);
        db.sets.insert(id, set.clone());
        Ok(set)
    }

    async fn patch(&self, id: SetId, patch: PatchSet) -> set_result::OptRepoResult<Set> {
        let mut db = self.db.write().await;

        let Some(set) = db.sets.get(&id).cloned() else {
            return Ok(None);
        };

        if let Some(theme_id) = patch.theme_id
            && !db.themes.contains_key(&theme_id)
        {
            return Err(SetRepoError::Patch(set_result::Reason::ThemeNotFound).into_report());
        }
        if let Some(num) = &patch.num
            && db.num_taken(num, Some(id))
        {
            return Err(SetRepoError::Patch(set_result::Reason::DuplicateNum).into_report());
        }

        let patched = patch.apply(set);
        db.sets.insert(id, patched.clone());
        Ok(Some(patched))
    }

    async fn delete(&self, id: SetId) -> set_result::OptRepoResult<()> {
        let mut db = self.db.write().await;
        Ok(db.sets.shift_remove(&id).map(|_| ()))
    }
}

impl BulkInsert<NewSet> for InMemorySetsRepo {
    async fn bulk_insert(&self, batch: Vec<NewSet>) -> Result<usize, Report<InsertError>> {
        let mut db = self.db.write().await;

        let mut nums = IndexSet::with_capacity(batch.len());
        for new_set in &batch {
            if db.num_taken(&new_set.num, None) || !nums.insert(new_set.num.as_str()) {
                return Err(Report::new(InsertError::Constraint(Violation::DuplicateKey))
                    .attach(format!("set {} already exists", new_set.num)));
            }
            if !db.themes.contains_key(&new_set.theme_id) {
                return Err(
                    Report::new(InsertError::Constraint(Violation::MissingReference))
                        .attach(format!("theme {} does not exist", new_set.theme_id)),
                );
            }
        }

        let inserted = batch.len();
        for new_set in batch {
            let id = db.next_set_id();
            db.sets.insert(id, Set::create(id, new_set));
        }
        Ok(inserted)
    }
}

#[derive(Clone, Default)]
pub struct FailingThemesRepo;

impl ThemeRepository for FailingThemesRepo {
    async fn get(&self, _: ThemeId) -> OptRepoResult<Theme> {
        Err(ThemeRepoError::Get(Reason::Db).into_report())
    }

    async fn list(&self, _: ThemeListCriteria) -> RepoResult<Vec<Theme>> {
        Err(ThemeRepoError::List(Reason::Db).into_report())
    }

    async fn create(&self, _: NewTheme) -> RepoResult<Theme> {
        Err(ThemeRepoError::Create(Reason::Db).into_report())
    }

    async fn patch(&self, _: ThemeId, _: PatchTheme) -> OptRepoResult<Theme> {
        Err(ThemeRepoError::Patch(Reason::Db).into_report())
    }

    async fn delete(&self, _: ThemeId) -> OptRepoResult<()> {
        Err(ThemeRepoError::Delete(Reason::Db).into_report())
    }
}

impl BulkInsert<ThemeImport> for FailingThemesRepo {
    async fn bulk_insert(&self, _: Vec<ThemeImport>) -> Result<usize, Report<InsertError>> {
        Err(InsertError::Store.into_report())
    }
}

#[derive(Clone, Default)]
pub struct FailingSetsRepo;

impl SetRepository for FailingSetsRepo {
    async fn get(&self, _: SetId) -> set_result::OptRepoResult<Set> {
        Err(SetRepoError::Get(set_result::Reason::Db).into_report())
    }

    async fn list(&self, _: SetListCriteria) -> set_result::RepoResult<Vec<Set>> {
        Err(SetRepoError::List(set_result::Reason::Db).into_report())
    }

    async fn create(&self, _: NewSet) -> set_result::RepoResult<Set> {
        Err(SetRepoError::Create(set_result::Reason::Db).into_report())
    }

    async fn patch(&self, _: SetId, _: PatchSet) -> set_result::OptRepoResult<Set> {
        Err(SetRepoError::Patch(set_result::Reason::Db).into_report())
    }

    async fn delete(&self, _: SetId) -> set_result::OptRepoResult<()> {
        Err(SetRepoError::Delete(set_result::Reason::Db).into_report())
    }
}

impl BulkInsert<NewSet> for FailingSetsRepo {
    async fn bulk_insert(&self, _: Vec<NewSet>) -> Result<usize, Report<InsertError>> {
        Err(InsertError::Store.into_report())
    }
}
