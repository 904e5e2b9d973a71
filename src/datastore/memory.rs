use std::{
    any::{Any, TypeId},
    cell::RefCell,
    collections::HashMap,
    rc::{Rc, Weak},
};

use chrono::Utc;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::debug;

use super::{ChangeEvent, Criteria, DataStore, Model, OpType, Snapshot, StoreError, model::make_id};
use crate::subscription::Subscription;

/// An in-memory [`DataStore`].
///
/// Records live in one table per model type and keep their insertion order.
/// Clones share the same tables, so a clone behaves like a second handle to
/// the same client.
///
/// Observers are notified synchronously while a mutation is applied, the
/// notification is buffered in the subscription until it is read.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore(Rc<RefCell<State>>);

#[derive(Debug, Default)]
struct State {
    tables: HashMap<TypeId, Box<dyn Any>>,
    next_observer: u64,
}

impl State {
    fn table<M: Model>(&self) -> Option<&Table<M>> {
        self.tables.get(&TypeId::of::<M>())?.downcast_ref()
    }

    fn table_mut<M: Model>(&mut self) -> &mut Table<M> {
        self.tables
            .entry(TypeId::of::<M>())
            .or_insert_with(|| Box::new(Table::<M>::default()))
            .downcast_mut()
            .expect("tables are keyed by their model type")
    }

    fn observer_id(&mut self) -> u64 {
        self.next_observer += 1;
        self.next_observer
    }
}

struct Table<M: Model> {
    records: Vec<M>,
    observers: Vec<Observer<M>>,
}

impl<M: Model> Default for Table<M> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            observers: Vec::new(),
        }
    }
}

struct Observer<M: Model> {
    id: u64,
    criteria: Criteria<M>,
    sink: Sink<M>,
}

enum Sink<M> {
    Changes(UnboundedSender<ChangeEvent<M>>),
    Snapshots(UnboundedSender<Snapshot<M>>),
}

impl<M: Model> Table<M> {
    fn snapshot(&self, criteria: &Criteria<M>) -> Snapshot<M> {
        Snapshot {
            items: self.select(criteria),
            is_synced: true,
        }
    }

    fn select(&self, criteria: &Criteria<M>) -> Vec<M> {
        self.records
            .iter()
            .filter(|record| criteria.matches(record))
            .cloned()
            .collect()
    }

    /// Notify every observer interested in `element`, dropping observers whose subscription is gone.
    ///
    /// Snapshot observers are also notified when `previous` matched, an
    /// update may move a record out of their result set.
    fn notify(&mut self, op_type: OpType, element: &M, previous: Option<&M>) {
        let Self { records, observers } = self;
        observers.retain(|observer| match &observer.sink {
            Sink::Changes(tx) => {
                !observer.criteria.matches(element)
                    || tx
                        .send(ChangeEvent {
                            op_type,
                            element: element.clone(),
                        })
                        .is_ok()
            }
            Sink::Snapshots(tx) => {
                let affected = observer.criteria.matches(element)
                    || previous.is_some_and(|previous| observer.criteria.matches(previous));
                if !affected {
                    return true;
                }
                let items = records
                    .iter()
                    .filter(|record| observer.criteria.matches(record))
                    .cloned()
                    .collect();
                tx.send(Snapshot {
                    items,
                    is_synced: true,
                })
                .is_ok()
            }
        });
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records of model `M`.
    pub fn count<M: Model>(&self) -> usize {
        self.0.borrow().table::<M>().map_or(0, |table| table.records.len())
    }

    /// Number of live observers on model `M`.
    pub fn observers<M: Model>(&self) -> usize {
        self.0
            .borrow()
            .table::<M>()
            .map_or(0, |table| table.observers.len())
    }

    fn subscribe<M: Model, T>(
        &self,
        criteria: Criteria<M>,
        initial: Option<T>,
        sink: impl FnOnce(UnboundedSender<T>) -> Sink<M>,
    ) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(initial) = initial {
            let _ = tx.send(initial);
        }
        let mut state = self.0.borrow_mut();
        let id = state.observer_id();
        state.table_mut::<M>().observers.push(Observer {
            id,
            criteria,
            sink: sink(tx),
        });
        debug!(model = M::NAME, observer = id, "subscribed");
        Subscription::new(rx, unsubscribe_hook::<M>(Rc::downgrade(&self.0), id))
    }
}

fn unsubscribe_hook<M: Model>(state: Weak<RefCell<State>>, id: u64) -> impl FnOnce() + 'static {
    move || {
        let Some(state) = state.upgrade() else { return };
        // A busy store prunes the observer on its next notification instead.
        let Ok(mut state) = state.try_borrow_mut() else { return };
        let Some(table) = state
            .tables
            .get_mut(&TypeId::of::<M>())
            .and_then(|table| table.downcast_mut::<Table<M>>())
        else {
            return;
        };
        table.observers.retain(|observer| observer.id != id);
        debug!(model = M::NAME, observer = id, "unsubscribed");
    }
}

impl DataStore for MemoryStore {
    async fn save<M: Model>(&self, mut record: M) -> Result<M, StoreError> {
        record.validate()?;

        let now = Utc::now();
        let mut state = self.0.borrow_mut();
        let table = state.table_mut::<M>();

        if record.id().is_empty() {
            record.meta_mut().id = make_id();
        }
        let key = record.key();

        if let Some(existing) = table.records.iter().find(|r| r.id() == record.id()) {
            if existing.key() != key {
                return Err(StoreError::ImmutableKey {
                    model: M::NAME,
                    id: record.id().to_string(),
                });
            }
        }

        let (op_type, previous) = match table.records.iter().position(|r| r.key() == key) {
            Some(idx) => {
                let existing = table.records[idx].meta();
                let meta = record.meta_mut();
                meta.id = existing.id.clone();
                meta.created_at = existing.created_at.or(Some(now));
                meta.updated_at = Some(now);
                let previous = std::mem::replace(&mut table.records[idx], record.clone());
                (OpType::Update, Some(previous))
            }
            None => {
                let meta = record.meta_mut();
                meta.created_at = Some(now);
                meta.updated_at = Some(now);
                table.records.push(record.clone());
                (OpType::Insert, None)
            }
        };

        debug!(model = M::NAME, id = record.id(), ?op_type, "saved");
        table.notify(op_type, &record, previous.as_ref());
        Ok(record)
    }

    async fn query<M: Model>(&self, criteria: Criteria<M>) -> Result<Vec<M>, StoreError> {
        let state = self.0.borrow();
        Ok(state.table::<M>().map(|table| table.select(&criteria)).unwrap_or_default())
    }

    async fn delete<M: Model>(&self, criteria: Criteria<M>) -> Result<Vec<M>, StoreError> {
        let mut state = self.0.borrow_mut();
        let table = state.table_mut::<M>();

        // Removed one at a time, each snapshot shows the table after that removal.
        let mut removed = Vec::new();
        let mut idx = 0;
        while idx < table.records.len() {
            if !criteria.matches(&table.records[idx]) {
                idx += 1;
                continue;
            }
            let record = table.records.remove(idx);
            table.notify(OpType::Delete, &record, None);
            removed.push(record);
        }

        debug!(model = M::NAME, removed = removed.len(), "deleted");
        Ok(removed)
    }

    fn observe<M: Model>(&self, criteria: Criteria<M>) -> Subscription<ChangeEvent<M>> {
        self.subscribe(criteria, None, Sink::Changes)
    }

    fn observe_query<M: Model>(&self, criteria: Criteria<M>) -> Subscription<Snapshot<M>> {
        let initial = self.0.borrow_mut().table_mut::<M>().snapshot(&criteria);
        self.subscribe(criteria, Some(initial), Sink::Snapshots)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut state = self.0.borrow_mut();
        debug!(tables = state.tables.len(), "cleared");
        // Dropping the tables drops every sender, which closes the subscriptions.
        state.tables.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::datastore::{BasicModel, Comment, Post};

    #[tokio::test]
    async fn save_assigns_id_and_timestamps() {
        let store = MemoryStore::new();
        let saved = store.save(BasicModel::new("b")).await.unwrap();
        assert_eq!(saved.meta.id.len(), 32);
        assert!(saved.meta.created_at.is_some());
        assert_eq!(saved.meta.created_at, saved.meta.updated_at);
        assert_eq!(store.count::<BasicModel>(), 1);
    }

    #[tokio::test]
    async fn saving_the_same_key_updates() {
        let store = MemoryStore::new();
        let saved = store.save(BasicModel::new("b")).await.unwrap();
        let updated = store
            .save(saved.copy_of(|draft| draft.body = "edited".into()))
            .await
            .unwrap();

        assert_eq!(updated.meta.id, saved.meta.id);
        assert_eq!(updated.meta.created_at, saved.meta.created_at);
        let all = store.query(Criteria::<BasicModel>::all()).await.unwrap();
        assert_eq!(all, [updated]);
    }

    #[tokio::test]
    async fn primary_keys_are_immutable() {
        let store = MemoryStore::new();
        let saved = store.save(Post::new("p1", "title")).await.unwrap();
        let err = store
            .save(saved.copy_of(|draft| draft.title = "edited".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ImmutableKey { model: "Post", .. }));
    }

    #[tokio::test]
    async fn invalid_records_are_rejected() {
        let store = MemoryStore::new();
        let err = store.save(Comment::new("", "c")).await.unwrap_err();
        assert_eq!(err.to_string(), "comment_id is required");
        assert_eq!(store.count::<Comment>(), 0);
    }

    #[tokio::test]
    async fn delete_returns_removed_records() {
        let store = MemoryStore::new();
        let a = store.save(Post::new("p1", "a")).await.unwrap();
        let b = store.save(Post::new("p1", "b")).await.unwrap();
        let c = store.save(Post::new("p2", "c")).await.unwrap();

        let none = store.delete(Criteria::<Post>::key(("p3".to_string(), "a".to_string()))).await;
        assert_eq!(none, Ok(vec![]));

        let removed = store
            .delete(Criteria::<Post>::matching(|p| p.post_id == "p1"))
            .await
            .unwrap();
        assert_eq!(removed, [a, b]);
        assert_eq!(store.query_by_key::<Post>(c.key()).await, Ok(Some(c)));
    }

    #[tokio::test]
    async fn observe_delivers_matching_changes_in_order() {
        let store = MemoryStore::new();
        let mut all = store.observe(Criteria::<BasicModel>::all());
        let mut edited = store.observe(Criteria::<BasicModel>::matching(|m| m.body == "edited"));

        let saved = store.save(BasicModel::new("b")).await.unwrap();
        let updated = store
            .save(saved.copy_of(|draft| draft.body = "edited".into()))
            .await
            .unwrap();
        store.delete(Criteria::of(&updated)).await.unwrap();

        let ops: Vec<_> = [all.next().await, all.next().await, all.next().await]
            .into_iter()
            .map(|event| event.map(|e| e.op_type))
            .collect();
        assert_eq!(ops, [Some(OpType::Insert), Some(OpType::Update), Some(OpType::Delete)]);

        assert_eq!(edited.next().await.map(|e| e.op_type), Some(OpType::Update));
        assert_eq!(edited.next().await.map(|e| e.op_type), Some(OpType::Delete));
    }

    #[tokio::test]
    async fn observe_query_starts_with_current_snapshot() {
        let store = MemoryStore::new();
        let first = store.save(Post::new("p1", "a")).await.unwrap();
        let mut snapshots = store.observe_query(Criteria::<Post>::all());
        let second = store.save(Post::new("p2", "b")).await.unwrap();

        let initial = snapshots.next().await.unwrap();
        assert_eq!(initial.items, [first.clone()]);
        assert!(initial.is_synced);
        assert_eq!(snapshots.next().await.unwrap().items, [first, second]);
    }

    #[tokio::test]
    async fn unsubscribe_removes_observer() {
        let store = MemoryStore::new();
        let subscription = store.observe(Criteria::<BasicModel>::all());
        assert_eq!(store.observers::<BasicModel>(), 1);
        subscription.unsubscribe();
        assert_eq!(store.observers::<BasicModel>(), 0);
    }

    #[tokio::test]
    async fn clear_closes_subscriptions() {
        let store = MemoryStore::new();
        store.save(BasicModel::new("b")).await.unwrap();
        let mut subscription = store.observe(Criteria::<BasicModel>::all());

        store.clear().await.unwrap();
        assert_eq!(subscription.next().await, None);
        assert_eq!(store.count::<BasicModel>(), 0);
    }

    #[tokio::test]
    async fn observe_query_sees_records_leaving_the_result_set() {
        let store = MemoryStore::new();
        let saved = store.save(BasicModel::new("a")).await.unwrap();
        let mut snapshots = store.observe_query(Criteria::<BasicModel>::matching(|m| m.body == "a"));
        assert_eq!(snapshots.next().await.unwrap().items, [saved.clone()]);

        store
            .save(saved.copy_of(|draft| draft.body = "b".into()))
            .await
            .unwrap();
        assert_eq!(snapshots.next().await.unwrap().items, Vec::<BasicModel>::new());
    }

    #[tokio::test]
    async fn delete_sends_a_snapshot_per_removed_record() {
        let store = MemoryStore::new();
        store.save(Post::new("p1", "a")).await.unwrap();
        let second = store.save(Post::new("p2", "b")).await.unwrap();
        let mut snapshots = store.observe_query(Criteria::<Post>::all());
        assert_eq!(snapshots.next().await.unwrap().items.len(), 2);

        store.delete(Criteria::<Post>::all()).await.unwrap();
        assert_eq!(snapshots.next().await.unwrap().items, [second]);
        assert_eq!(snapshots.next().await.unwrap().items, Vec::<Post>::new());
    }

    #[tokio::test]
    async fn unsubscribe_after_clear_creates_no_table() {
        let store = MemoryStore::new();
        let subscription = store.observe(Criteria::<BasicModel>::all());
        store.clear().await.unwrap();

        subscription.unsubscribe();
        assert!(store.0.borrow().tables.is_empty());
    }
}
