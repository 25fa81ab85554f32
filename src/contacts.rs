//! Contact store.
//!
//! Owns the durable contact list. The persisted array is kept sorted by
//! name after every mutation, using Unicode collation on the lowercased name, and `list()` repairs the
//! stored order if it ever finds it out of order.

use std::cmp::Ordering;
use std::sync::Arc;

use feruca::Collator;

use crate::clock::{Clock, IdGenerator};
use crate::collection::JsonCollection;
use crate::error::DialerResult;
use crate::models::{Contact, ContactId, NewContact};
use crate::persistence::{KeyValuePersistence, LoadOutcome};
use crate::phone::strip_dashes;
use crate::validation::{validate_contact, validate_new_contact, validate_search_query};

/// Storage key used when none is configured.
pub const DEFAULT_CONTACTS_KEY: &str = "contacts-store";

/// Locale-aware, case-insensitive name ordering: accented letters sort with
/// their base letter, so "Émile" falls between "bob" and "Zoe".
pub fn compare_names(a: &Contact, b: &Contact) -> Ordering {
    collate_names(&mut Collator::default(), a, b)
}

fn collate_names(collator: &mut Collator, a: &Contact, b: &Contact) -> Ordering {
    collator.collate(a.sort_key().as_str(), b.sort_key().as_str())
}

/// Stable sort by [`compare_names`]. Equal names keep their relative order.
pub fn sort_by_name(contacts: &mut [Contact]) {
    let mut collator = Collator::default();
    contacts.sort_by(|a, b| collate_names(&mut collator, a, b));
}

/// True when `contact` matches a search `query`.
///
/// Matches case-insensitively against name, email and occupation, and
/// against the number both as stored and with dashes removed, so `555`,
/// `555-123` and `5551234567` all find `555-123-4567`.
pub fn matches_query(contact: &Contact, query: &str) -> bool {
    let lowered = query.to_lowercase();
    let cleaned = strip_dashes(query);

    let optional_contains = |field: &Option<String>| {
        field
            .as_deref()
            .is_some_and(|value| value.to_lowercase().contains(&lowered))
    };

    contact.name.to_lowercase().contains(&lowered)
        || contact.number.contains(query)
        || strip_dashes(&contact.number).contains(&cleaned)
        || optional_contains(&contact.email)
        || optional_contains(&contact.occupation)
}

pub struct ContactStore<P> {
    collection: JsonCollection<P, Contact>,
    clock: Arc<dyn Clock>,
    ids: IdGenerator,
}

impl<P: KeyValuePersistence> ContactStore<P> {
    pub fn new(persistence: Arc<P>, key: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            collection: JsonCollection::new(persistence, key),
            clock,
            ids: IdGenerator::new(),
        }
    }

    pub fn key(&self) -> &str {
        self.collection.key()
    }

    /// All contacts, sorted by name. Empty on a read fault.
    ///
    /// If the stored order differs from the sorted order, the sorted list is
    /// written back. A second call on sorted data performs no write.
    pub async fn list(&self) -> Vec<Contact> {
        self.list_outcome().await.into_items()
    }

    /// Like [`list`](Self::list) but reports whether a read fault was recovered.
    pub async fn list_outcome(&self) -> LoadOutcome<Contact> {
        let _guard = self.collection.lock().await;

        let stored = match self.collection.load().await {
            LoadOutcome::Loaded(items) => items,
            recovered => return recovered,
        };

        let mut sorted = stored.clone();
        sort_by_name(&mut sorted);

        if sorted != stored {
            tracing::debug!(key = %self.key(), count = sorted.len(), "Rewriting contacts in sorted order");
            if let Err(e) = self.collection.store(&sorted).await {
                tracing::warn!(key = %self.key(), error = %e, "Failed to persist sorted contacts");
            }
        }

        LoadOutcome::Loaded(sorted)
    }

    /// Contact with the given id, if any.
    pub async fn get(&self, id: ContactId) -> Option<Contact> {
        self.collection
            .load()
            .await
            .into_items()
            .into_iter()
            .find(|c| c.id == id)
    }

    /// Create a contact from `fields` and return the stored record.
    ///
    /// Name and number are required; the number is stored in canonical form
    /// when it has exactly ten digits.
    pub async fn save(&self, fields: NewContact) -> DialerResult<Contact> {
        let fields = validate_new_contact(fields)?;

        let _guard = self.collection.lock().await;
        let mut contacts = self.collection.load_for_update().await?;

        let floor = contacts.iter().map(|c| c.id).max();
        let id = self.ids.next_id(self.clock.now_millis(), floor);
        let contact = Contact::from_new(id, fields);

        contacts.push(contact.clone());
        sort_by_name(&mut contacts);
        self.collection.store(&contacts).await?;

        tracing::info!(id = contact.id, name = %contact.name, "Contact saved");
        Ok(contact)
    }

    /// Replace the contact with the same id.
    ///
    /// Returns `false` (and writes nothing) when no contact has that id.
    pub async fn update(&self, contact: Contact) -> DialerResult<bool> {
        let contact = validate_contact(contact)?;

        let _guard = self.collection.lock().await;
        let mut contacts = self.collection.load_for_update().await?;

        let Some(slot) = contacts.iter_mut().find(|c| c.id == contact.id) else {
            tracing::debug!(id = contact.id, "Update skipped, contact not found");
            return Ok(false);
        };
        *slot = contact;

        sort_by_name(&mut contacts);
        self.collection.store(&contacts).await?;
        Ok(true)
    }

    /// Remove the contact with `id`.
    ///
    /// Returns `false` (and writes nothing) when no contact has that id.
    pub async fn delete(&self, id: ContactId) -> DialerResult<bool> {
        let _guard = self.collection.lock().await;
        let mut contacts = self.collection.load_for_update().await?;

        let before = contacts.len();
        contacts.retain(|c| c.id != id);
        if contacts.len() == before {
            tracing::debug!(id, "Delete skipped, contact not found");
            return Ok(false);
        }

        sort_by_name(&mut contacts);
        self.collection.store(&contacts).await?;
        tracing::info!(id, "Contact deleted");
        Ok(true)
    }

    /// Remove every contact by deleting the stored key.
    pub async fn clear(&self) -> DialerResult<()> {
        let _guard = self.collection.lock().await;
        self.collection.remove().await
    }

    /// Sort the stored contacts and write them back unconditionally.
    pub async fn sort(&self) -> DialerResult<Vec<Contact>> {
        let _guard = self.collection.lock().await;
        let mut contacts = self.collection.load_for_update().await?;
        sort_by_name(&mut contacts);
        self.collection.store(&contacts).await?;
        Ok(contacts)
    }

    /// Contacts matching `query`, sorted by name.
    ///
    /// An empty query is not special-cased; callers showing the full list
    /// should use [`list`](Self::list).
    pub async fn search(&self, query: &str) -> Vec<Contact> {
        if let Err(e) = validate_search_query(query) {
            tracing::warn!(error = %e, "Rejected search query");
            return Vec::new();
        }

        let mut results: Vec<Contact> = self
            .list()
            .await
            .into_iter()
            .filter(|c| matches_query(c, query))
            .collect();
        sort_by_name(&mut results);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::DialerError;
    use crate::persistence::MemoryPersistence;

    fn store() -> (Arc<MemoryPersistence>, ContactStore<MemoryPersistence>) {
        let backend = Arc::new(MemoryPersistence::new());
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let store = ContactStore::new(backend.clone(), DEFAULT_CONTACTS_KEY, clock);
        (backend, store)
    }

    fn names(contacts: &[Contact]) -> Vec<&str> {
        contacts.iter().map(|c| c.name.as_str()).collect()
    }

    fn contact(id: ContactId, name: &str, number: &str) -> Contact {
        Contact::from_new(id, NewContact::new(name, number))
    }

    #[tokio::test]
    async fn test_empty_store_lists_nothing() {
        let (backend, store) = store();
        assert!(store.list().await.is_empty());
        assert_eq!(backend.write_count(), 0);
    }

    #[tokio::test]
    async fn test_save_keeps_list_sorted() {
        let (_, store) = store();
        store.save(NewContact::new("charlie", "111")).await.unwrap();
        store.save(NewContact::new("Alice", "222")).await.unwrap();
        store.save(NewContact::new("bob", "333")).await.unwrap();

        assert_eq!(names(&store.list().await), vec!["Alice", "bob", "charlie"]);
    }

    #[tokio::test]
    async fn test_save_assigns_unique_ids_within_one_tick() {
        let (_, store) = store();
        let a = store.save(NewContact::new("A", "1")).await.unwrap();
        let b = store.save(NewContact::new("B", "2")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.id, 1_700_000_000_000);
    }

    #[tokio::test]
    async fn test_save_formats_and_trims() {
        let (_, store) = store();
        let saved = store
            .save(NewContact::new("  Jane ", "8322345354").with_email(""))
            .await
            .unwrap();
        assert_eq!(saved.name, "Jane");
        assert_eq!(saved.number, "832-234-5354");
        assert!(saved.email.is_none());
    }

    #[tokio::test]
    async fn test_save_rejects_missing_name() {
        let (backend, store) = store();
        let err = store.save(NewContact::new(" ", "555")).await.unwrap_err();
        assert!(matches!(err, DialerError::Validation { .. }));
        assert_eq!(backend.write_count(), 0);
    }

    #[tokio::test]
    async fn test_save_propagates_write_fault() {
        let (backend, store) = store();
        backend.set_fail_writes(true);
        let err = store.save(NewContact::new("Jane", "555")).await.unwrap_err();
        assert!(err.is_write_fault());
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_list_repairs_unsorted_storage_once() {
        let (backend, store) = store();
        let unsorted = vec![contact(2, "zed", "1"), contact(1, "Amy", "2")];
        backend
            .insert_raw(DEFAULT_CONTACTS_KEY, &serde_json::to_string(&unsorted).unwrap())
            .unwrap();

        let first = store.list().await;
        assert_eq!(names(&first), vec!["Amy", "zed"]);
        assert_eq!(backend.write_count(), 1);

        let second = store.list().await;
        assert_eq!(first, second);
        assert_eq!(backend.write_count(), 1);
    }

    #[tokio::test]
    async fn test_list_tolerates_corrupt_value() {
        let (backend, store) = store();
        backend.insert_raw(DEFAULT_CONTACTS_KEY, "not json").unwrap();
        assert!(store.list_outcome().await.is_recovered());
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_list_tolerates_read_fault() {
        let (backend, store) = store();
        store.save(NewContact::new("Jane", "555")).await.unwrap();
        backend.set_fail_reads(true);
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_and_resorts() {
        let (_, store) = store();
        let alice = store.save(NewContact::new("Alice", "1")).await.unwrap();
        store.save(NewContact::new("Bob", "2")).await.unwrap();

        let mut renamed = alice.clone();
        renamed.name = "Zoe".to_string();
        renamed.number = "8322345354".to_string();
        assert!(store.update(renamed).await.unwrap());

        let listed = store.list().await;
        assert_eq!(names(&listed), vec!["Bob", "Zoe"]);
        assert_eq!(listed[1].id, alice.id);
        assert_eq!(listed[1].number, "832-234-5354");
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_noop() {
        let (backend, store) = store();
        store.save(NewContact::new("Alice", "1")).await.unwrap();
        let writes = backend.write_count();

        let changed = store.update(contact(42, "Ghost", "0")).await.unwrap();
        assert!(!changed);
        assert_eq!(backend.write_count(), writes);
        assert_eq!(names(&store.list().await), vec!["Alice"]);
    }

    #[tokio::test]
    async fn test_delete_then_list() {
        let (_, store) = store();
        let a = store.save(NewContact::new("Alice", "1")).await.unwrap();
        let b = store.save(NewContact::new("Bob", "2")).await.unwrap();
        let c = store.save(NewContact::new("Carol", "3")).await.unwrap();

        assert!(store.delete(b.id).await.unwrap());
        let listed = store.list().await;
        assert_eq!(listed, vec![a, c]);
        assert!(!store.delete(b.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_removes_key() {
        let (backend, store) = store();
        store.save(NewContact::new("Alice", "1")).await.unwrap();
        store.clear().await.unwrap();
        assert!(backend.raw(DEFAULT_CONTACTS_KEY).is_none());
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_sort_always_writes() {
        let (backend, store) = store();
        store.save(NewContact::new("Alice", "1")).await.unwrap();
        let writes = backend.write_count();
        let sorted = store.sort().await.unwrap();
        assert_eq!(names(&sorted), vec!["Alice"]);
        assert_eq!(backend.write_count(), writes + 1);
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let (_, store) = store();
        let saved = store.save(NewContact::new("Alice", "1")).await.unwrap();
        assert_eq!(store.get(saved.id).await, Some(saved));
        assert_eq!(store.get(-1).await, None);
    }

    #[tokio::test]
    async fn test_search_by_name() {
        let (_, store) = store();
        store.save(NewContact::new("Smith", "111-111-1111")).await.unwrap();
        store.save(NewContact::new("Jones", "222-222-2222")).await.unwrap();

        assert_eq!(names(&store.search("smi").await), vec!["Smith"]);
        assert_eq!(names(&store.search("SMI").await), vec!["Smith"]);
    }

    #[tokio::test]
    async fn test_search_by_number_any_dash_placement() {
        let (_, store) = store();
        store.save(NewContact::new("Smith", "5551234567")).await.unwrap();
        store.save(NewContact::new("Jones", "8322345354")).await.unwrap();

        for query in ["555", "5551234567", "555-123-4567", "55-51", "1234"] {
            assert_eq!(names(&store.search(query).await), vec!["Smith"], "query {query}");
        }
    }

    #[tokio::test]
    async fn test_search_by_email_and_occupation() {
        let (_, store) = store();
        store
            .save(NewContact::new("Dr. Who", "1").with_occupation("Dentist"))
            .await
            .unwrap();
        store
            .save(NewContact::new("Ann", "2").with_email("ann@Example.com"))
            .await
            .unwrap();

        assert_eq!(names(&store.search("dent").await), vec!["Dr. Who"]);
        assert_eq!(names(&store.search("example").await), vec!["Ann"]);
        assert!(store.search("plumber").await.is_empty());
    }

    #[tokio::test]
    async fn test_search_results_sorted() {
        let (_, store) = store();
        store.save(NewContact::new("mark", "1")).await.unwrap();
        store.save(NewContact::new("Mary", "2")).await.unwrap();
        store.save(NewContact::new("Amar", "3")).await.unwrap();
        assert_eq!(names(&store.search("mar").await), vec!["Amar", "mark", "Mary"]);
    }

    #[test]
    fn test_sort_is_stable_for_equal_names() {
        let mut contacts = vec![
            contact(1, "sam", "1"),
            contact(2, "Sam", "2"),
            contact(3, "Adam", "3"),
        ];
        sort_by_name(&mut contacts);
        let ids: Vec<ContactId> = contacts.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(compare_names(&contacts[1], &contacts[2]), Ordering::Equal);
    }

    #[tokio::test]
    async fn test_accented_names_sort_with_base_letter() {
        let (_, store) = store();
        for name in ["Zoe", "Émile", "Ángel", "bob"] {
            store.save(NewContact::new(name, "555")).await.unwrap();
        }

        assert_eq!(names(&store.list().await), vec!["Ángel", "bob", "Émile", "Zoe"]);
        assert_eq!(
            names(&store.search("e").await),
            vec!["Ángel", "Émile", "Zoe"]
        );
    }

    #[test]
    fn test_compare_names_ignores_case_and_accents_at_first_letter() {
        let emile = contact(1, "émile", "1");
        assert_eq!(compare_names(&contact(2, "Bob", "2"), &emile), Ordering::Less);
        assert_eq!(compare_names(&emile, &contact(3, "zoe", "3")), Ordering::Less);
        assert_eq!(compare_names(&emile, &contact(4, "ÉMILE", "4")), Ordering::Equal);
    }

    #[tokio::test]
    async fn test_concurrent_saves_are_not_lost() {
        let (_, store) = store();
        let store = Arc::new(store);

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .save(NewContact::new(format!("Contact {i:02}"), "555"))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let listed = store.list().await;
        assert_eq!(listed.len(), 20);
        let mut ids: Vec<ContactId> = listed.iter().map(|c| c.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }
}
