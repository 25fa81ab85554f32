//! Application context.
//!
//! [`Dialer`] is built once at startup and handed to every screen. It owns
//! both stores over one shared persistence backend plus the prompt catalog,
//! and implements the call flows that touch more than one of them.
//!
//! Recording a call never updates a contact: the two collections are written
//! independently.

use std::sync::Arc;

use crate::call_history::CallHistoryStore;
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, ConfigData};
use crate::contacts::ContactStore;
use crate::error::{DialerError, DialerResult};
use crate::models::{CallId, CallRecord, Contact, NewCallRecord};
use crate::persistence::{FilePersistence, KeyValuePersistence};
use crate::phone::{digits_only, format_phone_number};
use crate::prompts::PromptCatalog;

/// Number of contacts shown as favorites on the home screen.
pub const FAVORITES_LIMIT: usize = 4;

pub struct Dialer<P> {
    contacts: ContactStore<P>,
    calls: CallHistoryStore<P>,
    prompts: PromptCatalog,
}

impl Dialer<FilePersistence> {
    /// Open the file-backed stores described by `config`.
    pub fn open(config: &Config) -> DialerResult<Self> {
        let persistence = Arc::new(FilePersistence::new(config.data_dir()));
        tracing::info!(data_dir = %config.data_dir().display(), "Opening dialer stores");
        Self::with_config(persistence, Arc::new(SystemClock), config.data())
    }
}

impl<P: KeyValuePersistence> Dialer<P> {
    /// Stores with default keys and settings.
    pub fn new(persistence: Arc<P>, clock: Arc<dyn Clock>) -> DialerResult<Self> {
        Self::with_config(persistence, clock, &ConfigData::default())
    }

    /// Fails when both collections would land in the same stored document.
    pub fn with_config(
        persistence: Arc<P>,
        clock: Arc<dyn Clock>,
        config: &ConfigData,
    ) -> DialerResult<Self> {
        let contacts_doc = persistence.document_name(&config.contacts_key);
        if config.contacts_key == config.call_history_key
            || contacts_doc == persistence.document_name(&config.call_history_key)
        {
            return Err(DialerError::Config(format!(
                "contacts_key '{}' and call_history_key '{}' share the stored document '{}'",
                config.contacts_key, config.call_history_key, contacts_doc
            )));
        }

        let contacts = ContactStore::new(persistence.clone(), &config.contacts_key, clock.clone());
        let calls = CallHistoryStore::new(persistence, &config.call_history_key, clock)
            .with_recent_limit(config.recent_calls_limit)
            .with_date_format(&config.date_format);

        Ok(Self {
            contacts,
            calls,
            prompts: PromptCatalog::new(),
        })
    }

    pub fn contacts(&self) -> &ContactStore<P> {
        &self.contacts
    }

    pub fn calls(&self) -> &CallHistoryStore<P> {
        &self.calls
    }

    pub fn prompts(&self) -> &PromptCatalog {
        &self.prompts
    }

    /// Contacts for a search box: the full list when `query` is blank,
    /// search results otherwise.
    pub async fn filter_contacts(&self, query: &str) -> Vec<Contact> {
        if query.trim().is_empty() {
            self.contacts.list().await
        } else {
            self.contacts.search(query.trim()).await
        }
    }

    /// The first [`FAVORITES_LIMIT`] contacts in name order.
    pub async fn favorites(&self) -> Vec<Contact> {
        let mut contacts = self.contacts.list().await;
        contacts.truncate(FAVORITES_LIMIT);
        contacts
    }

    /// Recent calls for the home screen, with legacy records repaired first.
    ///
    /// A failed repair is logged and the stored history is shown as is.
    pub async fn recent_calls(&self) -> Vec<CallRecord> {
        if let Err(e) = self.calls.normalize().await {
            tracing::warn!(error = %e, "Failed to repair call history");
        }
        self.calls.recent(None).await
    }

    /// Prompts to offer before calling `contact`.
    pub fn prompts_for(&self, contact: &Contact) -> Vec<&'static str> {
        self.prompts.prompts_for(contact.occupation.as_deref())
    }

    /// Record an outgoing call to a number typed on the keypad.
    ///
    /// The call is labelled with the name of a stored contact that has the
    /// same digits, or with the number itself.
    pub async fn call_number(&self, raw: &str) -> DialerResult<CallRecord> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DialerError::validation("number", "nothing to dial"));
        }

        let number = format_phone_number(trimmed);
        let digits = digits_only(&number);
        let name = self
            .contacts
            .list()
            .await
            .into_iter()
            .find(|c| !digits.is_empty() && digits_only(&c.number) == digits)
            .map(|c| c.name)
            .unwrap_or_else(|| number.clone());

        tracing::debug!(number = %number, name = %name, "Dialing number");
        self.calls.append(NewCallRecord::outgoing(name, number)).await
    }

    /// Record an outgoing call to `contact`, optionally with the prompt
    /// chosen for it.
    pub async fn call_contact(
        &self,
        contact: &Contact,
        prompt: Option<&str>,
    ) -> DialerResult<CallRecord> {
        let mut record =
            NewCallRecord::outgoing(contact.name.clone(), format_phone_number(&contact.number));
        if let Some(prompt) = prompt.map(str::trim).filter(|p| !p.is_empty()) {
            record = record.with_prompt(prompt);
        }

        tracing::debug!(contact_id = contact.id, prompted = record.ai_prompt.is_some(), "Calling contact");
        self.calls.append(record).await
    }

    /// Store the length of a finished call.
    pub async fn end_call(&self, id: CallId, seconds: u64) -> DialerResult<bool> {
        self.calls.update_duration(id, seconds).await
    }
}
