use tokio::sync::{broadcast, mpsc, oneshot};

use crate::{
    core::store::{DeletedContact, RecordStore, StoreError},
    record::{Contact, Encounter, NewContact, NewEncounter},
    stats::{ContactSummary, Overview},
    types::{ContactId, EncounterId},
};

use super::events::StoreEvent;

/// Failure talking to the store task.
#[derive(Debug)]
pub enum RuntimeError {
    /// The store rejected the mutation.
    Store(StoreError),
    /// The task has stopped.
    ChannelClosed,
}

impl From<StoreError> for RuntimeError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "store error: {err}"),
            Self::ChannelClosed => f.write_str("record store task is gone"),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Channel sizing for the store task.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Pending commands before senders wait.
    pub command_queue_bound: usize,
    /// Events buffered per subscriber before it lags.
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 256,
            event_capacity: 1024,
        }
    }
}

/// Cloneable handle to a record store owned by a background task.
#[derive(Clone)]
pub struct StoreHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<StoreEvent>,
}

enum Command {
    AddContact {
        new: NewContact,
        resp: oneshot::Sender<Contact>,
    },
    DeleteContact {
        id: ContactId,
        resp: oneshot::Sender<DeletedContact>,
    },
    AddEncounter {
        new: NewEncounter,
        resp: oneshot::Sender<Result<Encounter, StoreError>>,
    },
    DeleteEncounter {
        id: EncounterId,
        resp: oneshot::Sender<Option<Encounter>>,
    },
    Contacts {
        resp: oneshot::Sender<Vec<Contact>>,
    },
    Encounters {
        resp: oneshot::Sender<Vec<Encounter>>,
    },
    Overview {
        resp: oneshot::Sender<Overview>,
    },
    ContactSummary {
        id: ContactId,
        resp: oneshot::Sender<ContactSummary>,
    },
    EncountersForContact {
        id: ContactId,
        resp: oneshot::Sender<Vec<Encounter>>,
    },
    Shutdown {
        resp: oneshot::Sender<RecordStore>,
    },
}

/// Moves `store` into a background task and returns a handle to it.
pub fn spawn_record_store(store: RecordStore, config: RuntimeConfig) -> StoreHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound.max(1));
    let (events_tx, _) = broadcast::channel::<StoreEvent>(config.event_capacity.max(1));

    let events_tx_loop = events_tx.clone();

    tokio::spawn(async move {
        let mut store = store;

        while let Some(cmd) = cmd_rx.recv().await {
            if let Command::Shutdown { resp } = cmd {
                let _ = resp.send(store);
                return;
            }
            handle_command(cmd, &mut store, &events_tx_loop);
        }
    });

    StoreHandle { cmd_tx, events_tx }
}

impl StoreHandle {
    /// Receives a [`StoreEvent`] after every effective mutation.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events_tx.subscribe()
    }

    /// See [`RecordStore::add_contact`].
    pub async fn add_contact(&self, new: NewContact) -> Result<Contact, RuntimeError> {
        self.request(|resp| Command::AddContact { new, resp }).await
    }

    /// See [`RecordStore::delete_contact`].
    pub async fn delete_contact(&self, id: ContactId) -> Result<DeletedContact, RuntimeError> {
        self.request(|resp| Command::DeleteContact { id, resp }).await
    }

    /// See [`RecordStore::add_encounter`].
    pub async fn add_encounter(&self, new: NewEncounter) -> Result<Encounter, RuntimeError> {
        self.request(|resp| Command::AddEncounter { new, resp })
            .await?
            .map_err(RuntimeError::from)
    }

    /// See [`RecordStore::delete_encounter`].
    pub async fn delete_encounter(
        &self,
        id: EncounterId,
    ) -> Result<Option<Encounter>, RuntimeError> {
        self.request(|resp| Command::DeleteEncounter { id, resp }).await
    }

    /// Current contacts.
    pub async fn contacts(&self) -> Result<Vec<Contact>, RuntimeError> {
        self.request(|resp| Command::Contacts { resp }).await
    }

    /// Current encounters.
    pub async fn encounters(&self) -> Result<Vec<Encounter>, RuntimeError> {
        self.request(|resp| Command::Encounters { resp }).await
    }

    /// Dashboard figures.
    pub async fn overview(&self) -> Result<Overview, RuntimeError> {
        self.request(|resp| Command::Overview { resp }).await
    }

    /// Totals for one contact.
    pub async fn contact_summary(&self, id: ContactId) -> Result<ContactSummary, RuntimeError> {
        self.request(|resp| Command::ContactSummary { id, resp }).await
    }

    /// One contact's encounters, most recent first.
    pub async fn encounters_for_contact(
        &self,
        id: ContactId,
    ) -> Result<Vec<Encounter>, RuntimeError> {
        self.request(|resp| Command::EncountersForContact { id, resp }).await
    }

    /// Stops the task and hands back the store it owned.
    pub async fn shutdown(&self) -> Result<RecordStore, RuntimeError> {
        self.request(|resp| Command::Shutdown { resp }).await
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

fn handle_command(
    cmd: Command,
    store: &mut RecordStore,
    events_tx: &broadcast::Sender<StoreEvent>,
) {
    match cmd {
        Command::AddContact { new, resp } => {
            let contact = store.add_contact(new);
            let _ = events_tx.send(StoreEvent::ContactAdded { id: contact.id });
            let _ = resp.send(contact);
        }
        Command::DeleteContact { id, resp } => {
            let deleted = store.delete_contact(id);
            if !deleted.is_noop() {
                let _ = events_tx.send(StoreEvent::ContactDeleted {
                    id,
                    encounters_removed: deleted.encounters.len(),
                });
            }
            let _ = resp.send(deleted);
        }
        Command::AddEncounter { new, resp } => {
            let res = store.add_encounter(new);
            if let Ok(encounter) = &res {
                let _ = events_tx.send(StoreEvent::EncounterAdded {
                    id: encounter.id,
                    contact_id: encounter.contact_id,
                });
            }
            let _ = resp.send(res);
        }
        Command::DeleteEncounter { id, resp } => {
            let removed = store.delete_encounter(id);
            if removed.is_some() {
                let _ = events_tx.send(StoreEvent::EncounterDeleted { id });
            }
            let _ = resp.send(removed);
        }
        Command::Contacts { resp } => {
            let _ = resp.send(store.contacts().to_vec());
        }
        Command::Encounters { resp } => {
            let _ = resp.send(store.encounters().to_vec());
        }
        Command::Overview { resp } => {
            let _ = resp.send(store.stats().overview());
        }
        Command::ContactSummary { id, resp } => {
            let _ = resp.send(store.stats().contact_summary(id));
        }
        Command::EncountersForContact { id, resp } => {
            let list = store.stats().encounters_for_contact(id).cloned().collect();
            let _ = resp.send(list);
        }
        Command::Shutdown { .. } => {}
    }
}
