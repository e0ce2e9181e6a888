// src/ledger/network.rs
//! In-process party directory and session router.
//!
//! Opening a session spawns the peer's [`SessionHandler`] on its own tokio
//! task with the responder end of a fresh [`Session`].

use crate::error::{FlowError, FlowResult};
use crate::ledger::session::Session;
use crate::ledger::{Network, SessionHandler};
use crate::models::party::Party;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

struct Registration {
    party: Party,
    handler: Option<Arc<dyn SessionHandler>>,
}

pub struct InMemoryNetwork {
    session_timeout: Duration,
    directory: RwLock<HashMap<String, Registration>>,
    responders: Mutex<Vec<JoinHandle<FlowResult<()>>>>,
}

impl InMemoryNetwork {
    pub fn new(session_timeout: Duration) -> Self {
        Self {
            session_timeout,
            directory: RwLock::new(HashMap::new()),
            responders: Mutex::new(Vec::new()),
        }
    }

    /// Registers a party; `handler` serves the sessions other parties open to it.
    pub async fn register(&self, party: Party, handler: Option<Arc<dyn SessionHandler>>) {
        let name = party.name.clone();
        self.directory.write().await.insert(name, Registration { party, handler });
    }

    /// Waits for the tracked responders and returns their results.
    ///
    /// Responders that had already finished when a later session opened are
    /// no longer tracked; their failures were logged when they ended.
    pub async fn settle(&self) -> Vec<FlowResult<()>> {
        let handles: Vec<_> = self.responders.lock().await.drain(..).collect();
        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(match handle.await {
                Ok(result) => result,
                Err(e) => Err(FlowError::SessionFailure(format!("responder task failed: {}", e))),
            });
        }
        results
    }
}

#[async_trait]
impl Network for InMemoryNetwork {
    async fn resolve_party(&self, name: &str) -> FlowResult<Party> {
        self.directory
            .read()
            .await
            .get(name)
            .map(|r| r.party.clone())
            .ok_or_else(|| FlowError::UnknownParty(name.to_string()))
    }

    async fn open_session(&self, initiator: &Party, peer: &Party) -> FlowResult<Session> {
        let handler = {
            let directory = self.directory.read().await;
            let registration = directory
                .get(&peer.name)
                .filter(|r| &r.party == peer)
                .ok_or_else(|| FlowError::UnknownParty(peer.name.clone()))?;
            registration
                .handler
                .clone()
                .ok_or_else(|| FlowError::SessionFailure(format!("{} does not accept sessions", peer)))?
        };

        let (initiator_end, responder_end) =
            Session::pair(initiator.clone(), peer.clone(), self.session_timeout);
        let peer_name = peer.name.clone();
        let handle = tokio::spawn(async move {
            let result = handler.on_session(responder_end).await;
            if let Err(e) = &result {
                log::warn!("responder {} aborted ({}): {}", peer_name, e.kind(), e);
            }
            result
        });
        let mut responders = self.responders.lock().await;
        responders.retain(|h| !h.is_finished());
        responders.push(handle);
        Ok(initiator_end)
    }
}
