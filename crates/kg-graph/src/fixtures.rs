//! Test doubles: a small Middle-earth graph, a call-counting wrapper, a
//! client whose store is always down, and one that never answers.

use crate::{GraphSnapshot, InMemoryGraphClient};
use kg_types::{
    Community, GraphClient, GraphClientError, Neighbor, Node, Path, Relationship,
};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const NODES: &[(&str, &str, &str)] = &[
    ("frodo", "Character", "Frodo"),
    ("sam", "Character", "Sam"),
    ("gandalf", "Character", "Gandalf"),
    ("gandalf_white", "Character", "Gandalf the White"),
    ("bilbo", "Character", "Bilbo"),
    ("sauron", "Character", "Sauron"),
    ("aragorn", "Character", "Aragorn"),
    ("elrond", "Character", "Elrond"),
    ("shire", "Location", "The Shire"),
    ("mordor", "Location", "Mordor"),
    ("mount_doom", "Location", "Mount Doom"),
    ("rivendell", "Location", "Rivendell"),
    ("ring", "Artifact", "Ring of Power"),
];

const RELATIONSHIPS: &[(&str, &str, &str)] = &[
    ("frodo", "CARRIES", "ring"),
    ("bilbo", "FOUND", "ring"),
    ("bilbo", "UNCLE_OF", "frodo"),
    ("sauron", "FORGED", "ring"),
    ("ring", "DESTROYED_AT", "mount_doom"),
    ("mount_doom", "LOCATED_IN", "mordor"),
    ("sauron", "RULES", "mordor"),
    ("frodo", "LIVES_IN", "shire"),
    ("sam", "LIVES_IN", "shire"),
    ("bilbo", "LIVES_IN", "shire"),
    ("sam", "COMPANION_OF", "frodo"),
    ("aragorn", "COMPANION_OF", "frodo"),
    ("gandalf", "MENTOR_OF", "frodo"),
    ("gandalf", "BECAME", "gandalf_white"),
    ("elrond", "LIVES_IN", "rivendell"),
    ("frodo", "VISITED", "rivendell"),
    ("gandalf", "VISITED", "rivendell"),
];

const COMMUNITIES: &[(&str, &str, &[&str])] = &[
    ("c1", "Hobbits of the Shire", &["frodo", "sam", "bilbo", "shire"]),
    ("c2", "The One Ring", &["ring", "frodo", "bilbo", "sauron", "mount_doom"]),
    ("c3", "Mordor", &["sauron", "mordor", "mount_doom"]),
    ("c4", "Fellowship", &["frodo", "sam", "gandalf", "aragorn"]),
    ("c5", "Wizards", &["gandalf", "gandalf_white"]),
    ("c6", "Rivendell", &["elrond", "rivendell", "frodo"]),
];

pub fn middle_earth_snapshot() -> GraphSnapshot {
    GraphSnapshot {
        nodes: NODES
            .iter()
            .map(|(id, label, name)| Node::new(*id, *label).with_property("name", *name))
            .collect(),
        relationships: RELATIONSHIPS
            .iter()
            .map(|(s, t, d)| Relationship::new(*t, *s, *d))
            .collect(),
        communities: COMMUNITIES
            .iter()
            .map(|(id, label, members)| Community {
                id: id.to_string(),
                label: Some(label.to_string()),
                members: members.iter().map(|m| m.to_string()).collect(),
            })
            .collect(),
    }
}

/// The fixture graph, ready to query.
pub fn middle_earth() -> InMemoryGraphClient {
    InMemoryGraphClient::from_snapshot(middle_earth_snapshot())
        .expect("fixture graph references only its own nodes")
}

/// Delegates to an inner client and counts every capability call.
pub struct CountingGraphClient {
    inner: Arc<dyn GraphClient>,
    calls: AtomicUsize,
}

impl CountingGraphClient {
    pub fn new(inner: Arc<dyn GraphClient>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl GraphClient for CountingGraphClient {
    async fn find_nodes_by_name(
        &self,
        names: &[String],
        limit: usize,
    ) -> Result<Vec<Node>, GraphClientError> {
        self.tick();
        self.inner.find_nodes_by_name(names, limit).await
    }

    async fn shortest_paths(
        &self,
        from_id: &str,
        to_id: &str,
        max_hops: usize,
    ) -> Result<Vec<Path>, GraphClientError> {
        self.tick();
        self.inner.shortest_paths(from_id, to_id, max_hops).await
    }

    async fn neighbors(
        &self,
        node_id: &str,
        max_results: usize,
    ) -> Result<Vec<Neighbor>, GraphClientError> {
        self.tick();
        self.inner.neighbors(node_id, max_results).await
    }

    async fn communities_for(
        &self,
        node_ids: &BTreeSet<String>,
    ) -> Result<Vec<Community>, GraphClientError> {
        self.tick();
        self.inner.communities_for(node_ids).await
    }
}

/// Every call hangs; for exercising cancellation.
pub struct StalledGraphClient;

#[async_trait::async_trait]
impl GraphClient for StalledGraphClient {
    async fn find_nodes_by_name(&self, _: &[String], _: usize) -> Result<Vec<Node>, GraphClientError> {
        std::future::pending().await
    }

    async fn shortest_paths(&self, _: &str, _: &str, _: usize) -> Result<Vec<Path>, GraphClientError> {
        std::future::pending().await
    }

    async fn neighbors(&self, _: &str, _: usize) -> Result<Vec<Neighbor>, GraphClientError> {
        std::future::pending().await
    }

    async fn communities_for(&self, _: &BTreeSet<String>) -> Result<Vec<Community>, GraphClientError> {
        std::future::pending().await
    }
}

/// Every call fails with `Unavailable`.
pub struct UnavailableGraphClient;

fn down() -> GraphClientError {
    GraphClientError::Unavailable("connection refused".to_string())
}

#[async_trait::async_trait]
impl GraphClient for UnavailableGraphClient {
    async fn find_nodes_by_name(&self, _: &[String], _: usize) -> Result<Vec<Node>, GraphClientError> {
        Err(down())
    }

    async fn shortest_paths(&self, _: &str, _: &str, _: usize) -> Result<Vec<Path>, GraphClientError> {
        Err(down())
    }

    async fn neighbors(&self, _: &str, _: usize) -> Result<Vec<Neighbor>, GraphClientError> {
        Err(down())
    }

    async fn communities_for(&self, _: &BTreeSet<String>) -> Result<Vec<Community>, GraphClientError> {
        Err(down())
    }
}
