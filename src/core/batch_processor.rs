//! Batch processing with account-disjoint partitioning
//!
//! This module provides the `BatchProcessor`, which applies a batch of
//! commands concurrently while producing the same final balances as applying
//! them one by one in file order.
//!
//! # Design
//!
//! A batch is split into groups such that no two groups mention the same
//! identity, either as issuer or as transfer counterparty. Identities are
//! merged with a union-find: a transfer joins the sender's and the receiver's
//! groups. Commands in different groups then touch disjoint accounts and
//! commute; commands inside one group are applied in their original order.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     └── Arc<LedgerEngine>  (shared, every operation takes &self)
//! ```
//!
//! Batches themselves are applied one after another by the caller, so an
//! identity whose commands span several batches still sees them in order.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, warn};

use crate::core::engine::LedgerEngine;
use crate::core::traits::Ledger;
use crate::types::{Identity, LedgerCommand, LedgerError, Outcome};

/// Result of applying a single command
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The command that was applied
    pub command: LedgerCommand,

    /// What the ledger answered
    pub result: Result<Outcome, LedgerError>,
}

/// Batch processor with identity-based partitioning
///
/// Cheap to clone; clones share the same engine.
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    engine: Arc<LedgerEngine>,
}

impl BatchProcessor {
    pub fn new(engine: Arc<LedgerEngine>) -> Self {
        Self { engine }
    }

    /// Partition a batch into groups with disjoint identity sets
    ///
    /// # Guarantees
    ///
    /// - Each command appears in exactly one group
    /// - Commands sharing an identity (directly or through a chain of
    ///   transfers) land in the same group
    /// - Commands keep their original relative order inside a group
    /// - Groups are returned in order of their first command
    pub fn partition(&self, batch: Vec<LedgerCommand>) -> Vec<Vec<LedgerCommand>> {
        let roots: Vec<usize> = {
            let mut groups = IdentityGroups::default();
            let issuers: Vec<usize> = batch
                .iter()
                .map(|command| {
                    let issuer = groups.index_of(command.identity());
                    if let Some(counterparty) = command.counterparty() {
                        let other = groups.index_of(counterparty);
                        groups.union(issuer, other);
                    }
                    issuer
                })
                .collect();
            issuers.into_iter().map(|issuer| groups.find(issuer)).collect()
        };

        let mut slots: HashMap<usize, usize> = HashMap::new();
        let mut partitions: Vec<Vec<LedgerCommand>> = Vec::new();
        for (command, root) in batch.into_iter().zip(roots) {
            let slot = *slots.entry(root).or_insert_with(|| {
                partitions.push(Vec::new());
                partitions.len() - 1
            });
            partitions[slot].push(command);
        }

        partitions
    }

    /// Apply one group's commands in order
    ///
    /// Rejections are logged and recorded; they never stop the group.
    pub async fn process_group(&self, commands: Vec<LedgerCommand>) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(commands.len());

        for command in commands {
            let result = self.engine.execute(&command);
            if let Err(e) = &result {
                warn!(
                    operation = command.operation(),
                    identity = %command.identity(),
                    error = %e,
                    "command rejected"
                );
            }
            results.push(ProcessingResult { command, result });
        }

        results
    }

    /// Apply a batch, running account-disjoint groups concurrently
    ///
    /// Each group is spawned on its own tokio task. Results come back grouped,
    /// not in input order.
    pub async fn process_batch(&self, batch: Vec<LedgerCommand>) -> Vec<ProcessingResult> {
        let mut tasks = Vec::new();
        for group in self.partition(batch) {
            let processor = self.clone();
            tasks.push(tokio::spawn(
                async move { processor.process_group(group).await },
            ));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(group_results) => results.extend(group_results),
                Err(e) => error!(error = %e, "batch task failed"),
            }
        }

        results
    }
}

/// Union-find over the identities of one batch
#[derive(Default)]
struct IdentityGroups<'a> {
    indices: HashMap<&'a Identity, usize>,
    parent: Vec<usize>,
}

impl<'a> IdentityGroups<'a> {
    fn index_of(&mut self, identity: &'a Identity) -> usize {
        let next = self.parent.len();
        let index = *self.indices.entry(identity).or_insert(next);
        if index == next {
            self.parent.push(next);
        }
        index
    }

    fn find(&mut self, mut index: usize) -> usize {
        while self.parent[index] != index {
            self.parent[index] = self.parent[self.parent[index]];
            index = self.parent[index];
        }
        index
    }

    fn union(&mut self, a: usize, b: usize) {
        let (a, b) = (self.find(a), self.find(b));
        if a != b {
            self.parent[b.max(a)] = a.min(b);
        }
    }
}
