//! Per-conversation accumulator threaded through every envelope.
//!
//! Decisions and constraints are append-only logs. There is no API that edits
//! or removes an entry once recorded; reconciling parallel branches goes
//! through [`SharedContext::merge`].

use a2a_rt_core::ids::{AgentId, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One reasoning step recorded by an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub agent_id: AgentId,
    pub decision: String,
    pub confidence: f64,
    pub reasoning: String,
    pub timestamp: DateTime<Utc>,
}

impl Decision {
    pub fn new(
        agent_id: AgentId,
        decision: impl Into<String>,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            agent_id,
            decision: decision.into(),
            confidence,
            reasoning: reasoning.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintType {
    Budget,
    Compliance,
    Preference,
    Technical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    #[serde(rename = "type")]
    pub constraint_type: ConstraintType,
    pub name: String,
    pub value: Value,
    pub source: String,
}

impl Constraint {
    pub fn new(
        constraint_type: ConstraintType,
        name: impl Into<String>,
        value: Value,
        source: impl Into<String>,
    ) -> Self {
        Self {
            constraint_type,
            name: name.into(),
            value,
            source: source.into(),
        }
    }
}

/// What a [`SharedContext::merge`] brought in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub decisions_added: usize,
    pub constraints_added: usize,
    pub facts_added: usize,
    /// Keys present on both sides with different values; the receiver's value is kept.
    pub conflicting_facts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedContext {
    pub session_id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default)]
    accumulated_facts: BTreeMap<String, Value>,
    #[serde(default)]
    decisions: Vec<Decision>,
    #[serde(default)]
    constraints: Vec<Constraint>,
    #[serde(default)]
    pub pii_masked: bool,
}

impl SharedContext {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            customer_id: None,
            accumulated_facts: BTreeMap::new(),
            decisions: Vec::new(),
            constraints: Vec::new(),
            pii_masked: false,
        }
    }

    /// Empty context for a freshly minted session.
    pub fn new_session() -> Self {
        Self::new(SessionId::generate())
    }

    pub fn with_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    pub fn record_decision(&mut self, decision: Decision) {
        self.decisions.push(decision);
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Add a constraint. Earlier constraints with the same name are kept.
    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn constraints_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Constraint> {
        self.constraints.iter().filter(move |c| c.name == name)
    }

    /// The most recently added constraint with this name.
    pub fn effective_constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().rev().find(|c| c.name == name)
    }

    pub fn facts(&self) -> &BTreeMap<String, Value> {
        &self.accumulated_facts
    }

    pub fn fact(&self, key: &str) -> Option<&Value> {
        self.accumulated_facts.get(key)
    }

    /// Set a fact, returning the value it replaced.
    pub fn set_fact(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.accumulated_facts.insert(key.into(), value)
    }

    /// Fold a parallel branch of this conversation back into `self`.
    ///
    /// Entries the receiver already holds are skipped, so branches cloned from
    /// a common parent only contribute what they appended. New decisions land
    /// after the existing log, ordered by timestamp.
    pub fn merge(&mut self, branch: SharedContext) -> MergeReport {
        let mut report = MergeReport::default();

        let mut incoming: Vec<Decision> = branch
            .decisions
            .into_iter()
            .filter(|decision| !self.decisions.contains(decision))
            .collect();
        incoming.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        for decision in incoming {
            if !self.decisions.contains(&decision) {
                self.decisions.push(decision);
                report.decisions_added += 1;
            }
        }

        for constraint in branch.constraints {
            if !self.constraints.contains(&constraint) {
                self.constraints.push(constraint);
                report.constraints_added += 1;
            }
        }

        for (key, value) in branch.accumulated_facts {
            match self.accumulated_facts.get(&key) {
                None => {
                    self.accumulated_facts.insert(key, value);
                    report.facts_added += 1;
                }
                Some(existing) if *existing != value => report.conflicting_facts.push(key),
                Some(_) => {}
            }
        }

        if self.customer_id.is_none() {
            self.customer_id = branch.customer_id;
        }
        self.pii_masked |= branch.pii_masked;

        report
    }
}
