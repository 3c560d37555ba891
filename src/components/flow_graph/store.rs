//! Per-instance store: model, visibility, positions and viewport, mutated
//! through one owner only.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::Result;
use super::layout::LayoutPass;
use super::model::GraphModel;
use super::positions::{PositionRecord, PositionStore};
use super::types::{NodeId, Point};
use super::viewport::ViewportState;
use super::visibility::{VisibilityChange, VisibilityStore};

/// Persistable part of the store. Gesture state is never part of it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowSnapshot {
	pub visibility: Vec<NodeId>,
	pub positions: BTreeMap<NodeId, PositionRecord>,
	pub viewport: ViewportState,
}

impl FlowSnapshot {
	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string(self)?)
	}

	pub fn from_json(json: &str) -> Result<Self> {
		Ok(serde_json::from_str(json)?)
	}
}

/// What a model replacement did to the other stores.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReplaceOutcome {
	pub visibility: VisibilityChange,
	pub pruned_positions: Vec<NodeId>,
}

#[derive(Clone, Debug, Default)]
pub struct FlowStore {
	model: GraphModel,
	visibility: VisibilityStore,
	positions: PositionStore,
	viewport: ViewportState,
}

impl FlowStore {
	pub fn new(viewport: ViewportState) -> Self {
		Self {
			viewport,
			..Self::default()
		}
	}

	pub fn model(&self) -> &GraphModel {
		&self.model
	}

	pub fn visibility(&self) -> &VisibilityStore {
		&self.visibility
	}

	pub fn positions(&self) -> &PositionStore {
		&self.positions
	}

	pub fn viewport(&self) -> &ViewportState {
		&self.viewport
	}

	pub fn viewport_mut(&mut self) -> &mut ViewportState {
		&mut self.viewport
	}

	pub fn replace_model(&mut self, model: GraphModel) -> ReplaceOutcome {
		let visibility = self.visibility.reconcile(&self.model, &model);
		let pruned_positions = self.positions.retain_in(&model);
		self.model = model;
		ReplaceOutcome {
			visibility,
			pruned_positions,
		}
	}

	pub fn toggle(&mut self, id: &str) -> Result<VisibilityChange> {
		self.visibility.toggle(&self.model, id)
	}

	/// Merges computed coordinates; returns how many records moved.
	pub fn apply_layout(&mut self, pass: &LayoutPass) -> usize {
		self.positions.merge_computed(pass.computed.iter().cloned())
	}

	pub fn commit_position(&mut self, id: &str, point: Point) -> Result<()> {
		self.positions.commit_explicit(&self.model, id, point)
	}

	/// Back to the initial disclosure; all positions are forgotten.
	pub fn hard_reset(&mut self) -> VisibilityChange {
		self.positions.clear();
		self.visibility.reset(&self.model)
	}

	pub fn snapshot(&self) -> FlowSnapshot {
		FlowSnapshot {
			visibility: self.visibility.sorted_ids(),
			positions: self.positions.to_sorted(),
			viewport: self.viewport,
		}
	}

	/// Loads a snapshot, then re-applies the visibility invariants and
	/// drops positions of unknown nodes if a model is already present.
	pub fn restore(&mut self, snapshot: FlowSnapshot) {
		self.visibility.restore(snapshot.visibility);
		self.positions.restore(snapshot.positions);
		self.viewport.adopt(&snapshot.viewport);
		if !self.model.is_empty() {
			self.visibility.reconcile(&GraphModel::default(), &self.model);
			self.positions.retain_in(&self.model);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::flow_graph::config::ChildStatusPolicy;
	use crate::components::flow_graph::types::FlowNode;

	fn model(nodes: Vec<FlowNode>) -> GraphModel {
		GraphModel::build(nodes, ChildStatusPolicy::FirstInOrder).unwrap()
	}

	#[test]
	fn replace_prunes_removed_nodes_everywhere() {
		let mut store = FlowStore::default();
		store.replace_model(model(vec![
			FlowNode::root("r", 1.0),
			FlowNode::child("a", "r", 1.0),
			FlowNode::child("b", "r", 1.0),
		]));
		store.commit_position("b", Point::new(3.0, 4.0)).unwrap();

		let outcome = store.replace_model(model(vec![
			FlowNode::root("r", 1.0),
			FlowNode::child("a", "r", 1.0),
		]));

		assert_eq!(outcome.pruned_positions, vec!["b"]);
		assert_eq!(outcome.visibility.removed, vec!["b"]);
		assert!(store.positions().get_position("b").is_none());
		assert!(!store.visibility().is_visible("b"));
	}

	#[test]
	fn snapshot_round_trips_through_json() {
		let mut store = FlowStore::new(ViewportState::new(800.0, 600.0));
		store.replace_model(model(vec![
			FlowNode::root("r", 1.0),
			FlowNode::child("a", "r", 1.0),
		]));
		store.commit_position("a", Point::new(10.0, 20.0)).unwrap();
		store.viewport_mut().zoom_level = 1.4;

		let json = store.snapshot().to_json().unwrap();
		let mut restored = FlowStore::new(ViewportState::new(1024.0, 768.0));
		restored.restore(FlowSnapshot::from_json(&json).unwrap());

		assert_eq!(restored.viewport().zoom_level, 1.4);
		assert_eq!(restored.viewport().width, 1024.0);
		assert!(restored.positions().is_explicit("a"));
		assert!(restored.visibility().is_visible("r"));
	}

	#[test]
	fn hard_reset_forgets_explicit_positions() {
		let mut store = FlowStore::default();
		store.replace_model(model(vec![
			FlowNode::root("r", 1.0),
			FlowNode::child("a", "r", 1.0),
			FlowNode::child("a1", "a", 1.0),
		]));
		store.toggle("a").unwrap();
		store.commit_position("a", Point::ZERO).unwrap();

		let change = store.hard_reset();
		assert_eq!(change.hidden, vec!["a1"]);
		assert!(store.positions().is_empty());
	}

	#[test]
	fn malformed_snapshot_is_an_error() {
		assert!(FlowSnapshot::from_json("{not json").is_err());
		assert_eq!(FlowSnapshot::from_json("{}").unwrap(), FlowSnapshot::default());
	}
}
