use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::error::{FlowError, Result};
use super::model::GraphModel;
use super::types::{NodeId, Point};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
	pub x: f64,
	pub y: f64,
	/// Set once the user dragged the node; layout never touches it again.
	pub explicit: bool,
}

impl PositionRecord {
	pub fn point(&self) -> Point {
		Point::new(self.x, self.y)
	}
}

/// Authoritative node coordinates in model space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionStore {
	records: HashMap<NodeId, PositionRecord>,
}

impl PositionStore {
	pub fn get_position(&self, id: &str) -> Option<Point> {
		self.records.get(id).map(PositionRecord::point)
	}

	pub fn record(&self, id: &str) -> Option<&PositionRecord> {
		self.records.get(id)
	}

	pub fn is_explicit(&self, id: &str) -> bool {
		self.records.get(id).is_some_and(|record| record.explicit)
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	/// Writes a layout batch; explicit records are skipped.
	///
	/// Returns how many records were created or moved.
	pub fn merge_computed<I>(&mut self, batch: I) -> usize
	where
		I: IntoIterator<Item = (NodeId, Point)>,
	{
		let mut updated = 0;
		for (id, point) in batch {
			let record = self.records.entry(id).or_insert(PositionRecord {
				x: f64::NAN,
				y: f64::NAN,
				explicit: false,
			});
			if record.explicit {
				continue;
			}
			if record.x != point.x || record.y != point.y {
				record.x = point.x;
				record.y = point.y;
				updated += 1;
			}
		}
		updated
	}

	/// Pins a node at a user-chosen coordinate.
	pub fn commit_explicit(&mut self, model: &GraphModel, id: &str, point: Point) -> Result<()> {
		if !model.contains(id) {
			return Err(FlowError::NodeNotInModel(id.to_string()));
		}
		self.records.insert(
			id.to_string(),
			PositionRecord {
				x: point.x,
				y: point.y,
				explicit: true,
			},
		);
		Ok(())
	}

	/// Drops records of nodes absent from `model`, returning their ids.
	pub fn retain_in(&mut self, model: &GraphModel) -> Vec<NodeId> {
		let mut pruned: Vec<NodeId> = self
			.records
			.keys()
			.filter(|id| !model.contains(id))
			.cloned()
			.collect();
		pruned.sort();
		for id in &pruned {
			self.records.remove(id);
		}
		pruned
	}

	pub fn clear(&mut self) {
		self.records.clear();
	}

	pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &PositionRecord)> {
		self.records.iter()
	}

	/// Ordered copy of all records, for serialization.
	pub fn to_sorted(&self) -> BTreeMap<NodeId, PositionRecord> {
		self.records
			.iter()
			.map(|(id, record)| (id.clone(), *record))
			.collect()
	}

	pub fn restore<I>(&mut self, records: I)
	where
		I: IntoIterator<Item = (NodeId, PositionRecord)>,
	{
		self.records = records
			.into_iter()
			.filter(|(_, record)| record.x.is_finite() && record.y.is_finite())
			.collect();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::flow_graph::config::ChildStatusPolicy;
	use crate::components::flow_graph::types::FlowNode;

	fn model() -> GraphModel {
		GraphModel::build(
			vec![FlowNode::root("r", 1.0), FlowNode::child("a", "r", 1.0)],
			ChildStatusPolicy::FirstInOrder,
		)
		.unwrap()
	}

	#[test]
	fn computed_batches_never_override_explicit_records() {
		let model = model();
		let mut store = PositionStore::default();
		store.commit_explicit(&model, "a", Point::new(5.0, 5.0)).unwrap();

		let updated = store.merge_computed([
			("r".to_string(), Point::new(1.0, 1.0)),
			("a".to_string(), Point::new(9.0, 9.0)),
		]);

		assert_eq!(updated, 1);
		assert_eq!(store.get_position("a"), Some(Point::new(5.0, 5.0)));
		assert!(store.is_explicit("a"));
		assert!(!store.is_explicit("r"));
	}

	#[test]
	fn unchanged_batch_reports_no_updates() {
		let mut store = PositionStore::default();
		let batch = [("r".to_string(), Point::new(1.0, 2.0))];
		assert_eq!(store.merge_computed(batch.clone()), 1);
		assert_eq!(store.merge_computed(batch), 0);
	}

	#[test]
	fn commit_requires_a_known_node() {
		let model = model();
		let mut store = PositionStore::default();
		assert!(matches!(
			store.commit_explicit(&model, "ghost", Point::ZERO),
			Err(FlowError::NodeNotInModel(_))
		));
	}

	#[test]
	fn retain_prunes_removed_nodes() {
		let model = model();
		let mut store = PositionStore::default();
		store.merge_computed([
			("r".to_string(), Point::ZERO),
			("gone".to_string(), Point::ZERO),
		]);
		assert_eq!(store.retain_in(&model), vec!["gone"]);
		assert_eq!(store.len(), 1);
	}
}
