//! Placement of visible nodes that have no explicit position.
//!
//! Children are laid out on a ring around their parent. The ring is large
//! enough to hold every child side by side (sum of diameters plus one
//! `spacing` per child) and never closer to the parent than
//! `parent_radius + spacing + largest_child_radius`. Child `i` of `k` sits at
//! angle `2π·i/k`, so the result only depends on the visible set, the
//! explicit positions and the measured footprints.

use std::collections::{HashMap, VecDeque};
use std::f64::consts::TAU;

use log::debug;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::config::{FlowConfig, LayoutStrategy};
use super::measure::Measure;
use super::model::GraphModel;
use super::positions::PositionStore;
use super::types::{NodeId, Point, Rect};
use super::visibility::VisibilityStore;

/// Attempts per node before the scattered strategy accepts an overlap.
const SCATTER_ATTEMPTS: usize = 20;

/// Output of one layout pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutPass {
	/// Computed coordinates, parents before children.
	pub computed: Vec<(NodeId, Point)>,
	/// Visible nodes that could not be measured yet.
	pub deferred: Vec<NodeId>,
}

/// Ring geometry of one child group.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ring {
	pub radius: f64,
	pub max_child_diameter: f64,
	pub total_diameter: f64,
	pub spacing: f64,
}

/// Ring radius for `count` children with the given diameters around a
/// parent of `parent_diameter`.
pub fn ring(parent_diameter: f64, child_diameters: &[f64], count: usize, spacing: f64) -> Ring {
	let max_child_diameter = child_diameters.iter().copied().fold(0.0, f64::max);
	let total_diameter: f64 = child_diameters.iter().sum();
	let min_circumference = TAU * (parent_diameter / 2.0 + spacing + max_child_diameter / 2.0);
	let circumference = (total_diameter + spacing * count as f64).max(min_circumference);
	Ring {
		radius: circumference / TAU,
		max_child_diameter,
		total_diameter,
		spacing,
	}
}

/// Offset of child `index` of `count` on a ring of `radius`.
pub fn ring_offset(radius: f64, index: usize, count: usize) -> Point {
	let angle = TAU / count as f64 * index as f64;
	Point::new(radius * angle.cos(), radius * angle.sin())
}

#[derive(Clone, Debug)]
pub struct LayoutEngine {
	spacing: f64,
	branch_spacing_factor: f64,
	strategy: LayoutStrategy,
}

impl LayoutEngine {
	pub fn new(config: &FlowConfig) -> Self {
		Self {
			spacing: config.spacing.max(0.0),
			branch_spacing_factor: config.branch_spacing_factor.max(1.0),
			strategy: config.layout_strategy,
		}
	}

	pub fn strategy(&self) -> LayoutStrategy {
		self.strategy
	}

	/// Spacing for a child group; groups holding branches get more room.
	pub fn group_spacing(&self, model: &GraphModel, group: &[&NodeId]) -> f64 {
		if group.iter().any(|id| model.has_children(id)) {
			self.spacing * self.branch_spacing_factor
		} else {
			self.spacing
		}
	}

	/// Computes positions for every visible node reachable from the root
	/// through visible parents. `anchor` is where a non-explicit root goes.
	pub fn run(
		&self,
		model: &GraphModel,
		visibility: &VisibilityStore,
		positions: &PositionStore,
		measure: &dyn Measure,
		anchor: Point,
	) -> LayoutPass {
		let mut pass = LayoutPass::default();
		let Some(root) = model.root() else {
			return pass;
		};
		if !visibility.is_visible(root) {
			return pass;
		}

		let mut rng = match self.strategy {
			LayoutStrategy::Scattered { seed } => Some(SmallRng::seed_from_u64(seed)),
			LayoutStrategy::Radial => None,
		};

		let mut placed: HashMap<&str, Point> = HashMap::new();
		let root_point = match positions.record(root) {
			Some(record) if record.explicit => record.point(),
			_ => {
				pass.computed.push((root.to_string(), anchor));
				anchor
			}
		};
		placed.insert(root, root_point);

		let mut queue: VecDeque<&str> = VecDeque::from([root]);
		while let Some(parent) = queue.pop_front() {
			let Some(&origin) = placed.get(parent) else {
				continue;
			};
			let group: Vec<&NodeId> = model
				.children(parent)
				.iter()
				.filter(|child| visibility.is_visible(child))
				.collect();
			if group.is_empty() {
				continue;
			}

			let parent_box = measure.measure(parent);
			let spacing = self.group_spacing(model, &group);
			let slots = match rng.as_mut() {
				Some(rng) => self.scatter_group(origin, parent_box, &group, positions, measure, spacing, rng),
				None => self.radial_group(origin, parent_box, &group, positions, measure, spacing),
			};

			for (child, slot) in group.iter().copied().zip(slots) {
				match slot {
					Slot::Explicit(point) => {
						placed.insert(child.as_str(), point);
						queue.push_back(child.as_str());
					}
					Slot::Computed(point) => {
						pass.computed.push((child.clone(), point));
						placed.insert(child.as_str(), point);
						queue.push_back(child.as_str());
					}
					Slot::Deferred => pass.deferred.push(child.clone()),
				}
			}
		}

		if !pass.deferred.is_empty() {
			debug!("layout deferred {} unmeasured node(s)", pass.deferred.len());
		}
		pass
	}

	fn radial_group(
		&self,
		origin: Point,
		parent_box: Rect,
		group: &[&NodeId],
		positions: &PositionStore,
		measure: &dyn Measure,
		spacing: f64,
	) -> Vec<Slot> {
		let boxes = measure_group(group, positions, measure);
		let diameters: Vec<f64> = boxes
			.iter()
			.filter_map(|slot| match slot {
				GroupBox::Measured(rect) => Some(rect.diameter()),
				_ => None,
			})
			.collect();
		let ring = ring(parent_box.diameter(), &diameters, group.len(), spacing);

		boxes
			.iter()
			.enumerate()
			.map(|(index, slot)| match slot {
				GroupBox::Explicit(point) => Slot::Explicit(*point),
				GroupBox::Unmeasured => Slot::Deferred,
				GroupBox::Measured(_) if parent_box.is_empty() => Slot::Deferred,
				GroupBox::Measured(_) => {
					Slot::Computed(origin + ring_offset(ring.radius, index, group.len()))
				}
			})
			.collect()
	}

	#[allow(clippy::too_many_arguments)]
	fn scatter_group(
		&self,
		origin: Point,
		parent_box: Rect,
		group: &[&NodeId],
		positions: &PositionStore,
		measure: &dyn Measure,
		spacing: f64,
		rng: &mut SmallRng,
	) -> Vec<Slot> {
		let boxes = measure_group(group, positions, measure);
		let mut taken: Vec<(Point, f64)> = boxes
			.iter()
			.zip(group)
			.filter_map(|(slot, id)| match slot {
				GroupBox::Explicit(point) => Some((*point, measure.measure(id).width)),
				_ => None,
			})
			.collect();

		boxes
			.iter()
			.map(|slot| match slot {
				GroupBox::Explicit(point) => Slot::Explicit(*point),
				GroupBox::Unmeasured => Slot::Deferred,
				GroupBox::Measured(_) if parent_box.is_empty() => Slot::Deferred,
				GroupBox::Measured(rect) => {
					let radius = parent_box.width / 2.0 + rect.width / 2.0 + spacing;
					let mut candidate = origin;
					for _ in 0..SCATTER_ATTEMPTS {
						let angle = rng.gen_range(0.0..TAU);
						candidate = origin + Point::new(radius * angle.cos(), radius * angle.sin());
						let collides = taken.iter().any(|(other, width)| {
							candidate.distance(*other) <= width / 2.0 + rect.width / 2.0
						});
						if !collides {
							break;
						}
					}
					taken.push((candidate, rect.width));
					Slot::Computed(candidate)
				}
			})
			.collect()
	}
}

enum GroupBox {
	Explicit(Point),
	Measured(Rect),
	Unmeasured,
}

enum Slot {
	Explicit(Point),
	Computed(Point),
	Deferred,
}

fn measure_group(group: &[&NodeId], positions: &PositionStore, measure: &dyn Measure) -> Vec<GroupBox> {
	group
		.iter()
		.map(|id| match positions.record(id) {
			Some(record) if record.explicit => GroupBox::Explicit(record.point()),
			_ => {
				let rect = measure.measure(id);
				if rect.is_empty() {
					GroupBox::Unmeasured
				} else {
					GroupBox::Measured(rect)
				}
			}
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::flow_graph::config::ChildStatusPolicy;
	use crate::components::flow_graph::types::FlowNode;

	fn square(size: f64) -> impl Fn(&str) -> Rect {
		move |_: &str| Rect::centered(Point::ZERO, size, size)
	}

	fn setup(nodes: Vec<FlowNode>) -> (GraphModel, VisibilityStore) {
		let model = GraphModel::build(nodes, ChildStatusPolicy::FirstInOrder).unwrap();
		let mut visibility = VisibilityStore::default();
		visibility.reset(&model);
		(model, visibility)
	}

	fn lookup(pass: &LayoutPass, id: &str) -> Point {
		pass.computed
			.iter()
			.find(|(node, _)| node == id)
			.map(|(_, point)| *point)
			.unwrap()
	}

	#[test]
	fn ring_respects_minimum_radius() {
		let ring = ring(100.0, &[50.0, 50.0], 2, 25.0);
		assert!((ring.radius - (50.0 + 25.0 + 25.0)).abs() < 1e-9);
		assert_eq!(ring.max_child_diameter, 50.0);

		let crowded = ring_radius_for(20);
		assert!(crowded > 100.0);
	}

	fn ring_radius_for(count: usize) -> f64 {
		ring(10.0, &vec![40.0; count], count, 10.0).radius
	}

	#[test]
	fn root_sits_on_anchor_and_children_on_the_ring() {
		let (model, visibility) = setup(vec![
			FlowNode::root("r", 100.0),
			FlowNode::child("a", "r", 50.0),
			FlowNode::child("b", "r", 50.0),
		]);
		let engine = LayoutEngine::new(&FlowConfig::default());
		let measure = square(60.0);
		let anchor = Point::new(400.0, 300.0);
		let pass = engine.run(&model, &visibility, &PositionStore::default(), &measure, anchor);

		let expected = ring(60.0, &[60.0, 60.0], 2, 25.0).radius;
		assert_eq!(lookup(&pass, "r"), anchor);
		let a = lookup(&pass, "a");
		let b = lookup(&pass, "b");
		assert!((a.x - (400.0 + expected)).abs() < 1e-9);
		assert!((a.y - 300.0).abs() < 1e-9);
		assert!((b.x - (400.0 - expected)).abs() < 1e-9);
		assert!((b.y - 300.0).abs() < 1e-9);
		assert!(pass.deferred.is_empty());
	}

	#[test]
	fn explicit_children_keep_their_slot_and_coordinate() {
		let (model, visibility) = setup(vec![
			FlowNode::root("r", 10.0),
			FlowNode::child("a", "r", 10.0),
			FlowNode::child("b", "r", 10.0),
			FlowNode::child("c", "r", 10.0),
			FlowNode::child("d", "r", 10.0),
		]);
		let mut positions = PositionStore::default();
		positions.commit_explicit(&model, "a", Point::new(-5.0, -5.0)).unwrap();
		let engine = LayoutEngine::new(&FlowConfig::default());
		let pass = engine.run(&model, &visibility, &positions, &square(20.0), Point::ZERO);

		assert!(pass.computed.iter().all(|(id, _)| id != "a"));
		let b = lookup(&pass, "b");
		assert!(b.x.abs() < 1e-9 && b.y > 0.0, "b keeps the quarter-turn slot: {b:?}");
	}

	#[test]
	fn branch_groups_get_wider_spacing() {
		let (model, _) = setup(vec![
			FlowNode::root("r", 10.0),
			FlowNode::child("a", "r", 10.0),
			FlowNode::child("a1", "a", 10.0),
			FlowNode::child("b", "r", 10.0),
		]);
		let engine = LayoutEngine::new(&FlowConfig::default());
		let (a, b) = (&"a".to_string(), &"b".to_string());
		assert_eq!(engine.group_spacing(&model, &[a, b]), 100.0);
		assert_eq!(engine.group_spacing(&model, &[b]), 25.0);
	}

	#[test]
	fn unmeasured_nodes_are_deferred_with_their_subtree() {
		let (model, mut visibility) = setup(vec![
			FlowNode::root("r", 10.0),
			FlowNode::child("a", "r", 10.0),
			FlowNode::child("a1", "a", 10.0),
			FlowNode::child("b", "r", 10.0),
		]);
		visibility.toggle(&model, "a").unwrap();
		let measure = |id: &str| {
			if id == "a" {
				Rect::default()
			} else {
				Rect::centered(Point::ZERO, 10.0, 10.0)
			}
		};
		let engine = LayoutEngine::new(&FlowConfig::default());
		let pass = engine.run(&model, &visibility, &PositionStore::default(), &measure, Point::ZERO);

		assert_eq!(pass.deferred, vec!["a"]);
		assert!(pass.computed.iter().all(|(id, _)| id != "a1"));
		assert!(pass.computed.iter().any(|(id, _)| id == "b"));
	}

	#[test]
	fn hidden_nodes_are_not_laid_out() {
		let (model, visibility) = setup(vec![
			FlowNode::root("r", 10.0),
			FlowNode::child("a", "r", 10.0),
			FlowNode::child("a1", "a", 10.0),
		]);
		let engine = LayoutEngine::new(&FlowConfig::default());
		let pass = engine.run(&model, &visibility, &PositionStore::default(), &square(10.0), Point::ZERO);
		assert_eq!(pass.computed.len(), 2);
	}

	#[test]
	fn scattered_strategy_is_stable_for_a_seed() {
		let (model, visibility) = setup(vec![
			FlowNode::root("r", 10.0),
			FlowNode::child("a", "r", 10.0),
			FlowNode::child("b", "r", 10.0),
			FlowNode::child("c", "r", 10.0),
		]);
		let config = FlowConfig {
			layout_strategy: LayoutStrategy::Scattered { seed: 7 },
			..FlowConfig::default()
		};
		let engine = LayoutEngine::new(&config);
		let positions = PositionStore::default();
		let first = engine.run(&model, &visibility, &positions, &square(20.0), Point::ZERO);
		let second = engine.run(&model, &visibility, &positions, &square(20.0), Point::ZERO);

		assert_eq!(first, second);
		let a = lookup(&first, "a");
		assert!((a.distance(Point::ZERO) - (10.0 + 10.0 + 25.0)).abs() < 1e-9);
	}
}
