//! Expand/collapse state of the tree.

use std::collections::HashSet;

use super::error::{FlowError, Result};
use super::model::GraphModel;
use super::types::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
	Hidden,
	Visible,
}

/// Ids whose visibility flipped in one transition, in model order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibilityChange {
	pub shown: Vec<NodeId>,
	pub hidden: Vec<NodeId>,
	/// Previously visible ids that no longer exist in the model.
	pub removed: Vec<NodeId>,
}

impl VisibilityChange {
	pub fn is_empty(&self) -> bool {
		self.shown.is_empty() && self.hidden.is_empty() && self.removed.is_empty()
	}
}

/// Set of currently visible nodes; everything else is hidden.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibilityStore {
	visible: HashSet<NodeId>,
}

impl VisibilityStore {
	pub fn is_visible(&self, id: &str) -> bool {
		self.visible.contains(id)
	}

	pub fn state(&self, id: &str) -> Visibility {
		if self.is_visible(id) {
			Visibility::Visible
		} else {
			Visibility::Hidden
		}
	}

	pub fn len(&self) -> usize {
		self.visible.len()
	}

	pub fn is_empty(&self) -> bool {
		self.visible.is_empty()
	}

	/// Root plus its direct children, nothing else.
	pub fn reset(&mut self, model: &GraphModel) -> VisibilityChange {
		let before = std::mem::take(&mut self.visible);
		if let Some(root) = model.root() {
			self.visible.insert(root.to_string());
			self.visible.extend(model.children(root).iter().cloned());
		}
		self.diff(&before, model)
	}

	/// Whether the children of `id` are currently expanded.
	///
	/// Expansion is judged by the first child; toggling keeps all direct
	/// children in the same state.
	pub fn children_visible(&self, model: &GraphModel, id: &str) -> bool {
		model
			.children(id)
			.first()
			.is_some_and(|child| self.is_visible(child))
	}

	/// Expands `id` by one level, or collapses its whole subtree.
	///
	/// Leaves, the root and hidden nodes are left alone.
	pub fn toggle(&mut self, model: &GraphModel, id: &str) -> Result<VisibilityChange> {
		if !model.contains(id) {
			return Err(FlowError::UnknownNode(id.to_string()));
		}
		let mut change = VisibilityChange::default();
		if model.is_root(id) || !model.has_children(id) || !self.is_visible(id) {
			return Ok(change);
		}

		if self.children_visible(model, id) {
			for descendant in model.descendants(id) {
				if self.visible.remove(&descendant) {
					change.hidden.push(descendant);
				}
			}
		} else {
			for child in model.children(id) {
				if self.visible.insert(child.clone()) {
					change.shown.push(child.clone());
				}
			}
		}
		Ok(change)
	}

	/// Carries the visible set over to a freshly built model.
	///
	/// Surviving visible nodes stay visible, new nodes under an already
	/// visible parent appear, root and root children are always visible and
	/// vanished ids are dropped. A node is only kept when its parent is kept
	/// too, so a stale snapshot cannot leave children of hidden nodes behind.
	pub fn reconcile(&mut self, previous: &GraphModel, model: &GraphModel) -> VisibilityChange {
		let before = std::mem::take(&mut self.visible);
		let root = model.root();

		// Parents come before their children in breadth-first order.
		for id in model.breadth_first() {
			let parent = model.parent(id);
			let is_new = !previous.is_empty() && !previous.contains(id);
			let keep = Some(id.as_str()) == root
				|| (parent.is_some() && parent == root)
				|| (parent.is_some_and(|p| self.visible.contains(p))
					&& (before.contains(id) || (is_new && parent.is_some_and(|p| before.contains(p)))));
			if keep {
				self.visible.insert(id.clone());
			}
		}
		self.diff(&before, model)
	}

	/// Replaces the set wholesale, e.g. from a persisted snapshot.
	pub fn restore<I>(&mut self, ids: I)
	where
		I: IntoIterator<Item = NodeId>,
	{
		self.visible = ids.into_iter().collect();
	}

	/// Visible ids in model order.
	pub fn visible_ids<'a>(&self, model: &'a GraphModel) -> Vec<&'a NodeId> {
		model.ids().filter(|id| self.is_visible(id)).collect()
	}

	/// Visible ids sorted, for stable serialization.
	pub fn sorted_ids(&self) -> Vec<NodeId> {
		let mut ids: Vec<NodeId> = self.visible.iter().cloned().collect();
		ids.sort();
		ids
	}

	fn diff(&self, before: &HashSet<NodeId>, model: &GraphModel) -> VisibilityChange {
		let mut change = VisibilityChange::default();
		for id in model.ids() {
			match (before.contains(id), self.visible.contains(id)) {
				(false, true) => change.shown.push(id.clone()),
				(true, false) => change.hidden.push(id.clone()),
				_ => {}
			}
		}
		change.removed = before
			.iter()
			.filter(|id| !model.contains(id))
			.cloned()
			.collect();
		change.removed.sort();
		change
	}
}
