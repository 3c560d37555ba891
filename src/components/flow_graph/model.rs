//! Indexed tree built from a flat node snapshot.

use std::collections::{HashMap, HashSet, VecDeque};

use super::config::ChildStatusPolicy;
use super::error::ValidationError;
use super::types::{FlowNode, NodeId, NodeStatus};

#[derive(Clone, Debug)]
pub struct GraphEntry {
	pub node: FlowNode,
	/// Children in input order.
	pub children: Vec<NodeId>,
	pub has_children: bool,
	pub child_status: Option<NodeStatus>,
}

/// Immutable tree index, replaced wholesale whenever the input changes.
#[derive(Clone, Debug, Default)]
pub struct GraphModel {
	entries: HashMap<NodeId, GraphEntry>,
	order: Vec<NodeId>,
	root: Option<NodeId>,
}

impl GraphModel {
	pub fn build(nodes: Vec<FlowNode>, policy: ChildStatusPolicy) -> Result<Self, ValidationError> {
		let mut entries: HashMap<NodeId, GraphEntry> = HashMap::with_capacity(nodes.len());
		let mut order = Vec::with_capacity(nodes.len());
		let mut roots = Vec::new();

		for node in nodes {
			if entries.contains_key(&node.id) {
				return Err(ValidationError::DuplicateId(node.id));
			}
			if node.is_root {
				roots.push(node.id.clone());
			}
			order.push(node.id.clone());
			entries.insert(
				node.id.clone(),
				GraphEntry {
					node,
					children: Vec::new(),
					has_children: false,
					child_status: None,
				},
			);
		}

		let root = match roots.len() {
			0 => return Err(ValidationError::NoRoot),
			1 => roots.remove(0),
			_ => return Err(ValidationError::MultipleRoots(roots)),
		};
		if entries[&root].node.parent_id.is_some() {
			return Err(ValidationError::RootHasParent(root));
		}

		let mut links = Vec::new();
		for id in &order {
			if let Some(parent) = &entries[id].node.parent_id {
				if !entries.contains_key(parent) {
					return Err(ValidationError::MissingParent {
						id: id.clone(),
						parent: parent.clone(),
					});
				}
				links.push((parent.clone(), id.clone()));
			}
		}
		for (parent, child) in links {
			if let Some(entry) = entries.get_mut(&parent) {
				entry.children.push(child);
			}
		}

		let mut model = Self {
			entries,
			order,
			root: Some(root),
		};
		model.check_reachable()?;
		model.derive(policy);
		Ok(model)
	}

	// Every parent resolves and only the root lacks one, so anything the
	// root cannot reach hangs off a cycle.
	fn check_reachable(&self) -> Result<(), ValidationError> {
		let reached: HashSet<&str> = self
			.breadth_first()
			.into_iter()
			.map(String::as_str)
			.collect();
		match self.order.iter().find(|id| !reached.contains(id.as_str())) {
			Some(id) => Err(ValidationError::Cycle(id.clone())),
			None => Ok(()),
		}
	}

	fn derive(&mut self, policy: ChildStatusPolicy) {
		let statuses: HashMap<NodeId, NodeStatus> = self
			.entries
			.iter()
			.map(|(id, entry)| (id.clone(), entry.node.status))
			.collect();

		for entry in self.entries.values_mut() {
			entry.has_children = !entry.children.is_empty();
			let mut notable = entry
				.children
				.iter()
				.filter_map(|child| statuses.get(child).copied())
				.filter(|status| status.is_notable());
			entry.child_status = match policy {
				ChildStatusPolicy::FirstInOrder => notable.next(),
				ChildStatusPolicy::LastInOrder => notable.last(),
			};
		}
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	pub fn len(&self) -> usize {
		self.order.len()
	}

	pub fn root(&self) -> Option<&str> {
		self.root.as_deref()
	}

	pub fn contains(&self, id: &str) -> bool {
		self.entries.contains_key(id)
	}

	pub fn entry(&self, id: &str) -> Option<&GraphEntry> {
		self.entries.get(id)
	}

	pub fn node(&self, id: &str) -> Option<&FlowNode> {
		self.entries.get(id).map(|entry| &entry.node)
	}

	/// Node ids in input order.
	pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
		self.order.iter()
	}

	pub fn nodes(&self) -> impl Iterator<Item = &GraphEntry> {
		self.order.iter().filter_map(|id| self.entries.get(id))
	}

	pub fn children(&self, id: &str) -> &[NodeId] {
		self.entries
			.get(id)
			.map(|entry| entry.children.as_slice())
			.unwrap_or(&[])
	}

	pub fn parent(&self, id: &str) -> Option<&str> {
		self.node(id).and_then(|node| node.parent_id.as_deref())
	}

	pub fn is_root(&self, id: &str) -> bool {
		self.root.as_deref() == Some(id)
	}

	pub fn has_children(&self, id: &str) -> bool {
		self.entries.get(id).is_some_and(|entry| entry.has_children)
	}

	pub fn child_status(&self, id: &str) -> Option<NodeStatus> {
		self.entries.get(id).and_then(|entry| entry.child_status)
	}

	/// Full descendant closure of `id` in pre-order, excluding `id` itself.
	pub fn descendants(&self, id: &str) -> Vec<NodeId> {
		let mut out = Vec::new();
		let mut stack: Vec<&NodeId> = self.children(id).iter().rev().collect();
		while let Some(next) = stack.pop() {
			out.push(next.clone());
			stack.extend(self.children(next).iter().rev());
		}
		out
	}

	/// Ids reachable from the root, breadth first.
	pub fn breadth_first(&self) -> Vec<&NodeId> {
		let Some(root) = self.root.as_ref() else {
			return Vec::new();
		};
		let mut out = Vec::with_capacity(self.order.len());
		let mut queue = VecDeque::from([root]);
		while let Some(id) = queue.pop_front() {
			out.push(id);
			queue.extend(self.children(id));
		}
		out
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn build(nodes: Vec<FlowNode>) -> Result<GraphModel, ValidationError> {
		GraphModel::build(nodes, ChildStatusPolicy::FirstInOrder)
	}

	#[test]
	fn indexes_children_in_input_order() {
		let model = build(vec![
			FlowNode::child("b", "root", 10.0),
			FlowNode::root("root", 10.0),
			FlowNode::child("a", "root", 10.0),
			FlowNode::child("c", "a", 10.0),
		])
		.unwrap();

		assert_eq!(model.root(), Some("root"));
		assert_eq!(model.children("root"), ["b".to_string(), "a".to_string()]);
		assert_eq!(model.parent("c"), Some("a"));
		assert!(model.has_children("a"));
		assert!(!model.has_children("c"));
		assert_eq!(model.descendants("root"), vec!["b", "a", "c"]);
		assert!(model.children("missing").is_empty());
	}

	#[test]
	fn rejects_malformed_graphs() {
		assert_eq!(build(vec![]).unwrap_err(), ValidationError::NoRoot);
		assert_eq!(
			build(vec![FlowNode::root("a", 1.0), FlowNode::root("b", 1.0)]).unwrap_err(),
			ValidationError::MultipleRoots(vec!["a".into(), "b".into()])
		);
		assert_eq!(
			build(vec![FlowNode::root("a", 1.0), FlowNode::child("b", "zz", 1.0)]).unwrap_err(),
			ValidationError::MissingParent {
				id: "b".into(),
				parent: "zz".into()
			}
		);
		assert_eq!(
			build(vec![FlowNode::root("a", 1.0), FlowNode::root("a", 1.0)]).unwrap_err(),
			ValidationError::DuplicateId("a".into())
		);
	}

	#[test]
	fn rejects_parent_cycles() {
		let err = build(vec![
			FlowNode::root("r", 1.0),
			FlowNode::child("x", "y", 1.0),
			FlowNode::child("y", "x", 1.0),
		])
		.unwrap_err();
		assert_eq!(err, ValidationError::Cycle("x".into()));
	}

	#[test]
	fn child_status_follows_policy() {
		let nodes = vec![
			FlowNode::root("r", 1.0),
			FlowNode::child("ok", "r", 1.0).with_status(NodeStatus::Success),
			FlowNode::child("warn", "r", 1.0).with_status(NodeStatus::Warning),
			FlowNode::child("err", "r", 1.0).with_status(NodeStatus::Error),
		];
		let first = GraphModel::build(nodes.clone(), ChildStatusPolicy::FirstInOrder).unwrap();
		let last = GraphModel::build(nodes, ChildStatusPolicy::LastInOrder).unwrap();

		assert_eq!(first.child_status("r"), Some(NodeStatus::Warning));
		assert_eq!(last.child_status("r"), Some(NodeStatus::Error));
		assert_eq!(first.child_status("ok"), None);
	}
}
