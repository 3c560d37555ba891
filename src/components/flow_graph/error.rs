use super::types::NodeId;

/// Reasons a node snapshot cannot be turned into a graph model.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
	#[error("graph has no root node")]
	NoRoot,
	#[error("graph has multiple root nodes: {}", .0.join(", "))]
	MultipleRoots(Vec<NodeId>),
	#[error("node `{id}` references missing parent `{parent}`")]
	MissingParent { id: NodeId, parent: NodeId },
	#[error("duplicate node id `{0}`")]
	DuplicateId(NodeId),
	#[error("root node `{0}` must not have a parent")]
	RootHasParent(NodeId),
	#[error("node `{0}` is not reachable from the root (parent cycle)")]
	Cycle(NodeId),
}

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
	#[error("invalid graph: {0}")]
	Validation(#[from] ValidationError),
	#[error("unknown node `{0}`")]
	UnknownNode(NodeId),
	#[error("node `{0}` is not part of the graph model")]
	NodeNotInModel(NodeId),
	#[error("snapshot could not be decoded: {0}")]
	Snapshot(#[from] serde_json::Error),
}

pub type Result<T, E = FlowError> = std::result::Result<T, E>;
