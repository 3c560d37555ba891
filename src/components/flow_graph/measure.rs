//! Footprint measurement, the one capability the engine does not own.

use std::collections::HashMap;

use super::model::GraphModel;
use super::types::{FlowNode, NodeId, Rect};

/// Height reserved under a node for its name.
pub const LABEL_HEIGHT: f64 = 16.0;
/// Minimum label width, also used for unnamed nodes.
pub const MIN_LABEL_WIDTH: f64 = 75.0;
/// Average glyph advance used when no text metrics are available.
pub const GLYPH_WIDTH: f64 = 11.0;

/// Rendered footprint of a node, in model units, centered on the node.
///
/// A zero-area box means the node has no footprint yet; layout defers it.
pub trait Measure {
	fn measure(&self, id: &str) -> Rect;

	/// Called after every graph replacement, before layout runs.
	fn prepare(&mut self, _model: &GraphModel) {}
}

impl<F> Measure for F
where
	F: Fn(&str) -> Rect,
{
	fn measure(&self, id: &str) -> Rect {
		self(id)
	}
}

/// Footprint of a node whose label is `text_width` wide: the shape on top,
/// the label underneath, the wider of the two decides the width.
pub fn footprint(node: &FlowNode, text_width: f64) -> Rect {
	let size = node.size.max(0.0);
	let width = text_width.max(MIN_LABEL_WIDTH).max(size);
	Rect::new(-width / 2.0, -(size + LABEL_HEIGHT) / 2.0, width, size + LABEL_HEIGHT)
}

/// Estimated label width from the character count.
pub fn estimate_text_width(node: &FlowNode) -> f64 {
	let chars = node.name.as_deref().map_or(1, |name| name.chars().count().max(1));
	chars as f64 * GLYPH_WIDTH
}

/// Measures nodes from their declared size and an estimated label width.
#[derive(Clone, Debug, Default)]
pub struct SizeMeasure {
	footprints: HashMap<NodeId, Rect>,
}

impl Measure for SizeMeasure {
	fn measure(&self, id: &str) -> Rect {
		self.footprints.get(id).copied().unwrap_or_default()
	}

	fn prepare(&mut self, model: &GraphModel) {
		self.footprints = model
			.nodes()
			.map(|entry| {
				let rect = footprint(&entry.node, estimate_text_width(&entry.node));
				(entry.node.id.clone(), rect)
			})
			.collect();
	}
}
