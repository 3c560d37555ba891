use serde::{Deserialize, Serialize};

/// Placement strategy for nodes without an explicit position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutStrategy {
	/// Deterministic, index-based angles around the parent.
	#[default]
	Radial,
	/// Legacy placement: random angle per node with sibling collision
	/// rejection. Stable only for a fixed seed and visiting order.
	Scattered { seed: u64 },
}

/// Which notable child status a parent reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChildStatusPolicy {
	#[default]
	FirstInOrder,
	LastInOrder,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
	pub min: f64,
	pub max: f64,
	pub step: f64,
}

impl Default for ZoomConfig {
	fn default() -> Self {
		Self {
			min: 0.2,
			max: 3.0,
			step: 0.2,
		}
	}
}

/// Per-instance settings of a flow graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
	/// Key under which the persisted snapshot is stored.
	pub graph_id: String,
	/// Gap between a parent's footprint and its ring of children.
	pub spacing: f64,
	/// Multiplier applied to `spacing` for groups containing branch nodes.
	pub branch_spacing_factor: f64,
	pub zoom: ZoomConfig,
	pub auto_center: bool,
	pub click_delay_ms: u32,
	/// Pointer travel (model units, per axis) that turns a press into a drag.
	pub drag_threshold: f64,
	pub change_debounce_ms: u32,
	pub layout_strategy: LayoutStrategy,
	pub child_status_policy: ChildStatusPolicy,
}

impl Default for FlowConfig {
	fn default() -> Self {
		Self {
			graph_id: "flowGraph".into(),
			spacing: 25.0,
			branch_spacing_factor: 4.0,
			zoom: ZoomConfig::default(),
			auto_center: false,
			click_delay_ms: 300,
			drag_threshold: 20.0,
			change_debounce_ms: 1000,
			layout_strategy: LayoutStrategy::Radial,
			child_status_policy: ChildStatusPolicy::FirstInOrder,
		}
	}
}

impl FlowConfig {
	/// localStorage key of the persisted snapshot.
	pub fn storage_key(&self) -> String {
		format!("{}State", self.graph_id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_config_falls_back_to_defaults() {
		let config: FlowConfig =
			serde_json::from_str(r#"{"spacing":50,"zoom":{"max":2}}"#).unwrap();
		assert_eq!(config.spacing, 50.0);
		assert_eq!(config.zoom.max, 2.0);
		assert_eq!(config.zoom.min, 0.2);
		assert_eq!(config.click_delay_ms, 300);
		assert_eq!(config.storage_key(), "flowGraphState");
	}
}
