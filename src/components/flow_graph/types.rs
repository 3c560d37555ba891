use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

pub type NodeId = String;

/// Processing status of a node, as delivered by the data source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeStatus {
	Success,
	#[default]
	Unknown,
	Warning,
	Error,
	Running,
	Pending,
	Disabled,
}

impl NodeStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			NodeStatus::Success => "Success",
			NodeStatus::Unknown => "Unknown",
			NodeStatus::Warning => "Warning",
			NodeStatus::Error => "Error",
			NodeStatus::Running => "Running",
			NodeStatus::Pending => "Pending",
			NodeStatus::Disabled => "Disabled",
		}
	}

	/// `Success` and `Unknown` never propagate up as a child status.
	pub fn is_notable(self) -> bool {
		!matches!(self, NodeStatus::Success | NodeStatus::Unknown)
	}
}

impl From<&str> for NodeStatus {
	fn from(value: &str) -> Self {
		match value {
			"Success" => NodeStatus::Success,
			"Warning" => NodeStatus::Warning,
			"Error" => NodeStatus::Error,
			"Running" => NodeStatus::Running,
			"Pending" => NodeStatus::Pending,
			"Disabled" => NodeStatus::Disabled,
			_ => NodeStatus::Unknown,
		}
	}
}

impl From<String> for NodeStatus {
	fn from(value: String) -> Self {
		NodeStatus::from(value.as_str())
	}
}

impl From<NodeStatus> for String {
	fn from(value: NodeStatus) -> Self {
		value.as_str().to_string()
	}
}

impl fmt::Display for NodeStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

fn default_clickable() -> bool {
	true
}

/// One raw node record of the input snapshot.
///
/// Field names on the wire follow the flat process list the diagram is fed
/// with (`parent`, `value`, `root`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
	pub id: NodeId,
	#[serde(default, rename = "parent", skip_serializing_if = "Option::is_none")]
	pub parent_id: Option<NodeId>,
	#[serde(default, rename = "value")]
	pub size: f64,
	#[serde(default)]
	pub status: NodeStatus,
	#[serde(default, rename = "root")]
	pub is_root: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub reference: Option<String>,
	#[serde(default = "default_clickable")]
	pub clickable: bool,
}

impl FlowNode {
	pub fn root(id: impl Into<NodeId>, size: f64) -> Self {
		Self {
			id: id.into(),
			parent_id: None,
			size,
			status: NodeStatus::Unknown,
			is_root: true,
			name: None,
			reference: None,
			clickable: true,
		}
	}

	pub fn child(id: impl Into<NodeId>, parent: impl Into<NodeId>, size: f64) -> Self {
		Self {
			parent_id: Some(parent.into()),
			is_root: false,
			..Self::root(id, size)
		}
	}

	pub fn with_status(mut self, status: NodeStatus) -> Self {
		self.status = status;
		self
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
		self.reference = Some(reference.into());
		self
	}

	/// Identifier handed to activation listeners; falls back to the node id.
	pub fn reference_id(&self) -> &str {
		self.reference.as_deref().unwrap_or(&self.id)
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn distance(self, other: Point) -> f64 {
		let (dx, dy) = (other.x - self.x, other.y - self.y);
		(dx * dx + dy * dy).sqrt()
	}
}

impl Add for Point {
	type Output = Point;

	fn add(self, rhs: Point) -> Point {
		Point::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl Sub for Point {
	type Output = Point;

	fn sub(self, rhs: Point) -> Point {
		Point::new(self.x - rhs.x, self.y - rhs.y)
	}
}

impl Mul<f64> for Point {
	type Output = Point;

	fn mul(self, rhs: f64) -> Point {
		Point::new(self.x * rhs, self.y * rhs)
	}
}

impl Div<f64> for Point {
	type Output = Point;

	fn div(self, rhs: f64) -> Point {
		Point::new(self.x / rhs, self.y / rhs)
	}
}

/// Axis-aligned box in model units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl Rect {
	pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
		Self {
			x,
			y,
			width,
			height,
		}
	}

	/// Box of the given size centered on `center`.
	pub fn centered(center: Point, width: f64, height: f64) -> Self {
		Self::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
	}

	/// A zero-area box means the node has not been rendered yet.
	pub fn is_empty(&self) -> bool {
		self.width <= 0.0 || self.height <= 0.0
	}

	pub fn diameter(&self) -> f64 {
		self.width.max(self.height)
	}

	pub fn center(&self) -> Point {
		Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
	}

	pub fn contains(&self, p: Point) -> bool {
		p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
	}

	pub fn offset(&self, by: Point) -> Rect {
		Rect::new(self.x + by.x, self.y + by.y, self.width, self.height)
	}

	pub fn union(&self, other: &Rect) -> Rect {
		let (x0, y0) = (self.x.min(other.x), self.y.min(other.y));
		let (x1, y1) = (
			(self.x + self.width).max(other.x + other.width),
			(self.y + self.height).max(other.y + other.height),
		);
		Rect::new(x0, y0, x1 - x0, y1 - y0)
	}
}
