use serde::{Deserialize, Serialize};

use super::types::{Point, Rect};

/// Canvas transform: `client = model * zoom + pan + page`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
	/// Draggable translation of the canvas content.
	pub pan_offset: Point,
	/// Static offset of the canvas element on the page; measured, never
	/// persisted.
	#[serde(skip)]
	pub page_offset: Point,
	pub zoom_level: f64,
	#[serde(skip)]
	pub width: f64,
	#[serde(skip)]
	pub height: f64,
}

impl Default for ViewportState {
	fn default() -> Self {
		Self {
			pan_offset: Point::ZERO,
			page_offset: Point::ZERO,
			zoom_level: 1.0,
			width: 0.0,
			height: 0.0,
		}
	}
}

impl ViewportState {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			width,
			height,
			..Self::default()
		}
	}

	/// Client (page) coordinates to model space.
	pub fn screen_to_model(&self, client: Point) -> Point {
		(client - self.pan_offset - self.page_offset) / self.zoom()
	}

	/// Model space to canvas-local coordinates.
	pub fn model_to_canvas(&self, model: Point) -> Point {
		model * self.zoom() + self.pan_offset
	}

	/// Client coordinates to canvas-local coordinates.
	pub fn client_to_canvas(&self, client: Point) -> Point {
		client - self.page_offset
	}

	/// Model point laid out at the middle of the canvas before any pan or
	/// zoom; the root is anchored here.
	pub fn anchor(&self) -> Point {
		Point::new(self.width / 2.0, self.height / 2.0)
	}

	pub fn canvas_center(&self) -> Point {
		Point::new(self.width / 2.0, self.height / 2.0)
	}

	/// Pans so the center of `bounds` lands on the canvas center.
	pub fn center_on(&mut self, bounds: &Rect) {
		self.pan_offset = self.canvas_center() - bounds.center() * self.zoom();
	}

	/// Changes the zoom while keeping the model point under `focus`
	/// (canvas-local) in place.
	pub fn zoom_about(&mut self, zoom: f64, focus: Point) {
		if zoom <= 0.0 || !zoom.is_finite() {
			return;
		}
		let ratio = zoom / self.zoom();
		self.pan_offset = focus - (focus - self.pan_offset) * ratio;
		self.zoom_level = zoom;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Takes over the persisted fields of `other`, keeping the canvas size
	/// and page offset.
	pub fn adopt(&mut self, other: &ViewportState) {
		self.pan_offset = other.pan_offset;
		self.zoom_level = other.zoom_level;
	}

	fn zoom(&self) -> f64 {
		if self.zoom_level > 0.0 { self.zoom_level } else { 1.0 }
	}
}
