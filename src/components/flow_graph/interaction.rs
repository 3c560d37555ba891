//! Pointer gesture state machine: pan, click, double-click and drag.
//!
//! The controller never reads a clock. A press on a node arms the click
//! timer through the scheduler; the owner reports its expiry back with
//! `on_click_timer`. Pointer moves only record the latest position, the
//! owner applies them once per animation frame with `on_frame`.

use log::debug;

use super::measure::Measure;
use super::model::GraphModel;
use super::scheduler::{Scheduler, TimerHandle, TimerKind};
use super::store::FlowStore;
use super::types::{NodeId, Point};
use super::viewport::ViewportState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureMode {
	Idle,
	Panning,
	PendingClick,
	Dragging,
}

/// One pointer sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerInput {
	pub client: Point,
	/// Primary button still held, from `MouseEvent::buttons`.
	pub primary: bool,
	/// Modifier held: drag only the grabbed node.
	pub solo: bool,
}

impl PointerInput {
	pub fn new(client: Point) -> Self {
		Self {
			client,
			primary: true,
			solo: false,
		}
	}

	pub fn solo(mut self) -> Self {
		self.solo = true;
		self
	}

	pub fn released(mut self) -> Self {
		self.primary = false;
		self
	}
}

/// Outcome of a gesture step, applied by the owner.
#[derive(Clone, Debug, PartialEq)]
pub enum InteractionEvent {
	/// Single click on an expandable node.
	Toggle(NodeId),
	/// Double click; carries the external reference id.
	Activated(String),
	/// A dragged node got an explicit position.
	Committed { id: NodeId, point: Point },
	/// Pan offset moved.
	ViewportChanged,
	/// Live state changed, a frame should be drawn.
	FrameNeeded,
	/// The gesture target vanished; nothing was committed.
	Aborted,
}

/// Everything a gesture step may touch.
pub struct InteractionContext<'a> {
	pub store: &'a mut FlowStore,
	pub scheduler: &'a mut dyn Scheduler,
	pub measure: &'a dyn Measure,
}

/// Pointer travel in model units exceeds `threshold` on either axis.
fn beyond_threshold(threshold: f64, viewport: &ViewportState, from: Point, to: Point) -> bool {
	let travel = viewport.screen_to_model(to) - viewport.screen_to_model(from);
	travel.x.abs() > threshold || travel.y.abs() > threshold
}

#[derive(Clone, Debug)]
struct ClickCandidate {
	node: NodeId,
	down_client: Point,
	/// Pointer still down on the candidate.
	held: bool,
	solo: bool,
	/// Armed click window; `None` once expired or cancelled.
	timer: Option<TimerHandle>,
}

#[derive(Clone, Debug)]
struct PanGesture {
	start_client: Point,
	start_pan: Point,
	latest: Point,
	dirty: bool,
}

#[derive(Clone, Debug)]
struct DragTarget {
	id: NodeId,
	origin: Point,
	live: Point,
}

#[derive(Clone, Debug)]
struct DragGesture {
	node: NodeId,
	grab_offset: Point,
	start_pointer: Point,
	latest: Point,
	targets: Vec<DragTarget>,
	dirty: bool,
}

impl DragGesture {
	fn pointer(&self, viewport: &ViewportState) -> Point {
		viewport.screen_to_model(self.latest) - self.grab_offset
	}

	fn apply(&mut self, viewport: &ViewportState) {
		let delta = self.pointer(viewport) - self.start_pointer;
		for target in &mut self.targets {
			target.live = target.origin + delta;
		}
		self.dirty = false;
	}
}

#[derive(Clone, Debug, Default)]
enum Gesture {
	#[default]
	Idle,
	Panning(PanGesture),
	PendingClick(ClickCandidate),
	Dragging(DragGesture),
}

#[derive(Clone, Debug)]
pub struct InteractionController {
	gesture: Gesture,
	click_delay_ms: u32,
	drag_threshold: f64,
}

impl InteractionController {
	pub fn new(click_delay_ms: u32, drag_threshold: f64) -> Self {
		Self {
			gesture: Gesture::Idle,
			click_delay_ms,
			drag_threshold: drag_threshold.max(0.0),
		}
	}

	pub fn mode(&self) -> GestureMode {
		match self.gesture {
			Gesture::Idle => GestureMode::Idle,
			Gesture::Panning(_) => GestureMode::Panning,
			Gesture::PendingClick(_) => GestureMode::PendingClick,
			Gesture::Dragging(_) => GestureMode::Dragging,
		}
	}

	/// Node currently being dragged.
	pub fn dragged_node(&self) -> Option<&str> {
		match &self.gesture {
			Gesture::Dragging(drag) => Some(&drag.node),
			_ => None,
		}
	}

	/// Live position of a node moved by the current drag.
	pub fn live_position(&self, id: &str) -> Option<Point> {
		let Gesture::Dragging(drag) = &self.gesture else {
			return None;
		};
		drag.targets.iter().find(|target| target.id == id).map(|target| target.live)
	}

	pub fn pointer_down(
		&mut self,
		cx: &mut InteractionContext<'_>,
		input: PointerInput,
		hit: Option<NodeId>,
	) -> Vec<InteractionEvent> {
		let mut events = Vec::new();

		if let Some((node, timer)) = self.repeat_press(hit.as_deref()) {
			cx.scheduler.clear_timeout(timer);
			match cx.store.model().node(&node) {
				Some(found) => {
					debug!("double click on {node}");
					events.push(InteractionEvent::Activated(found.reference_id().to_string()));
					self.gesture = Gesture::PendingClick(ClickCandidate {
						node,
						down_client: input.client,
						held: true,
						solo: input.solo,
						timer: None,
					});
				}
				None => {
					self.gesture = Gesture::Idle;
					events.push(InteractionEvent::Aborted);
				}
			}
			return events;
		}

		self.abort(cx.scheduler);
		self.gesture = match hit {
			Some(node) => {
				let timer = cx.scheduler.set_timeout(TimerKind::Click, self.click_delay_ms);
				Gesture::PendingClick(ClickCandidate {
					node,
					down_client: input.client,
					held: true,
					solo: input.solo,
					timer: Some(timer),
				})
			}
			None => Gesture::Panning(PanGesture {
				start_client: input.client,
				start_pan: cx.store.viewport().pan_offset,
				latest: input.client,
				dirty: false,
			}),
		};
		debug!("gesture start: {:?}", self.mode());
		events
	}

	pub fn pointer_move(&mut self, cx: &mut InteractionContext<'_>, input: PointerInput) -> Vec<InteractionEvent> {
		if !input.primary && self.is_holding() {
			return self.pointer_up(cx, input.client);
		}

		match &mut self.gesture {
			Gesture::Panning(pan) => {
				pan.latest = input.client;
				pan.dirty = true;
				vec![InteractionEvent::FrameNeeded]
			}
			Gesture::Dragging(drag) => {
				drag.latest = input.client;
				drag.dirty = true;
				vec![InteractionEvent::FrameNeeded]
			}
			Gesture::PendingClick(candidate) if candidate.held => {
				if beyond_threshold(self.drag_threshold, cx.store.viewport(), candidate.down_client, input.client) {
					let candidate = candidate.clone();
					self.start_drag(cx, candidate, input.client)
				} else {
					Vec::new()
				}
			}
			_ => Vec::new(),
		}
	}

	pub fn pointer_up(&mut self, cx: &mut InteractionContext<'_>, client: Point) -> Vec<InteractionEvent> {
		match std::mem::take(&mut self.gesture) {
			Gesture::Panning(mut pan) => {
				pan.latest = client;
				cx.store.viewport_mut().pan_offset = pan.start_pan + (pan.latest - pan.start_client);
				debug!("pan committed");
				vec![InteractionEvent::ViewportChanged, InteractionEvent::FrameNeeded]
			}
			Gesture::Dragging(mut drag) => {
				drag.latest = client;
				drag.apply(cx.store.viewport());
				self.commit_drag(cx, drag)
			}
			Gesture::PendingClick(candidate)
				if candidate.held && beyond_threshold(self.drag_threshold, cx.store.viewport(), candidate.down_client, client) =>
			{
				// Released far from the press without a move in between.
				let _ = self.start_drag(cx, candidate, client);
				match std::mem::take(&mut self.gesture) {
					Gesture::Dragging(drag) => self.commit_drag(cx, drag),
					_ => Vec::new(),
				}
			}
			Gesture::PendingClick(mut candidate) => {
				candidate.held = false;
				// A released press keeps waiting for its timer or a second press.
				if candidate.timer.is_some() {
					self.gesture = Gesture::PendingClick(candidate);
				}
				Vec::new()
			}
			Gesture::Idle => Vec::new(),
		}
	}

	/// Pointer left the canvas: ends the gesture at its last known position.
	pub fn pointer_leave(&mut self, cx: &mut InteractionContext<'_>) -> Vec<InteractionEvent> {
		let client = match &self.gesture {
			Gesture::Panning(pan) => pan.latest,
			Gesture::Dragging(drag) => drag.latest,
			Gesture::PendingClick(candidate) => candidate.down_client,
			Gesture::Idle => return Vec::new(),
		};
		self.pointer_up(cx, client)
	}

	/// Applies the moves recorded since the last frame.
	pub fn on_frame(&mut self, cx: &mut InteractionContext<'_>) -> Vec<InteractionEvent> {
		match &mut self.gesture {
			Gesture::Panning(pan) if pan.dirty => {
				pan.dirty = false;
				cx.store.viewport_mut().pan_offset = pan.start_pan + (pan.latest - pan.start_client);
				vec![InteractionEvent::ViewportChanged]
			}
			Gesture::Dragging(drag) if drag.dirty => {
				drag.apply(cx.store.viewport());
				Vec::new()
			}
			_ => Vec::new(),
		}
	}

	/// The click window closed.
	pub fn on_click_timer(&mut self, cx: &mut InteractionContext<'_>) -> Vec<InteractionEvent> {
		let Gesture::PendingClick(candidate) = &mut self.gesture else {
			return Vec::new();
		};
		if candidate.timer.take().is_none() {
			return Vec::new();
		}
		if candidate.held {
			// Long press: no click, a drag may still follow.
			return Vec::new();
		}

		let node = candidate.node.clone();
		self.gesture = Gesture::Idle;
		let model = cx.store.model();
		match model.entry(&node) {
			None => {
				debug!("gesture aborted: {node} vanished before its click");
				vec![InteractionEvent::Aborted]
			}
			Some(entry) if entry.has_children && entry.node.clickable && !model.is_root(&node) => {
				vec![InteractionEvent::Toggle(node)]
			}
			Some(_) => Vec::new(),
		}
	}

	/// Cancels the current gesture without committing anything. Returns
	/// whether a gesture was in progress.
	pub fn abort(&mut self, scheduler: &mut dyn Scheduler) -> bool {
		let gesture = std::mem::take(&mut self.gesture);
		if let Gesture::PendingClick(ClickCandidate { timer: Some(timer), .. }) = &gesture {
			scheduler.clear_timeout(*timer);
		}
		!matches!(gesture, Gesture::Idle)
	}

	/// Drops the gesture if its target left the model.
	pub fn retain_targets(&mut self, model: &GraphModel, scheduler: &mut dyn Scheduler) -> bool {
		let vanished = match &self.gesture {
			Gesture::PendingClick(candidate) => !model.contains(&candidate.node),
			Gesture::Dragging(drag) => drag.targets.iter().any(|target| !model.contains(&target.id)),
			Gesture::Panning(_) | Gesture::Idle => false,
		};
		if vanished {
			debug!("gesture aborted: target removed from the graph");
			self.abort(scheduler);
		}
		vanished
	}

	fn is_holding(&self) -> bool {
		match &self.gesture {
			Gesture::Panning(_) | Gesture::Dragging(_) => true,
			Gesture::PendingClick(candidate) => candidate.held,
			Gesture::Idle => false,
		}
	}

	/// Second press on a released candidate inside its click window.
	fn repeat_press(&self, hit: Option<&str>) -> Option<(NodeId, TimerHandle)> {
		let Gesture::PendingClick(candidate) = &self.gesture else {
			return None;
		};
		match (candidate.timer, hit) {
			(Some(timer), Some(hit)) if !candidate.held && hit == candidate.node => {
				Some((candidate.node.clone(), timer))
			}
			_ => None,
		}
	}

	fn start_drag(
		&mut self,
		cx: &mut InteractionContext<'_>,
		candidate: ClickCandidate,
		client: Point,
	) -> Vec<InteractionEvent> {
		if let Some(timer) = candidate.timer {
			cx.scheduler.clear_timeout(timer);
		}
		let positions = cx.store.positions();
		let Some(origin) = positions.get_position(&candidate.node) else {
			debug!("drag ignored: {} has no position yet", candidate.node);
			self.gesture = Gesture::Idle;
			return Vec::new();
		};

		let mut targets = vec![DragTarget {
			id: candidate.node.clone(),
			origin,
			live: origin,
		}];
		if !candidate.solo {
			let model = cx.store.model();
			let visibility = cx.store.visibility();
			for child in model.children(&candidate.node) {
				if !visibility.is_visible(child) || positions.is_explicit(child) {
					continue;
				}
				if let Some(point) = positions.get_position(child) {
					targets.push(DragTarget {
						id: child.clone(),
						origin: point,
						live: point,
					});
				}
			}
		}

		let viewport = cx.store.viewport();
		let grab_offset = viewport.screen_to_model(candidate.down_client) - origin;
		let mut drag = DragGesture {
			node: candidate.node,
			grab_offset,
			start_pointer: origin,
			latest: client,
			targets,
			dirty: true,
		};
		drag.apply(viewport);
		debug!("drag start: {} moving {} node(s)", drag.node, drag.targets.len());
		self.gesture = Gesture::Dragging(drag);
		vec![InteractionEvent::FrameNeeded]
	}

	fn commit_drag(&mut self, cx: &mut InteractionContext<'_>, drag: DragGesture) -> Vec<InteractionEvent> {
		let mut events = Vec::new();
		for target in drag.targets {
			if cx.measure.measure(&target.id).is_empty() || cx.store.positions().get_position(&target.id).is_none() {
				continue;
			}
			match cx.store.commit_position(&target.id, target.live) {
				Ok(()) => events.push(InteractionEvent::Committed {
					id: target.id,
					point: target.live,
				}),
				Err(err) => debug!("drag commit skipped: {err}"),
			}
		}
		debug!("drag end: {} committed", events.len());
		events.push(InteractionEvent::FrameNeeded);
		events
	}
}
