use log::{debug, info, warn};

use super::config::FlowConfig;
use super::error::Result;
use super::events::{ChangeDebouncer, FlowEvents};
use super::interaction::{
	GestureMode, InteractionContext, InteractionController, InteractionEvent, PointerInput,
};
use super::layout::{LayoutEngine, LayoutPass};
use super::measure::Measure;
use super::model::GraphModel;
use super::scale::ZoomScale;
use super::scheduler::{FrameHandle, Scheduler, TimerKind};
use super::store::{FlowSnapshot, FlowStore};
use super::types::{FlowNode, NodeId, Point, Rect};
use super::viewport::ViewportState;
use super::visibility::VisibilityChange;

/// Consecutive frames a layout pass may be retried while footprints are
/// still unavailable.
pub const MAX_DEFERRED_PASSES: u32 = 120;

/// One flow graph instance: store, gestures, layout and notifications.
///
/// All mutation goes through `&mut self`; the host owns the only instance
/// and forwards DOM events, timers and animation frames to it.
pub struct FlowGraphState {
	config: FlowConfig,
	store: FlowStore,
	layout: LayoutEngine,
	zoom: ZoomScale,
	interaction: InteractionController,
	scheduler: Box<dyn Scheduler>,
	measure: Box<dyn Measure>,
	events: FlowEvents,
	debouncer: ChangeDebouncer,
	frame: Option<FrameHandle>,
	layout_pending: bool,
	deferred_passes: u32,
	centered: bool,
	torn_down: bool,
}

impl FlowGraphState {
	pub fn new(config: FlowConfig, scheduler: Box<dyn Scheduler>, measure: Box<dyn Measure>) -> Self {
		Self {
			store: FlowStore::default(),
			layout: LayoutEngine::new(&config),
			zoom: ZoomScale::new(&config.zoom),
			interaction: InteractionController::new(config.click_delay_ms, config.drag_threshold),
			debouncer: ChangeDebouncer::new(config.change_debounce_ms),
			config,
			scheduler,
			measure,
			events: FlowEvents::default(),
			frame: None,
			layout_pending: false,
			deferred_passes: 0,
			centered: false,
			torn_down: false,
		}
	}

	pub fn config(&self) -> &FlowConfig {
		&self.config
	}

	pub fn store(&self) -> &FlowStore {
		&self.store
	}

	pub fn model(&self) -> &GraphModel {
		self.store.model()
	}

	pub fn viewport(&self) -> &ViewportState {
		self.store.viewport()
	}

	pub fn zoom_level(&self) -> f64 {
		self.store.viewport().zoom_level
	}

	pub fn gesture_mode(&self) -> GestureMode {
		self.interaction.mode()
	}

	pub fn dragged_node(&self) -> Option<&str> {
		self.interaction.dragged_node()
	}

	pub fn events_mut(&mut self) -> &mut FlowEvents {
		&mut self.events
	}

	/// A layout retry is waiting for the next frame.
	pub fn is_layout_pending(&self) -> bool {
		self.layout_pending
	}

	/// Swaps in a new node snapshot. An invalid snapshot is rejected and the
	/// previous model stays in place.
	pub fn replace_graph(&mut self, nodes: Vec<FlowNode>) -> Result<()> {
		let model = GraphModel::build(nodes, self.config.child_status_policy).inspect_err(|err| {
			warn!("graph rejected: {err}");
		})?;
		info!("graph replaced: {} nodes", model.len());

		let outcome = self.store.replace_model(model);
		if self.interaction.retain_targets(self.store.model(), self.scheduler.as_mut()) {
			debug!("gesture aborted by graph replacement");
		}
		if !outcome.pruned_positions.is_empty() {
			debug!("pruned {} position records", outcome.pruned_positions.len());
		}
		self.measure.prepare(self.store.model());
		self.emit_visibility(&outcome.visibility);
		self.deferred_passes = 0;
		self.relayout();
		self.touch_change();
		Ok(())
	}

	/// Expands or collapses `id`.
	pub fn toggle(&mut self, id: &str) -> Result<VisibilityChange> {
		let change = self.store.toggle(id)?;
		if !change.is_empty() {
			debug!("toggled {id}: +{} -{}", change.shown.len(), change.hidden.len());
			self.emit_visibility(&change);
			self.deferred_passes = 0;
			self.relayout();
			self.touch_change();
		}
		Ok(change)
	}

	/// Runs one layout pass and merges its output. Unmeasured nodes make the
	/// pass retry on the next frame.
	pub fn relayout(&mut self) -> LayoutPass {
		let anchor = self.store.viewport().anchor();
		let pass = self.layout.run(
			self.store.model(),
			self.store.visibility(),
			self.store.positions(),
			self.measure.as_ref(),
			anchor,
		);
		self.store.apply_layout(&pass);

		if pass.deferred.is_empty() {
			self.layout_pending = false;
			self.deferred_passes = 0;
			if self.config.auto_center && !self.centered && !self.store.model().is_empty() {
				self.centered = true;
				self.center();
			}
		} else {
			self.deferred_passes += 1;
			self.layout_pending = self.deferred_passes < MAX_DEFERRED_PASSES;
			if self.layout_pending {
				debug!("layout deferred for {} node(s)", pass.deferred.len());
			} else {
				warn!("giving up on {} unmeasured node(s)", pass.deferred.len());
			}
		}
		self.request_redraw();
		pass
	}

	/// Model-space box around every visible positioned node.
	pub fn bounds(&self) -> Option<Rect> {
		let model = self.store.model();
		self.store
			.visibility()
			.visible_ids(model)
			.into_iter()
			.filter_map(|id| {
				let position = self.display_position(id)?;
				let footprint = self.measure.measure(id);
				Some(if footprint.is_empty() {
					Rect::new(position.x, position.y, 0.0, 0.0)
				} else {
					footprint.offset(position)
				})
			})
			.reduce(|acc, rect| acc.union(&rect))
	}

	/// Pans so the visible graph sits in the middle of the canvas.
	pub fn center(&mut self) {
		let Some(bounds) = self.bounds() else {
			return;
		};
		self.store.viewport_mut().center_on(&bounds);
		self.touch_change();
		self.request_redraw();
	}

	pub fn zoom_in(&mut self) -> f64 {
		let level = self.zoom.step_from(self.zoom_level(), 1);
		self.zoom_to(level)
	}

	pub fn zoom_out(&mut self) -> f64 {
		let level = self.zoom.step_from(self.zoom_level(), -1);
		self.zoom_to(level)
	}

	/// Snaps `level` onto the scale and zooms about the canvas center.
	pub fn zoom_to(&mut self, level: f64) -> f64 {
		let focus = self.store.viewport().canvas_center();
		self.zoom_about(self.zoom.snap(level), focus)
	}

	/// Modifier + wheel zoom about the cursor. Returns false when the wheel
	/// event is not meant for the graph.
	pub fn wheel(&mut self, client: Point, delta_y: f64, modifier: bool) -> bool {
		if !modifier {
			return false;
		}
		let level = self.zoom.from_wheel(self.zoom_level(), delta_y);
		let focus = self.store.viewport().client_to_canvas(client);
		self.zoom_about(level, focus);
		true
	}

	pub fn pointer_down(&mut self, input: PointerInput) {
		let hit = self.node_at_position(input.client);
		self.gesture(|controller, cx| controller.pointer_down(cx, input, hit));
	}

	pub fn pointer_move(&mut self, input: PointerInput) {
		self.gesture(|controller, cx| controller.pointer_move(cx, input));
	}

	pub fn pointer_up(&mut self, client: Point) {
		self.gesture(|controller, cx| controller.pointer_up(cx, client));
	}

	pub fn pointer_leave(&mut self) {
		self.gesture(|controller, cx| controller.pointer_leave(cx));
	}

	/// Animation frame callback; the host draws right after.
	pub fn on_animation_frame(&mut self) {
		self.frame = None;
		self.gesture(|controller, cx| controller.on_frame(cx));
		if self.layout_pending {
			self.relayout();
		}
	}

	/// Timer callback. Returns true when the debounced change notification
	/// fired, so the host can persist a snapshot.
	pub fn on_timer(&mut self, kind: TimerKind) -> bool {
		match kind {
			TimerKind::Click => {
				self.gesture(|controller, cx| controller.on_click_timer(cx));
				false
			}
			TimerKind::Change => {
				if !self.debouncer.fire() {
					return false;
				}
				self.events.emit_change();
				true
			}
		}
	}

	/// Topmost visible node whose footprint contains the client point.
	pub fn node_at_position(&self, client: Point) -> Option<NodeId> {
		let point = self.store.viewport().screen_to_model(client);
		let model = self.store.model();
		self.store
			.visibility()
			.visible_ids(model)
			.into_iter()
			.rev()
			.find(|id| {
				let footprint = self.measure.measure(id);
				!footprint.is_empty()
					&& self
						.display_position(id)
						.is_some_and(|position| footprint.offset(position).contains(point))
			})
			.cloned()
	}

	/// Where to draw `id` right now, including an ongoing drag.
	pub fn display_position(&self, id: &str) -> Option<Point> {
		self.interaction
			.live_position(id)
			.or_else(|| self.store.positions().get_position(id))
	}

	pub fn snapshot(&self) -> FlowSnapshot {
		self.store.snapshot()
	}

	/// Loads persisted state. Restoring before the first graph is fine; the
	/// next replacement reconciles against it.
	pub fn restore(&mut self, snapshot: FlowSnapshot) {
		self.interaction.abort(self.scheduler.as_mut());
		self.store.restore(snapshot);
		self.centered = true;
		if !self.store.model().is_empty() {
			self.relayout();
		}
		self.request_redraw();
	}

	/// Initial disclosure, no explicit positions, default zoom and pan.
	pub fn hard_reset(&mut self) {
		self.interaction.abort(self.scheduler.as_mut());
		let change = self.store.hard_reset();
		let viewport = self.store.viewport_mut();
		viewport.pan_offset = Point::ZERO;
		viewport.zoom_level = 1.0;
		self.emit_visibility(&change);
		self.centered = false;
		self.deferred_passes = 0;
		self.relayout();
		self.touch_change();
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.store.viewport_mut().resize(width, height);
		self.request_redraw();
	}

	pub fn set_page_offset(&mut self, offset: Point) {
		self.store.viewport_mut().page_offset = offset;
	}

	/// Cancels every timer and frame and drops all listeners. Later calls
	/// into the instance never schedule anything again; pointer input is
	/// ignored.
	pub fn teardown(&mut self) {
		if self.torn_down {
			return;
		}
		self.interaction.abort(self.scheduler.as_mut());
		self.debouncer.cancel(self.scheduler.as_mut());
		if let Some(frame) = self.frame.take() {
			self.scheduler.cancel_frame(frame);
		}
		self.scheduler.detach();
		self.events.clear();
		self.torn_down = true;
		debug!("flow graph torn down");
	}

	fn zoom_about(&mut self, level: f64, focus: Point) -> f64 {
		let viewport = self.store.viewport_mut();
		if viewport.zoom_level != level {
			viewport.zoom_about(level, focus);
			self.touch_change();
			self.request_redraw();
		}
		self.zoom_level()
	}

	fn gesture<F>(&mut self, step: F)
	where
		F: FnOnce(&mut InteractionController, &mut InteractionContext<'_>) -> Vec<InteractionEvent>,
	{
		if self.torn_down {
			return;
		}
		let mut cx = InteractionContext {
			store: &mut self.store,
			scheduler: self.scheduler.as_mut(),
			measure: self.measure.as_ref(),
		};
		let events = step(&mut self.interaction, &mut cx);
		let committed = events
			.iter()
			.any(|event| matches!(event, InteractionEvent::Committed { .. }));
		for event in events {
			self.apply(event);
		}
		// Computed nodes under the new explicit records follow them.
		if committed {
			self.relayout();
		}
	}

	fn apply(&mut self, event: InteractionEvent) {
		match event {
			InteractionEvent::Toggle(id) => {
				if let Err(err) = self.toggle(&id) {
					debug!("toggle ignored: {err}");
				}
			}
			InteractionEvent::Activated(reference) => self.events.emit_activated(&reference),
			InteractionEvent::Committed { id, point } => {
				self.events.emit_commit(&id, point.x, point.y);
				self.touch_change();
			}
			InteractionEvent::ViewportChanged => {
				self.touch_change();
				self.request_redraw();
			}
			InteractionEvent::FrameNeeded => self.request_redraw(),
			InteractionEvent::Aborted => debug!("gesture aborted"),
		}
	}

	fn emit_visibility(&mut self, change: &VisibilityChange) {
		for id in &change.shown {
			self.events.emit_visibility(id, true);
		}
		for id in change.hidden.iter().chain(&change.removed) {
			self.events.emit_visibility(id, false);
		}
	}

	fn touch_change(&mut self) {
		if !self.torn_down {
			self.debouncer.touch(self.scheduler.as_mut());
		}
	}

	fn request_redraw(&mut self) {
		if !self.torn_down && self.frame.is_none() {
			self.frame = Some(self.scheduler.request_frame());
		}
	}
}
