//! `web-sys` implementations of the scheduler and the footprint measure.

use std::collections::HashMap;
use std::rc::Rc;

use log::error;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Window};

use super::measure::{Measure, estimate_text_width, footprint};
use super::model::GraphModel;
use super::render::LABEL_FONT;
use super::scheduler::{FrameHandle, Scheduler, TimerHandle, TimerKind};
use super::types::{NodeId, Rect};

/// Timers and frames on the browser event loop.
///
/// One closure per callback kind lives as long as the scheduler, so a
/// cleared timeout never leaks its callback.
pub struct BrowserScheduler {
	window: Window,
	click: Closure<dyn FnMut()>,
	change: Closure<dyn FnMut()>,
	frame: Closure<dyn FnMut()>,
	timers: HashMap<TimerKind, TimerHandle>,
	frames: Vec<FrameHandle>,
}

impl BrowserScheduler {
	pub fn new(window: Window, on_timer: impl Fn(TimerKind) + 'static, on_frame: impl Fn() + 'static) -> Self {
		let on_timer: Rc<dyn Fn(TimerKind)> = Rc::new(on_timer);
		let on_click = on_timer.clone();
		Self {
			window,
			click: Closure::new(move || on_click(TimerKind::Click)),
			change: Closure::new(move || on_timer(TimerKind::Change)),
			frame: Closure::new(on_frame),
			timers: HashMap::new(),
			frames: Vec::new(),
		}
	}
}

impl Scheduler for BrowserScheduler {
	fn set_timeout(&mut self, kind: TimerKind, delay_ms: u32) -> TimerHandle {
		let callback = match kind {
			TimerKind::Click => &self.click,
			TimerKind::Change => &self.change,
		};
		let id = self
			.window
			.set_timeout_with_callback_and_timeout_and_arguments_0(
				callback.as_ref().unchecked_ref(),
				delay_ms.min(i32::MAX as u32) as i32,
			)
			.unwrap_or_else(|err| {
				error!("setTimeout failed: {err:?}");
				0
			});
		let handle = TimerHandle(id);
		self.timers.insert(kind, handle);
		handle
	}

	fn clear_timeout(&mut self, handle: TimerHandle) {
		self.window.clear_timeout_with_handle(handle.0);
		self.timers.retain(|_, pending| *pending != handle);
	}

	fn request_frame(&mut self) -> FrameHandle {
		let id = self
			.window
			.request_animation_frame(self.frame.as_ref().unchecked_ref())
			.unwrap_or_else(|err| {
				error!("requestAnimationFrame failed: {err:?}");
				0
			});
		// Older handles have fired by now; only the newest can be pending.
		self.frames.clear();
		self.frames.push(FrameHandle(id));
		FrameHandle(id)
	}

	fn cancel_frame(&mut self, handle: FrameHandle) {
		let _ = self.window.cancel_animation_frame(handle.0);
		self.frames.retain(|frame| *frame != handle);
	}

	fn detach(&mut self) {
		for (_, handle) in self.timers.drain() {
			self.window.clear_timeout_with_handle(handle.0);
		}
		for frame in self.frames.drain(..) {
			let _ = self.window.cancel_animation_frame(frame.0);
		}
	}
}

/// Measures labels with the 2d context the graph is drawn with.
pub struct CanvasMeasure {
	ctx: CanvasRenderingContext2d,
	footprints: HashMap<NodeId, Rect>,
}

impl CanvasMeasure {
	pub fn new(ctx: CanvasRenderingContext2d) -> Self {
		Self {
			ctx,
			footprints: HashMap::new(),
		}
	}
}

impl Measure for CanvasMeasure {
	fn measure(&self, id: &str) -> Rect {
		self.footprints.get(id).copied().unwrap_or_default()
	}

	fn prepare(&mut self, model: &GraphModel) {
		self.ctx.set_font(LABEL_FONT);
		self.footprints = model
			.nodes()
			.map(|entry| {
				let node = &entry.node;
				let text_width = match node.name.as_deref() {
					Some(name) => self
						.ctx
						.measure_text(name)
						.map(|metrics| metrics.width())
						.unwrap_or_else(|_| estimate_text_width(node)),
					None => 0.0,
				};
				(node.id.clone(), footprint(node, text_width))
			})
			.collect();
	}
}
