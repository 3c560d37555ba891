use std::cell::RefCell;
use std::rc::{Rc, Weak};

use leptos::prelude::*;
use log::{error, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::browser::{BrowserScheduler, CanvasMeasure};
use super::config::FlowConfig;
use super::interaction::PointerInput;
use super::persist;
use super::render;
use super::scheduler::TimerKind;
use super::state::FlowGraphState;
use super::types::{FlowNode, Point};

type SharedState = Rc<RefCell<Option<FlowGraphState>>>;
type SharedClosure = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

fn pointer_input(ev: &MouseEvent) -> PointerInput {
	PointerInput {
		client: Point::new(ev.client_x() as f64, ev.client_y() as f64),
		primary: ev.buttons() & 1 == 1,
		solo: ev.alt_key(),
	}
}

fn window_size(window: &Window) -> (f64, f64) {
	let read = |value: Result<JsValue, JsValue>, fallback: f64| {
		value.ok().and_then(|v| v.as_f64()).unwrap_or(fallback)
	};
	(read(window.inner_width(), 800.0), read(window.inner_height(), 600.0))
}

/// The canvas may have moved on the page since the last event.
fn sync_page_offset(canvas_ref: NodeRef<leptos::html::Canvas>, state: &mut FlowGraphState) {
	if let Some(canvas) = canvas_ref.get_untracked() {
		let rect = canvas.get_bounding_client_rect();
		state.set_page_offset(Point::new(rect.left(), rect.top()));
	}
}

/// Runs `f` against the live engine, if any.
fn with_state<R>(state: &SharedState, f: impl FnOnce(&mut FlowGraphState) -> R) -> Option<R> {
	state.borrow_mut().as_mut().map(f)
}

#[component]
pub fn FlowGraphCanvas(
	#[prop(into)] data: Signal<Vec<FlowNode>>,
	#[prop(optional)] config: FlowConfig,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	/// Keep expand state, positions and viewport in localStorage.
	#[prop(default = true)]
	persist: bool,
	/// Double click on a node, with its reference id.
	#[prop(optional, into)]
	on_node_activated: Option<Callback<String>>,
	/// Debounced notification after any state change.
	#[prop(optional, into)]
	on_change: Option<Callback<()>>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let resize_cb: SharedClosure = Rc::new(RefCell::new(None));
	let zoom_level = RwSignal::new(1.0_f64);
	let storage_key = config.storage_key();
	let (state_init, resize_cb_init, key_init) = (state.clone(), resize_cb.clone(), storage_key.clone());

	Effect::new(move |_| {
		let nodes = data.get();
		if state_init.borrow().is_none() {
			let Some(canvas) = canvas_ref.get() else {
				return;
			};
			let canvas: HtmlCanvasElement = canvas.into();
			mount(
				&state_init,
				&resize_cb_init,
				&canvas,
				MountOptions {
					config: config.clone(),
					fullscreen,
					width,
					height,
					persist,
					storage_key: key_init.clone(),
					zoom_level,
					on_node_activated,
					on_change,
				},
			);
		}
		with_state(&state_init, |s| {
			// Rejections are logged by the engine; the old graph stays.
			let _ = s.replace_graph(nodes);
		});
	});

	let cleanup = StoredValue::new_local((state.clone(), resize_cb.clone()));
	on_cleanup(move || {
		cleanup.try_with_value(|(state, resize_cb)| {
			with_state(state, FlowGraphState::teardown);
			if let (Some(cb), Some(window)) = (resize_cb.borrow_mut().take(), web_sys::window()) {
				let _ = window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
			state.borrow_mut().take();
		});
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		let input = pointer_input(&ev);
		with_state(&state_md, |s| {
			sync_page_offset(canvas_ref, s);
			s.pointer_down(input);
		});
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let input = pointer_input(&ev);
		with_state(&state_mm, |s| s.pointer_move(input));
	};

	let state_mu = state.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let client = Point::new(ev.client_x() as f64, ev.client_y() as f64);
		with_state(&state_mu, |s| s.pointer_up(client));
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		with_state(&state_ml, FlowGraphState::pointer_leave);
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		let client = Point::new(ev.client_x() as f64, ev.client_y() as f64);
		let modifier = ev.ctrl_key() || ev.meta_key();
		let handled = with_state(&state_wh, |s| {
			sync_page_offset(canvas_ref, s);
			s.wheel(client, ev.delta_y(), modifier)
		});
		if handled == Some(true) {
			ev.prevent_default();
		}
	};

	let toolbar = move |state: SharedState, action: fn(&mut FlowGraphState)| {
		move |_: MouseEvent| {
			if let Some(level) = with_state(&state, |s| {
				action(s);
				s.zoom_level()
			}) {
				zoom_level.set(level);
			}
		}
	};
	let on_zoom_in = toolbar(state.clone(), |s| {
		s.zoom_in();
	});
	let on_zoom_out = toolbar(state.clone(), |s| {
		s.zoom_out();
	});
	let on_center = toolbar(state.clone(), FlowGraphState::center);
	let state_reset = state.clone();
	let on_reset = move |_: MouseEvent| {
		persist::clear_snapshot(&storage_key);
		if let Some(level) = with_state(&state_reset, |s| {
			s.hard_reset();
			s.zoom_level()
		}) {
			zoom_level.set(level);
		}
	};

	view! {
		<div class="flow-graph" style="position: relative;">
			<canvas
				node_ref=canvas_ref
				class="flow-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			<div class="flow-graph-toolbar">
				<button title="Zoom in" on:click=on_zoom_in>"+"</button>
				<span class="flow-graph-zoom">{move || format!("{:.0}%", zoom_level.get() * 100.0)}</span>
				<button title="Zoom out" on:click=on_zoom_out>"-"</button>
				<button title="Center" on:click=on_center>"Center"</button>
				<button title="Reset layout" on:click=on_reset>"Reset"</button>
			</div>
		</div>
	}
}

struct MountOptions {
	config: FlowConfig,
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
	persist: bool,
	storage_key: String,
	zoom_level: RwSignal<f64>,
	on_node_activated: Option<Callback<String>>,
	on_change: Option<Callback<()>>,
}

/// Builds the engine for `canvas` and wires its timers, frames and the
/// window resize listener.
fn mount(state: &SharedState, resize_cb: &SharedClosure, canvas: &HtmlCanvasElement, options: MountOptions) {
	let Some(window) = web_sys::window() else {
		error!("flow graph: no window");
		return;
	};

	let (w, h) = if options.fullscreen {
		window_size(&window)
	} else {
		let parent = canvas.parent_element();
		(
			options
				.width
				.unwrap_or_else(|| parent.as_ref().map(|p| p.client_width() as f64).unwrap_or(800.0)),
			options
				.height
				.unwrap_or_else(|| parent.as_ref().map(|p| p.client_height() as f64).unwrap_or(600.0)),
		)
	};
	canvas.set_width(w as u32);
	canvas.set_height(h as u32);

	let Some(ctx) = canvas
		.get_context("2d")
		.ok()
		.flatten()
		.and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
	else {
		error!("flow graph: no 2d context");
		return;
	};

	let scheduler = BrowserScheduler::new(
		window.clone(),
		timer_callback(Rc::downgrade(state), options.persist, options.storage_key.clone()),
		frame_callback(Rc::downgrade(state), ctx.clone(), options.zoom_level),
	);
	let mut engine = FlowGraphState::new(options.config, Box::new(scheduler), Box::new(CanvasMeasure::new(ctx)));
	engine.resize(w, h);
	let rect = canvas.get_bounding_client_rect();
	engine.set_page_offset(Point::new(rect.left(), rect.top()));

	if let Some(callback) = options.on_node_activated {
		engine.events_mut().on_node_activated(move |reference| callback.run(reference.to_string()));
	}
	if let Some(callback) = options.on_change {
		engine.events_mut().on_change(move || callback.run(()));
	}
	if options.persist {
		if let Some(snapshot) = persist::load_snapshot(&options.storage_key) {
			engine.restore(snapshot);
			options.zoom_level.set(engine.zoom_level());
		}
	}
	*state.borrow_mut() = Some(engine);

	if options.fullscreen {
		let (state_resize, canvas_resize) = (Rc::downgrade(state), canvas.clone());
		*resize_cb.borrow_mut() = Some(Closure::new(move || {
			let Some(win) = web_sys::window() else {
				return;
			};
			let (nw, nh) = window_size(&win);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			if let Some(state) = state_resize.upgrade() {
				with_state(&state, |s| s.resize(nw, nh));
			}
		}));
		if let Some(ref cb) = *resize_cb.borrow() {
			if window
				.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref())
				.is_err()
			{
				warn!("flow graph: resize listener not attached");
			}
		}
	}
}

fn timer_callback(
	state: Weak<RefCell<Option<FlowGraphState>>>,
	persist: bool,
	key: String,
) -> impl Fn(TimerKind) + 'static {
	move |kind| {
		let Some(state) = state.upgrade() else {
			return;
		};
		let snapshot = with_state(&state, |s| s.on_timer(kind).then(|| s.snapshot())).flatten();
		if let (true, Some(snapshot)) = (persist, snapshot) {
			persist::save_snapshot(&key, &snapshot);
		}
	}
}

fn frame_callback(
	state: Weak<RefCell<Option<FlowGraphState>>>,
	ctx: CanvasRenderingContext2d,
	zoom_level: RwSignal<f64>,
) -> impl Fn() + 'static {
	move || {
		let Some(state) = state.upgrade() else {
			return;
		};
		let level = with_state(&state, |s| {
			s.on_animation_frame();
			render::render(s, &ctx);
			s.zoom_level()
		});
		if let Some(level) = level {
			if zoom_level.get_untracked() != level {
				zoom_level.set(level);
			}
		}
	}
}
