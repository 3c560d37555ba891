use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::measure::LABEL_HEIGHT;
use super::state::FlowGraphState;
use super::types::{NodeStatus, Point};

pub const LABEL_FONT: &str = "12px sans-serif";

const BACKGROUND: &str = "#1a1a2e";
const LINK: &str = "rgba(100, 180, 255, 0.6)";

fn status_color(status: NodeStatus) -> &'static str {
	match status {
		NodeStatus::Success => "#2ca02c",
		NodeStatus::Warning => "#ff7f0e",
		NodeStatus::Error => "#d62728",
		NodeStatus::Running => "#1f77b4",
		NodeStatus::Pending => "#9467bd",
		NodeStatus::Disabled => "#7f7f7f",
		NodeStatus::Unknown => "#bcbd22",
	}
}

pub fn render(state: &FlowGraphState, ctx: &CanvasRenderingContext2d) {
	let viewport = state.viewport();
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, viewport.width, viewport.height);
	ctx.save();
	let _ = ctx.translate(viewport.pan_offset.x, viewport.pan_offset.y);
	let _ = ctx.scale(viewport.zoom_level, viewport.zoom_level);
	draw_links(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_links(state: &FlowGraphState, ctx: &CanvasRenderingContext2d) {
	let (model, visibility) = (state.model(), state.store().visibility());
	ctx.set_stroke_style_str(LINK);
	ctx.set_line_width(1.5 / state.zoom_level());

	for id in visibility.visible_ids(model) {
		let Some(parent) = model.parent(id) else {
			continue;
		};
		let (Some(from), Some(to)) = (state.display_position(parent), state.display_position(id)) else {
			continue;
		};
		ctx.begin_path();
		ctx.move_to(from.x, from.y);
		ctx.line_to(to.x, to.y);
		ctx.stroke();
	}
}

fn draw_nodes(state: &FlowGraphState, ctx: &CanvasRenderingContext2d) {
	let (model, visibility) = (state.model(), state.store().visibility());
	let k = state.zoom_level();
	let dragged = state.dragged_node();

	ctx.set_font(LABEL_FONT);
	ctx.set_text_align("center");
	for id in visibility.visible_ids(model) {
		let (Some(entry), Some(Point { x, y })) = (model.entry(id), state.display_position(id)) else {
			continue;
		};
		let node = &entry.node;
		let radius = (node.size / 2.0).max(2.0);

		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(status_color(node.status));
		ctx.fill();

		// Collapsed branch: dashed ring around the node.
		if entry.has_children && !visibility.children_visible(model, id) {
			ctx.set_stroke_style_str("rgba(255, 255, 255, 0.7)");
			ctx.set_line_width(1.5 / k);
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(4.0 / k),
				&JsValue::from_f64(3.0 / k),
			));
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + 4.0 / k, 0.0, 2.0 * PI);
			ctx.stroke();
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}

		if let Some(status) = entry.child_status {
			let badge = (radius * 0.35).max(3.0);
			let (bx, by) = (x + radius * 0.7, y - radius * 0.7);
			ctx.begin_path();
			let _ = ctx.arc(bx, by, badge, 0.0, 2.0 * PI);
			ctx.set_fill_style_str(status_color(status));
			ctx.fill();
			ctx.set_stroke_style_str(BACKGROUND);
			ctx.set_line_width(1.0 / k);
			ctx.stroke();
		}

		if dragged == Some(id.as_str()) {
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + 2.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str("white");
			ctx.set_line_width(1.5 / k);
			ctx.stroke();
		}

		if let Some(name) = &node.name {
			ctx.set_fill_style_str("rgba(255, 255, 255, 0.8)");
			let _ = ctx.fill_text(name, x, y + radius + LABEL_HEIGHT - 4.0);
		}
	}
}
