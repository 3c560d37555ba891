//! End-to-end behavior of one flow graph instance driven through its public
//! engine API with a manual scheduler.

use std::cell::RefCell;
use std::rc::Rc;

use flow_graph_canvas::components::flow_graph::interaction::PointerInput;
use flow_graph_canvas::components::flow_graph::measure::SizeMeasure;
use flow_graph_canvas::components::flow_graph::scheduler::{ManualScheduler, TimerKind};
use flow_graph_canvas::components::flow_graph::{FlowConfig, FlowGraphState, FlowNode, Point};

const ROOT_DIAMETER: f64 = 116.0;
const CHILD_DIAMETER: f64 = 75.0;
const SPACING: f64 = 25.0;

fn close(a: Point, b: Point) -> bool {
	a.distance(b) < 1e-6
}

fn engine() -> (FlowGraphState, Rc<RefCell<ManualScheduler>>) {
	let scheduler = ManualScheduler::shared();
	let mut state = FlowGraphState::new(
		FlowConfig::default(),
		Box::new(scheduler.clone()),
		Box::new(SizeMeasure::default()),
	);
	state.resize(800.0, 600.0);
	(state, scheduler)
}

fn base_nodes() -> Vec<FlowNode> {
	vec![
		FlowNode::root("root", 100.0),
		FlowNode::child("a", "root", 50.0),
		FlowNode::child("b", "root", 50.0),
	]
}

fn with_c() -> Vec<FlowNode> {
	let mut nodes = base_nodes();
	nodes.push(FlowNode::child("c", "a", 50.0));
	nodes
}

#[test]
fn scenario_a_initial_layout() {
	let (mut state, _) = engine();
	state.replace_graph(base_nodes()).unwrap();

	let root = state.display_position("root").unwrap();
	assert_eq!(root, Point::new(400.0, 300.0));

	let radius = ROOT_DIAMETER / 2.0 + SPACING + CHILD_DIAMETER / 2.0;
	assert!(close(state.display_position("a").unwrap(), root + Point::new(radius, 0.0)));
	assert!(close(state.display_position("b").unwrap(), root + Point::new(-radius, 0.0)));

	let change = state.toggle("a").unwrap();
	assert!(change.is_empty());
}

#[test]
fn scenario_b_expand_and_collapse_keep_records() {
	let (mut state, _) = engine();
	state.replace_graph(with_c()).unwrap();
	let visibility = state.store().visibility();
	assert!(visibility.is_visible("a"));
	assert!(!visibility.is_visible("c"));

	let change = state.toggle("a").unwrap();
	assert_eq!(change.shown, vec!["c"]);
	let a = state.display_position("a").unwrap();
	let radius = CHILD_DIAMETER / 2.0 + SPACING + CHILD_DIAMETER / 2.0;
	assert!(close(state.display_position("c").unwrap(), a + Point::new(radius, 0.0)));

	let change = state.toggle("a").unwrap();
	assert_eq!(change.hidden, vec!["c"]);
	assert!(!state.store().visibility().is_visible("c"));
	assert!(state.store().positions().get_position("c").is_some());
}

#[test]
fn scenario_c_drag_commits_only_the_moved_leaf() {
	let (mut state, _) = engine();
	state.replace_graph(base_nodes()).unwrap();

	let commits = Rc::new(RefCell::new(Vec::new()));
	let sink = commits.clone();
	state
		.events_mut()
		.on_position_commit(move |id, x, y| sink.borrow_mut().push((id.to_string(), Point::new(x, y))));

	let b = state.display_position("b").unwrap();
	let a = state.display_position("a").unwrap();
	state.pointer_down(PointerInput::new(b));
	state.pointer_move(PointerInput::new(b + Point::new(30.0, -20.0)));
	state.pointer_up(b + Point::new(30.0, -20.0));

	let commits = commits.borrow();
	assert_eq!(commits.len(), 1);
	assert_eq!(commits[0].0, "b");
	assert!(close(commits[0].1, b + Point::new(30.0, -20.0)));
	assert!(state.store().positions().is_explicit("b"));
	assert!(!state.store().positions().is_explicit("a"));
	assert_eq!(state.display_position("a"), Some(a));
}

#[test]
fn scenario_d_replacement_prunes_and_discloses() {
	let (mut state, _) = engine();
	state.replace_graph(base_nodes()).unwrap();
	assert!(state.store().positions().get_position("b").is_some());

	state
		.replace_graph(vec![FlowNode::root("root", 100.0), FlowNode::child("a", "root", 50.0)])
		.unwrap();
	assert!(state.store().positions().get_position("b").is_none());
	assert!(!state.store().visibility().is_visible("b"));

	state
		.replace_graph(vec![
			FlowNode::root("root", 100.0),
			FlowNode::child("a", "root", 50.0),
			FlowNode::child("d", "a", 50.0),
		])
		.unwrap();
	assert!(state.store().visibility().is_visible("d"));
	assert!(state.display_position("d").is_some());
}

#[test]
fn single_click_on_a_branch_toggles_it_after_the_window() {
	let (mut state, scheduler) = engine();
	state.replace_graph(with_c()).unwrap();
	let a = state.display_position("a").unwrap();

	state.pointer_down(PointerInput::new(a));
	state.pointer_up(a);
	assert!(!state.store().visibility().is_visible("c"));

	scheduler.borrow_mut().expire(TimerKind::Click);
	state.on_timer(TimerKind::Click);
	assert!(state.store().visibility().is_visible("c"));
}

#[test]
fn double_click_activates_with_the_reference() {
	let (mut state, scheduler) = engine();
	let mut nodes = with_c();
	nodes[1] = FlowNode::child("a", "root", 50.0).with_reference("job-a");
	state.replace_graph(nodes).unwrap();

	let activated = Rc::new(RefCell::new(Vec::new()));
	let sink = activated.clone();
	state
		.events_mut()
		.on_node_activated(move |reference| sink.borrow_mut().push(reference.to_string()));

	let a = state.display_position("a").unwrap();
	state.pointer_down(PointerInput::new(a));
	state.pointer_up(a);
	state.pointer_down(PointerInput::new(a));
	state.pointer_up(a);

	assert_eq!(*activated.borrow(), vec!["job-a"]);
	assert!(!scheduler.borrow().has_timer(TimerKind::Click));
	assert!(!state.store().visibility().is_visible("c"));
}

#[test]
fn snapshot_survives_a_new_instance() {
	let (mut state, _) = engine();
	state.replace_graph(with_c()).unwrap();
	state.toggle("a").unwrap();
	state.zoom_in();
	let json = state.snapshot().to_json().unwrap();

	let (mut restored, _) = engine();
	restored.restore(flow_graph_canvas::components::flow_graph::FlowSnapshot::from_json(&json).unwrap());
	restored.replace_graph(with_c()).unwrap();

	assert!(restored.store().visibility().is_visible("c"));
	assert_eq!(restored.zoom_level(), state.zoom_level());
	assert_eq!(restored.display_position("c"), state.display_position("c"));
}

#[test]
fn hard_reset_returns_to_the_initial_disclosure() {
	let (mut state, _) = engine();
	state.replace_graph(with_c()).unwrap();
	state.toggle("a").unwrap();
	let b = state.display_position("b").unwrap();
	state.pointer_down(PointerInput::new(b).solo());
	state.pointer_move(PointerInput::new(b + Point::new(50.0, 0.0)));
	state.pointer_up(b + Point::new(50.0, 0.0));
	assert!(state.store().positions().is_explicit("b"));

	state.hard_reset();
	assert!(!state.store().visibility().is_visible("c"));
	assert!(!state.store().positions().is_explicit("b"));
	assert_eq!(state.zoom_level(), 1.0);
}

#[test]
fn toggling_a_collapsed_grandchild_reveals_nothing() {
	let (mut state, _) = engine();
	let mut nodes = with_c();
	nodes.push(FlowNode::child("cx", "c", 50.0));
	state.replace_graph(nodes).unwrap();

	let change = state.toggle("c").unwrap();
	assert!(change.is_empty());
	assert!(!state.store().visibility().is_visible("cx"));
	assert!(state.display_position("cx").is_none());
}

#[test]
fn stale_snapshot_cannot_show_children_of_hidden_nodes() {
	let (mut state, _) = engine();
	state.restore(flow_graph_canvas::components::flow_graph::FlowSnapshot {
		visibility: vec!["root".into(), "a".into(), "b".into(), "cx".into()],
		..Default::default()
	});
	let mut nodes = with_c();
	nodes.push(FlowNode::child("cx", "c", 50.0));
	state.replace_graph(nodes).unwrap();

	let visibility = state.store().visibility();
	assert!(!visibility.is_visible("c"));
	assert!(!visibility.is_visible("cx"));
	for id in visibility.visible_ids(state.model()) {
		assert!(state.display_position(id).is_some(), "{id} has no position");
	}
}
