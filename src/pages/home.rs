use leptos::prelude::*;
use log::info;

use crate::components::flow_graph::{FlowConfig, FlowGraphCanvas, FlowNode, NodeStatus};

const STATUSES: &[NodeStatus] = &[
	NodeStatus::Success,
	NodeStatus::Success,
	NodeStatus::Running,
	NodeStatus::Success,
	NodeStatus::Warning,
	NodeStatus::Pending,
	NodeStatus::Success,
	NodeStatus::Error,
	NodeStatus::Disabled,
	NodeStatus::Unknown,
];

/// Sample process tree: every step hangs off an earlier one.
fn generate_sample_flow(n: usize) -> Vec<FlowNode> {
	let mut nodes = vec![FlowNode::root("0", 60.0).with_name("Pipeline").with_status(NodeStatus::Running)];
	nodes.extend((1..n).map(|i| {
		let parent = (rand_simple(i) * (i as f64)) as usize;
		let size = 20.0 + 30.0 * rand_simple(i * 7);
		FlowNode::child(i.to_string(), parent.to_string(), size.round())
			.with_name(format!("Step {i}"))
			.with_status(STATUSES[i % STATUSES.len()])
			.with_reference(format!("job-{i}"))
	}));
	nodes
}

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let flow = Signal::derive(move || generate_sample_flow(60));
	let config = FlowConfig {
		graph_id: "demoFlow".into(),
		auto_center: true,
		..FlowConfig::default()
	};
	let (activated, set_activated) = signal(None::<String>);
	let on_node_activated = Callback::new(move |reference: String| {
		info!("activated {reference}");
		set_activated.set(Some(reference));
	});

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<FlowGraphCanvas data=flow config=config fullscreen=true on_node_activated=on_node_activated />
				<div class="graph-overlay">
					<h1>"Flow Graph"</h1>
					<p class="subtitle">
						"Click a node to expand it. Double-click to open. Drag to move a node with its children, Alt-drag to move it alone. Ctrl+scroll to zoom."
					</p>
					<p class="subtitle">{move || activated.get().map(|r| format!("Last opened: {r}"))}</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
