//! Outbound notifications of a flow graph instance.

use super::scheduler::{Scheduler, TimerHandle, TimerKind};

type VisibilityListener = Box<dyn FnMut(&str, bool)>;
type CommitListener = Box<dyn FnMut(&str, f64, f64)>;
type ActivationListener = Box<dyn FnMut(&str)>;
type ChangeListener = Box<dyn FnMut()>;

#[derive(Default)]
pub struct FlowEvents {
	visibility: Vec<VisibilityListener>,
	commit: Vec<CommitListener>,
	activated: Vec<ActivationListener>,
	change: Vec<ChangeListener>,
}

impl FlowEvents {
	pub fn on_visibility_change(&mut self, listener: impl FnMut(&str, bool) + 'static) {
		self.visibility.push(Box::new(listener));
	}

	pub fn on_position_commit(&mut self, listener: impl FnMut(&str, f64, f64) + 'static) {
		self.commit.push(Box::new(listener));
	}

	/// Fired on double-click with the node's external reference id.
	pub fn on_node_activated(&mut self, listener: impl FnMut(&str) + 'static) {
		self.activated.push(Box::new(listener));
	}

	/// Debounced: fires once after a quiet period following any change.
	pub fn on_change(&mut self, listener: impl FnMut() + 'static) {
		self.change.push(Box::new(listener));
	}

	pub(crate) fn emit_visibility(&mut self, id: &str, visible: bool) {
		for listener in &mut self.visibility {
			listener(id, visible);
		}
	}

	pub(crate) fn emit_commit(&mut self, id: &str, x: f64, y: f64) {
		for listener in &mut self.commit {
			listener(id, x, y);
		}
	}

	pub(crate) fn emit_activated(&mut self, reference: &str) {
		for listener in &mut self.activated {
			listener(reference);
		}
	}

	pub(crate) fn emit_change(&mut self) {
		for listener in &mut self.change {
			listener();
		}
	}

	/// Detaches every listener.
	pub fn clear(&mut self) {
		self.visibility.clear();
		self.commit.clear();
		self.activated.clear();
		self.change.clear();
	}
}

/// Trailing-edge debounce on top of the injected scheduler.
#[derive(Debug)]
pub struct ChangeDebouncer {
	delay_ms: u32,
	pending: Option<TimerHandle>,
}

impl ChangeDebouncer {
	pub fn new(delay_ms: u32) -> Self {
		Self {
			delay_ms,
			pending: None,
		}
	}

	/// Restarts the quiet period.
	pub fn touch(&mut self, scheduler: &mut dyn Scheduler) {
		if let Some(handle) = self.pending.take() {
			scheduler.clear_timeout(handle);
		}
		self.pending = Some(scheduler.set_timeout(TimerKind::Change, self.delay_ms));
	}

	/// The quiet period ended; true if a change was actually pending.
	pub fn fire(&mut self) -> bool {
		self.pending.take().is_some()
	}

	pub fn cancel(&mut self, scheduler: &mut dyn Scheduler) {
		if let Some(handle) = self.pending.take() {
			scheduler.clear_timeout(handle);
		}
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;
	use crate::components::flow_graph::scheduler::ManualScheduler;

	#[test]
	fn debouncer_keeps_a_single_timer() {
		let mut scheduler = ManualScheduler::default();
		let mut debouncer = ChangeDebouncer::new(1000);
		debouncer.touch(&mut scheduler);
		debouncer.touch(&mut scheduler);
		debouncer.touch(&mut scheduler);

		assert_eq!(scheduler.pending_timers().len(), 1);
		assert!(debouncer.fire());
		assert!(!debouncer.fire());
	}

	#[test]
	fn cleared_events_stop_notifying() {
		let seen = Rc::new(RefCell::new(Vec::new()));
		let mut events = FlowEvents::default();
		let sink = seen.clone();
		events.on_node_activated(move |reference| sink.borrow_mut().push(reference.to_string()));

		events.emit_activated("ref-1");
		events.clear();
		events.emit_activated("ref-2");
		assert_eq!(*seen.borrow(), vec!["ref-1"]);
	}
}
