//! Timers and animation frames, injected so the engine stays free of any
//! event-loop specifics.

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
	/// Click/double-click disambiguation window.
	Click,
	/// Quiet period of the debounced change notification.
	Change,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub i32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

/// Single-threaded scheduling capability.
///
/// The owner of the engine routes expired timers to `on_timer` and frame
/// callbacks to `on_animation_frame`.
pub trait Scheduler {
	fn set_timeout(&mut self, kind: TimerKind, delay_ms: u32) -> TimerHandle;
	fn clear_timeout(&mut self, handle: TimerHandle);
	fn request_frame(&mut self) -> FrameHandle;
	fn cancel_frame(&mut self, handle: FrameHandle);
	/// Releases every callback the scheduler holds.
	fn detach(&mut self) {}
}

impl<S> Scheduler for Rc<RefCell<S>>
where
	S: Scheduler + ?Sized,
{
	fn set_timeout(&mut self, kind: TimerKind, delay_ms: u32) -> TimerHandle {
		self.borrow_mut().set_timeout(kind, delay_ms)
	}

	fn clear_timeout(&mut self, handle: TimerHandle) {
		self.borrow_mut().clear_timeout(handle)
	}

	fn request_frame(&mut self) -> FrameHandle {
		self.borrow_mut().request_frame()
	}

	fn cancel_frame(&mut self, handle: FrameHandle) {
		self.borrow_mut().cancel_frame(handle)
	}

	fn detach(&mut self) {
		self.borrow_mut().detach()
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingTimer {
	pub handle: TimerHandle,
	pub kind: TimerKind,
	pub delay_ms: u32,
}

/// Scheduler that only records requests; time advances when the owner
/// fires them. Used by tests and headless hosts.
#[derive(Debug, Default)]
pub struct ManualScheduler {
	next: i32,
	timers: Vec<PendingTimer>,
	frames: Vec<FrameHandle>,
	detached: bool,
}

impl ManualScheduler {
	pub fn shared() -> Rc<RefCell<Self>> {
		Rc::new(RefCell::new(Self::default()))
	}

	pub fn pending_timers(&self) -> &[PendingTimer] {
		&self.timers
	}

	pub fn has_timer(&self, kind: TimerKind) -> bool {
		self.timers.iter().any(|timer| timer.kind == kind)
	}

	pub fn pending_frames(&self) -> usize {
		self.frames.len()
	}

	pub fn is_detached(&self) -> bool {
		self.detached
	}

	/// Removes the oldest timer of `kind`; the caller then delivers it.
	pub fn expire(&mut self, kind: TimerKind) -> Option<PendingTimer> {
		let index = self.timers.iter().position(|timer| timer.kind == kind)?;
		Some(self.timers.remove(index))
	}

	/// Removes all frame requests, returning whether there were any.
	pub fn take_frames(&mut self) -> bool {
		let any = !self.frames.is_empty();
		self.frames.clear();
		any
	}

	fn allocate(&mut self) -> i32 {
		self.next += 1;
		self.next
	}
}

impl Scheduler for ManualScheduler {
	fn set_timeout(&mut self, kind: TimerKind, delay_ms: u32) -> TimerHandle {
		let handle = TimerHandle(self.allocate());
		self.timers.push(PendingTimer {
			handle,
			kind,
			delay_ms,
		});
		handle
	}

	fn clear_timeout(&mut self, handle: TimerHandle) {
		self.timers.retain(|timer| timer.handle != handle);
	}

	fn request_frame(&mut self) -> FrameHandle {
		let handle = FrameHandle(self.allocate());
		self.frames.push(handle);
		handle
	}

	fn cancel_frame(&mut self, handle: FrameHandle) {
		self.frames.retain(|frame| *frame != handle);
	}

	fn detach(&mut self) {
		self.detached = true;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cleared_timers_never_expire() {
		let mut scheduler = ManualScheduler::default();
		let click = scheduler.set_timeout(TimerKind::Click, 300);
		scheduler.set_timeout(TimerKind::Change, 1000);
		scheduler.clear_timeout(click);

		assert!(!scheduler.has_timer(TimerKind::Click));
		assert_eq!(scheduler.expire(TimerKind::Change).map(|t| t.delay_ms), Some(1000));
		assert!(scheduler.pending_timers().is_empty());
	}

	#[test]
	fn shared_handle_forwards_requests() {
		let shared = ManualScheduler::shared();
		let mut handle = shared.clone();
		let frame = handle.request_frame();
		assert_eq!(shared.borrow().pending_frames(), 1);
		handle.cancel_frame(frame);
		assert!(!shared.borrow_mut().take_frames());
	}
}
