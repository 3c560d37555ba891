//! Discrete zoom levels.

use super::config::ZoomConfig;

fn round2(value: f64) -> f64 {
	(value * 100.0).round() / 100.0
}

/// `first`, then `first + i * step` up to and including `last`.
pub fn generate_steps(first: f64, last: f64, step: f64) -> Vec<f64> {
	let mut steps = vec![round2(first)];
	if step <= 0.0 || last <= first {
		return steps;
	}
	let count = ((last - first) / step).ceil() as usize;
	for i in 1..=count {
		steps.push(round2((first + i as f64 * step).min(last)));
	}
	steps.dedup();
	steps
}

/// Level closest to `goal`; the earlier level wins a tie.
pub fn closest_step(levels: &[f64], goal: f64) -> Option<f64> {
	levels.iter().copied().reduce(|prev, curr| {
		if (curr - goal).abs() < (prev - goal).abs() {
			curr
		} else {
			prev
		}
	})
}

#[derive(Clone, Debug, PartialEq)]
pub struct ZoomScale {
	min: f64,
	max: f64,
	step: f64,
	levels: Vec<f64>,
}

impl ZoomScale {
	pub fn new(config: &ZoomConfig) -> Self {
		let (min, max) = if config.min <= config.max {
			(config.min, config.max)
		} else {
			(config.max, config.min)
		};
		Self {
			min,
			max,
			step: config.step,
			levels: generate_steps(min, max, config.step),
		}
	}

	pub fn levels(&self) -> &[f64] {
		&self.levels
	}

	pub fn min(&self) -> f64 {
		self.min
	}

	pub fn max(&self) -> f64 {
		self.max
	}

	/// Snaps an arbitrary level onto the scale.
	pub fn snap(&self, level: f64) -> f64 {
		let clamped = level.clamp(self.min, self.max);
		round2(closest_step(&self.levels, clamped).unwrap_or(clamped))
	}

	/// One button press: `direction` is +1 to zoom in, -1 to zoom out.
	pub fn step_from(&self, current: f64, direction: i32) -> f64 {
		self.snap(current + self.step * direction.signum() as f64)
	}

	/// Modifier + wheel: `current + delta_y / 100` snapped onto the scale.
	/// Positive `delta_y` (scrolling down) zooms in.
	pub fn from_wheel(&self, current: f64, delta_y: f64) -> f64 {
		self.snap(current + delta_y / 100.0)
	}
}

impl Default for ZoomScale {
	fn default() -> Self {
		Self::new(&ZoomConfig::default())
	}
}
