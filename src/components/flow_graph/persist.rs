//! Snapshot persistence in `localStorage`.

use log::{debug, warn};
use web_sys::Storage;

use super::store::FlowSnapshot;

fn local_storage() -> Option<Storage> {
	web_sys::window()?.local_storage().ok().flatten()
}

/// Stored snapshot under `key`; unreadable entries are ignored.
pub fn load_snapshot(key: &str) -> Option<FlowSnapshot> {
	let raw = local_storage()?.get_item(key).ok().flatten()?;
	match FlowSnapshot::from_json(&raw) {
		Ok(snapshot) => {
			debug!("restored {key}");
			Some(snapshot)
		}
		Err(err) => {
			warn!("ignoring stored {key}: {err}");
			None
		}
	}
}

pub fn save_snapshot(key: &str, snapshot: &FlowSnapshot) {
	let Some(storage) = local_storage() else {
		return;
	};
	match snapshot.to_json() {
		Ok(json) => {
			if let Err(err) = storage.set_item(key, &json) {
				warn!("could not persist {key}: {err:?}");
			}
		}
		Err(err) => warn!("could not encode {key}: {err}"),
	}
}

pub fn clear_snapshot(key: &str) {
	if let Some(storage) = local_storage() {
		let _ = storage.remove_item(key);
	}
}
