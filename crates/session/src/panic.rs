use std::any::Any;

/// Extracts a readable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(message) = payload.downcast_ref::<&str>() {
		(*message).to_string()
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.clone()
	} else {
		"unknown panic payload".to_string()
	}
}

/// Runs `f`, converting a panic into an error carrying the panic message.
pub(crate) fn catch_fault<T>(f: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
	match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
		Ok(result) => result,
		Err(payload) => Err(anyhow::anyhow!("panicked: {}", panic_message(&*payload))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn extracts_static_str_payload() {
		let payload = std::panic::catch_unwind(|| panic!("boom-str")).unwrap_err();
		assert_eq!(panic_message(&*payload), "boom-str");
	}

	#[test]
	fn extracts_string_payload() {
		let payload = std::panic::catch_unwind(|| panic!("{}", String::from("boom-string"))).unwrap_err();
		assert_eq!(panic_message(&*payload), "boom-string");
	}

	#[test]
	fn catch_fault_passes_errors_through() {
		let err = catch_fault::<()>(|| Err(anyhow::anyhow!("plain"))).unwrap_err();
		assert_eq!(err.to_string(), "plain");
	}

	#[test]
	fn catch_fault_converts_panics() {
		let err = catch_fault::<()>(|| panic!("exploded")).unwrap_err();
		assert!(err.to_string().contains("exploded"), "got: {err}");
	}
}
