//! The `ProgressTrait` interface shared by the real progress bar and the no-op drain.

/// A trait defining the interface for progress indicators.
pub trait ProgressTrait: Send + Sync {
	/// Creates a new, uninitialized instance.
	fn new() -> Self
	where
		Self: Sized;

	/// Initializes the progress indicator with a message and maximum value.
	fn init(&mut self, message: &str, max_value: u64);

	/// Sets the absolute position of the progress.
	fn set_position(&mut self, value: u64);

	/// Increases the value of the progress by a given amount.
	fn inc(&mut self, value: u64);

	/// Finishes the progress.
	fn finish(&mut self);

	/// Removes the progress indicator from the terminal.
	fn remove(&mut self);
}
