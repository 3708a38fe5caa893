/// Execution classes used for worker scheduling and observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Async resource reads; may park on I/O for a long time.
	Io,
	/// CPU-bound blocking work such as resolving tag data against a registry.
	Cpu,
	/// Orchestration tasks that only await other tasks.
	Background,
}

impl TaskClass {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Io => "io",
			Self::Cpu => "cpu",
			Self::Background => "background",
		}
	}
}
