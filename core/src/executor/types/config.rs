/// Presentation options for one `execute` call.
#[derive(Debug, Clone)]
pub struct ExecutionOpts {
    /// Output stream format: "text" or "jsonl"
    pub stream_format: String,

    /// Print the plan and per-job start lines
    pub verbose: bool,

    /// ASCII-only markers (no Unicode)
    pub ascii: bool,

    /// Visual progress bars (never combined with jsonl output)
    pub progress_bar: bool,
}

impl ExecutionOpts {
    pub fn new(stream_format: impl Into<String>) -> Self {
        Self {
            stream_format: stream_format.into(),
            ..Self::default()
        }
    }

    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress_bar = enabled && !self.is_jsonl();
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn is_jsonl(&self) -> bool {
        self.stream_format == "jsonl"
    }
}

impl Default for ExecutionOpts {
    fn default() -> Self {
        Self {
            stream_format: "text".to_string(),
            verbose: false,
            ascii: false,
            progress_bar: false,
        }
    }
}
