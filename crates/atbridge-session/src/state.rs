/// Default radio access technology setting.
pub const DEFAULT_RAT: &str = "0,0";

/// Values carried across cycles within one bridge session.
///
/// Currently one value: the last radio access technology setting the host
/// requested, cached so queries can be answered without contacting the
/// modem. Re-created with defaults every time a new session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    rat: String,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            rat: DEFAULT_RAT.to_string(),
        }
    }

    /// Last requested radio access technology setting.
    pub fn rat(&self) -> &str {
        &self.rat
    }

    pub fn set_rat(&mut self, value: impl Into<String>) {
        self.rat = value.into();
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
