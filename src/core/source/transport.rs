//! Transport settings shared by every remote fetch of one invocation.

/// Environment switch read by the KCL package tooling to talk plain HTTP to OCI registries.
pub const PLAIN_HTTP_ENV: &str = "OCI_REG_PLAIN_HTTP";
const ON: &str = "on";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportOptions {
    /// Allow plaintext transport for remote sources. Opt-in only.
    pub insecure: bool,
}

impl TransportOptions {
    pub fn insecure() -> Self {
        Self { insecure: true }
    }

    /// Environment pairs a child process needs to honour these options.
    pub fn child_env(&self) -> Vec<(String, String)> {
        if self.insecure {
            vec![(PLAIN_HTTP_ENV.to_string(), ON.to_string())]
        } else {
            Vec::new()
        }
    }
}

/// Turn on plain HTTP for the whole process when `options` asks for it.
///
/// This is process-wide, last-writer-wins state: concurrent invocations with different
/// settings race on it. Collaborators should prefer the per-call [`TransportOptions`].
pub fn apply_process_toggle(options: &TransportOptions) {
    if options.insecure {
        tracing::warn!(
            env = PLAIN_HTTP_ENV,
            "insecure source transport enabled for this process"
        );
        std::env::set_var(PLAIN_HTTP_ENV, ON);
    }
}
