//! Errors returned by the config-driven constructors.

/// Error returned when a configuration value is out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A hash ring needs at least one virtual point per node.
    #[error("replica count must be greater than zero")]
    ZeroReplicas,

    /// An explicit shard count of zero leaves no place to store entries.
    #[error("shard count must be greater than zero")]
    ZeroShards,
}
