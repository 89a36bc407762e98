//! Configuration

/// Owned-string serialization settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializerConfig {
    /// First buffer tried by [`Element::outer_html`](crate::Element::outer_html)
    pub initial_buffer_size: usize,
    /// The buffer doubles on truncation until it would exceed this
    pub max_buffer_size: usize,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            initial_buffer_size: 2 * 1024 * 1024,
            max_buffer_size: 256 * 1024 * 1024,
        }
    }
}

/// Host bridge settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeConfig {
    pub serializer: SerializerConfig,
}
