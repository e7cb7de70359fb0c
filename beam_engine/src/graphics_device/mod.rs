/// Graphics device module - the immediate-mode API the engine drives

// Module declarations
pub mod graphics_device;

// Re-export everything from graphics_device.rs
pub use graphics_device::*;

// Mock graphics device for tests (no GPU required). Public so integration
// tests and downstream crates can drive the engine headless.
pub mod mock_graphics_device;
