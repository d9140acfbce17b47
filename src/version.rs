/// Crate version reported by the binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
