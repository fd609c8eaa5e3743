//! # Event Relay Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Fan-out throughput
//! └── src/integration/  # Event bus → coordinator → client flows
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p relay-tests
//! cargo bench -p relay-tests
//! ```

pub mod integration;
