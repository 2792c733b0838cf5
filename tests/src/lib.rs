//! # LaneGuard Test Suite
//!
//! ```text
//! tests/
//! ├── src/integration/   # End-to-end scenarios across crates
//! └── benches/           # Criterion benchmarks
//! ```
//!
//! ```bash
//! cargo test -p lg-tests
//! cargo bench -p lg-tests
//! ```

pub mod integration;
