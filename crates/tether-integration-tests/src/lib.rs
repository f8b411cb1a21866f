//! Cross-crate scenarios for the governance layer.
//!
//! Everything lives under `tests/`: each file drives a [`tether_runtime`]
//! governor through `tether-test`'s harness and checks what lands on disk.

#![deny(unsafe_code)]
#![warn(missing_docs)]
