//! Integration test crate for Flying Sesame.
//!
//! Holds cross-crate tests that drive the acquisition loop against the
//! simulated devices and check what lands on disk.

#[cfg(test)]
mod support;

#[cfg(test)]
mod recording;

#[cfg(test)]
mod extraction;
