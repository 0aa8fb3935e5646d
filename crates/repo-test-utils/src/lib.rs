//! Shared test utilities for the repository installer workspace.
//!
//! This crate provides standardised fixtures so engine tests do not each
//! build their own content tree and installer double. It is a
//! dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`content`]: [`TestContent`] and [`TestDisk`] seeding install folders
//! - [`installer`]: [`MockInstaller`] recording every installer call

pub mod content;
pub mod installer;

pub use content::{FAKE_CONFIGS, FAKE_RESOURCES, TestContent, TestDisk};
pub use installer::MockInstaller;
