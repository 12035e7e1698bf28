#![doc = "cf-release-core: core logic library for cf-release."]

//! This crate contains all pipeline logic, API models and trait seams for
//! cf-release: fetching the latest addon files from CurseForge and
//! republishing them as a GitHub release with a packager-compatible
//! `release.json` manifest.
//!
//! # Usage
//! Add this as a dependency for all shared fetch, manifest, changelog and
//! pipeline code. The CLI crate supplies the concrete GitHub publisher.

pub mod changelog;
pub mod contract;
pub mod curseforge;
pub mod flavor;
pub mod manifest;
pub mod pipeline;
