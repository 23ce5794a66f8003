//! Consolidated test utilities for git-syncd
//!
//! Real repositories for executor and CLI tests, plus a scripted executor
//! for exercising session ordering without touching the toolchain.

pub mod assertions;
pub mod fixtures;
pub mod mock;
pub mod repository;
