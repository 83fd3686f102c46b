#![doc = "sharefile-upload-core: core logic library for sharefile-upload."]

//! This crate holds everything with real logic in the upload step: turning
//! include/exclude pattern text into a concrete file list, building the
//! uploader invocation with every value safely quoted, and the single-shot
//! pipeline that executes it and reports the share link.
//!
//! Reading configuration from a host environment, printing workflow
//! commands and CLI parsing live in the `sharefile-upload` crate.
//!
//! # Usage
//! Construct an [`config::UploadConfig`] with [`config::apply_defaults`], then
//! call [`upload::upload`] with a [`contract::CommandExecutor`] and a
//! [`contract::SecretMasker`].

pub mod config;
pub mod contract;
pub mod executor;
pub mod invocation;
pub mod resolve;
pub mod upload;
