//! Configuration module for Skriv.
//!
//! Handles loading application settings, prompt templates and
//! environment-sourced secrets.

pub mod prompts;
pub mod secrets;
mod settings;

pub use secrets::Secret;
pub use settings::{
    AcquisitionStrategy, GeneralSettings, HostedProvider, PipelineSettings, ServerSettings,
    Settings, StoreSettings, SummarizerSettings, TitleProvider, TitleSettings,
    TranscriptionSettings,
};
