//! Shared core of the school dashboard: remote list loading, client-side
//! filtering and sorting, mutations, document export and dependent forms.
//!
//! Each role's page (admin, censeur, comptable, secrétaire, formateur) is a
//! registry entry in [`resources`] driven through [`page::Page`].

pub mod client;
pub mod collection;
pub mod config;
pub mod envelope;
pub mod error;
pub mod export;
pub mod filter;
pub mod form;
pub mod logging;
pub mod models;
pub mod notify;
pub mod page;
pub mod resources;
pub mod sort;
pub mod summary;

pub use error::{DeskError, Result};
