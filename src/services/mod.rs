//! Traits for the external collaborators: the dashboard backend and the AI summary provider.

pub mod dashboard_api;
pub mod summary;
