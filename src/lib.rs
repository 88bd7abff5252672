//! missionlog: HTTP and CLI surface over `missionlog-core`.

pub mod api;
pub mod config;
