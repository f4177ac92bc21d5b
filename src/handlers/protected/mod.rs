// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Every route here runs behind `middleware::authenticate`; most also carry a
// per-route access rule (see `app.rs`).

pub mod access_request;
pub mod attachment;
pub mod draft;
pub mod participant;
pub mod project;
pub mod search;
pub mod spatial;
pub mod user;
