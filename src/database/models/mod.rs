pub mod administrative_activity;
pub mod attachment;
pub mod code;
pub mod draft;
pub mod project;
pub mod report;
pub mod search;
pub mod user;
