pub mod administrative_activity;
pub mod attachment;
pub mod code;
pub mod contact;
pub mod draft;
pub mod funding;
pub mod iucn;
pub mod participation;
pub mod partnership;
pub mod permit;
pub mod project;
pub mod report;
pub mod search;
pub mod spatial;
pub mod species;
pub mod user;
