pub mod access;
pub mod challenge;
