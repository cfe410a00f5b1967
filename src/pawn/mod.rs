pub mod common;
pub mod domain;
pub mod service;
