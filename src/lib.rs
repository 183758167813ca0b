pub mod capture;
pub mod configuration;
pub mod controller;
pub mod error_handling;
pub mod remote_store;
pub mod rendering;
pub mod rotation;
pub mod storage;
pub mod web_interface;
