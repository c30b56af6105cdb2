pub mod client;
pub mod db;
pub mod server;
pub mod services;
pub mod version;
pub mod web;
