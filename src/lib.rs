pub mod accounts;
pub mod config;
pub mod connection;
pub mod controller;
pub mod handlers;
pub mod request;
pub mod response;
pub mod server;
pub mod site;
pub mod view;
