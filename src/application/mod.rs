pub mod bootstrap;
pub mod commands;
pub mod controller;
pub mod oauth;
pub mod remote_mirror;
