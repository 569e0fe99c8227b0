pub mod config;
pub mod logging;

pub mod collection;
pub mod credential;
pub mod http;
pub mod pagedata;
pub mod resolver;
pub mod retry;
pub mod scheduler;
pub mod template;
pub mod url_model;
pub mod writer;
