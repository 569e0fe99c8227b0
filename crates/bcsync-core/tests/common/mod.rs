#![allow(dead_code)]

pub mod storefront_server;
