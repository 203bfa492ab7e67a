//! HTTP front end: server-rendered product pages over the catalog service.

pub mod app;
pub mod middleware;
