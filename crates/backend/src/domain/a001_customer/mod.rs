pub mod entity;
pub mod error;
pub mod filter;
pub mod hydration;
pub mod repository;
pub mod service;
