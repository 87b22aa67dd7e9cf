//! HTTP request handlers

pub mod entities;
pub mod health;
pub mod menu;
pub mod pages;
pub mod reports;
pub mod session;
