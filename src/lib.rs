pub mod availability;
pub mod compare;
pub mod config;
pub mod display;
pub mod form;
pub mod parser;
pub mod selection;
pub mod web;
