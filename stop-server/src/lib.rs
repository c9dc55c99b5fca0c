//! Truck stop planner server.
//!
//! A web application that answers: "Driving this shared route, where can
//! I take my mandated breaks and refuel at my preferred brand?"

pub mod config;
pub mod domain;
pub mod fuel;
pub mod link;
pub mod planner;
pub mod providers;
pub mod routing;
pub mod web;
