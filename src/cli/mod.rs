//! # CLI Module
//!
//! Command-line tooling for route-table files.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! List the routes of a table in dispatch order:
//!
//! ```bash
//! routeshift routes --table routes.yaml
//! ```
//!
//! ### `match`
//!
//! Dispatch a request against the table. Every handler identifier resolves
//! to an echo handler, so the output shows how the request was routed:
//!
//! ```bash
//! routeshift match --table routes.yaml --method POST "/admin/users/7?x=1"
//! ```
//!
//! ### `reverse`
//!
//! Build a path from a route:
//!
//! ```bash
//! routeshift reverse --table routes.yaml pets:get --var id=7
//! ```

mod commands;


pub use commands::{execute, run_cli, Cli, Commands};
