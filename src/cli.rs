//! CLI domain: parse, route, output, and presentation only.
//! No queue logic here; the route table drives `JobService`.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{format_config, format_simulation, SimulationSummary};
pub use route::RunContext;
