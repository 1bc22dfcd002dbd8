//! CLI command implementations.
//!
//! | Module     | Commands handled     |
//! |------------|----------------------|
//! | `run`      | `Run`, `Maintain`    |
//! | `classify` | `Classify`           |

pub mod classify;
pub mod run;

pub use classify::cmd_classify;
pub use run::{cmd_maintain, cmd_run};
