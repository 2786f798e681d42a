//! MiniTwin - natural-language credit operations agent.
//!
//! The core is a router over ~14 intent handlers. A handler takes the user's
//! question plus a typed view of the credit export table, decides via
//! keyword/regex heuristics whether the question is its to answer, and
//! computes a formatted text report (optionally paired with a result
//! subtable). The hosting shell only ever calls [`Router::route`].

pub mod dates;
pub mod error;
pub mod format;
pub mod frame;
pub mod intents;
pub mod router;

pub use error::{AgentError, Result};
pub use frame::{CreditFrame, CreditRecord};
pub use intents::{IntentQuery, IntentReply, QueryContext};
pub use router::{ResponseEnvelope, Router};
