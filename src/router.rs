//! Ordered intent dispatch.
//!
//! The router holds a fixed, ordered registry of intent handlers and tries
//! them one by one; the first handler producing a reply wins. Ordering is a
//! contract, not an accident: ticket detail must run before ticket status
//! (both match the same `R-` pattern but answer with different shapes), and
//! the enumerated help fallback mirrors the registry order.

use crate::error::Result;
use crate::frame::CreditFrame;
use crate::intents::{self, HandlerFn, IntentQuery, QueryContext};
use chrono::Local;
use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::{debug, info, warn};

/// One registered intent: a stable name, an example phrasing for the help
/// fallback, and the handler function.
pub struct IntentHandler {
    pub name: &'static str,
    pub example: &'static str,
    pub func: HandlerFn,
}

/// The envelope every `route` call returns: answer text plus an optional
/// result table the shell may render as a grid.
#[derive(Debug, Serialize)]
pub struct ResponseEnvelope {
    pub text: String,
    #[serde(skip_serializing)]
    pub table: Option<DataFrame>,
}

pub struct Router {
    handlers: Vec<IntentHandler>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Build the router with the frozen priority order.
    pub fn new() -> Self {
        let handlers = vec![
            IntentHandler {
                name: "ticket_detail",
                example: "MiniTwin, show me all the requests for ticket R-040699",
                func: intents::ticket_detail::handle,
            },
            IntentHandler {
                name: "ticket_status",
                example: "MiniTwin, status on ticket R-048484",
                func: intents::ticket_status::handle,
            },
            IntentHandler {
                name: "record_lookup",
                example: "MiniTwin, is ticket R-040699 logged in the system?",
                func: intents::record_lookup::handle,
            },
            IntentHandler {
                name: "customer_tickets",
                example: "MiniTwin, show all tickets for customer YAM in last 30 days",
                func: intents::customer_tickets::handle,
            },
            IntentHandler {
                name: "credit_activity",
                example: "MiniTwin, how many credits did I update from Nov 1st to today?",
                func: intents::credit_activity::handle,
            },
            IntentHandler {
                name: "credit_numbers",
                example: "MiniTwin, how many credits have a credit number?",
                func: intents::credit_numbers::handle,
            },
            IntentHandler {
                name: "priority_tickets",
                example: "MiniTwin, what tickets are priority right now?",
                func: intents::priority_tickets::handle,
            },
            IntentHandler {
                name: "credit_aging",
                example: "MiniTwin, show the credit aging summary",
                func: intents::credit_aging::handle,
            },
            IntentHandler {
                name: "stalled_tickets",
                example: "MiniTwin, which tickets haven't been updated in 7 days?",
                func: intents::stalled_tickets::handle,
            },
            IntentHandler {
                name: "overall_summary",
                example: "MiniTwin, give me a credit overview",
                func: intents::overall_summary::handle,
            },
            IntentHandler {
                name: "top_accounts",
                example: "MiniTwin, which accounts have the most credits?",
                func: intents::top_accounts::handle,
            },
            IntentHandler {
                name: "top_items",
                example: "MiniTwin, which items have the most credits issued?",
                func: intents::top_items::handle,
            },
            IntentHandler {
                name: "credit_trends",
                example: "MiniTwin, are there any credit trends worth sharing?",
                func: intents::credit_trends::handle,
            },
            IntentHandler {
                name: "credit_anomalies",
                example: "MiniTwin, any unusual or suspicious credits lately?",
                func: intents::credit_anomalies::handle,
            },
        ];
        Self { handlers }
    }

    pub fn handlers(&self) -> &[IntentHandler] {
        &self.handlers
    }

    /// Route a query against the table, anchored at the current day.
    pub fn route(&self, query: &str, df: &DataFrame) -> ResponseEnvelope {
        self.route_at(query, df, Local::now().date_naive())
    }

    /// Route with a pinned "today". Never returns an error: any escaping
    /// fault is converted into a visible error string.
    pub fn route_at(
        &self,
        query: &str,
        df: &DataFrame,
        today: chrono::NaiveDate,
    ) -> ResponseEnvelope {
        match self.try_route(query, df, today) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("query failed: {}", e);
                ResponseEnvelope {
                    text: format!("⚠️ Error while processing your request:\n\n`{}`", e),
                    table: None,
                }
            }
        }
    }

    fn try_route(
        &self,
        query: &str,
        df: &DataFrame,
        today: chrono::NaiveDate,
    ) -> Result<ResponseEnvelope> {
        let parsed = IntentQuery::new(query);
        let ctx = QueryContext { today };
        let frame = CreditFrame::new(df)?;

        for handler in &self.handlers {
            debug!("trying intent {}", handler.name);
            if let Some(reply) = (handler.func)(&parsed, &frame, &ctx)? {
                info!("intent {} answered the query", handler.name);
                return Ok(ResponseEnvelope {
                    text: reply.text,
                    table: reply.table,
                });
            }
        }

        debug!("no intent matched, returning help text");
        Ok(ResponseEnvelope {
            text: self.help_text(),
            table: None,
        })
    }

    /// Enumerated list of supported intents, numbered in priority order.
    pub fn help_text(&self) -> String {
        let mut lines = vec![
            "MiniTwin here 🤖 I didn't fully understand that request.".to_string(),
            String::new(),
            "Right now I can help you with:".to_string(),
        ];
        for (i, handler) in self.handlers.iter().enumerate() {
            lines.push(format!(
                "{}. {} — e.g. `{}`",
                i + 1,
                describe(handler.name),
                handler.example
            ));
        }
        lines.join("\n")
    }
}

fn describe(name: &str) -> &'static str {
    match name {
        "ticket_detail" => "Ticket detail",
        "ticket_status" => "Ticket status",
        "record_lookup" => "Record lookup",
        "customer_tickets" => "Customer history",
        "credit_activity" => "Credit activity",
        "credit_numbers" => "Credits with RTN",
        "priority_tickets" => "Priority tickets",
        "credit_aging" => "Credit aging",
        "stalled_tickets" => "Stalled tickets",
        "overall_summary" => "Overall overview",
        "top_accounts" => "Top accounts",
        "top_items" => "Top items",
        "credit_trends" => "Credit trends",
        "credit_anomalies" => "Anomalies",
        _ => "Other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order_is_frozen() {
        let router = Router::new();
        let names: Vec<&str> = router.handlers().iter().map(|h| h.name).collect();
        assert_eq!(
            names,
            vec![
                "ticket_detail",
                "ticket_status",
                "record_lookup",
                "customer_tickets",
                "credit_activity",
                "credit_numbers",
                "priority_tickets",
                "credit_aging",
                "stalled_tickets",
                "overall_summary",
                "top_accounts",
                "top_items",
                "credit_trends",
                "credit_anomalies",
            ]
        );
    }

    #[test]
    fn test_help_text_enumerates_all_intents() {
        let router = Router::new();
        let help = router.help_text();
        for i in 1..=14 {
            assert!(help.contains(&format!("{}. ", i)), "missing entry {}", i);
        }
        assert!(help.contains("R-040699"));
    }
}
