//! Audit trail CSV export.
//!
//! Flat export of every audit event across the given requests, one row per
//! event, ordered by request id then trail order. Timestamps are RFC 3339;
//! fields containing a comma, quote, or line break are double-quoted with
//! embedded quotes doubled.

use std::borrow::Cow;
use std::fmt::Write;

use chrono::SecondsFormat;

use tripflow_travel::TravelRequest;

pub const HEADER: &str = "request_id,event_id,at,actor_role,actor_name,action,from_status,to_status,note";

pub fn export(requests: &[TravelRequest]) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');
    for request in requests {
        for event in request.audit_trail() {
            let event_id = event.id.to_string();
            let at = event.at.to_rfc3339_opts(SecondsFormat::Secs, true);
            let fields = [
                escape(request.id().as_str()),
                escape(&event_id),
                escape(&at),
                escape(event.actor_role.as_str()),
                escape(&event.actor_name),
                escape(event.action.name()),
                escape(event.from_status.map(|s| s.as_str()).unwrap_or("")),
                escape(event.to_status.map(|s| s.as_str()).unwrap_or("")),
                escape(event.note.as_deref().unwrap_or("")),
            ];
            let _ = writeln!(out, "{}", fields.join(","));
        }
    }
    out
}

fn escape(field: &str) -> Cow<'_, str> {
    if field.contains(['"', ',', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
