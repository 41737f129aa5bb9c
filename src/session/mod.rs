//! Session & Request Pipeline (spec §2.F, §4.F, ~20% share): per-search HTTP
//! state — cookie jar, CSRF token lifecycle, form fetch → parse → submit →
//! parse, result extraction.

mod classify;
mod csrf;
mod extract;
mod form;
mod pipeline;
mod transport;

pub use classify::classify_response;
pub use extract::extract_records;
pub use form::{parse_form, ParsedForm};
pub use pipeline::{HttpTransport, SessionPhase, SessionPipeline};
pub use transport::ReqwestHttpTransport;
