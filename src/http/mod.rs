// Publishing
// Turns a report file into an authenticated PUT against the metrics API

pub mod client;
pub mod template;

pub use client::{describe_request, PublishError, PublishOutcome, Publisher};
pub use template::{TemplateError, UrlTemplate};
