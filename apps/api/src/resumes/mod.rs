// Resume records: storage-agnostic service, PDF text extraction and the
// HTTP surface that ties them together.

pub mod content;
pub mod handlers;
pub mod service;
