mod ingest;
mod source;
mod support;
