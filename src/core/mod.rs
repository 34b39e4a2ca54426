pub mod aggregator;
pub mod format;
pub mod grouper;
pub mod report;
pub mod service;
pub mod validator;
