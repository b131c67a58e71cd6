// Operational endpoints that act on the whole deployment.

pub mod handlers;
