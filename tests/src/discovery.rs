mod engine;
mod isolation;
mod logging;
mod session;
