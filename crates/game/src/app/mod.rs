mod audio;
mod bootstrap;
mod loop_runner;
mod session;

pub(crate) use bootstrap::build_app;
pub(crate) use loop_runner::run;
