// Applications: the status state machine and the apply / review / submit flow.

pub mod handlers;
pub mod service;
pub mod status;
