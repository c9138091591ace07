pub mod gateway;
pub mod run_cmd;
pub mod status;
