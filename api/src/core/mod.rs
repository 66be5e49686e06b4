pub mod app_state;
pub mod delivery_log;
