pub mod activity;
pub mod record;
