pub mod gateway;
pub mod notifier;
