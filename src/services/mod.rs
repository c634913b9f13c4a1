// Services module for device sessions and module logic
pub mod command_runner;
pub mod device_stream;
pub mod facts_collector;
pub mod pager;
pub mod ssh;
pub mod telnet;
