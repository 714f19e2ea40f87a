pub mod service;

pub use service::ShellService;
