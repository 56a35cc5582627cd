pub mod clock;
pub mod constants;
pub mod frame;
pub mod read_context;
