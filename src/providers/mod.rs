pub mod base;
pub mod configs;
pub mod openai;
pub mod types;
pub mod utils;
